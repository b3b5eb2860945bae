// src/core/runner.rs

//! Dispatch of a parsed namespace to the matched function.

use crate::{
    core::{definition::Call, namespace::Namespace},
    error::Error,
    models::{Kwargs, Value},
    settings::{Precedence, Settings},
    system::parser::ParserRef,
};
use anyhow::Result as AnyResult;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// The outcome of running a parsed namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// A handler ran and returned this value.
    Completed(Value),
    /// No handler was matched; the usage text was printed and is returned.
    Usage(String),
}

impl Dispatch {
    /// Whether no handler was matched.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }

    /// The handler's return value.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Usage(_) => None,
        }
    }

    /// Consumes the outcome, keeping only the handler's return value.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Usage(_) => None,
        }
    }
}

/// Executes a parsed namespace.
pub trait Runner {
    /// Dispatches to the matched function, or prints usage when there is none.
    fn run(&self) -> Result<Dispatch, Error>;
}

type BindFn = dyn Fn(Option<&ParserRef>, &Namespace) -> AnyResult<Box<dyn Any>>;
type RunnerFn = dyn Fn(Namespace, Kwargs, &Settings) -> Box<dyn Runner>;

/// Produces the context object handed to context-taking functions.
#[derive(Clone)]
pub struct Binder(Rc<BindFn>);

impl Binder {
    /// Wraps a closure returning any context type.
    pub fn new<F, T>(bind: F) -> Self
    where
        F: Fn(Option<&ParserRef>, &Namespace) -> AnyResult<T> + 'static,
        T: Any,
    {
        Self(Rc::new(
            move |parser: Option<&ParserRef>, namespace: &Namespace| -> AnyResult<Box<dyn Any>> {
                Ok(Box::new(bind(parser, namespace)?))
            },
        ))
    }

    /// Produces a fresh context for one dispatch.
    pub fn bind(&self, parser: Option<&ParserRef>, namespace: &Namespace) -> AnyResult<Box<dyn Any>> {
        (self.0)(parser, namespace)
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Binder(..)")
    }
}

/// Builds a custom runner in place of [`CommandRunner`].
#[derive(Clone)]
pub struct RunnerFactory(Rc<RunnerFn>);

impl RunnerFactory {
    /// Wraps a closure building the runner.
    pub fn new<F, R>(build: F) -> Self
    where
        F: Fn(Namespace, Kwargs, &Settings) -> R + 'static,
        R: Runner + 'static,
    {
        Self(Rc::new(
            move |namespace: Namespace, extras: Kwargs, settings: &Settings| -> Box<dyn Runner> {
                Box::new(build(namespace, extras, settings))
            },
        ))
    }

    /// Builds the runner for one parsed command line.
    pub fn create(&self, namespace: Namespace, extras: Kwargs, settings: &Settings) -> Box<dyn Runner> {
        (self.0)(namespace, extras, settings)
    }
}

impl fmt::Debug for RunnerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RunnerFactory(..)")
    }
}

/// The default runner: matches namespace attributes and caller extras onto the
/// resolved function's parameters by name.
#[derive(Debug)]
pub struct CommandRunner {
    namespace: Namespace,
    parser: Option<ParserRef>,
    extras: Kwargs,
    settings: Settings,
}

impl CommandRunner {
    /// A runner with default settings; the parser is taken from the namespace.
    pub fn new(namespace: Namespace, extras: Kwargs) -> Self {
        let parser = namespace.parser().cloned();
        Self {
            namespace,
            parser,
            extras,
            settings: Settings::default(),
        }
    }

    /// Uses `settings` for precedence and the usage stream.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.settings = settings.clone();
        self
    }

    /// The parsed namespace.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The parser that produced the namespace.
    pub fn parser(&self) -> Option<&ParserRef> {
        self.parser.as_ref()
    }

    /// A caller-supplied extra value.
    pub fn extra(&self, name: &str) -> Option<&Value> {
        self.extras.get(name)
    }

    /// All caller-supplied extras.
    pub fn extras(&self) -> &Kwargs {
        &self.extras
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        let parsed = self.namespace.get(name);
        let extra = self.extras.get(name);
        match self.settings.precedence {
            Precedence::Context => extra.or(parsed),
            Precedence::Namespace => parsed.or(extra),
        }
    }

    /// Prints the originating parser's usage and returns it.
    pub fn print_usage(&self) -> String {
        let usage = self
            .parser
            .as_ref()
            .map(|parser| parser.format_usage())
            .unwrap_or_default();
        self.settings.usage_stream.emit(&usage);
        usage
    }
}

impl Runner for CommandRunner {
    fn run(&self) -> Result<Dispatch, Error> {
        let Some(function) = self.namespace.handler() else {
            log::debug!("No command handler matched; printing usage.");
            return Ok(Dispatch::Usage(self.print_usage()));
        };

        let mut values = Kwargs::new();
        for parameter in function.signature() {
            if let Some(value) = self.lookup(parameter.name()) {
                values.insert(parameter.name().to_string(), value.clone());
            }
        }

        let bound: Box<dyn Any>;
        let context: Option<&dyn Any> = if function.takes_context() {
            match self.namespace.binder() {
                Some(binder) => {
                    bound = binder.bind(self.parser.as_ref(), &self.namespace)?;
                    Some(&*bound)
                }
                None => Some(self as &dyn Any),
            }
        } else {
            None
        };

        log::debug!(
            "Dispatching to '{}' with {:?}",
            function.qualified_name(),
            values
        );
        let call = Call::new(function, values, context);
        Ok(Dispatch::Completed(function.invoke(&call)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::definition::{Function, Parameter};
    use crate::kwargs;
    use crate::system::recording::FakeHandle;

    fn namespace_with_parser() -> Namespace {
        let mut ns = Namespace::new();
        ns.set_parser(Rc::new(FakeHandle::new("prog")));
        ns
    }

    fn tuple_function(takes_context: bool) -> Function {
        let names = ["foo", "bar", "baz", "zoo", "blub"];
        let mut function = Function::new("foo", move |call| {
            let mut out: Vec<Value> = Vec::new();
            if let Some(runner) = call.context::<CommandRunner>() {
                out.push(Value::from(runner.parser().map(|p| p.prog()).unwrap_or_default()));
            }
            for name in names {
                out.push(call.value(name).cloned().unwrap_or(Value::Null));
            }
            Ok(Value::from(out))
        })
        .param(Parameter::new("foo"))
        .param(Parameter::new("bar"))
        .param(Parameter::new("baz").default(43))
        .param(Parameter::new("zoo").default(2))
        .param(Parameter::new("blub").default(99));
        if takes_context {
            function = function.with_context();
        }
        function
    }

    #[test]
    fn test_runner_keeps_namespace_parser_and_extras() {
        let ns = namespace_with_parser();
        let runner = CommandRunner::new(ns, kwargs! { "foo" => 1, "bar" => 3 });
        assert_eq!(runner.parser().map(|p| p.prog()), Some("prog".to_string()));
        assert_eq!(runner.extra("foo"), Some(&Value::from(1)));
        assert_eq!(runner.extra("bar"), Some(&Value::from(3)));
        assert!(runner.extra("baz").is_none());
    }

    #[test]
    fn test_run_without_handler_returns_usage() {
        let runner = CommandRunner::new(namespace_with_parser(), kwargs! {});
        let outcome = runner.run().unwrap();
        assert_eq!(outcome, Dispatch::Usage("usage: prog\n".to_string()));
        assert!(outcome.is_usage());
    }

    #[test]
    fn test_run_without_handler_or_parser_is_not_an_error() {
        let runner = CommandRunner::new(Namespace::new(), kwargs! {});
        assert_eq!(runner.run().unwrap(), Dispatch::Usage(String::new()));
    }

    #[test]
    fn test_run_maps_namespace_and_extras_onto_parameters() {
        let mut ns = namespace_with_parser();
        ns.set_handler(tuple_function(false));
        ns.insert("foo", Value::from(22));
        ns.insert("zoo", Value::from(3));

        let runner = CommandRunner::new(ns, kwargs! { "bar" => 47, "baz" => 4 });
        let value = runner.run().unwrap().into_value().unwrap();
        assert_eq!(value, serde_json::json!([22, 47, 4, 3, 99]));
    }

    #[test]
    fn test_run_passes_runner_as_context() {
        let mut ns = namespace_with_parser();
        ns.set_handler(tuple_function(true));
        ns.insert("foo", Value::from(22));
        ns.insert("zoo", Value::from(3));

        let runner = CommandRunner::new(ns, kwargs! { "bar" => 47, "baz" => 4 });
        let value = runner.run().unwrap().into_value().unwrap();
        assert_eq!(value, serde_json::json!(["prog", 22, 47, 4, 3, 99]));
    }

    #[test]
    fn test_run_uses_binder_result_as_context() {
        #[derive(Debug)]
        struct Session {
            user: String,
        }

        let function = Function::new("whoami", |call| {
            let session = call.context::<Session>().expect("session context");
            Ok(Value::from(session.user.clone()))
        })
        .with_context();

        let mut ns = namespace_with_parser();
        ns.set_handler(function);
        ns.insert("user", Value::from("ada"));
        ns.set_binder(Binder::new(|parser, ns| {
            assert_eq!(parser.map(|p| p.prog()), Some("prog".to_string()));
            Ok(Session {
                user: ns.get("user").and_then(Value::as_str).unwrap_or("").to_string(),
            })
        }));

        let outcome = CommandRunner::new(ns, kwargs! {}).run().unwrap();
        assert_eq!(outcome.value(), Some(&Value::from("ada")));
    }

    #[test]
    fn test_precedence_setting() {
        let echo = Function::new("echo", |call| Ok(call.value("name").cloned().unwrap_or_default()))
            .param(Parameter::new("name"));
        let mut ns = namespace_with_parser();
        ns.set_handler(echo);
        ns.insert("name", Value::from("parsed"));

        let extras = kwargs! { "name" => "extra" };
        let context_first = CommandRunner::new(ns.clone(), extras.clone());
        assert_eq!(context_first.run().unwrap().into_value(), Some(Value::from("extra")));

        let settings = Settings {
            precedence: Precedence::Namespace,
            ..Settings::default()
        };
        let namespace_first = CommandRunner::new(ns, extras).with_settings(&settings);
        assert_eq!(namespace_first.run().unwrap().into_value(), Some(Value::from("parsed")));
    }

    #[test]
    fn test_handler_errors_propagate() {
        let failing = Function::new("fail", |_| Err(anyhow::anyhow!("boom")));
        let mut ns = namespace_with_parser();
        ns.set_handler(failing);
        let err = CommandRunner::new(ns, kwargs! {}).run().unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
        assert_eq!(err.to_string(), "boom");
    }
}
