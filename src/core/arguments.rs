// src/core/arguments.rs

//! Argument descriptors.

use crate::{
    models::{Kwargs, Value, is_truthy},
    system::parser::{ArgumentParser, ParserError, Scope},
};
use std::fmt;

/// Selects how [`Arg::apply`] computes the argument's action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgFlavor {
    /// Options are forwarded as given.
    #[default]
    Store,
    /// Boolean toggle; the action follows the parameter default.
    Flag,
    /// Collects repeated occurrences into a list.
    Append,
    /// Counts occurrences.
    Count,
}

impl ArgFlavor {
    /// An empty descriptor of this flavor already assigned to `group`; the
    /// subscript form of the flavor's type. Fill it in with [`Arg::call`].
    pub fn grouped(self, group: impl Into<String>) -> Arg {
        Arg {
            flavor: self,
            group: Some(group.into()),
            ..Arg::default()
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            Self::Store => "Arg",
            Self::Flag => "Flag",
            Self::Append => "Append",
            Self::Count => "Count",
        }
    }
}

/// Declarative description of one command-line argument.
///
/// Used either as a parameter annotation (the parameter name becomes `dest`)
/// or through the `argument` decorator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arg {
    flavor: ArgFlavor,
    name_or_flags: Vec<String>,
    kwargs: Kwargs,
    group: Option<String>,
}

impl Arg {
    /// A plain descriptor whose options are forwarded as given.
    pub fn new<I, S>(name_or_flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_flavor(ArgFlavor::Store, name_or_flags)
    }

    /// A boolean toggle (`store_true`/`store_false`).
    pub fn flag<I, S>(name_or_flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_flavor(ArgFlavor::Flag, name_or_flags)
    }

    /// A repeatable option collected into a list.
    pub fn append<I, S>(name_or_flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_flavor(ArgFlavor::Append, name_or_flags)
    }

    /// A counted flag such as `-vvv`.
    pub fn count<I, S>(name_or_flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_flavor(ArgFlavor::Count, name_or_flags)
    }

    /// An empty plain descriptor already assigned to `group`; fill it in with
    /// [`Arg::call`]. See [`ArgFlavor::grouped`] for the other flavors.
    pub fn grouped(group: impl Into<String>) -> Self {
        ArgFlavor::Store.grouped(group)
    }

    /// A descriptor of an explicit flavor.
    pub fn with_flavor<I, S>(flavor: ArgFlavor, name_or_flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flavor,
            name_or_flags: name_or_flags.into_iter().map(Into::into).collect(),
            kwargs: Kwargs::new(),
            group: None,
        }
    }

    /// Assigns the descriptor to the group tagged `group`.
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Sets one parser option, replacing an earlier value for `key`.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Shorthand for the `help` option.
    pub fn help(self, text: impl Into<String>) -> Self {
        self.option("help", text.into())
    }

    /// Merges a whole set of parser options.
    pub fn with_kwargs(mut self, kwargs: Kwargs) -> Self {
        self.kwargs.extend(kwargs);
        self
    }

    /// Merges new names and options in place.
    ///
    /// Non-empty `name_or_flags` replace the stored names; options overwrite
    /// existing keys.
    pub fn call<I, S>(&mut self, name_or_flags: I, kwargs: Kwargs) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = name_or_flags.into_iter().map(Into::into).collect();
        if !names.is_empty() {
            self.name_or_flags = names;
        }
        self.kwargs.extend(kwargs);
        self
    }

    /// The flavor the descriptor was built with.
    pub fn flavor(&self) -> ArgFlavor {
        self.flavor
    }

    /// The positional name or flag strings, empty when only `dest` applies.
    pub fn name_or_flags(&self) -> &[String] {
        &self.name_or_flags
    }

    /// The options as declared, without `dest` or `default` stamped in.
    pub fn kwargs(&self) -> &Kwargs {
        &self.kwargs
    }

    /// The group tag, if any.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// The options `apply` would hand to the parser for destination `name`.
    ///
    /// `dest` and `default` are stamped onto a copy; the descriptor is left
    /// untouched so it can be applied again elsewhere.
    pub fn resolved_kwargs(&self, name: &str, default: Option<&Value>) -> Kwargs {
        let mut kwargs = self.kwargs.clone();
        kwargs.insert("dest".to_string(), Value::from(name));
        match self.flavor {
            ArgFlavor::Store => {
                if let Some(default) = default {
                    kwargs.insert("default".to_string(), default.clone());
                }
            }
            ArgFlavor::Flag => {
                let on = default.is_some_and(is_truthy);
                let action = if on { "store_false" } else { "store_true" };
                kwargs.insert("action".to_string(), Value::from(action));
                kwargs.insert("default".to_string(), Value::from(on));
            }
            ArgFlavor::Append | ArgFlavor::Count => {
                let action = if self.flavor == ArgFlavor::Append {
                    "append"
                } else {
                    "count"
                };
                kwargs.insert("action".to_string(), Value::from(action));
                if let Some(default) = default {
                    kwargs.insert("default".to_string(), default.clone());
                }
            }
        }
        kwargs
    }

    /// Registers the argument on `scope` under destination `name`.
    pub fn apply<P: ArgumentParser + ?Sized>(
        &self,
        scope: &mut Scope<'_, P>,
        name: &str,
        default: Option<&Value>,
    ) -> Result<(), ParserError> {
        log::trace!("Applying {} as '{}' to {:?}", self, name, scope.destination());
        scope.add_argument(&self.name_or_flags, self.resolved_kwargs(name, default))
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flavor.type_name())?;
        if let Some(group) = &self.group {
            write!(f, "['{}']", group)?;
        }
        let names = self.name_or_flags.iter().map(|n| format!("'{}'", n));
        let options = self.kwargs.iter().map(|(k, v)| match v {
            Value::String(s) => format!("{}={}", k, s),
            other => format!("{}={}", k, other),
        });
        let parts: Vec<String> = names.chain(options).collect();
        write!(f, "({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kwargs;
    use crate::models::Destination;
    use crate::system::recording::{Recorded, RecordingParser};

    fn applied(arg: &Arg, name: &str, default: Option<&Value>) -> (Vec<String>, Kwargs) {
        let mut parser = RecordingParser::default();
        let mut scope = Scope::new(&mut parser, Destination::Parser);
        arg.apply(&mut scope, name, default).unwrap();
        match parser.calls.into_iter().next() {
            Some(Recorded::AddArgument { names, kwargs, .. }) => (names, kwargs),
            other => panic!("unexpected call: {:?}", other),
        }
    }

    #[test]
    fn test_grouped_constructor() {
        let arg = Arg::grouped("output");
        assert_eq!(arg.group(), Some("output"));
        assert!(arg.name_or_flags().is_empty());
        assert!(arg.kwargs().is_empty());
    }

    #[test]
    fn test_grouped_keeps_flavor() {
        let mut arg = ArgFlavor::Count.grouped("verbosity");
        arg.call(["-v"], kwargs! {});
        assert_eq!(arg.flavor(), ArgFlavor::Count);
        assert_eq!(arg.group(), Some("verbosity"));
        assert_eq!(arg.to_string(), "Count['verbosity']('-v')");

        let (names, kwargs) = applied(&arg, "verbose", None);
        assert_eq!(names, ["-v"]);
        assert_eq!(kwargs.get("action"), Some(&Value::from("count")));

        let flag = ArgFlavor::Flag.grouped("output");
        assert_eq!(flag, Arg::flag(Vec::<String>::new()).in_group("output"));
        assert_eq!(ArgFlavor::Append.grouped("g").flavor(), ArgFlavor::Append);
        assert_eq!(Arg::grouped("g").flavor(), ArgFlavor::Store);
    }

    #[test]
    fn test_call_replaces_names_and_merges_options() {
        let mut arg = Arg::new(["-a", "--alpha"]).with_kwargs(kwargs! { "foo" => 21, "bar" => 100 });
        arg.call(["-b", "--beta"], kwargs! { "bar" => 3, "baz" => 10 });
        assert_eq!(arg.name_or_flags(), ["-b", "--beta"]);
        assert_eq!(arg.kwargs(), &kwargs! { "foo" => 21, "bar" => 3, "baz" => 10 });

        // Empty names keep the existing ones.
        arg.call(Vec::<String>::new(), kwargs! {});
        assert_eq!(arg.name_or_flags(), ["-b", "--beta"]);
    }

    #[test]
    fn test_display() {
        let arg = Arg::new(["-a", "--alpha"]).with_kwargs(kwargs! { "foo" => 21, "help" => "text" });
        assert_eq!(arg.to_string(), "Arg('-a', '--alpha', foo=21, help=text)");
        assert_eq!(Arg::grouped("foo").to_string(), "Arg['foo']()");
        assert_eq!(Arg::flag(["--x"]).to_string(), "Flag('--x')");
    }

    #[test]
    fn test_apply_stamps_dest_and_default() {
        let arg = Arg::new(["--level"]).with_kwargs(kwargs! { "foo" => 21 });

        let (names, kwargs) = applied(&arg, "bogus", None);
        assert_eq!(names, ["--level"]);
        assert_eq!(kwargs, kwargs! { "foo" => 21, "dest" => "bogus" });

        let marker = Value::from("marker");
        let (_, kwargs) = applied(&arg, "bogus", Some(&marker));
        assert_eq!(
            kwargs,
            kwargs! { "foo" => 21, "dest" => "bogus", "default" => "marker" }
        );

        // The descriptor itself is never stamped.
        assert!(!arg.kwargs().contains_key("dest"));
    }

    #[test]
    fn test_apply_threads_falsy_defaults() {
        let arg = Arg::new(["--n"]);
        for falsy in [Value::from(0), Value::from(""), Value::from(false), Value::Null] {
            let (_, kwargs) = applied(&arg, "n", Some(&falsy));
            assert_eq!(kwargs.get("default"), Some(&falsy));
        }
    }

    #[test]
    fn test_flag_chooses_action_from_default() {
        let flag = Arg::flag(["--quiet"]);

        let (_, kwargs) = applied(&flag, "quiet", None);
        assert_eq!(kwargs.get("action"), Some(&Value::from("store_true")));
        assert_eq!(kwargs.get("default"), Some(&Value::from(false)));

        let (_, kwargs) = applied(&flag, "quiet", Some(&Value::from(false)));
        assert_eq!(kwargs.get("action"), Some(&Value::from("store_true")));

        let (_, kwargs) = applied(&flag, "quiet", Some(&Value::from(true)));
        assert_eq!(kwargs.get("action"), Some(&Value::from("store_false")));
        assert_eq!(kwargs.get("default"), Some(&Value::from(true)));
    }

    #[test]
    fn test_append_and_count_force_action() {
        let (_, kwargs) = applied(&Arg::append(["--tag"]).option("action", "store"), "tags", None);
        assert_eq!(kwargs.get("action"), Some(&Value::from("append")));

        let (_, kwargs) = applied(&Arg::count(["-v"]), "verbose", Some(&Value::from(0)));
        assert_eq!(kwargs.get("action"), Some(&Value::from("count")));
        assert_eq!(kwargs.get("default"), Some(&Value::from(0)));
        assert_eq!(kwargs.get("dest"), Some(&Value::from("verbose")));
    }
}
