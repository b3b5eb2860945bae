// src/core/definition.rs

//! Function-like and class-like definitions with explicit signatures.
//!
//! A [`Function`] carries its parameter list (name, optional default, optional
//! argument annotation) alongside its body, so the assembly engine can inspect
//! it the way a reflective runtime would. A [`Class`] is an ordered list of
//! named members plus an optional call operator.

use crate::{
    core::{arguments::Arg, command::Command},
    models::{Kwargs, Value},
};
use anyhow::{Result, anyhow};
use serde::de::DeserializeOwned;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// The body of a command function.
pub type Body = Rc<dyn Fn(&Call<'_>) -> Result<Value>>;

// --- SIGNATURES ---

/// One declared parameter of a [`Function`].
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    default: Option<Value>,
    annotation: Option<Arg>,
}

impl Parameter {
    /// A parameter without default or annotation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            annotation: None,
        }
    }

    /// Gives the parameter a default. `Value::Null` is a real default, distinct
    /// from having none.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Annotates the parameter with an argument descriptor, exposing it on the
    /// command line.
    pub fn annotated(mut self, arg: Arg) -> Self {
        self.annotation = Some(arg);
        self
    }

    /// The parameter name, used as the argument's `dest`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared default, if any.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The argument descriptor, if the parameter is exposed on the command line.
    pub fn annotation(&self) -> Option<&Arg> {
        self.annotation.as_ref()
    }
}

/// A callable definition: metadata, an ordered signature and a body.
#[derive(Clone)]
pub struct Function {
    name: String,
    doc: Option<String>,
    module: Option<String>,
    qualname: String,
    params: Vec<Parameter>,
    takes_context: bool,
    body: Body,
}

impl Function {
    /// A function with an empty signature; its qualified name defaults to `name`.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Call<'_>) -> Result<Value> + 'static,
    {
        let name = name.into();
        Self {
            qualname: name.clone(),
            name,
            doc: None,
            module: None,
            params: Vec::new(),
            takes_context: false,
            body: Rc::new(body),
        }
    }

    /// Sets the doc string, used as description and subcommand help.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Sets the defining module path.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Overrides the qualified name.
    pub fn qualname(mut self, qualname: impl Into<String>) -> Self {
        self.qualname = qualname.into();
        self
    }

    /// Appends a parameter to the signature.
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.params.push(parameter);
        self
    }

    /// Shorthand for an annotated parameter without a default.
    pub fn arg(self, name: impl Into<String>, arg: Arg) -> Self {
        self.param(Parameter::new(name).annotated(arg))
    }

    /// Declares that the function receives a context object (the `bind` result,
    /// or the runner itself).
    pub fn with_context(mut self) -> Self {
        self.takes_context = true;
        self
    }

    /// The plain name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The doc string.
    pub fn documentation(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// The defining module path.
    pub fn module_path(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// The qualified name, as used in error messages.
    pub fn qualified_name(&self) -> &str {
        &self.qualname
    }

    /// The parameters in declaration order.
    pub fn signature(&self) -> &[Parameter] {
        &self.params
    }

    /// Whether the body expects a context object.
    pub fn takes_context(&self) -> bool {
        self.takes_context
    }

    /// Runs the body.
    pub fn invoke(&self, call: &Call<'_>) -> Result<Value> {
        (self.body)(call)
    }

    /// Whether both values are the same function (same body).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("qualname", &self.qualname)
            .field("params", &self.params)
            .field("takes_context", &self.takes_context)
            .finish_non_exhaustive()
    }
}

// --- CLASSES ---

/// A named container of members with an optional call operator.
///
/// Member order is declaration order; it drives subcommand discovery.
#[derive(Debug, Clone)]
pub struct Class {
    name: String,
    doc: Option<String>,
    module: Option<String>,
    qualname: String,
    call: Option<Function>,
    members: Vec<(String, Member)>,
}

impl Class {
    /// An empty class without call operator.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            qualname: name.clone(),
            name,
            doc: None,
            module: None,
            call: None,
            members: Vec::new(),
        }
    }

    /// Wraps a function into a member-less class whose call operator is that
    /// function, carrying over its metadata.
    pub fn from_function(function: Function) -> Self {
        Self {
            name: function.name.clone(),
            doc: function.doc.clone(),
            module: function.module.clone(),
            qualname: function.qualname.clone(),
            call: Some(function),
            members: Vec::new(),
        }
    }

    /// Sets the doc string, used as description and subcommand help.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Sets the defining module path.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Overrides the qualified name.
    pub fn qualname(mut self, qualname: impl Into<String>) -> Self {
        self.qualname = qualname.into();
        self
    }

    /// Sets the call operator.
    pub fn call(mut self, function: Function) -> Self {
        self.call = Some(function);
        self
    }

    /// Declares a member. Functions, classes and commands become subcommands
    /// when the class is wrapped; plain values do not.
    pub fn member(mut self, name: impl Into<String>, member: impl Into<Member>) -> Self {
        self.members.push((name.into(), member.into()));
        self
    }

    /// Declares a plain value member.
    pub fn attribute(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.member(name, Member::Attribute(value.into()))
    }

    /// The plain name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The doc string.
    pub fn documentation(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Replaces the doc string.
    pub fn set_documentation(&mut self, doc: Option<String>) {
        self.doc = doc;
    }

    /// The defining module path.
    pub fn module_path(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// The qualified name, as used in error messages.
    pub fn qualified_name(&self) -> &str {
        &self.qualname
    }

    /// The function run when the class itself is the matched command.
    pub fn call_operator(&self) -> Option<&Function> {
        self.call.as_ref()
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[(String, Member)] {
        &self.members
    }
}

/// Anything that can sit in a class body.
#[derive(Debug, Clone)]
pub enum Member {
    /// A function; becomes a leaf subcommand.
    Function(Function),
    /// A nested class; becomes a subcommand with its own subcommands.
    Class(Class),
    /// An already wrapped command, reused as is.
    Command(Box<Command>),
    /// A plain value; never a subcommand.
    Attribute(Value),
}

impl From<Function> for Member {
    fn from(function: Function) -> Self {
        Self::Function(function)
    }
}

impl From<Class> for Member {
    fn from(class: Class) -> Self {
        Self::Class(class)
    }
}

impl From<Command> for Member {
    fn from(command: Command) -> Self {
        Self::Command(Box::new(command))
    }
}

impl From<Value> for Member {
    fn from(value: Value) -> Self {
        Self::Attribute(value)
    }
}

// --- CALLS ---

/// The arguments a function body receives: the values matched onto its
/// parameters and, for context-taking functions, the context object.
pub struct Call<'a> {
    function: &'a Function,
    values: Kwargs,
    context: Option<&'a dyn Any>,
}

impl<'a> Call<'a> {
    /// Bundles the matched values and context for one invocation of `function`.
    pub fn new(function: &'a Function, values: Kwargs, context: Option<&'a dyn Any>) -> Self {
        Self {
            function,
            values,
            context,
        }
    }

    /// The function being called.
    pub fn function(&self) -> &Function {
        self.function
    }

    /// The value for `name`: the matched one, else the parameter's declared
    /// default.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name).or_else(|| {
            self.function
                .params
                .iter()
                .find(|p| p.name == name)
                .and_then(Parameter::default_value)
        })
    }

    /// Deserializes the value for `name` into `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.value(name).ok_or_else(|| {
            anyhow!(
                "{}() missing required argument: '{}'",
                self.function.qualname,
                name
            )
        })?;
        serde_json::from_value(value.clone())
            .map_err(|e| anyhow!("Invalid value for parameter '{}': {}", name, e))
    }

    /// The matched values only, without declared defaults.
    pub fn values(&self) -> &Kwargs {
        &self.values
    }

    /// The context object, when it has type `T`.
    pub fn context<T: Any>(&self) -> Option<&T> {
        self.context.and_then(|c| c.downcast_ref::<T>())
    }

    /// Whether a context object was passed.
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }
}

impl fmt::Debug for Call<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("function", &self.function.qualname)
            .field("values", &self.values)
            .field("context", &self.context.is_some())
            .finish()
    }
}
