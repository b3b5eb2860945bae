// src/core/namespace.rs

//! The attribute bag a parser fills in, plus the defaults it is seeded with.

use crate::{
    core::{definition::Function, runner::Binder},
    models::{Kwargs, Value},
    system::parser::ParserRef,
};
use std::fmt;

/// A default a parser contributes to every namespace it produces.
#[derive(Clone)]
pub enum NamespaceDefault {
    /// A plain attribute value.
    Value(String, Value),
    /// The parser that produced the namespace; the collaborator resolves it to
    /// its own handle.
    Parser,
    /// The function to run when this parser is the deepest one matched.
    Handler(Function),
    /// Builds the context object for functions that take one.
    Binder(Binder),
}

impl fmt::Debug for NamespaceDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(name, value) => f.debug_tuple("Value").field(name).field(value).finish(),
            Self::Parser => f.write_str("Parser"),
            Self::Handler(function) => f.debug_tuple("Handler").field(&function.name()).finish(),
            Self::Binder(_) => f.write_str("Binder(..)"),
        }
    }
}

/// The attribute bag produced by parsing, plus the slots the runner reads:
/// the originating parser, the resolved function and an optional binder.
#[derive(Clone, Default)]
pub struct Namespace {
    values: Kwargs,
    parser: Option<ParserRef>,
    handler: Option<Function>,
    binder: Option<Binder>,
}

impl Namespace {
    /// An empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// The attribute `name`, if set.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Whether the attribute `name` is set, even to `null`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Sets an attribute, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Unsets an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }

    /// All parsed attributes, in the order they were set.
    pub fn values(&self) -> &Kwargs {
        &self.values
    }

    /// The deepest parser that contributed to the namespace.
    pub fn parser(&self) -> Option<&ParserRef> {
        self.parser.as_ref()
    }

    /// Replaces the parser slot.
    pub fn set_parser(&mut self, parser: ParserRef) {
        self.parser = Some(parser);
    }

    /// The function to dispatch to.
    pub fn handler(&self) -> Option<&Function> {
        self.handler.as_ref()
    }

    /// Replaces the handler slot.
    pub fn set_handler(&mut self, handler: Function) {
        self.handler = Some(handler);
    }

    /// The binder of the deepest matched command that declared one.
    pub fn binder(&self) -> Option<&Binder> {
        self.binder.as_ref()
    }

    /// Replaces the binder slot.
    pub fn set_binder(&mut self, binder: Binder) {
        self.binder = Some(binder);
    }

    /// Applies one parser default. `Parser` needs the collaborator's handle,
    /// which is passed in by the caller.
    pub fn apply_default(&mut self, default: &NamespaceDefault, own_parser: impl FnOnce() -> ParserRef) {
        match default {
            NamespaceDefault::Value(name, value) => self.insert(name.clone(), value.clone()),
            NamespaceDefault::Parser => self.set_parser(own_parser()),
            NamespaceDefault::Handler(function) => self.set_handler(function.clone()),
            NamespaceDefault::Binder(binder) => self.set_binder(binder.clone()),
        }
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("values", &self.values)
            .field("parser", &self.parser.as_ref().map(|p| p.prog()))
            .field("handler", &self.handler.as_ref().map(Function::name))
            .field("binder", &self.binder.is_some())
            .finish()
    }
}
