// src/core/command.rs

//! The command node and the parser assembly engine.
//!
//! A [`Command`] wraps a definition, accumulates decorator [`Options`] and
//! owns its subcommands. [`Command::parser`] turns the tree into a fresh
//! parser through any [`ArgumentParser`] implementation; [`Command::call`]
//! parses a command line and dispatches it.
//!
//! ## Assembly stages
//!
//! 1. Parser creation from the `parser` option, aliases and doc string.
//! 2. Materialization of the declared `group`/`mutually_exclusive` groups.
//! 3. Argument attachment, planned first ([`Command::attachment_plan`]) and
//!    resolved against the parser second ([`Command::setup_arguments`]).
//! 4. Recursion into subcommands.

use crate::{
    constants::DUNDER_PREFIX,
    core::{
        arguments::Arg,
        decorators::{Cli, Decorator},
        definition::{Class, Function, Member, Parameter},
        namespace::{Namespace, NamespaceDefault},
        options::Options,
        runner::{Binder, CommandRunner, Dispatch, Runner, RunnerFactory},
    },
    dev_utils::BlockTimer,
    error::Error,
    models::{ArgumentDecl, Destination, GroupId, Invocation, Kwargs, Value},
    settings::Settings,
    system::{
        clap_parser::ClapParser,
        parser::{ArgumentParser, Scope},
    },
};
use indexmap::{IndexMap, map::Entry};

/// One attachment request produced by the planning pass.
#[derive(Debug, Clone, Copy)]
pub enum Attachment<'a> {
    /// An `argument` decorator value.
    Declared(&'a ArgumentDecl),
    /// An annotated parameter of the call operator.
    Parameter {
        /// The annotated parameter; its name becomes `dest`.
        parameter: &'a Parameter,
        /// Its annotation.
        arg: &'a Arg,
    },
    /// Registers the call operator (and binder) as parser defaults.
    DefaultAction,
}

impl<'a> Attachment<'a> {
    /// The group tag the request targets; `None` means the parser itself.
    pub fn group(&self) -> Option<&'a str> {
        match self {
            Self::Declared(decl) => decl.group.as_deref(),
            Self::Parameter { arg, .. } => arg.group(),
            Self::DefaultAction => None,
        }
    }
}

/// A wrapped definition plus its options and subcommands.
#[derive(Debug, Clone)]
pub struct Command {
    definition: Class,
    /// Decorator values recorded so far.
    pub options: Options,
    subcommands: IndexMap<String, Command>,
    parent: Option<String>,
}

impl Command {
    /// Wraps a definition. A member that already is a command is reused as is.
    pub fn new(definition: impl Into<Member>) -> Result<Self, Error> {
        Self::wrap(definition.into(), None)
    }

    /// Wraps a definition as the child of `parent`.
    pub fn with_parent(definition: impl Into<Member>, parent: &str) -> Result<Self, Error> {
        Self::wrap(definition.into(), Some(parent))
    }

    fn wrap(member: Member, parent: Option<&str>) -> Result<Self, Error> {
        let definition = match member {
            Member::Class(class) => class,
            Member::Function(function) => Class::from_function(function),
            Member::Command(command) => {
                let mut command = *command;
                if let Some(parent) = parent {
                    command.parent = Some(parent.to_string());
                }
                return Ok(command);
            }
            Member::Attribute(value) => return Err(Error::Definition(value.to_string())),
        };
        let subcommands = Self::discover(&definition)?;
        log::trace!(
            "Wrapped '{}' with {} subcommand(s)",
            definition.qualified_name(),
            subcommands.len()
        );
        Ok(Self {
            definition,
            options: Options::default(),
            subcommands,
            parent: parent.map(str::to_string),
        })
    }

    /// Wraps every non-dunder function, class or command member, in
    /// declaration order.
    fn discover(class: &Class) -> Result<IndexMap<String, Self>, Error> {
        let mut subcommands = IndexMap::new();
        for (name, member) in class.members() {
            if name.starts_with(DUNDER_PREFIX) || matches!(member, Member::Attribute(_)) {
                continue;
            }
            let command = Self::wrap(member.clone(), Some(class.name()))?;
            subcommands.insert(name.clone(), command);
        }
        Ok(subcommands)
    }

    // --- ACCESSORS ---

    /// Name of the wrapped definition.
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// The wrapped definition; a bare function is seen as a class with a call operator.
    pub fn definition(&self) -> &Class {
        &self.definition
    }

    /// Name of the enclosing command, if any.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Subcommands keyed by registration name, in insertion order.
    pub fn subcommands(&self) -> &IndexMap<String, Self> {
        &self.subcommands
    }

    /// The subcommand stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.subcommands.get(key)
    }

    /// Mutable access to the subcommand stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Self> {
        self.subcommands.get_mut(key)
    }

    /// Wraps `definition` and stores it under `key`, replacing any previous
    /// subcommand with that key in place.
    pub fn insert(&mut self, key: impl Into<String>, definition: impl Into<Member>) -> Result<&mut Self, Error> {
        let command = Self::with_parent(definition, self.definition.name())?;
        Ok(self.store(key.into(), command))
    }

    fn store(&mut self, key: String, command: Self) -> &mut Self {
        match self.subcommands.entry(key) {
            Entry::Occupied(mut entry) => {
                entry.insert(command);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(command),
        }
    }

    /// Removes a subcommand, keeping the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<Self> {
        self.subcommands.shift_remove(key)
    }

    /// Iterates subcommands as `(key, command)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Self)> {
        self.subcommands.iter()
    }

    /// Number of direct subcommands.
    pub fn len(&self) -> usize {
        self.subcommands.len()
    }

    /// Whether there are no direct subcommands.
    pub fn is_empty(&self) -> bool {
        self.subcommands.is_empty()
    }

    /// Registers `definition` as a subcommand under its own name.
    pub fn subcommand(&mut self, definition: impl Into<Member>) -> Result<&mut Self, Error> {
        let command = Self::with_parent(definition, self.definition.name())?;
        let key = command.name().to_string();
        log::debug!("Registering subcommand '{}' on '{}'", key, self.name());
        Ok(self.store(key, command))
    }

    // --- DECORATOR BUILDERS ---

    /// Records one decorator application.
    pub fn with(&mut self, decorator: Decorator) -> &mut Self {
        decorator.record(&mut self.options);
        self
    }

    /// Sets the options the parser is constructed with.
    pub fn configure_parser<I, S>(&mut self, args: I, kwargs: Kwargs) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Cli::parser(args, kwargs))
    }

    /// Declares an argument on the parser itself.
    pub fn argument<I, S>(&mut self, name_or_flags: I, kwargs: Kwargs) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Cli::argument(name_or_flags, kwargs))
    }

    /// Declares an argument inside the group tagged `group`.
    pub fn argument_in<I, S>(&mut self, group: &str, name_or_flags: I, kwargs: Kwargs) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Cli::argument_in(group).call(name_or_flags, kwargs))
    }

    /// Declares a regular argument group.
    pub fn group(&mut self, name: &str, title: Option<&str>, description: Option<&str>) -> &mut Self {
        self.with(Cli::group(name, title, description))
    }

    /// Declares a group whose members exclude each other.
    pub fn mutually_exclusive(&mut self, name: &str, required: bool) -> &mut Self {
        self.with(Cli::mutually_exclusive(name, required))
    }

    /// Sets the options of the subparsers container.
    pub fn subparsers<I, S>(&mut self, args: I, kwargs: Kwargs) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Cli::subparsers(args, kwargs))
    }

    /// Adds an alternative subcommand name.
    pub fn alias(&mut self, name: &str) -> &mut Self {
        self.with(Cli::alias(name))
    }

    /// Sets the context binder for this node and the commands below it.
    pub fn bind(&mut self, binder: Binder) -> &mut Self {
        self.with(Decorator::Bind(binder))
    }

    /// Replaces the runner used to dispatch the parsed namespace.
    pub fn command_runner(&mut self, factory: RunnerFactory) -> &mut Self {
        self.with(Decorator::CommandRunner(factory))
    }

    // --- ASSEMBLY ---

    /// The construction call for this node's parser. `name` is the name the
    /// parent registered the node under.
    pub fn parser_invocation(&self, name: Option<&str>) -> Invocation {
        let mut invocation = self.options.parser.clone().unwrap_or_default();
        if invocation.args.is_empty()
            && let Some(name) = name
        {
            invocation.args.push(name.to_string());
        }
        let kwargs = &mut invocation.kwargs;
        if !self.options.alias.is_empty() {
            kwargs.insert("aliases".to_string(), Value::from(self.options.alias.clone()));
        }
        if let Some(doc) = self.definition.documentation() {
            if !kwargs.contains_key("description") {
                kwargs.insert("description".to_string(), Value::from(doc));
            }
            if self.parent.is_some() && !kwargs.contains_key("help") {
                kwargs.insert("help".to_string(), Value::from(doc));
            }
        }
        invocation
    }

    /// Assembles a new, independent parser for the whole tree.
    pub fn parser<P: ArgumentParser>(&self) -> Result<P, Error> {
        let _timer = BlockTimer::new(format!("assemble '{}'", self.name()));
        log::debug!("Assembling parser for '{}'", self.name());
        let invocation = self.parser_invocation(None);
        let mut parser = P::create(&invocation.args, invocation.kwargs)?;
        self.assemble(&mut parser)?;
        Ok(parser)
    }

    fn assemble<P: ArgumentParser>(&self, parser: &mut P) -> Result<(), Error> {
        parser.set_defaults(vec![NamespaceDefault::Parser]);
        let mut groups = self.setup_deco_groups(parser)?;
        self.setup_arguments(parser, &mut groups)?;
        self.setup_subparsers(parser)
    }

    /// Creates the declared groups, regular ones first, keyed by tag.
    pub fn setup_deco_groups<P: ArgumentParser>(&self, parser: &mut P) -> Result<IndexMap<String, GroupId>, Error> {
        let mut groups = IndexMap::new();
        for decl in self.options.group.iter().rev() {
            let id = parser.add_argument_group(decl.kwargs.clone())?;
            groups.insert(decl.name.clone(), id);
        }
        for decl in self.options.mutually_exclusive.iter().rev() {
            if groups.contains_key(&decl.name) {
                return Err(Error::Configuration(decl.name.clone()));
            }
            let id = parser.add_mutually_exclusive_group(decl.kwargs.clone())?;
            groups.insert(decl.name.clone(), id);
        }
        Ok(groups)
    }

    /// Plans every attachment in final order: declared arguments in source
    /// order, annotated parameters in signature order, then the default
    /// action.
    pub fn attachment_plan(&self) -> Vec<Attachment<'_>> {
        let mut plan: Vec<Attachment<'_>> = self.options.argument.iter().rev().map(Attachment::Declared).collect();
        if let Some(function) = self.definition.call_operator() {
            plan.extend(function.signature().iter().filter_map(|parameter| {
                parameter
                    .annotation()
                    .map(|arg| Attachment::Parameter { parameter, arg })
            }));
        }
        plan.push(Attachment::DefaultAction);
        plan
    }

    /// Resolves each planned request against `parser`. Unknown group tags get
    /// an unnamed argument group on first use.
    pub fn setup_arguments<P: ArgumentParser>(
        &self,
        parser: &mut P,
        groups: &mut IndexMap<String, GroupId>,
    ) -> Result<(), Error> {
        for request in self.attachment_plan() {
            let destination = match request.group() {
                None => Destination::Parser,
                Some(tag) => match groups.get(tag) {
                    Some(id) => Destination::Group(*id),
                    None => {
                        log::trace!("Creating implicit group '{}'", tag);
                        let id = parser.add_argument_group(Kwargs::new())?;
                        groups.insert(tag.to_string(), id);
                        Destination::Group(id)
                    }
                },
            };
            match request {
                Attachment::Declared(decl) => {
                    log::trace!("Adding argument {:?} to {:?}", decl.args, destination);
                    parser.add_argument(destination, &decl.args, decl.kwargs.clone())?;
                }
                Attachment::Parameter { parameter, arg } => {
                    let mut scope = Scope::new(&mut *parser, destination);
                    arg.apply(&mut scope, parameter.name(), parameter.default_value())?;
                }
                Attachment::DefaultAction => {
                    let mut defaults = Vec::new();
                    if let Some(function) = self.definition.call_operator() {
                        defaults.push(NamespaceDefault::Handler(function.clone()));
                    }
                    if let Some(binder) = &self.options.bind {
                        defaults.push(NamespaceDefault::Binder(binder.clone()));
                    }
                    if !defaults.is_empty() {
                        parser.set_defaults(defaults);
                    }
                }
            }
        }
        Ok(())
    }

    /// Adds the subparsers container and one child parser per subcommand.
    pub fn setup_subparsers<P: ArgumentParser>(&self, parser: &mut P) -> Result<(), Error> {
        if self.options.subparsers.is_none() && self.subcommands.is_empty() {
            return Ok(());
        }
        let container = self.options.subparsers.clone().unwrap_or_default();
        parser.add_subparsers(&container.args, container.kwargs)?;
        for (name, command) in &self.subcommands {
            log::debug!("Assembling subcommand '{}' of '{}'", name, self.name());
            let invocation = command.parser_invocation(Some(name));
            let child = parser.add_parser(&invocation.args, invocation.kwargs)?;
            command.assemble(child)?;
        }
        Ok(())
    }

    // --- DISPATCH ---

    /// Parses `argv` with a parser of type `P` and runs the matched command.
    pub fn call<P: ArgumentParser>(&self, argv: Option<&[String]>, extras: Kwargs) -> Result<Dispatch, Error> {
        self.call_with::<P>(argv, extras, &Settings::default())
    }

    /// Like [`Command::call`], with explicit settings.
    pub fn call_with<P: ArgumentParser>(
        &self,
        argv: Option<&[String]>,
        extras: Kwargs,
        settings: &Settings,
    ) -> Result<Dispatch, Error> {
        self.call_hooked::<P, _>(argv, extras, settings, |_, _| {})
    }

    /// Like [`Command::call_with`], with `hook` seeing the parsed namespace
    /// and the extras right before dispatch.
    pub fn call_hooked<P, H>(
        &self,
        argv: Option<&[String]>,
        mut extras: Kwargs,
        settings: &Settings,
        hook: H,
    ) -> Result<Dispatch, Error>
    where
        P: ArgumentParser,
        H: FnOnce(&mut Namespace, &mut Kwargs),
    {
        let parser: P = self.parser()?;
        let mut namespace = parser.parse_args(argv)?;
        hook(&mut namespace, &mut extras);
        let runner: Box<dyn Runner> = match &self.options.command_runner {
            Some(factory) => factory.create(namespace, extras, settings),
            None => Box::new(CommandRunner::new(namespace, extras).with_settings(settings)),
        };
        runner.run()
    }

    /// Parses `argv` (the process arguments when `None`) with clap, using
    /// settings from the environment.
    pub fn run(&self, argv: Option<&[String]>) -> Result<Dispatch, Error> {
        let settings = Settings::from_env()?;
        self.call_with::<ClapParser>(argv, Kwargs::new(), &settings)
    }

    /// The call operator, if the definition has one.
    pub fn function(&self) -> Option<&Function> {
        self.definition.call_operator()
    }
}

// MARK: --- UNIT TESTS ---
