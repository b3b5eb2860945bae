// src/core/decorators.rs

//! Stackable configuration values.
//!
//! Each option kind has a [`Decorator`] constructor on [`Cli`]. Applying a
//! decorator wraps the target into a [`Command`] (reusing one that is already
//! wrapped) and records the value on its [`Options`].
//!
//! Decorators compose like a stack written above a definition: the one nearest
//! the definition is applied first. [`decorate`] takes the stack top-down, as
//! it reads in source, and applies it bottom-up.

use crate::{
    core::{
        command::Command,
        definition::Member,
        namespace::Namespace,
        options::{OptionKind, Options},
        runner::{Binder, Runner, RunnerFactory},
    },
    error::Error,
    models::{ArgumentDecl, GroupDecl, Invocation, Kwargs, Value},
    settings::Settings,
    system::parser::ParserRef,
};
use std::any::Any;

/// One application of an option kind.
#[derive(Debug, Clone)]
pub enum Decorator {
    /// Parser construction options.
    Parser(Invocation),
    /// One declared argument.
    Argument(ArgumentDecl),
    /// One regular group.
    Group(GroupDecl),
    /// One mutually exclusive group.
    MutuallyExclusive(GroupDecl),
    /// Subparsers container options.
    Subparsers(Invocation),
    /// One alternative subcommand name.
    Alias(String),
    /// The context binder.
    Bind(Binder),
    /// The runner factory.
    CommandRunner(RunnerFactory),
}

impl Decorator {
    /// The option kind this decorator records.
    pub fn kind(&self) -> OptionKind {
        match self {
            Self::Parser(_) => OptionKind::Parser,
            Self::Argument(_) => OptionKind::Argument,
            Self::Group(_) => OptionKind::Group,
            Self::MutuallyExclusive(_) => OptionKind::MutuallyExclusive,
            Self::Subparsers(_) => OptionKind::Subparsers,
            Self::Alias(_) => OptionKind::Alias,
            Self::Bind(_) => OptionKind::Bind,
            Self::CommandRunner(_) => OptionKind::CommandRunner,
        }
    }

    /// Records the value: singular kinds are replaced, list kinds appended.
    pub fn record(self, options: &mut Options) {
        log::trace!("Recording '{}' decorator", self.kind());
        match self {
            Self::Parser(invocation) => options.parser = Some(invocation),
            Self::Argument(decl) => options.argument.push(decl),
            Self::Group(decl) => options.group.push(decl),
            Self::MutuallyExclusive(decl) => options.mutually_exclusive.push(decl),
            Self::Subparsers(invocation) => options.subparsers = Some(invocation),
            Self::Alias(name) => options.alias.push(name),
            Self::Bind(binder) => options.bind = Some(binder),
            Self::CommandRunner(factory) => options.command_runner = Some(factory),
        }
    }

    /// Wraps `target` if needed and records this decorator on it.
    pub fn apply(self, target: impl Into<Member>) -> Result<Command, Error> {
        let mut command = Command::new(target)?;
        command.with(self);
        Ok(command)
    }
}

/// Applies a decorator stack listed top-down, innermost first.
pub fn decorate<I>(decorators: I, target: impl Into<Member>) -> Result<Command, Error>
where
    I: IntoIterator<Item = Decorator>,
    I::IntoIter: DoubleEndedIterator,
{
    let mut command = Command::new(target)?;
    for decorator in decorators.into_iter().rev() {
        command.with(decorator);
    }
    Ok(command)
}

/// Constructors for every decorator kind.
#[derive(Debug, Clone, Copy)]
pub struct Cli;

impl Cli {
    /// Parser construction options.
    pub fn parser<I, S>(args: I, kwargs: Kwargs) -> Decorator
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Decorator::Parser(Invocation::new(args, kwargs))
    }

    /// An argument attached directly to the parser.
    pub fn argument<I, S>(name_or_flags: I, kwargs: Kwargs) -> Decorator
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Decorator::Argument(ArgumentDecl {
            group: None,
            args: name_or_flags.into_iter().map(Into::into).collect(),
            kwargs,
        })
    }

    /// The keyed form of [`Cli::argument`]: `argument_in(tag).call(...)`
    /// attaches the argument to group `tag`.
    pub fn argument_in(group: impl Into<String>) -> GroupedArgument {
        GroupedArgument {
            group: group.into(),
        }
    }

    /// A regular argument group.
    pub fn group(name: impl Into<String>, title: Option<&str>, description: Option<&str>) -> Decorator {
        let mut kwargs = Kwargs::new();
        if let Some(title) = title {
            kwargs.insert("title".to_string(), Value::from(title));
        }
        if let Some(description) = description {
            kwargs.insert("description".to_string(), Value::from(description));
        }
        Decorator::Group(GroupDecl {
            name: name.into(),
            kwargs,
        })
    }

    /// A group whose arguments exclude each other.
    pub fn mutually_exclusive(name: impl Into<String>, required: bool) -> Decorator {
        let mut kwargs = Kwargs::new();
        kwargs.insert("required".to_string(), Value::from(required));
        Decorator::MutuallyExclusive(GroupDecl {
            name: name.into(),
            kwargs,
        })
    }

    /// Options for the subparsers container.
    pub fn subparsers<I, S>(args: I, kwargs: Kwargs) -> Decorator
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Decorator::Subparsers(Invocation::new(args, kwargs))
    }

    /// An extra name the command answers to.
    pub fn alias(name: impl Into<String>) -> Decorator {
        Decorator::Alias(name.into())
    }

    /// Builds the context object for context-taking functions.
    pub fn bind<F, T>(bind: F) -> Decorator
    where
        F: Fn(Option<&ParserRef>, &Namespace) -> anyhow::Result<T> + 'static,
        T: Any,
    {
        Decorator::Bind(Binder::new(bind))
    }

    /// Replaces the default runner.
    pub fn command_runner<F, R>(build: F) -> Decorator
    where
        F: Fn(Namespace, Kwargs, &Settings) -> R + 'static,
        R: Runner + 'static,
    {
        Decorator::CommandRunner(RunnerFactory::new(build))
    }
}

/// An `argument` decorator with its group already bound.
#[derive(Debug, Clone)]
pub struct GroupedArgument {
    group: String,
}

impl GroupedArgument {
    /// Completes the declaration with names and options.
    pub fn call<I, S>(self, name_or_flags: I, kwargs: Kwargs) -> Decorator
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Decorator::Argument(ArgumentDecl {
            group: Some(self.group),
            args: name_or_flags.into_iter().map(Into::into).collect(),
            kwargs,
        })
    }
}
