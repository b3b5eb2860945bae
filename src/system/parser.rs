// src/system/parser.rs

//! The contract between the assembly engine and a parser implementation.

use crate::{
    core::namespace::{Namespace, NamespaceDefault},
    models::{Destination, GroupId, Kwargs},
};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Errors raised by a parser collaborator.
///
/// These belong to the collaborator's domain; the assembly engine forwards them
/// without translation.
#[derive(Error, Debug)]
pub enum ParserError {
    /// Raised by clap while parsing, including help and version requests.
    #[error(transparent)]
    Clap(#[from] clap::Error),
    /// An `action` option the parser does not implement.
    #[error("Unknown action '{action}' for argument '{argument}'")]
    UnknownAction {
        /// The requested action.
        action: String,
        /// The argument it was requested for.
        argument: String,
    },
    /// A `type` option the parser cannot convert values to.
    #[error("Unknown type '{kind}' for argument '{argument}'")]
    UnknownType {
        /// The requested type name.
        kind: String,
        /// The argument it was requested for.
        argument: String,
    },
    /// A keyword or positional option the target does not accept.
    #[error("Unexpected option '{key}' for {target}")]
    UnexpectedOption {
        /// The offending option.
        key: String,
        /// What it was passed to, e.g. `parser 'prog'`.
        target: String,
    },
    /// A name or flag string that is neither a positional nor a valid flag.
    #[error("Invalid option string '{0}'")]
    InvalidName(String),
    /// A destination or flag already taken on the same parser.
    #[error("Argument '{0}' conflicts with an existing argument")]
    ConflictingArgument(String),
    /// A subcommand name or alias already taken by a sibling.
    #[error("Subcommand name '{0}' conflicts with an existing subcommand")]
    ConflictingSubcommand(String),
    /// A group handle this parser never handed out.
    #[error("Unknown argument group {0:?}")]
    UnknownGroup(GroupId),
    /// `add_parser` before `add_subparsers`.
    #[error("Cannot add a sub-parser before the subparsers container exists")]
    NoSubparsers,
    /// A second `add_subparsers` on the same parser.
    #[error("Cannot have multiple subparser arguments")]
    DuplicateSubparsers,
    /// An option value the parser cannot honor.
    #[error("Invalid value for '{argument}': {reason}")]
    InvalidValue {
        /// The argument being configured or parsed.
        argument: String,
        /// What is wrong with the value.
        reason: String,
    },
}

/// The back-reference a namespace keeps to the parser that produced it.
pub trait ParserHandle: fmt::Debug {
    /// The program (or subcommand) name of the parser.
    fn prog(&self) -> String;

    /// The usage line(s) of the parser, as they would be printed.
    fn format_usage(&self) -> String;
}

/// Shared, cheaply clonable parser handle.
pub type ParserRef = Rc<dyn ParserHandle>;

/// The contract the assembly engine expects from a parser.
///
/// Argument groups are handed out as [`GroupId`]s instead of borrowed group
/// objects; arguments name their [`Destination`] explicitly.
pub trait ArgumentParser {
    /// Constructs a top-level parser.
    fn create(args: &[String], kwargs: Kwargs) -> Result<Self, ParserError>
    where
        Self: Sized;

    /// Registers one argument on the parser or on one of its groups.
    fn add_argument(
        &mut self,
        destination: Destination,
        name_or_flags: &[String],
        kwargs: Kwargs,
    ) -> Result<(), ParserError>;

    /// Creates a regular (display) argument group.
    fn add_argument_group(&mut self, kwargs: Kwargs) -> Result<GroupId, ParserError>;

    /// Creates a group whose members exclude each other.
    fn add_mutually_exclusive_group(&mut self, kwargs: Kwargs) -> Result<GroupId, ParserError>;

    /// Creates the subparsers container. Only one per parser.
    fn add_subparsers(&mut self, args: &[String], kwargs: Kwargs) -> Result<(), ParserError>;

    /// Adds one sub-parser to the container and returns it for configuration.
    fn add_parser(&mut self, args: &[String], kwargs: Kwargs) -> Result<&mut Self, ParserError>
    where
        Self: Sized;

    /// Registers namespace defaults for this parser.
    fn set_defaults(&mut self, defaults: Vec<NamespaceDefault>);

    /// Parses `argv` (without the program name); `None` reads the process
    /// arguments.
    fn parse_args(&self, argv: Option<&[String]>) -> Result<Namespace, ParserError>;
}

/// A parser together with the destination arguments are attached to.
///
/// This is what an argument descriptor applies itself to: either the parser
/// itself or one of its groups.
pub struct Scope<'p, P: ?Sized> {
    parser: &'p mut P,
    destination: Destination,
}

impl<'p, P: ArgumentParser + ?Sized> Scope<'p, P> {
    /// Targets `destination` on `parser`.
    pub fn new(parser: &'p mut P, destination: Destination) -> Self {
        Self {
            parser,
            destination,
        }
    }

    /// Where arguments added through this scope end up.
    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Forwards to [`ArgumentParser::add_argument`] with this scope's destination.
    pub fn add_argument(
        &mut self,
        name_or_flags: &[String],
        kwargs: Kwargs,
    ) -> Result<(), ParserError> {
        self.parser
            .add_argument(self.destination, name_or_flags, kwargs)
    }
}

impl<P: ?Sized> fmt::Debug for Scope<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("destination", &self.destination)
            .finish_non_exhaustive()
    }
}
