// src/core/options.rs

//! Option kinds and the per-command store of decorator values.

use crate::{
    core::runner::{Binder, RunnerFactory},
    models::{ArgumentDecl, GroupDecl, Invocation},
};
use std::fmt;

/// The categories of configuration a command accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    /// Parser construction options. Singular.
    Parser,
    /// Declared arguments.
    Argument,
    /// Regular argument groups.
    Group,
    /// Mutually exclusive groups.
    MutuallyExclusive,
    /// Subparsers container options. Singular.
    Subparsers,
    /// Alternative subcommand names.
    Alias,
    /// The context binder. Singular.
    Bind,
    /// The runner factory. Singular.
    CommandRunner,
}

impl OptionKind {
    /// Every kind, in canonical order.
    pub const ALL: [Self; 8] = [
        Self::Parser,
        Self::Argument,
        Self::Group,
        Self::MutuallyExclusive,
        Self::Subparsers,
        Self::Alias,
        Self::Bind,
        Self::CommandRunner,
    ];

    /// The decorator name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Parser => "parser",
            Self::Argument => "argument",
            Self::Group => "group",
            Self::MutuallyExclusive => "mutually_exclusive",
            Self::Subparsers => "subparsers",
            Self::Alias => "alias",
            Self::Bind => "bind",
            Self::CommandRunner => "command_runner",
        }
    }

    /// Multi kinds accumulate a list; singular kinds keep the last value.
    pub fn is_multi(self) -> bool {
        matches!(
            self,
            Self::Argument | Self::Group | Self::MutuallyExclusive | Self::Alias
        )
    }

    /// Looks a kind up by its decorator name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-command accumulator of decorator values.
///
/// List-valued kinds are stored in application order: the decorator closest to
/// the definition comes first, the topmost one last. Consumers that need source
/// order iterate them in reverse.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// How the parser is constructed.
    pub parser: Option<Invocation>,
    /// Declared arguments.
    pub argument: Vec<ArgumentDecl>,
    /// Regular groups.
    pub group: Vec<GroupDecl>,
    /// Mutually exclusive groups.
    pub mutually_exclusive: Vec<GroupDecl>,
    /// How the subparsers container is created.
    pub subparsers: Option<Invocation>,
    /// Alternative names under the parent command.
    pub alias: Vec<String>,
    /// Context binder.
    pub bind: Option<Binder>,
    /// Runner override.
    pub command_runner: Option<RunnerFactory>,
}

impl Options {
    /// Whether any decorator of `kind` has been applied.
    pub fn contains(&self, kind: OptionKind) -> bool {
        match kind {
            OptionKind::Parser => self.parser.is_some(),
            OptionKind::Argument => !self.argument.is_empty(),
            OptionKind::Group => !self.group.is_empty(),
            OptionKind::MutuallyExclusive => !self.mutually_exclusive.is_empty(),
            OptionKind::Subparsers => self.subparsers.is_some(),
            OptionKind::Alias => !self.alias.is_empty(),
            OptionKind::Bind => self.bind.is_some(),
            OptionKind::CommandRunner => self.command_runner.is_some(),
        }
    }

    /// The kinds currently set, in canonical order.
    pub fn kinds(&self) -> Vec<OptionKind> {
        OptionKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }

    /// Whether no decorator has been applied.
    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }

    /// Drops everything recorded for `kind`.
    pub fn clear(&mut self, kind: OptionKind) {
        match kind {
            OptionKind::Parser => self.parser = None,
            OptionKind::Argument => self.argument.clear(),
            OptionKind::Group => self.group.clear(),
            OptionKind::MutuallyExclusive => self.mutually_exclusive.clear(),
            OptionKind::Subparsers => self.subparsers = None,
            OptionKind::Alias => self.alias.clear(),
            OptionKind::Bind => self.bind = None,
            OptionKind::CommandRunner => self.command_runner = None,
        }
    }
}
