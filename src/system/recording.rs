// src/system/recording.rs
//
// Test double for the parser contract: records every configuration call.

use crate::{
    core::namespace::{Namespace, NamespaceDefault},
    models::{Destination, GroupId, Kwargs},
    system::parser::{ArgumentParser, ParserError, ParserHandle},
};

#[derive(Debug, Clone)]
pub(crate) enum Recorded {
    AddArgument {
        destination: Destination,
        names: Vec<String>,
        kwargs: Kwargs,
    },
    AddGroup {
        id: GroupId,
        kwargs: Kwargs,
    },
    AddExclusiveGroup {
        id: GroupId,
        kwargs: Kwargs,
    },
    AddSubparsers {
        args: Vec<String>,
        kwargs: Kwargs,
    },
    SetDefaults(Vec<NamespaceDefault>),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingParser {
    pub(crate) args: Vec<String>,
    pub(crate) kwargs: Kwargs,
    pub(crate) calls: Vec<Recorded>,
    pub(crate) children: Vec<RecordingParser>,
    pub(crate) parsed: Option<Namespace>,
    next_group: usize,
}

impl RecordingParser {
    pub(crate) fn arguments(&self) -> Vec<(Destination, Vec<String>, Kwargs)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Recorded::AddArgument {
                    destination,
                    names,
                    kwargs,
                } => Some((*destination, names.clone(), kwargs.clone())),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn handler_name(&self) -> Option<String> {
        self.calls.iter().find_map(|call| match call {
            Recorded::SetDefaults(defaults) => defaults.iter().find_map(|d| match d {
                NamespaceDefault::Handler(f) => Some(f.name().to_string()),
                _ => None,
            }),
            _ => None,
        })
    }

    pub(crate) fn stamped_parser(&self) -> bool {
        self.calls.iter().any(|call| {
            matches!(call, Recorded::SetDefaults(defaults)
                if defaults.iter().any(|d| matches!(d, NamespaceDefault::Parser)))
        })
    }

    /// A structural summary, used to compare independently assembled trees.
    pub(crate) fn shape(&self) -> String {
        let children: Vec<String> = self.children.iter().map(Self::shape).collect();
        format!(
            "{:?}{:?}[{}]({})",
            self.args,
            self.kwargs,
            self.calls.len(),
            children.join(",")
        )
    }
}

impl ArgumentParser for RecordingParser {
    fn create(args: &[String], kwargs: Kwargs) -> Result<Self, ParserError> {
        Ok(Self {
            args: args.to_vec(),
            kwargs,
            ..Self::default()
        })
    }

    fn add_argument(
        &mut self,
        destination: Destination,
        name_or_flags: &[String],
        kwargs: Kwargs,
    ) -> Result<(), ParserError> {
        self.calls.push(Recorded::AddArgument {
            destination,
            names: name_or_flags.to_vec(),
            kwargs,
        });
        Ok(())
    }

    fn add_argument_group(&mut self, kwargs: Kwargs) -> Result<GroupId, ParserError> {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        self.calls.push(Recorded::AddGroup { id, kwargs });
        Ok(id)
    }

    fn add_mutually_exclusive_group(&mut self, kwargs: Kwargs) -> Result<GroupId, ParserError> {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        self.calls.push(Recorded::AddExclusiveGroup { id, kwargs });
        Ok(id)
    }

    fn add_subparsers(&mut self, args: &[String], kwargs: Kwargs) -> Result<(), ParserError> {
        self.calls.push(Recorded::AddSubparsers {
            args: args.to_vec(),
            kwargs,
        });
        Ok(())
    }

    fn add_parser(&mut self, args: &[String], kwargs: Kwargs) -> Result<&mut Self, ParserError> {
        self.children.push(Self::create(args, kwargs)?);
        self.children.last_mut().ok_or(ParserError::NoSubparsers)
    }

    fn set_defaults(&mut self, defaults: Vec<NamespaceDefault>) {
        self.calls.push(Recorded::SetDefaults(defaults));
    }

    fn parse_args(&self, _argv: Option<&[String]>) -> Result<Namespace, ParserError> {
        Ok(self.parsed.clone().unwrap_or_default())
    }
}

/// Parser handle with a fixed usage line.
#[derive(Debug)]
pub(crate) struct FakeHandle {
    prog: String,
}

impl FakeHandle {
    pub(crate) fn new(prog: &str) -> Self {
        Self {
            prog: prog.to_string(),
        }
    }
}

impl ParserHandle for FakeHandle {
    fn prog(&self) -> String {
        self.prog.clone()
    }

    fn format_usage(&self) -> String {
        format!("usage: {}\n", self.prog)
    }
}
