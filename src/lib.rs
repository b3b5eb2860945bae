// src/lib.rs

//! # argdeco
//!
//! Describe a command-line interface as data: functions whose parameters are
//! annotated with [`Arg`](core::arguments::Arg) descriptors, classes whose
//! members become subcommands, and stacked decorators for parser options,
//! groups and aliases. The tree is assembled into a parser on demand and a
//! parsed command line is dispatched to the matching function.
//!
//! ```no_run
//! use argdeco::prelude::*;
//!
//! let greet = Function::new("greet", |call| {
//!     let name: String = call.get("name")?;
//!     Ok(Value::from(format!("Hello, {}!", name)))
//! })
//! .doc("Say hello")
//! .arg("name", Arg::new(["name"]));
//!
//! let command = Command::new(greet)?;
//! let outcome = command.run(None)?;
//! # Ok::<(), argdeco::error::Error>(())
//! ```

pub mod constants;
pub mod core;
pub mod dev_utils;
pub mod error;
pub mod models;
pub mod settings;
pub mod system;

/// The authoring surface in one import.
pub mod prelude {
    pub use crate::core::arguments::{Arg, ArgFlavor};
    pub use crate::core::command::Command;
    pub use crate::core::decorators::{Cli, Decorator, decorate};
    pub use crate::core::definition::{Call, Class, Function, Member, Parameter};
    pub use crate::core::namespace::Namespace;
    pub use crate::core::runner::{Binder, CommandRunner, Dispatch, Runner, RunnerFactory};
    pub use crate::error::Error;
    pub use crate::kwargs;
    pub use crate::models::{Kwargs, Value};
    pub use crate::settings::{Precedence, Settings, UsageStream};
    pub use crate::system::clap_parser::ClapParser;
    pub use crate::system::parser::{ArgumentParser, ParserError};
}
