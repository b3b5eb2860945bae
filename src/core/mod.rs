// src/core/mod.rs

//! # Command Model and Assembly
//!
//! ## Modules
//!
//! - **`definition`**: Functions with explicit signatures and classes with
//!   ordered members; the raw material a command wraps.
//! - **`arguments`**: The `Arg` descriptor used as a parameter annotation.
//! - **`options`**: The per-command accumulator of decorator values.
//! - **`decorators`**: Stackable decorator values and their constructors.
//! - **`command`**: The command tree and the parser assembly engine.
//! - **`namespace`**: The parsed attribute bag handed to the runner.
//! - **`runner`**: Dispatch of a parsed namespace to the matched function.

pub mod arguments;
pub mod command;
pub mod decorators;
pub mod definition;
pub mod namespace;
pub mod options;
pub mod runner;
