//! # Parser Collaborators
//!
//! The assembly engine never tokenizes a command line itself. It drives an
//! external parser through a small, argparse-shaped contract and reads back a
//! namespace of parsed values.
//!
//! ## Modules
//!
//! - **`parser`**: The collaborator contract (`ArgumentParser`), the stamped
//!   back-reference a namespace carries (`ParserHandle`), and the collaborator's
//!   own error domain (`ParserError`).
//! - **`clap_parser`**: A collaborator backed by `clap`. It records the
//!   configuration calls and materializes a `clap::Command` tree when asked to
//!   parse.

pub mod clap_parser;
pub mod parser;

#[cfg(test)]
pub(crate) mod recording;
