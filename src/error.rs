// src/error.rs

//! The error type returned to application authors.

use crate::system::parser::ParserError;
use thiserror::Error;

/// Errors surfaced to the application author.
///
/// Definition and configuration errors are programming mistakes and are never
/// recovered from inside the crate. A command path without a handler is not an
/// error at all; see [`crate::core::runner::Dispatch::Usage`].
#[derive(Error, Debug)]
pub enum Error {
    /// Something that is neither a function nor a class was wrapped.
    #[error("{0} is neither a class nor a function")]
    Definition(String),
    /// A group tag was declared both as a regular and a mutually exclusive group.
    #[error("A regular group cannot be mutually exclusive: {0}")]
    Configuration(String),
    /// Rejected by the parser collaborator; passed through untouched.
    #[error(transparent)]
    Parser(#[from] ParserError),
    /// Returned by a command body.
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
    /// An invalid settings value or settings file.
    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl Error {
    /// Maps the error to a process exit code, following sysexits conventions.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Parser(ParserError::Clap(e)) => e.exit_code(),
            Self::Parser(_) | Self::Definition(_) | Self::Configuration(_) => 70, // EX_SOFTWARE
            Self::Settings(_) => 78, // EX_CONFIG
            Self::Handler(_) => 1,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Settings(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::Definition("3".to_string());
        assert_eq!(err.to_string(), "3 is neither a class nor a function");
        let err = Error::Configuration("output".to_string());
        assert_eq!(err.to_string(), "A regular group cannot be mutually exclusive: output");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::Configuration("x".into()).exit_code(), 70);
        assert_eq!(Error::Parser(ParserError::NoSubparsers).exit_code(), 70);
        assert_eq!(Error::Settings("x".into()).exit_code(), 78);
        assert_eq!(Error::Handler(anyhow::anyhow!("boom")).exit_code(), 1);
    }

    #[test]
    fn test_toml_errors_become_settings_errors() {
        let parse: Result<toml::Value, _> = toml::from_str("= broken");
        let err = Error::from(parse.unwrap_err());
        assert!(matches!(err, Error::Settings(_)));
    }
}
