//! Error types for view rendering.
//!
//! [`RenderError`] is the single error type returned by view, helper and
//! template operations. It hides the underlying template engine's errors behind
//! a stable API.

use std::fmt;
use std::path::PathBuf;

/// Error type for view and template operations.
#[derive(Debug)]
pub enum RenderError {
    /// Template syntax error or compilation failure.
    TemplateError(String),

    /// No layout file was found in any of the template search paths.
    TemplateNotFound {
        /// The layout file stem that was requested (e.g. `display_item`).
        name: String,
        /// Directories that were searched, in search order.
        searched: Vec<PathBuf>,
    },

    /// Data serialization error.
    SerializationError(String),

    /// I/O error (e.g., reading a template from disk).
    IoError(std::io::Error),

    /// A method call on a view matched no registered or discoverable helper.
    UnknownHelper(String),

    /// A helper was found but failed while running.
    HelperError {
        /// Helper name.
        helper: String,
        /// Failure message.
        message: String,
    },

    /// Other operational error.
    OperationError(String),
}

impl RenderError {
    /// Shorthand used by helper implementations.
    pub fn helper(helper: impl Into<String>, message: impl fmt::Display) -> Self {
        RenderError::HelperError {
            helper: helper.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TemplateError(msg) => write!(f, "template error: {}", msg),
            RenderError::TemplateNotFound { name, searched } => {
                write!(f, "layout \"{}\" not found", name)?;
                if !searched.is_empty() {
                    let dirs: Vec<String> =
                        searched.iter().map(|p| p.display().to_string()).collect();
                    write!(f, " (searched: {})", dirs.join(", "))?;
                }
                Ok(())
            }
            RenderError::SerializationError(msg) => write!(f, "serialization error: {}", msg),
            RenderError::IoError(err) => write!(f, "I/O error: {}", err),
            RenderError::UnknownHelper(name) => {
                write!(f, "call to undefined view helper \"{}\"", name)
            }
            RenderError::HelperError { helper, message } => {
                write!(f, "helper \"{}\" failed: {}", helper, message)
            }
            RenderError::OperationError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::IoError(err)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::SerializationError(err.to_string())
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::TemplateNotFound => RenderError::TemplateNotFound {
                name: err.to_string(),
                searched: Vec::new(),
            },
            ErrorKind::SyntaxError
            | ErrorKind::BadEscape
            | ErrorKind::UndefinedError
            | ErrorKind::UnknownTest
            | ErrorKind::UnknownFunction
            | ErrorKind::UnknownFilter
            | ErrorKind::UnknownMethod => RenderError::TemplateError(err.to_string()),
            ErrorKind::BadSerialization => RenderError::SerializationError(err.to_string()),
            _ => RenderError::OperationError(err.to_string()),
        }
    }
}
