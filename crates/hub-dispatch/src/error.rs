//! Dispatch error types.

use thiserror::Error;

use hub_pipe::ShellError;
use hub_render::RenderError;

use crate::store::StoreError;

/// Error returned by registry lookups and component dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No component could be resolved or none of its entry points matched.
    #[error("{0}")]
    NotFound(String),

    /// A component or controller name failed validation.
    #[error("{0}")]
    InvalidArgument(String),

    /// The extension store reported an error other than a lost connection.
    #[error("error loading component {option}: {source}")]
    Loading {
        option: String,
        #[source]
        source: StoreError,
    },

    /// A controller method name was neither a task nor a known method.
    #[error("call to undefined method {controller}::{method}()")]
    UndefinedMethod { controller: String, method: String },

    /// A static bundle's `index.html` did not have exactly one head and body.
    #[error("malformed bundle document: {0}")]
    BundleStructure(String),

    /// A static bundle's `index.html` could not be parsed.
    #[error("failed to parse bundle document: {0}")]
    BundleParse(#[from] quick_xml::Error),

    /// A legacy entry script could not be run.
    #[error("entry script failed: {0}")]
    Entry(#[from] ShellError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    /// HTTP status class of the failure.
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::NotFound(_) | DispatchError::InvalidArgument(_) => 404,
            _ => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DispatchError::NotFound(_))
    }
}
