//! Convenient imports for component code.
//!
//! ```rust,ignore
//! use hub_render::prelude::*;
//!
//! let mut view = View::new(ViewConfig::new("entries"), &defaults);
//! view.set("rows", json!(rows));
//! ```

pub use crate::document::{Document, Script};
pub use crate::error::RenderError;
pub use crate::helper::{FnHelper, Helper, HelperBase, HelperCatalog, ViewRef};
pub use crate::view::{PathKind, View, ViewConfig, ViewDefaults};
