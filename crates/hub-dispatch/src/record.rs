//! Component registry records.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use crate::params::Params;
use crate::store::ExtensionRow;

/// What the registry knows about one component.
///
/// Records are created on first lookup and shared as `Arc<ComponentRecord>`
/// for the loader's lifetime. Params are parsed and the install path is
/// resolved at most once.
#[derive(Debug)]
pub struct ComponentRecord {
    option: String,
    id: i64,
    enabled: bool,
    params_blob: String,
    params: OnceCell<Params>,
    path: OnceCell<PathBuf>,
}

impl ComponentRecord {
    pub fn from_row(row: ExtensionRow) -> Self {
        Self {
            option: row.option,
            id: row.id,
            enabled: row.enabled,
            params_blob: row.params,
            params: OnceCell::new(),
            path: OnceCell::new(),
        }
    }

    /// Record for a component with no registry row: id 0, no params,
    /// enabled unless `strict`.
    pub fn synthesized(option: impl Into<String>, strict: bool) -> Self {
        Self::from_row(ExtensionRow::new(0, option, !strict))
    }

    pub fn option(&self) -> &str {
        &self.option
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn params(&self) -> &Params {
        self.params.get_or_init(|| Params::from_blob(&self.params_blob))
    }

    /// The install path, resolving it with `resolve` on first call.
    pub fn path_or_init(&self, resolve: impl FnOnce() -> PathBuf) -> &Path {
        self.path.get_or_init(resolve)
    }
}
