//! Bootstrapped components.

use std::path::PathBuf;
use std::sync::Arc;

use crate::context::DispatchContext;
use crate::error::DispatchError;

/// Entry point of a component that registers a bootstrap for a client.
///
/// ```rust,ignore
/// struct BlogSite;
///
/// impl Bootstrap for BlogSite {
///     fn start(&mut self, ctx: &mut DispatchContext<'_>) -> Result<(), DispatchError> {
///         let view = ctx.view("entries", "entries", "");
///         ctx.echo(view.display()?);
///         Ok(())
///     }
/// }
///
/// catalog.register_bootstrap("com_blog", "site", || Box::new(BlogSite));
/// ```
pub trait Bootstrap {
    fn start(&mut self, ctx: &mut DispatchContext<'_>) -> Result<(), DispatchError>;

    /// Directory the component's language files live in. Defaults to the
    /// component's client directory.
    fn source_dir(&self) -> Option<PathBuf> {
        None
    }
}

pub type BootstrapFactory = Arc<dyn Fn() -> Box<dyn Bootstrap> + Send + Sync>;

/// A bootstrap backed by a closure.
pub struct FnBootstrap<F> {
    f: F,
    source_dir: Option<PathBuf>,
}

impl<F> FnBootstrap<F>
where
    F: FnMut(&mut DispatchContext<'_>) -> Result<(), DispatchError>,
{
    pub fn new(f: F) -> Self {
        Self { f, source_dir: None }
    }

    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }
}

impl<F> Bootstrap for FnBootstrap<F>
where
    F: FnMut(&mut DispatchContext<'_>) -> Result<(), DispatchError>,
{
    fn start(&mut self, ctx: &mut DispatchContext<'_>) -> Result<(), DispatchError> {
        (self.f)(ctx)
    }

    fn source_dir(&self) -> Option<PathBuf> {
        self.source_dir.clone()
    }
}
