//! Component routers.
//!
//! A router converts between a component's query (`controller`, `task`, `id`
//! and any other keys) and the path segments that follow the component in a
//! URL. [`ComponentLoader::router`](crate::ComponentLoader::router) picks one
//! router per component and client and memoizes it.

mod default;
mod legacy;

pub use default::DefaultRouter;
pub use legacy::{BuildRouteFn, LegacyRouter, ParseRouteFn};

use crate::request::Query;

/// Bidirectional mapping between a query and URL segments.
pub trait Router: Send + Sync {
    /// Consumes the routable keys of `query` and returns them as segments.
    /// Keys that are not consumed stay in `query`.
    fn build(&self, query: &mut Query) -> Vec<String>;

    /// Maps URL segments back to query variables.
    fn parse(&self, segments: &[String]) -> Query;
}
