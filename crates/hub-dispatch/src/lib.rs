//! Component registry, routing and dispatch.
//!
//! `hub-dispatch` resolves a request's component to the code that renders it
//! and runs that code. It's designed to work with any extension store and
//! cache backend; small in-memory implementations ship for tests and
//! single-process sites.
//!
//! # Features
//!
//! - **Canonical ids**: `com_<name>` normalization that cannot escape the
//!   component roots
//! - **Registry**: memoized, cache-backed component records that degrade to
//!   defaults when the database is unreachable
//! - **Dispatch**: four entry-point strategies (bootstrap, entry script,
//!   front-end bundle, controller) with scoped output capture
//! - **Routing**: positional default router, legacy routers, and per-component
//!   router selection
//!
//! # Usage
//!
//! ```rust,ignore
//! use hub_dispatch::{ComponentCatalog, ComponentLoader, FnBootstrap, Request};
//! use hub_render::Document;
//!
//! let mut catalog = ComponentCatalog::new();
//! catalog.register_bootstrap("com_blog", "site", || {
//!     Box::new(FnBootstrap::new(|ctx| {
//!         ctx.echo("<h1>Blog</h1>");
//!         Ok(())
//!     }))
//! });
//!
//! let mut loader = ComponentLoader::builder("/var/www/app", "/var/www/core")
//!     .catalog(Arc::new(catalog))
//!     .build();
//!
//! let mut document = Document::new();
//! let html = loader.render("blog", &Request::new(), &mut document)?;
//! ```
//!
//! # Registering Components
//!
//! Bootstraps, routers and controllers are registered in a
//! [`ComponentCatalog`] at startup under class-style names
//! (`Components\Blog\Site\Bootstrap`, `BlogRouter`, ...). See the catalog
//! module for the full naming table.

pub mod bootstrap;
pub mod bundle;
pub mod cache;
pub mod canonical;
pub mod catalog;
pub mod context;
pub mod controller;
pub mod entry;
mod error;
pub mod language;
pub mod loader;
pub mod params;
pub mod record;
pub mod request;
pub mod router;
pub mod scope;
pub mod store;

pub use bootstrap::{Bootstrap, BootstrapFactory, FnBootstrap};
pub use cache::{CacheStore, MemoryCache, NoCache};
pub use canonical::{canonical, canonical_parts, component_name, is_identifier};
pub use catalog::{ComponentCatalog, RouterFactory};
pub use context::DispatchContext;
pub use controller::{Controller, ControllerConfig, ControllerFactory, DefaultSiteController, TaskFn};
pub use entry::EntryConfig;
pub use error::DispatchError;
pub use language::{IniLanguage, Language};
pub use loader::{ComponentLoader, InstallPaths, LoaderBuilder, TemplateInfo, DEFAULT_CACHETIME};
pub use params::Params;
pub use record::ComponentRecord;
pub use request::{Query, Request};
pub use router::{DefaultRouter, LegacyRouter, Router};
pub use scope::{Scope, ScopeGuard};
pub use store::{ExtensionRow, ExtensionStore, MemoryStore, NoDatabase, StoreError};
