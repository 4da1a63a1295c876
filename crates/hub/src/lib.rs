//! # hub
//!
//! Component dispatch, routing, views and mail for a hub site, wired
//! together from one configuration file.
//!
//! | Crate | Provides |
//! |-------|----------|
//! | [`dispatch`] | component registry, the four entry-point strategies, routers |
//! | [`render`] | views, template search paths, helpers, the page [`Document`] |
//! | [`mail`] | legacy-compatible messages and transports |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hub::{FnBootstrap, Hub, HubConfig, Request};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = HubConfig::load(None)?;
//! let mut hub = Hub::builder(config)
//!     .components(|catalog| {
//!         catalog.register_bootstrap("com_blog", "site", || {
//!             Box::new(FnBootstrap::new(|ctx| {
//!                 ctx.echo("<h1>Blog</h1>");
//!                 Ok(())
//!             })) as Box<dyn hub::Bootstrap>
//!         });
//!     })
//!     .build();
//!
//! let page = hub.render("blog", &Request::new().with("task", "list"))?;
//! println!("{}", page.output);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See [`config`] for the file format. [`HubConfig::load`] reads an explicit
//! path, then `./hub.yaml`, `./hub.yml`, `./hub.json`, and falls back to the
//! defaults.
//!
//! ## Logging
//!
//! All crates log through `tracing`. Call [`logging::init`] from a binary to
//! print events to stderr; `HUB_LOG` sets the filter.

pub mod app;
pub mod config;
pub mod logging;

pub use hub_dispatch as dispatch;
pub use hub_mail as mail;
pub use hub_render as render;

pub use app::{Hub, HubBuilder, Page};
pub use config::{ConfigError, HubConfig};

pub use hub_dispatch::{
    Bootstrap, ComponentCatalog, DefaultSiteController, DispatchContext, DispatchError,
    FnBootstrap, Query, Request, Router,
};
pub use hub_mail::{MailConfig, MailError, Mailer, Message, TransportSpec};
pub use hub_render::{Document, Helper, HelperBase, HelperCatalog, View, ViewConfig};
