//! Application wiring.
//!
//! [`Hub`] owns the component loader and the mailer built from one
//! [`HubConfig`]. Extension points (component catalog, helper catalog,
//! extension store, cache, mail transporters) are supplied through
//! [`HubBuilder`] at startup.

use std::sync::Arc;

use hub_dispatch::{
    CacheStore, ComponentCatalog, ComponentLoader, DispatchError, EntryConfig, ExtensionStore,
    IniLanguage, Query, Request,
};
use hub_mail::{MailError, Mailer, Message, Transport, TransportSpec};
use hub_render::{Document, HelperCatalog};
use serde::Serialize;

use crate::config::HubConfig;

/// A rendered component and the head state it contributed.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub option: String,
    pub output: String,
    pub document: Document,
}

pub struct HubBuilder {
    config: HubConfig,
    catalog: ComponentCatalog,
    helpers: HelperCatalog,
    store: Option<Arc<dyn ExtensionStore>>,
    cache: Option<Arc<dyn CacheStore>>,
    mailer: Mailer,
}

impl HubBuilder {
    /// Component bootstraps, routers and controllers.
    pub fn components(mut self, register: impl FnOnce(&mut ComponentCatalog)) -> Self {
        register(&mut self.catalog);
        self
    }

    /// View helpers.
    pub fn helpers(mut self, register: impl FnOnce(&mut HelperCatalog)) -> Self {
        register(&mut self.helpers);
        self
    }

    pub fn store(mut self, store: Arc<dyn ExtensionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Registers a named mail transporter.
    pub fn transporter(mut self, name: impl Into<String>, transport: impl Transport + 'static) -> Self {
        self.mailer.add_transporter(name, transport);
        self
    }

    pub fn build(self) -> Hub {
        let config = self.config;
        let mut loader = ComponentLoader::builder(&config.paths.app, &config.paths.core)
            .client(config.client.clone())
            .cachetime(config.cachetime)
            .language(Box::new(IniLanguage::new(config.language.clone())))
            .catalog(Arc::new(self.catalog))
            .helpers(Arc::new(self.helpers))
            .entry(EntryConfig::from(&config.entry));
        if let Some(template) = config.template_info() {
            loader = loader.template(template);
        }
        if let Some(store) = self.store {
            loader = loader.store(store);
        }
        if let Some(cache) = self.cache {
            loader = loader.cache(cache);
        }

        tracing::info!(
            app = %config.paths.app.display(),
            core = %config.paths.core.display(),
            client = %config.client,
            "hub ready"
        );
        Hub {
            loader: loader.build(),
            mailer: self.mailer,
            config,
        }
    }
}

pub struct Hub {
    config: HubConfig,
    loader: ComponentLoader,
    mailer: Mailer,
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("loader", &self.loader)
            .field("mailer", &self.mailer)
            .finish_non_exhaustive()
    }
}

impl Hub {
    pub fn builder(config: HubConfig) -> HubBuilder {
        let mailer = Mailer::new(config.mail.clone());
        HubBuilder {
            config,
            catalog: ComponentCatalog::new(),
            helpers: HelperCatalog::new(),
            store: None,
            cache: None,
            mailer,
        }
    }

    pub fn new(config: HubConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn loader(&mut self) -> &mut ComponentLoader {
        &mut self.loader
    }

    pub fn mailer(&self) -> &Mailer {
        &self.mailer
    }

    /// Dispatches `option` into a fresh document.
    pub fn render(&mut self, option: &str, request: &Request) -> Result<Page, DispatchError> {
        let mut document = Document::new();
        let output = self.loader.render(option, request, &mut document)?;
        Ok(Page {
            option: hub_dispatch::canonical(option),
            output,
            document,
        })
    }

    /// Turns `query` into URL segments with the component's router. Keys the
    /// router does not consume are left in `query`.
    pub fn build_route(&mut self, option: &str, query: &mut Query) -> Result<Vec<String>, DispatchError> {
        let router = self.loader.router(option, None, None)?;
        Ok(router.build(query))
    }

    pub fn parse_route(&mut self, option: &str, segments: &[String]) -> Result<Query, DispatchError> {
        let router = self.loader.router(option, None, None)?;
        Ok(router.parse(segments))
    }

    /// A message with the site sender preset.
    pub fn message(&self) -> Message {
        self.mailer.message()
    }

    pub fn send_mail<'a>(
        &self,
        message: &mut Message,
        transport: impl Into<TransportSpec<'a>>,
    ) -> Result<bool, MailError> {
        self.mailer.send(message, transport)
    }
}
