//! Startup registry of component code.
//!
//! Components declare their bootstraps, routers and controllers here under
//! the class-style names the component tree uses, so the loader can find them
//! by naming convention without any runtime reflection.
//!
//! | Entry | Key for (`com_blog`, `site`) |
//! |-------|------------------------------|
//! | bootstrap | `Components\Blog\Site\Bootstrap` |
//! | router | `Components\Blog\Site\Router` |
//! | versioned router | `Components\Blog\Site\RouterV2` |
//! | legacy router | `BlogRouter` |
//! | legacy route functions | `BlogBuildRoute`, `BlogParseRoute` |
//! | controller | `Components\Blog\Site\Controllers\Entries` |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::bootstrap::{Bootstrap, BootstrapFactory};
use crate::canonical::{component_name, ucfirst};
use crate::controller::{Controller, ControllerConfig, ControllerFactory};
use crate::request::Query;
use crate::router::{BuildRouteFn, ParseRouteFn, Router};

/// Builds a router instance.
pub type RouterFactory = Arc<dyn Fn() -> Arc<dyn Router> + Send + Sync>;

#[derive(Clone, Default)]
pub struct ComponentCatalog {
    bootstraps: HashMap<String, BootstrapFactory>,
    routers: HashMap<String, RouterFactory>,
    controllers: HashMap<String, ControllerFactory>,
    build_routes: HashMap<String, BuildRouteFn>,
    parse_routes: HashMap<String, ParseRouteFn>,
}

impl fmt::Debug for ComponentCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn keys<V>(map: &HashMap<String, V>) -> Vec<&String> {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            keys
        }
        f.debug_struct("ComponentCatalog")
            .field("bootstraps", &keys(&self.bootstraps))
            .field("routers", &keys(&self.routers))
            .field("controllers", &keys(&self.controllers))
            .field("build_routes", &keys(&self.build_routes))
            .field("parse_routes", &keys(&self.parse_routes))
            .finish()
    }
}

fn namespace(option: &str, client: &str) -> String {
    format!(
        "Components\\{}\\{}",
        ucfirst(component_name(option)),
        ucfirst(client)
    )
}

impl ComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bootstrap_key(option: &str, client: &str) -> String {
        format!("{}\\Bootstrap", namespace(option, client))
    }

    pub fn router_key(option: &str, client: &str) -> String {
        format!("{}\\Router", namespace(option, client))
    }

    pub fn versioned_router_key(option: &str, client: &str, version: &str) -> String {
        format!("{}\\RouterV{}", namespace(option, client), version)
    }

    pub fn legacy_router_key(option: &str) -> String {
        format!("{}Router", ucfirst(component_name(option)))
    }

    pub fn controller_key(option: &str, client: &str, controller: &str) -> String {
        format!(
            "{}\\Controllers\\{}",
            namespace(option, client),
            ucfirst(controller)
        )
    }

    pub fn register_bootstrap<F>(&mut self, option: &str, client: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Bootstrap> + Send + Sync + 'static,
    {
        self.bootstraps
            .insert(Self::bootstrap_key(option, client), Arc::new(factory));
        self
    }

    /// Registers a router under an explicit class-style key. Use the `*_key`
    /// functions to build it.
    pub fn register_router<F>(&mut self, key: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn Router> + Send + Sync + 'static,
    {
        self.routers.insert(key.into(), Arc::new(factory));
        self
    }

    pub fn register_controller<F>(
        &mut self,
        option: &str,
        client: &str,
        controller: &str,
        factory: F,
    ) -> &mut Self
    where
        F: Fn(ControllerConfig) -> Box<dyn Controller> + Send + Sync + 'static,
    {
        self.controllers.insert(
            Self::controller_key(option, client, controller),
            Arc::new(factory),
        );
        self
    }

    /// Registers a legacy component's `<Name>BuildRoute` / `<Name>ParseRoute`.
    pub fn register_route_functions<B, P>(&mut self, option: &str, build: B, parse: P) -> &mut Self
    where
        B: Fn(&mut Query) -> Vec<String> + Send + Sync + 'static,
        P: Fn(&[String]) -> Query + Send + Sync + 'static,
    {
        let name = ucfirst(component_name(option));
        self.build_routes
            .insert(format!("{}BuildRoute", name), Arc::new(build));
        self.parse_routes
            .insert(format!("{}ParseRoute", name), Arc::new(parse));
        self
    }

    pub fn bootstrap(&self, option: &str, client: &str) -> Option<BootstrapFactory> {
        self.bootstraps
            .get(&Self::bootstrap_key(option, client))
            .cloned()
    }

    pub fn router(&self, key: &str) -> Option<RouterFactory> {
        self.routers.get(key).cloned()
    }

    pub fn controller(&self, option: &str, client: &str, controller: &str) -> Option<ControllerFactory> {
        self.controllers
            .get(&Self::controller_key(option, client, controller))
            .cloned()
    }

    pub fn route_functions(&self, option: &str) -> (Option<BuildRouteFn>, Option<ParseRouteFn>) {
        let name = ucfirst(component_name(option));
        (
            self.build_routes.get(&format!("{}BuildRoute", name)).cloned(),
            self.parse_routes.get(&format!("{}ParseRoute", name)).cloned(),
        )
    }
}
