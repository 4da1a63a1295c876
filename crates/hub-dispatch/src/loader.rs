//! Component loading and dispatch.
//!
//! [`ComponentLoader`] is the registry of installed components and the
//! dispatcher that runs one of them for a request.
//!
//! # Registry
//!
//! Records are memoized per loader. On a miss the row is read through the
//! shared cache (`_system.<option>`) and then the extension store. A lost
//! database connection is not an error: the component gets a synthesized
//! record (enabled unless `strict`).
//!
//! # Entry Points
//!
//! [`render`](ComponentLoader::render) tries, in order, and runs the first
//! that matches:
//!
//! 1. a bootstrap registered as `Components\<Name>\<Client>\Bootstrap`
//! 2. an entry script `<component>/<client>/<name>.<ext>`
//! 3. a front-end bundle at `<component>/<client>/assets/react/<name>`
//! 4. the component's `<client>` directory, driven by a controller
//!
//! The component's option is the active [`Scope`] for the duration of the
//! dispatch; the previous scope is restored however dispatch ends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hub_render::{Document, HelperCatalog, ViewDefaults};

use crate::bootstrap::BootstrapFactory;
use crate::bundle;
use crate::cache::{component_key, CacheStore, NoCache};
use crate::canonical::{canonical, component_name, is_identifier, ucfirst};
use crate::catalog::ComponentCatalog;
use crate::context::DispatchContext;
use crate::controller::{ControllerConfig, DefaultSiteController};
use crate::entry::{self, EntryConfig};
use crate::error::DispatchError;
use crate::language::{IniLanguage, Language};
use crate::params::Params;
use crate::record::ComponentRecord;
use crate::request::Request;
use crate::router::{DefaultRouter, LegacyRouter, Router};
use crate::scope::Scope;
use crate::store::{ExtensionRow, ExtensionStore, NoDatabase, StoreError};

const NOT_FOUND: &str = "JLIB_APPLICATION_ERROR_COMPONENT_NOT_FOUND";
const NOT_FOUND_OR_ENABLED: &str = "JLIB_APPLICATION_ERROR_COMPONENT_NOT_FOUND_OR_ENABLED";

/// Default registry cache lifetime, in minutes.
pub const DEFAULT_CACHETIME: u64 = 15;

/// Roots of the site and core installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    pub app: PathBuf,
    pub core: PathBuf,
}

/// The active site template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInfo {
    pub name: String,
    pub path: PathBuf,
}

/// Entry point chosen for a dispatch.
enum Strategy {
    Bootstrap(BootstrapFactory),
    Entry(PathBuf),
    Bundle(PathBuf),
    Default,
}

impl Strategy {
    fn label(&self) -> &'static str {
        match self {
            Strategy::Bootstrap(_) => "bootstrap",
            Strategy::Entry(_) => "entry",
            Strategy::Bundle(_) => "bundle",
            Strategy::Default => "default",
        }
    }
}

/// Builder for [`ComponentLoader`].
pub struct LoaderBuilder {
    paths: InstallPaths,
    client: String,
    cachetime: u64,
    store: Arc<dyn ExtensionStore>,
    cache: Arc<dyn CacheStore>,
    language: Box<dyn Language>,
    catalog: Arc<ComponentCatalog>,
    helpers: Arc<HelperCatalog>,
    entry: EntryConfig,
    template: Option<TemplateInfo>,
    scope: Scope,
}

impl LoaderBuilder {
    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }

    /// Registry cache lifetime in minutes.
    pub fn cachetime(mut self, minutes: u64) -> Self {
        self.cachetime = minutes;
        self
    }

    pub fn store(mut self, store: Arc<dyn ExtensionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    pub fn language(mut self, language: Box<dyn Language>) -> Self {
        self.language = language;
        self
    }

    pub fn catalog(mut self, catalog: Arc<ComponentCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn helpers(mut self, helpers: Arc<HelperCatalog>) -> Self {
        self.helpers = helpers;
        self
    }

    pub fn entry(mut self, entry: EntryConfig) -> Self {
        self.entry = entry;
        self
    }

    pub fn template(mut self, template: TemplateInfo) -> Self {
        self.template = Some(template);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn build(self) -> ComponentLoader {
        ComponentLoader {
            paths: self.paths,
            client: self.client,
            cachetime: self.cachetime,
            store: self.store,
            cache: self.cache,
            language: self.language,
            catalog: self.catalog,
            helpers: self.helpers,
            entry: self.entry,
            template: self.template,
            scope: self.scope,
            components: HashMap::new(),
            routers: HashMap::new(),
        }
    }
}

/// Component registry and dispatcher.
///
/// ```rust,ignore
/// let mut loader = ComponentLoader::builder("/var/www/app", "/var/www/core")
///     .store(Arc::new(database))
///     .cache(Arc::new(MemoryCache::new()))
///     .build();
///
/// let html = loader.render("blog", &request, &mut document)?;
/// ```
pub struct ComponentLoader {
    paths: InstallPaths,
    client: String,
    cachetime: u64,
    store: Arc<dyn ExtensionStore>,
    cache: Arc<dyn CacheStore>,
    language: Box<dyn Language>,
    catalog: Arc<ComponentCatalog>,
    helpers: Arc<HelperCatalog>,
    entry: EntryConfig,
    template: Option<TemplateInfo>,
    scope: Scope,
    components: HashMap<String, Arc<ComponentRecord>>,
    routers: HashMap<String, Arc<dyn Router>>,
}

impl std::fmt::Debug for ComponentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentLoader")
            .field("paths", &self.paths)
            .field("client", &self.client)
            .field("cachetime", &self.cachetime)
            .field("entry", &self.entry)
            .field("template", &self.template)
            .field("components", &self.components.len())
            .field("routers", &self.routers.len())
            .finish_non_exhaustive()
    }
}

impl ComponentLoader {
    /// Starts a loader for the given site and core install roots. Without
    /// further configuration there is no database, no cache, the client is
    /// `site` and entry scripts run through `php`.
    pub fn builder(app: impl Into<PathBuf>, core: impl Into<PathBuf>) -> LoaderBuilder {
        LoaderBuilder {
            paths: InstallPaths {
                app: app.into(),
                core: core.into(),
            },
            client: "site".to_string(),
            cachetime: DEFAULT_CACHETIME,
            store: Arc::new(NoDatabase),
            cache: Arc::new(NoCache),
            language: Box::new(IniLanguage::default()),
            catalog: Arc::new(ComponentCatalog::new()),
            helpers: Arc::new(HelperCatalog::new()),
            entry: EntryConfig::default(),
            template: None,
            scope: Scope::new(),
        }
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn paths(&self) -> &InstallPaths {
        &self.paths
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn language(&self) -> &dyn Language {
        self.language.as_ref()
    }

    /// Registry record for `option`, memoized for the loader's lifetime.
    pub fn load(&mut self, option: &str, strict: bool) -> Result<Arc<ComponentRecord>, DispatchError> {
        let option = canonical(option);
        if let Some(record) = self.components.get(&option) {
            return Ok(record.clone());
        }

        let record = match self.fetch_row(&option)? {
            Some(row) => ComponentRecord::from_row(row),
            None => {
                tracing::debug!(option = %option, strict, "no registry row; using defaults");
                ComponentRecord::synthesized(option.clone(), strict)
            }
        };
        let record = Arc::new(record);
        self.components.insert(option, record.clone());
        Ok(record)
    }

    /// Reads the row through the cache. `None` when the component has no
    /// row or the database is unreachable.
    fn fetch_row(&self, option: &str) -> Result<Option<ExtensionRow>, DispatchError> {
        let key = component_key(option);
        if let Some(row) = self
            .cache
            .get(&key)
            .and_then(|value| serde_json::from_value::<ExtensionRow>(value).ok())
        {
            return Ok(Some(row));
        }

        match self.store.find_component(option) {
            Ok(row) => {
                let value = serde_json::to_value(&row).unwrap_or(serde_json::Value::Null);
                self.cache
                    .put(&key, value, Duration::from_secs(self.cachetime * 60));
                Ok(row)
            }
            Err(StoreError::ConnectionFailed(reason)) => {
                tracing::warn!(option, %reason, "extension store unavailable");
                Ok(None)
            }
            Err(source) => Err(DispatchError::Loading {
                option: option.to_string(),
                source,
            }),
        }
    }

    pub fn is_enabled(&mut self, option: &str, strict: bool) -> Result<bool, DispatchError> {
        Ok(self.load(option, strict)?.enabled())
    }

    pub fn params(&mut self, option: &str, strict: bool) -> Result<Params, DispatchError> {
        Ok(self.load(option, strict)?.params().clone())
    }

    /// Install directory of `option`: the first existing directory among
    /// `app/components/<name>`, `app/components/com_<name>`,
    /// `core/components/<name>` and `core/components/com_<name>`. Empty when
    /// none exists.
    pub fn path(&mut self, option: &str) -> Result<PathBuf, DispatchError> {
        let record = self.load(option, false)?;
        if record.option().is_empty() {
            return Ok(PathBuf::new());
        }
        let paths = &self.paths;
        let path = record.path_or_init(|| {
            let name = component_name(record.option());
            [
                paths.app.join("components").join(name),
                paths.app.join("components").join(record.option()),
                paths.core.join("components").join(name),
                paths.core.join("components").join(record.option()),
            ]
            .into_iter()
            .find(|candidate| candidate.is_dir())
            .unwrap_or_default()
        });
        Ok(path.to_path_buf())
    }

    /// Runs the component `option` for `request` and returns its output.
    pub fn render(
        &mut self,
        option: &str,
        request: &Request,
        document: &mut Document,
    ) -> Result<String, DispatchError> {
        let client = self.client.clone();

        if let Some(template) = self.template.clone() {
            let extension = format!("tpl_{}", template.name);
            let bootstrap = self.paths.app.join("bootstrap").join(&client);
            self.language.load(&extension, &bootstrap);
            self.language.load(&extension, &template.path);
        }

        let option = canonical(option);
        if option.is_empty() {
            return Err(DispatchError::NotFound(self.language.translate(NOT_FOUND)));
        }

        let _scope = self.scope.enter(option.clone());

        let name = component_name(&option).to_string();
        let root = self.path(&option)?;
        let component_path = if root.as_os_str().is_empty() {
            PathBuf::new()
        } else {
            root.join(&client)
        };

        let mut strategy = None;
        if self.is_enabled(&option, false)? {
            strategy = self.select_strategy(&option, &client, &name, &component_path);
        }
        let Some(strategy) = strategy else {
            tracing::info!(option = %option, "component not found or not enabled");
            return Err(DispatchError::NotFound(
                self.language.translate(NOT_FOUND_OR_ENABLED),
            ));
        };

        let mut bootstrap = match &strategy {
            Strategy::Bootstrap(factory) => {
                let instance = factory();
                let dir = instance
                    .source_dir()
                    .unwrap_or_else(|| component_path.clone());
                self.language.load(&option, &dir);
                Some(instance)
            }
            _ => {
                self.language.load(&option, &component_path);
                None
            }
        };

        let app = self.paths.app.clone();
        self.language.load(&option, &app);

        tracing::info!(option = %option, strategy = strategy.label(), "dispatching component");

        let view_defaults = ViewDefaults {
            theme_path: self.template.as_ref().map(|t| t.path.clone()),
            component_path: Some(component_path.clone()),
            option: option.clone(),
            helpers: self.helpers.clone(),
        };
        let mut ctx = DispatchContext::new(
            &option,
            &client,
            &component_path,
            request,
            document,
            view_defaults,
        );

        match strategy {
            Strategy::Bootstrap(_) => {
                if let Some(instance) = bootstrap.as_mut() {
                    instance.start(&mut ctx)?;
                }
            }
            Strategy::Entry(script) => {
                let out = entry::execute(&self.entry, &script, &option, &component_path, request)?;
                ctx.echo(out);
            }
            Strategy::Bundle(dir) => {
                let out = bundle::execute(&dir, ctx.document)?;
                ctx.echo(out);
            }
            Strategy::Default => self.execute_default(&mut ctx)?,
        }

        Ok(ctx.into_output())
    }

    fn select_strategy(
        &self,
        option: &str,
        client: &str,
        name: &str,
        component_path: &Path,
    ) -> Option<Strategy> {
        if let Some(factory) = self.catalog.bootstrap(option, client) {
            return Some(Strategy::Bootstrap(factory));
        }
        if component_path.as_os_str().is_empty() {
            return None;
        }
        let script = self.entry.file_in(component_path, name);
        if script.is_file() {
            return Some(Strategy::Entry(script));
        }
        let bundle = bundle::bundle_dir(component_path, name);
        if bundle.is_dir() {
            return Some(Strategy::Bundle(bundle));
        }
        if component_path.is_dir() {
            return Some(Strategy::Default);
        }
        None
    }

    /// Runs a component that has only a client directory.
    fn execute_default(&self, ctx: &mut DispatchContext<'_>) -> Result<(), DispatchError> {
        let component = component_name(ctx.option).to_string();
        if !is_identifier(&component) {
            return Err(DispatchError::InvalidArgument(format!(
                "Invalid component name [{}] requested",
                component
            )));
        }

        let controller = ctx.request.get_cmd("controller", &component);
        if !is_identifier(&controller) {
            return Err(DispatchError::InvalidArgument(format!(
                "Invalid controller name [{}] requested",
                controller
            )));
        }

        let config = ControllerConfig {
            component: component.clone(),
            name: controller.clone(),
            base_path: ctx.component_path.to_path_buf(),
        };
        let mut instance = match self.catalog.controller(ctx.option, ctx.client, &controller) {
            Some(factory) => factory(config),
            None => {
                tracing::debug!(component = %component, controller = %controller, "using default site controller");
                Box::new(DefaultSiteController::new(config))
            }
        };
        instance.execute(ctx)
    }

    /// Router for `option` and `client` (the loader's client when `None`),
    /// memoized per option and client.
    ///
    /// Preference order: the versioned router (when `version` is given), the
    /// client router, the legacy-named router, and finally a
    /// [`LegacyRouter`] when the component still has an entry script or a
    /// same-named controller file, or a [`DefaultRouter`] otherwise.
    pub fn router(
        &mut self,
        option: &str,
        client: Option<&str>,
        version: Option<&str>,
    ) -> Result<Arc<dyn Router>, DispatchError> {
        let option = canonical(option);
        let client = client.unwrap_or(self.client.as_str()).to_string();
        let key = format!("{}{}", option, client);
        if let Some(router) = self.routers.get(&key) {
            return Ok(router.clone());
        }

        let mut keys = Vec::new();
        if let Some(version) = version {
            keys.push(ComponentCatalog::versioned_router_key(&option, &client, version));
        }
        keys.push(ComponentCatalog::router_key(&option, &client));
        keys.push(ComponentCatalog::legacy_router_key(&option));

        let registered = keys
            .iter()
            .find_map(|key| self.catalog.router(key).map(|factory| (key.clone(), factory)));

        let router: Arc<dyn Router> = match registered {
            Some((found, factory)) => {
                tracing::debug!(option = %option, router = %found, "using registered router");
                factory()
            }
            None => {
                let name = component_name(&option).to_string();
                let class = ucfirst(&name);
                let path = self.path(&option)?;
                let legacy = !path.as_os_str().is_empty()
                    && (self.entry.file_in(&path, &name).is_file()
                        || self.entry.file_in(&path.join("controllers"), &name).is_file());
                if legacy {
                    let (build, parse) = self.catalog.route_functions(&option);
                    Arc::new(LegacyRouter::new(class).with_functions(build, parse))
                } else {
                    Arc::new(DefaultRouter::new(class))
                }
            }
        };

        self.routers.insert(key, router.clone());
        Ok(router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::store::MemoryStore;
    use std::fs;

    fn loader_with(store: Arc<MemoryStore>, app: &Path) -> ComponentLoader {
        ComponentLoader::builder(app, app.join("core")).store(store).build()
    }

    #[test]
    fn test_load_is_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_rows([
            ExtensionRow::new(12, "com_blog", true).with_params(r#"{"limit": 5}"#),
        ]));
        let mut loader = loader_with(store.clone(), dir.path());

        let first = loader.load("blog", false).unwrap();
        let second = loader.load("com_blog", true).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.id(), 12);
        assert_eq!(loader.params("blog", false).unwrap().get_i64("limit"), Some(5));
        assert_eq!(store.query_count(), 1);
    }

    #[test]
    fn test_connection_failure_synthesizes_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.fail_with(Some(StoreError::ConnectionFailed("down".into())));

        let mut lenient = loader_with(store.clone(), dir.path());
        let record = lenient.load("blog", false).unwrap();
        assert!(record.enabled());
        assert_eq!(record.id(), 0);

        let mut strict = loader_with(store, dir.path());
        assert!(!strict.is_enabled("blog", true).unwrap());
    }

    #[test]
    fn test_missing_row_synthesizes_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = loader_with(Arc::new(MemoryStore::new()), dir.path());
        assert!(loader.is_enabled("wiki", false).unwrap());
    }

    #[test]
    fn test_query_error_is_loading_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.fail_with(Some(StoreError::Query("bad column".into())));
        let mut loader = loader_with(store, dir.path());

        let err = loader.load("blog", false).unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(matches!(err, DispatchError::Loading { ref option, .. } if option == "com_blog"));
    }

    #[test]
    fn test_rows_are_cached_across_loaders() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::with_rows([ExtensionRow::new(3, "com_blog", false)]));
        let cache = Arc::new(MemoryCache::new());

        for _ in 0..2 {
            let mut loader = ComponentLoader::builder(dir.path(), dir.path())
                .store(store.clone())
                .cache(cache.clone())
                .build();
            assert!(!loader.is_enabled("blog", false).unwrap());
        }
        assert_eq!(store.query_count(), 1);
        assert!(cache.get("_system.com_blog").is_some());
    }

    #[test]
    fn test_path_candidates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        let core = dir.path().join("core");
        fs::create_dir_all(core.join("components/com_blog")).unwrap();
        fs::create_dir_all(core.join("components/blog")).unwrap();
        fs::create_dir_all(app.join("components/com_wiki")).unwrap();

        let mut loader = ComponentLoader::builder(&app, &core).build();
        assert_eq!(loader.path("blog").unwrap(), core.join("components/blog"));
        assert_eq!(loader.path("wiki").unwrap(), app.join("components/com_wiki"));
        assert_eq!(loader.path("missing").unwrap(), PathBuf::new());
        assert_eq!(loader.path("").unwrap(), PathBuf::new());
    }

    #[test]
    fn test_path_is_memoized() {
        let dir = tempfile::tempdir().unwrap();
        let blog = dir.path().join("components/blog");
        fs::create_dir_all(&blog).unwrap();

        let mut loader = ComponentLoader::builder(dir.path(), dir.path()).build();
        assert_eq!(loader.path("blog").unwrap(), blog);
        fs::remove_dir_all(&blog).unwrap();
        assert_eq!(loader.path("blog").unwrap(), blog);
    }

    #[test]
    fn test_empty_option_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = ComponentLoader::builder(dir.path(), dir.path()).build();
        let err = loader
            .render("../..", &Request::new(), &mut Document::new())
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "Component not found.");
    }

    #[test]
    fn test_router_defaults_and_memoization() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("components/blog")).unwrap();
        let mut loader = ComponentLoader::builder(dir.path(), dir.path()).build();

        let a = loader.router("blog", None, None).unwrap();
        let b = loader.router("com_blog", Some("site"), None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let admin = loader.router("blog", Some("admin"), None).unwrap();
        assert!(!Arc::ptr_eq(&a, &admin));
    }
}
