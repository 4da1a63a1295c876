use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hub_dispatch::router::Router;
use hub_dispatch::{
    Bootstrap, ComponentCatalog, ComponentLoader, Controller, DefaultSiteController,
    DispatchError, EntryConfig, ExtensionRow, FnBootstrap, IniLanguage, Language, LegacyRouter,
    MemoryStore, Query, Request, Scope, TemplateInfo,
};
use hub_render::Document;

struct Site {
    _dir: tempfile::TempDir,
    app: PathBuf,
    core: PathBuf,
}

impl Site {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        let core = dir.path().join("core");
        fs::create_dir_all(app.join("components")).unwrap();
        fs::create_dir_all(core.join("components")).unwrap();
        Self { _dir: dir, app, core }
    }

    /// Creates `core/components/<name>/site` and returns it.
    fn component(&self, name: &str) -> PathBuf {
        let path = self.core.join("components").join(name).join("site");
        fs::create_dir_all(&path).unwrap();
        path
    }

    fn loader(&self, catalog: ComponentCatalog) -> ComponentLoader {
        ComponentLoader::builder(&self.app, &self.core)
            .catalog(Arc::new(catalog))
            .entry(EntryConfig {
                extension: "sh".into(),
                interpreter: PathBuf::from("sh"),
                timeout: Some(std::time::Duration::from_secs(10)),
            })
            .build()
    }
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn bootstrap_catalog(output: &'static str) -> ComponentCatalog {
    let mut catalog = ComponentCatalog::new();
    catalog.register_bootstrap("com_blog", "site", move || {
        Box::new(FnBootstrap::new(move |ctx| {
            ctx.echo(output);
            Ok(())
        })) as Box<dyn Bootstrap>
    });
    catalog
}

#[test]
fn bootstrap_wins_over_entry_script() {
    let site = Site::new();
    let path = site.component("blog");
    write(&path.join("blog.sh"), "printf entry");

    let mut loader = site.loader(bootstrap_catalog("bootstrapped"));
    let out = loader
        .render("blog", &Request::new(), &mut Document::new())
        .unwrap();
    assert_eq!(out, "bootstrapped");
}

#[test]
fn bootstrap_runs_without_install_directory() {
    let site = Site::new();
    let mut loader = site.loader(bootstrap_catalog("virtual"));
    let out = loader
        .render("com_blog", &Request::new(), &mut Document::new())
        .unwrap();
    assert_eq!(out, "virtual");
}

#[test]
#[cfg(unix)]
fn entry_script_output_is_captured() {
    let site = Site::new();
    let path = site.component("blog");
    write(&path.join("blog.sh"), "printf '<p>%s</p>' \"$HUB_TASK\"");

    let mut loader = site.loader(ComponentCatalog::new());
    let request = Request::new().with("task", "list");
    let out = loader.render("blog", &request, &mut Document::new()).unwrap();
    assert_eq!(out, "<p>list</p>");
}

#[test]
fn bundle_head_moves_into_document() {
    let site = Site::new();
    let path = site.component("tools");
    write(
        &path.join("assets/react/tools/build/index.html"),
        r#"<html><head><title>Tools</title><script defer="defer" src="/t.js"></script></head><body><div id="root"></div></body></html>"#,
    );

    let mut loader = site.loader(ComponentCatalog::new());
    let mut document = Document::new();
    let out = loader.render("tools", &Request::new(), &mut document).unwrap();

    assert_eq!(out, r#"<div id="root"></div>"#);
    assert_eq!(document.title(), "Tools");
    assert_eq!(document.scripts().len(), 1);
    assert!(document.scripts()[0].defer);
}

#[test]
fn bundle_with_inline_scripts_renders() {
    let site = Site::new();
    let path = site.component("tools");
    write(
        &path.join("assets/react/tools/build/index.html"),
        concat!(
            "<!doctype html><html><head><title>Tools</title>",
            "<script>var a=1<2&&x;for(var r=0;r<e.length;r++){}</script>",
            "</head><body><div id=\"root\"></div>",
            "<script>if(a<!b){x()}</script></body></html>",
        ),
    );

    let mut loader = site.loader(ComponentCatalog::new());
    let mut document = Document::new();
    let out = loader.render("tools", &Request::new(), &mut document).unwrap();

    assert_eq!(out, r#"<div id="root"></div><script>if(a<!b){x()}</script>"#);
    assert_eq!(document.title(), "Tools");
    assert!(document.scripts().is_empty());
}

#[test]
fn malformed_bundle_fails() {
    let site = Site::new();
    let path = site.component("tools");
    write(
        &path.join("assets/react/tools/build/index.html"),
        "<html><head></head></html>",
    );

    let mut loader = site.loader(ComponentCatalog::new());
    let err = loader
        .render("tools", &Request::new(), &mut Document::new())
        .unwrap_err();
    assert!(matches!(err, DispatchError::BundleStructure(_)));
}

#[test]
fn bare_directory_uses_default_controller() {
    let site = Site::new();
    let path = site.component("wiki");
    write(
        &path.join("views/pages/tmpl/display.jinja"),
        "{{ controller }}/{{ task }} in {{ option }}",
    );

    let mut loader = site.loader(ComponentCatalog::new());
    let request = Request::new().with("controller", "pages").with("task", "View");
    let out = loader.render("wiki", &request, &mut Document::new()).unwrap();
    assert_eq!(out, "pages/view in com_wiki");
}

#[test]
fn controller_defaults_to_component_name() {
    let site = Site::new();
    let path = site.component("wiki");
    write(&path.join("views/wiki/tmpl/display.html"), "home");

    let mut loader = site.loader(ComponentCatalog::new());
    let out = loader
        .render("wiki", &Request::new(), &mut Document::new())
        .unwrap();
    assert_eq!(out, "home");
}

#[test]
fn registered_controller_is_used() {
    let site = Site::new();
    site.component("wiki");

    let mut catalog = ComponentCatalog::new();
    catalog.register_controller("com_wiki", "site", "pages", |config| {
        Box::new(DefaultSiteController::new(config).task("save", |_view, ctx| {
            ctx.echo("saved");
            Ok(())
        })) as Box<dyn Controller>
    });

    let mut loader = site.loader(catalog);
    let request = Request::new().with("controller", "pages").with("task", "save");
    let out = loader.render("wiki", &request, &mut Document::new()).unwrap();
    assert_eq!(out, "saved");
}

#[test]
fn invalid_controller_name_is_rejected() {
    let site = Site::new();
    site.component("wiki");

    let mut loader = site.loader(ComponentCatalog::new());
    let request = Request::new().with("controller", "9pages");
    let err = loader.render("wiki", &request, &mut Document::new()).unwrap_err();
    assert!(matches!(err, DispatchError::InvalidArgument(_)));
    assert_eq!(err.status_code(), 404);
    assert_eq!(err.to_string(), "Invalid controller name [9pages] requested");
}

#[test]
fn invalid_component_name_is_rejected() {
    let site = Site::new();
    let path = site.core.join("components").join("com_my-blog").join("site");
    fs::create_dir_all(&path).unwrap();

    let mut loader = site.loader(ComponentCatalog::new());
    let err = loader
        .render("my-blog", &Request::new(), &mut Document::new())
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid component name [my-blog] requested");
}

#[test]
fn disabled_component_is_not_found() {
    let site = Site::new();
    site.component("blog");
    let store = Arc::new(MemoryStore::with_rows([ExtensionRow::new(4, "com_blog", false)]));

    let mut loader = ComponentLoader::builder(&site.app, &site.core)
        .store(store)
        .catalog(Arc::new(bootstrap_catalog("never")))
        .build();
    let err = loader
        .render("blog", &Request::new(), &mut Document::new())
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Component not found or not enabled.");
}

#[test]
fn missing_component_is_not_found() {
    let site = Site::new();
    let mut loader = site.loader(ComponentCatalog::new());
    let err = loader
        .render("ghost", &Request::new(), &mut Document::new())
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn scope_is_restored_after_success_and_failure() {
    let site = Site::new();
    let scope = Scope::new();
    let seen = Arc::new(std::sync::Mutex::new(None));

    let mut catalog = ComponentCatalog::new();
    let observed = seen.clone();
    let inner_scope = scope.clone();
    catalog.register_bootstrap("com_blog", "site", move || {
        let observed = observed.clone();
        let inner_scope = inner_scope.clone();
        Box::new(FnBootstrap::new(move |_ctx| {
            *observed.lock().unwrap() = inner_scope.get();
            Ok(())
        })) as Box<dyn Bootstrap>
    });
    catalog.register_bootstrap("com_broken", "site", || {
        Box::new(FnBootstrap::new(|_ctx| {
            Err(DispatchError::NotFound("gone".into()))
        })) as Box<dyn Bootstrap>
    });

    let mut loader = ComponentLoader::builder(&site.app, &site.core)
        .catalog(Arc::new(catalog))
        .scope(scope.clone())
        .build();

    let _outer = scope.enter("com_home");
    loader
        .render("blog", &Request::new(), &mut Document::new())
        .unwrap();
    assert_eq!(seen.lock().unwrap().as_deref(), Some("com_blog"));
    assert_eq!(scope.get().as_deref(), Some("com_home"));

    assert!(loader
        .render("broken", &Request::new(), &mut Document::new())
        .is_err());
    assert_eq!(scope.get().as_deref(), Some("com_home"));
}

#[test]
fn theme_override_and_language_files() {
    let site = Site::new();
    let path = site.component("wiki");
    write(&path.join("views/wiki/tmpl/display.jinja"), "component");
    let theme = site.app.join("templates/kimera");
    write(&theme.join("html/com_wiki/wiki/display.jinja"), "themed");
    write(
        &path.join("language/en-GB/en-GB.com_wiki.ini"),
        "COM_WIKI=\"Wiki\"\n",
    );

    let mut loader = ComponentLoader::builder(&site.app, &site.core)
        .template(TemplateInfo {
            name: "kimera".into(),
            path: theme,
        })
        .build();
    let out = loader
        .render("wiki", &Request::new(), &mut Document::new())
        .unwrap();
    assert_eq!(out, "themed");
    assert_eq!(loader.language().translate("com_wiki"), "Wiki");
}

#[test]
fn custom_language_is_consulted_for_errors() {
    let site = Site::new();
    let mut lang = IniLanguage::new("fr-FR");
    lang.insert("JLIB_APPLICATION_ERROR_COMPONENT_NOT_FOUND", "Composant introuvable");

    let mut loader = ComponentLoader::builder(&site.app, &site.core)
        .language(Box::new(lang))
        .build();
    let err = loader
        .render("", &Request::new(), &mut Document::new())
        .unwrap_err();
    assert_eq!(err.to_string(), "Composant introuvable");
}

#[test]
fn router_selection_order() {
    let site = Site::new();
    site.component("blog");
    write(&site.core.join("components/forum/forum.sh"), "");
    fs::create_dir_all(site.core.join("components/tags")).unwrap();

    let mut catalog = ComponentCatalog::new();
    catalog.register_router(ComponentCatalog::legacy_router_key("com_blog"), || {
        Arc::new(LegacyRouter::new("legacy-named")) as Arc<dyn Router>
    });
    catalog.register_router(ComponentCatalog::router_key("com_blog", "site"), || {
        Arc::new(LegacyRouter::new("client")) as Arc<dyn Router>
    });
    catalog.register_router(
        ComponentCatalog::versioned_router_key("com_blog", "site", "2"),
        || Arc::new(LegacyRouter::new("v2")) as Arc<dyn Router>,
    );
    catalog.register_route_functions(
        "com_forum",
        |q: &mut Query| q.remove("thread").into_iter().collect(),
        |s: &[String]| {
            s.first()
                .map(|t| Query::from([("thread".to_string(), t.clone())]))
                .unwrap_or_default()
        },
    );

    let mut loader = site.loader(catalog);

    // Versioned router only when asked for; memoized per option and client.
    let versioned = loader.router("blog", Some("site"), Some("2")).unwrap();
    let again = loader.router("blog", None, None).unwrap();
    assert!(Arc::ptr_eq(&versioned, &again));

    let admin = loader.router("blog", Some("admin"), None).unwrap();
    let mut q = Query::new();
    assert!(admin.build(&mut q).is_empty());

    // Entry script on disk selects the legacy router with its route functions.
    let forum = loader.router("forum", None, None).unwrap();
    let mut q = Query::from([("thread".to_string(), "t1".to_string())]);
    assert_eq!(forum.build(&mut q), vec!["t1"]);
    assert_eq!(forum.parse(&["t1".to_string()])["thread"], "t1");

    // Otherwise the positional router.
    let tags = loader.router("tags", None, None).unwrap();
    let mut q = Query::from([("controller".to_string(), "list".to_string())]);
    assert_eq!(tags.build(&mut q), vec!["list"]);
}
