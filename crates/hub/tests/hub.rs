use std::fs;
use std::path::Path;

use hub::dispatch::{ExtensionRow, MemoryStore};
use hub::mail::MemoryTransport;
use hub::render::FnHelper;
use hub::{Bootstrap, ConfigError, FnBootstrap, Helper, Hub, HubConfig, Query, Request};
use serde_json::json;
use std::sync::Arc;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("hub.yaml"),
        r#"
paths:
  app: app
  core: core
template:
  name: kimera
  path: app/templates/kimera
mailer_dsn: null://null
mailfrom: noreply@hub.test
fromname: Test Hub
"#,
    );
    fs::create_dir_all(dir.path().join("app/components")).unwrap();
    dir
}

#[test]
fn discovers_yaml_and_resolves_paths() {
    let dir = site();
    let config = HubConfig::discover(None, dir.path()).unwrap();
    assert_eq!(config.paths.core, dir.path().join("core"));
    assert_eq!(config.template_info().unwrap().name, "kimera");
    assert_eq!(config.mail.mailer_dsn, "null://null");
}

#[test]
fn discovery_prefers_yaml_over_json() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("hub.json"), r#"{"client": "json"}"#);
    write(&dir.path().join("hub.yml"), "client: yml\n");
    let config = HubConfig::discover(None, dir.path()).unwrap();
    assert_eq!(config.client, "yml");
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = HubConfig::discover(Some(&dir.path().join("nope.yaml")), dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn no_file_means_defaults_under_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = HubConfig::discover(None, dir.path()).unwrap();
    assert_eq!(config.paths.app, dir.path().join("app"));
    assert_eq!(config.client, "site");
}

#[test]
fn renders_component_view_with_theme_override_and_helper() {
    let dir = site();
    let component = dir.path().join("core/components/blog/site");
    write(
        &component.join("views/entries/tmpl/display.jinja"),
        "component copy",
    );
    write(
        &dir.path().join("app/templates/kimera/html/com_blog/entries/display.jinja"),
        "{{ shout(\"posts\") }} for {{ option }}",
    );

    let config = HubConfig::discover(None, dir.path()).unwrap();
    let mut hub = Hub::builder(config)
        .helpers(|helpers| {
            helpers.register_component("com_blog", "shout", || {
                Box::new(FnHelper::new(|args| {
                    let word = args.first().and_then(|v| v.as_str()).unwrap_or_default();
                    Ok(json!(word.to_uppercase()))
                })) as Box<dyn Helper>
            });
        })
        .build();

    let page = hub
        .render("blog", &Request::new().with("controller", "entries"))
        .unwrap();
    assert_eq!(page.option, "com_blog");
    assert_eq!(page.output, "POSTS for com_blog");
}

#[test]
fn disabled_component_reports_not_found() {
    let dir = site();
    let config = HubConfig::discover(None, dir.path()).unwrap();
    let mut hub = Hub::builder(config)
        .store(Arc::new(MemoryStore::with_rows([ExtensionRow::new(
            7, "com_blog", false,
        )])))
        .components(|catalog| {
            catalog.register_bootstrap("com_blog", "site", || {
                Box::new(FnBootstrap::new(|ctx| {
                    ctx.echo("should not run");
                    Ok(())
                })) as Box<dyn Bootstrap>
            });
        })
        .build();

    let err = hub.render("blog", &Request::new()).unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[test]
fn routes_round_trip_through_default_router() {
    let dir = site();
    fs::create_dir_all(dir.path().join("core/components/blog")).unwrap();
    let mut hub = Hub::new(HubConfig::discover(None, dir.path()).unwrap());

    let segments = vec!["entries".to_string(), "edit".to_string(), "42".to_string()];
    let query = hub.parse_route("blog", &segments).unwrap();
    assert_eq!(query.get("controller").map(String::as_str), Some("entries"));
    assert_eq!(query.get("task").map(String::as_str), Some("edit"));
    assert_eq!(query.get("id").map(String::as_str), Some("42"));

    let mut query: Query = query;
    query.insert("limit".into(), "10".into());
    let built = hub.build_route("blog", &mut query).unwrap();
    assert_eq!(built, ["entries", "edit"]);
    assert_eq!(query.len(), 2);
    assert_eq!(query.get("id").map(String::as_str), Some("42"));
    assert_eq!(query.get("limit").map(String::as_str), Some("10"));
}

#[test]
fn mail_uses_site_sender_and_named_transport() {
    let dir = site();
    let outbox = MemoryTransport::new();
    let hub = Hub::builder(HubConfig::discover(None, dir.path()).unwrap())
        .transporter("outbox", outbox.clone())
        .build();

    let mut message = hub.message();
    message.set_to("member@hub.test").unwrap();
    message.set_subject("Welcome");
    assert!(hub.send_mail(&mut message, "outbox").unwrap());

    let sent = outbox.sent();
    assert_eq!(sent[0].envelope.sender, "noreply@hub.test");
    let raw = sent[0].raw_str();
    let from = raw.lines().find(|l| l.starts_with("From:")).unwrap();
    assert!(from.contains("Test Hub") && from.contains("<noreply@hub.test>"), "{from}");

    let mut configured = hub.message();
    configured.set_to("member@hub.test").unwrap();
    assert!(hub.send_mail(&mut configured, hub::TransportSpec::Configured).unwrap());
    assert_eq!(outbox.len(), 1);
}
