//! Prebuilt front-end bundles.
//!
//! A component may ship a compiled single-page app under
//! `<component>/assets/react/<name>/build/index.html`. Dispatching it moves
//! the bundle's head entries (charset, metadata, title, stylesheets, scripts,
//! links) into the host [`Document`] and emits only the body's inner HTML.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use hub_render::{Document, Script};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::DispatchError;

/// Directory holding a component's bundle.
pub fn bundle_dir(component_path: &Path, name: &str) -> PathBuf {
    component_path.join("assets").join("react").join(name)
}

/// Reads `<dir>/build/index.html` and ingests it into `document`.
pub fn execute(dir: &Path, document: &mut Document) -> Result<String, DispatchError> {
    let index = dir.join("build").join("index.html");
    let html = std::fs::read_to_string(&index)?;
    tracing::debug!(path = %index.display(), bytes = html.len(), "ingesting bundle");
    ingest(&html, document)
}

/// Elements whose content HTML treats as raw text.
const RAW_TEXT: [&str; 4] = ["script", "style", "title", "textarea"];

/// Copies head entries of `html` into `document` and returns the body's
/// inner HTML.
///
/// The page must contain exactly one `<head>` and one `<body>`. Inline
/// scripts and styles are passed through untouched, whatever they contain.
pub fn ingest(html: &str, document: &mut Document) -> Result<String, DispatchError> {
    // Offsets into `masked` are offsets into `html`.
    let masked = mask_raw_text(html);
    let mut reader = Reader::from_str(&masked);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.trim_text(false);

    let mut heads = 0;
    let mut bodies = 0;
    let mut in_head = false;
    let mut body_start: Option<usize> = None;
    let mut body_end: Option<usize> = None;
    let mut html_end: Option<usize> = None;
    let mut title_start: Option<usize> = None;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) => {
                let name = tag_name(&e);
                match name.as_str() {
                    "head" => {
                        heads += 1;
                        in_head = true;
                    }
                    "body" => {
                        bodies += 1;
                        in_head = false;
                        if body_start.is_none() {
                            body_start = Some(reader.buffer_position() as usize);
                        }
                    }
                    "title" if in_head => title_start = Some(reader.buffer_position() as usize),
                    _ if in_head => head_element(&name, &e, document)?,
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let name = tag_name(&e);
                match name.as_str() {
                    "head" => heads += 1,
                    "body" => {
                        bodies += 1;
                        in_head = false;
                    }
                    _ if in_head => head_element(&name, &e, document)?,
                    _ => {}
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                match name.as_str() {
                    "head" => in_head = false,
                    "title" => {
                        if let Some(start) = title_start.take() {
                            let text = html.get(start..before).unwrap_or_default();
                            document.set_title(unescape_lossy(text).trim());
                        }
                    }
                    "body" if body_end.is_none() => body_end = Some(before),
                    "html" if html_end.is_none() => html_end = Some(before),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if heads != 1 || bodies != 1 {
        return Err(DispatchError::BundleStructure(format!(
            "expected one <head> and one <body>, found {} and {}",
            heads, bodies
        )));
    }

    let inner = match body_start {
        Some(start) => {
            let end = body_end
                .or(html_end.filter(|end| *end >= start))
                .unwrap_or(html.len());
            html.get(start..end).unwrap_or_default()
        }
        None => "",
    };
    Ok(inner.to_string())
}

/// Replaces the content of raw-text elements with spaces of the same byte
/// length, so the XML tokenizer never sees `<` or `&` inside a script.
fn mask_raw_text(html: &str) -> String {
    let bytes = html.as_bytes();
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    let mut pos = 0;

    while let Some(offset) = lower[pos..].find('<') {
        let name_start = pos + offset + 1;
        pos = name_start;
        let Some(name) = RAW_TEXT.iter().find(|name| {
            lower[name_start..].starts_with(*name)
                && matches!(
                    bytes.get(name_start + name.len()),
                    Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/'
                )
        }) else {
            continue;
        };
        let Some(tag_end) = tag_end(bytes, name_start) else {
            break;
        };
        pos = tag_end + 1;
        if bytes[tag_end - 1] == b'/' {
            continue;
        }
        let content_end = lower[pos..]
            .find(&format!("</{name}"))
            .map_or(html.len(), |i| pos + i);
        out.push_str(&html[copied..pos]);
        out.extend(std::iter::repeat(' ').take(content_end - pos));
        copied = content_end;
        pos = content_end;
    }
    out.push_str(&html[copied..]);
    out
}

/// Index of the `>` closing the tag that starts before `from`, skipping
/// quoted attribute values.
fn tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(i),
            None => {}
        }
    }
    None
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase()
}

fn unescape_lossy(text: &str) -> Cow<'_, str> {
    match quick_xml::escape::unescape(text) {
        Ok(value) => value,
        Err(_) => Cow::Borrowed(text),
    }
}

/// Attribute lookup that tolerates HTML-style valueless attributes.
struct Attrs {
    pairs: Vec<(String, String)>,
}

impl Attrs {
    fn read(e: &BytesStart<'_>) -> Result<Self, DispatchError> {
        let mut pairs = Vec::new();
        for attr in e.html_attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let value = attr
                .unescape_value()
                .map(Cow::into_owned)
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            pairs.push((key, value));
        }
        Ok(Self { pairs })
    }

    fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    fn get(&self, key: &str) -> &str {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }
}

fn head_element(name: &str, e: &BytesStart<'_>, document: &mut Document) -> Result<(), DispatchError> {
    match name {
        "meta" => {
            let attrs = Attrs::read(e)?;
            if attrs.has("charset") {
                document.set_charset(attrs.get("charset"));
            } else if attrs.has("name") {
                document.set_metadata(attrs.get("name"), attrs.get("content"), false);
            } else if attrs.has("http-equiv") {
                document.set_metadata(attrs.get("http-equiv"), attrs.get("content"), true);
            }
            // itemprop metadata has no document counterpart
        }
        "link" => {
            let attrs = Attrs::read(e)?;
            let href = attrs.get("href");
            match attrs.get("rel") {
                "stylesheet" => {
                    document.add_stylesheet(href, "text/css", None);
                }
                "script" => {
                    document.add_script(Script::new(href));
                }
                rel => {
                    document.add_head_link(href, rel);
                }
            }
        }
        "script" => {
            let attrs = Attrs::read(e)?;
            let src = attrs.get("src");
            if !src.is_empty() {
                document.add_script(
                    Script::new(src)
                        .defer(attrs.has("defer"))
                        .async_(attrs.has("async")),
                );
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="iso-8859-1">
<meta name="viewport" content="width=device-width,initial-scale=1">
<meta http-equiv="X-UA-Compatible" content="IE=edge">
<meta itemprop="name" content="ignored">
<title>Blog &amp; News</title>
<link rel="icon" href="/favicon.ico">
<link rel="stylesheet" href="/static/css/main.css">
<link rel="script" href="/static/js/vendor.js">
<script defer="defer" src="/static/js/main.js"></script>
<script async src="/static/js/stats.js"></script>
</head>
<body><noscript>Enable JS</noscript><div id="root"><p>Hi</p></div></body>
</html>
"#;

    #[test]
    fn test_ingest_head_and_body() {
        let mut doc = Document::new();
        let body = ingest(PAGE, &mut doc).unwrap();

        assert_eq!(body, r#"<noscript>Enable JS</noscript><div id="root"><p>Hi</p></div>"#);
        assert_eq!(doc.charset(), "iso-8859-1");
        assert_eq!(doc.title(), "Blog & News");
        assert_eq!(
            doc.metadata("viewport", false),
            Some("width=device-width,initial-scale=1")
        );
        assert_eq!(doc.metadata("X-UA-Compatible", true), Some("IE=edge"));
        assert_eq!(doc.metadata("name", false), None);
        assert_eq!(doc.all_metadata().len(), 2);

        assert_eq!(doc.stylesheets().len(), 1);
        assert_eq!(doc.stylesheets()[0].href, "/static/css/main.css");
        assert_eq!(doc.head_links().len(), 1);
        assert_eq!(doc.head_links()[0].rel, "icon");

        let scripts = doc.scripts();
        assert_eq!(scripts.len(), 3);
        assert_eq!(scripts[0].src, "/static/js/vendor.js");
        assert!(!scripts[0].defer);
        assert!(scripts[1].defer && !scripts[1].async_);
        assert!(scripts[2].async_ && !scripts[2].defer);
    }

    #[test]
    fn test_inline_scripts_pass_through() {
        let page = concat!(
            "<html><head><title>A &lt; B</title>",
            "<script>var a=1<2&&x</script>",
            "<script>for(var r=0;r<e.length;r++){}</script>",
            "<style>p>a{color:red}</style>",
            "<script src=\"/app.js\"></script>",
            "</head><body><div id=\"root\"></div>",
            "<script>if(a<!b){x()}</script></body></html>",
        );
        let mut doc = Document::new();
        let body = ingest(page, &mut doc).unwrap();

        assert_eq!(body, "<div id=\"root\"></div><script>if(a<!b){x()}</script>");
        assert_eq!(doc.title(), "A < B");
        assert_eq!(doc.scripts().len(), 1);
        assert_eq!(doc.scripts()[0].src, "/app.js");
    }

    #[test]
    fn test_mask_keeps_offsets() {
        let html = "<p>x</p><SCRIPT type=\"a>b\">é<!</script><script/><textarea>1<2</textarea>";
        let masked = mask_raw_text(html);
        assert_eq!(masked.len(), html.len());
        assert!(masked.starts_with("<p>x</p><SCRIPT type=\"a>b\">    </script><script/>"));
        assert!(masked.ends_with("<textarea>   </textarea>"));
    }

    #[test]
    fn test_missing_body_is_rejected() {
        let mut doc = Document::new();
        let err = ingest("<html><head><title>x</title></head></html>", &mut doc).unwrap_err();
        assert!(matches!(err, DispatchError::BundleStructure(_)));
    }

    #[test]
    fn test_two_heads_rejected() {
        let mut doc = Document::new();
        let err = ingest(
            "<html><head></head><head></head><body></body></html>",
            &mut doc,
        )
        .unwrap_err();
        assert!(err.to_string().contains("found 2 and 1"));
    }

    #[test]
    fn test_body_without_end_tag() {
        let mut doc = Document::new();
        let body = ingest("<html><head></head><body><p>open</p></html>", &mut doc).unwrap();
        assert_eq!(body, "<p>open</p>");
    }

    #[test]
    fn test_execute_reads_build_index() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        std::fs::create_dir_all(&build).unwrap();
        std::fs::write(build.join("index.html"), "<html><head></head><body>ok</body></html>").unwrap();

        let mut doc = Document::new();
        assert_eq!(execute(dir.path(), &mut doc).unwrap(), "ok");
    }
}
