//! Host page head state.
//!
//! Components contribute to the surrounding page through a [`Document`]:
//! metadata, stylesheets, scripts and extra head links. The page template
//! renders the head from this state after dispatch.

use serde::Serialize;

/// A `<script>` registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Script {
    pub src: String,
    pub mime: String,
    pub defer: bool,
    #[serde(rename = "async")]
    pub async_: bool,
}

impl Script {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            mime: "text/javascript".to_string(),
            defer: false,
            async_: false,
        }
    }

    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    pub fn defer(mut self, defer: bool) -> Self {
        self.defer = defer;
        self
    }

    pub fn async_(mut self, async_: bool) -> Self {
        self.async_ = async_;
        self
    }
}

/// A `<link rel="stylesheet">` registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stylesheet {
    pub href: String,
    pub mime: String,
    pub media: Option<String>,
}

/// A generic `<link>` in the head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadLink {
    pub href: String,
    pub rel: String,
}

/// A named `<meta>` entry. `http_equiv` entries render as
/// `<meta http-equiv="..">` instead of `<meta name="..">`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaEntry {
    pub name: String,
    pub content: String,
    pub http_equiv: bool,
}

/// Head state of the page being built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    charset: String,
    title: String,
    metadata: Vec<MetaEntry>,
    stylesheets: Vec<Stylesheet>,
    scripts: Vec<Script>,
    links: Vec<HeadLink>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            charset: "utf-8".to_string(),
            title: String::new(),
            metadata: Vec::new(),
            stylesheets: Vec::new(),
            scripts: Vec::new(),
            links: Vec::new(),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn set_charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = charset.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    /// Sets a metadata entry, replacing one with the same name and kind.
    pub fn set_metadata(
        &mut self,
        name: impl Into<String>,
        content: impl Into<String>,
        http_equiv: bool,
    ) -> &mut Self {
        let name = name.into();
        let content = content.into();
        match self
            .metadata
            .iter_mut()
            .find(|m| m.http_equiv == http_equiv && m.name.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.content = content,
            None => self.metadata.push(MetaEntry {
                name,
                content,
                http_equiv,
            }),
        }
        self
    }

    pub fn metadata(&self, name: &str, http_equiv: bool) -> Option<&str> {
        self.metadata
            .iter()
            .find(|m| m.http_equiv == http_equiv && m.name.eq_ignore_ascii_case(name))
            .map(|m| m.content.as_str())
    }

    pub fn all_metadata(&self) -> &[MetaEntry] {
        &self.metadata
    }

    /// Registers a stylesheet once; later registrations of the same href are ignored.
    pub fn add_stylesheet(
        &mut self,
        href: impl Into<String>,
        mime: impl Into<String>,
        media: Option<String>,
    ) -> &mut Self {
        let href = href.into();
        if !self.stylesheets.iter().any(|s| s.href == href) {
            self.stylesheets.push(Stylesheet {
                href,
                mime: mime.into(),
                media,
            });
        }
        self
    }

    pub fn stylesheets(&self) -> &[Stylesheet] {
        &self.stylesheets
    }

    /// Registers a script. Re-registering a src updates its attributes.
    pub fn add_script(&mut self, script: Script) -> &mut Self {
        match self.scripts.iter_mut().find(|s| s.src == script.src) {
            Some(existing) => *existing = script,
            None => self.scripts.push(script),
        }
        self
    }

    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    pub fn add_head_link(&mut self, href: impl Into<String>, rel: impl Into<String>) -> &mut Self {
        self.links.push(HeadLink {
            href: href.into(),
            rel: rel.into(),
        });
        self
    }

    pub fn head_links(&self) -> &[HeadLink] {
        &self.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let doc = Document::new();
        assert_eq!(doc.charset(), "utf-8");
        assert_eq!(doc.title(), "");
        assert!(doc.scripts().is_empty());
    }

    #[test]
    fn test_metadata_replaces_by_name_and_kind() {
        let mut doc = Document::new();
        doc.set_metadata("description", "one", false)
            .set_metadata("Description", "two", false)
            .set_metadata("description", "equiv", true);

        assert_eq!(doc.metadata("description", false), Some("two"));
        assert_eq!(doc.metadata("description", true), Some("equiv"));
        assert_eq!(doc.all_metadata().len(), 2);
    }

    #[test]
    fn test_stylesheets_deduplicated() {
        let mut doc = Document::new();
        doc.add_stylesheet("/a.css", "text/css", None)
            .add_stylesheet("/a.css", "text/css", Some("print".into()));
        assert_eq!(doc.stylesheets().len(), 1);
        assert_eq!(doc.stylesheets()[0].media, None);
    }

    #[test]
    fn test_script_reregistration_updates_flags() {
        let mut doc = Document::new();
        doc.add_script(Script::new("/app.js"))
            .add_script(Script::new("/app.js").defer(true));
        assert_eq!(doc.scripts().len(), 1);
        assert!(doc.scripts()[0].defer);
        assert!(!doc.scripts()[0].async_);
    }

    #[test]
    fn test_serializes_async_key() {
        let value = serde_json::to_value(Script::new("/x.js").async_(true)).unwrap();
        assert_eq!(value["async"], serde_json::json!(true));
    }
}
