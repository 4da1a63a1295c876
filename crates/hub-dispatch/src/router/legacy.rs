use std::sync::Arc;

use crate::request::Query;

use super::Router;

/// Route builder registered for a legacy component (`<Name>BuildRoute`).
pub type BuildRouteFn = Arc<dyn Fn(&mut Query) -> Vec<String> + Send + Sync>;

/// Route parser registered for a legacy component (`<Name>ParseRoute`).
pub type ParseRouteFn = Arc<dyn Fn(&[String]) -> Query + Send + Sync>;

/// Router for components that still ship an entry script or per-controller
/// files. Delegates to the component's registered route functions; without
/// them, queries pass through untouched and nothing is parsed.
#[derive(Clone)]
pub struct LegacyRouter {
    component: String,
    build: Option<BuildRouteFn>,
    parse: Option<ParseRouteFn>,
}

impl std::fmt::Debug for LegacyRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyRouter")
            .field("component", &self.component)
            .field("build", &self.build.is_some())
            .field("parse", &self.parse.is_some())
            .finish()
    }
}

impl LegacyRouter {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            build: None,
            parse: None,
        }
    }

    pub fn with_functions(mut self, build: Option<BuildRouteFn>, parse: Option<ParseRouteFn>) -> Self {
        self.build = build;
        self.parse = parse;
        self
    }

    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Router for LegacyRouter {
    fn build(&self, query: &mut Query) -> Vec<String> {
        match &self.build {
            Some(build) => build(query),
            None => Vec::new(),
        }
    }

    fn parse(&self, segments: &[String]) -> Query {
        match &self.parse {
            Some(parse) => parse(segments),
            None => Query::new(),
        }
    }
}
