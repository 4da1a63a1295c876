use crate::canonical::is_identifier;
use crate::request::Query;

use super::Router;

/// Positional `controller/task/id` router.
///
/// ```rust
/// use hub_dispatch::router::{DefaultRouter, Router};
/// use hub_dispatch::Query;
///
/// let router = DefaultRouter::new("Blog");
/// let mut query = Query::from([
///     ("controller".to_string(), "entries".to_string()),
///     ("task".to_string(), "edit".to_string()),
///     ("limit".to_string(), "5".to_string()),
/// ]);
/// assert_eq!(router.build(&mut query), vec!["entries", "edit"]);
/// assert_eq!(query.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultRouter {
    component: String,
}

impl DefaultRouter {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }
}

const KEYS: [&str; 3] = ["controller", "task", "id"];

impl Router for DefaultRouter {
    /// Each key is consumed only when it is a valid identifier and every key
    /// before it was consumed.
    fn build(&self, query: &mut Query) -> Vec<String> {
        let mut segments = Vec::new();
        for key in KEYS {
            match query.get(key) {
                Some(value) if is_identifier(value) => {
                    if let Some(value) = query.remove(key) {
                        segments.push(value);
                    }
                }
                _ => break,
            }
        }
        segments
    }

    fn parse(&self, segments: &[String]) -> Query {
        KEYS.iter()
            .zip(segments)
            .map(|(key, segment)| (key.to_string(), segment.clone()))
            .collect()
    }
}
