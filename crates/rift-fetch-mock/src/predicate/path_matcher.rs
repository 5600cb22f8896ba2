//! Express-style path templates (`/type/:instance`) backed by `matchit`.

use crate::error::RouteError;
use crate::request::get_path;
use matchit::Router;
use std::collections::BTreeMap;
use std::fmt;

/// Compiled `express:` template.
pub struct ExpressMatcher {
    template: String,
    router: Router<()>,
}

/// Rewrite `:name` segments into matchit `{name}` parameters and escape
/// literal braces.
fn to_matchit_route(template: &str) -> String {
    template
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{name}}}"),
            _ => segment.replace('{', "{{").replace('}', "}}"),
        })
        .collect::<Vec<_>>()
        .join("/")
}

impl ExpressMatcher {
    pub fn compile(template: &str) -> Result<Self, RouteError> {
        let mut router = Router::new();
        router
            .insert(to_matchit_route(template), ())
            .map_err(|e| RouteError::InvalidExpressPath {
                path: template.to_string(),
                reason: e.to_string(),
            })?;
        Ok(ExpressMatcher {
            template: template.to_string(),
            router,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Bind the template against the URL's path. `None` when the path does
    /// not fit the template's shape. A single trailing slash is tolerated.
    pub fn capture(&self, url: &str) -> Option<BTreeMap<String, String>> {
        let path = get_path(url);
        let path = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path.as_str(),
        };
        let matched = self.router.at(path).ok()?;
        Some(
            matched
                .params
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        )
    }
}

impl fmt::Debug for ExpressMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressMatcher")
            .field("template", &self.template)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_translation() {
        assert_eq!(to_matchit_route("/type/:instance"), "/type/{instance}");
        assert_eq!(to_matchit_route("/:type/:instance"), "/{type}/{instance}");
        assert_eq!(to_matchit_route("/static/path"), "/static/path");
    }

    #[test]
    fn test_capture_single_param() {
        let matcher = ExpressMatcher::compile("/type/:instance").unwrap();
        let params = matcher.capture("/type/a").unwrap();
        assert_eq!(params.get("instance").map(String::as_str), Some("a"));
        assert!(matcher.capture("/").is_none());
        assert!(matcher.capture("/type/a/b").is_none());
    }

    #[test]
    fn test_capture_on_full_url() {
        let matcher = ExpressMatcher::compile("/apps/:id").unwrap();
        let params = matcher
            .capture("https://api.example.com/apps/abc?x=1")
            .unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_capture_multiple_params() {
        let matcher = ExpressMatcher::compile("/:type/:instance").unwrap();
        let params = matcher.capture("/cat/b").unwrap();
        assert_eq!(params.get("type").map(String::as_str), Some("cat"));
        assert_eq!(params.get("instance").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_trailing_slash_tolerated() {
        let matcher = ExpressMatcher::compile("/its/:word").unwrap();
        assert!(matcher.capture("/its/alive/").is_some());
        assert!(matcher.capture("/its/a/boy").is_none());
    }

    #[test]
    fn test_invalid_template() {
        // catch-all parameters must end the route
        let err = ExpressMatcher::compile("/:*rest/x").unwrap_err();
        assert!(matches!(err, RouteError::InvalidExpressPath { .. }));
    }
}
