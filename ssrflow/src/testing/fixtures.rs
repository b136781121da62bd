//! Request and application fixtures.

use crate::render::{Application, ComponentRef};
use http::request::Parts;
use http::{header, Method, Request};

/// Builds a GET request head for `path`.
#[must_use]
pub fn request(path: &str) -> Parts {
    request_with_method(Method::GET, path)
}

/// Builds a request head with the given method.
#[must_use]
pub fn request_with_method(method: Method, path: &str) -> Parts {
    let (parts, ()) = Request::builder()
        .method(method)
        .uri(path)
        .body(())
        .unwrap_or_default()
        .into_parts();
    parts
}

/// Builds a GET request head carrying a `User-Agent` header.
#[must_use]
pub fn request_with_user_agent(path: &str, user_agent: &str) -> Parts {
    let (parts, ()) = Request::builder()
        .method(Method::GET)
        .uri(path)
        .header(header::USER_AGENT, user_agent)
        .body(())
        .unwrap_or_default()
        .into_parts();
    parts
}

/// Builds an application with placeholder components.
#[must_use]
pub fn test_app() -> Application {
    Application::new(
        ComponentRef::new("MainApp", ()),
        ComponentRef::new("ServerRouter", ()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_fixture() {
        let parts = request("/about?x=1");
        assert_eq!(parts.method, Method::GET);
        assert_eq!(parts.uri.path(), "/about");
    }

    #[test]
    fn test_user_agent_fixture() {
        let parts = request_with_user_agent("/", "Googlebot/2.1");
        assert_eq!(
            parts.headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()),
            Some("Googlebot/2.1")
        );
    }
}
