//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup, and a single fallback
//! handler for everything that does not match.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    fallback: Option<BoxedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), fallback: None }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid matchit route or conflicts with one
    /// already registered for `method`. Routes are fixed at startup.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Handler for requests no route matches. Without one, such requests get
    /// an empty `404 Not Found`.
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = Some(handler.into_boxed_handler());
        self
    }

    /// Dispatches one fully buffered request and produces its response.
    pub async fn handle(&self, req: http::Request<Bytes>) -> Response {
        let matched = Method::try_from(req.method())
            .ok()
            .and_then(|method| self.lookup(method, req.uri().path()));

        match matched {
            Some((handler, params)) => handler.call(Request::new(req, params)).await,
            None => match &self.fallback {
                Some(handler) => handler.call(Request::new(req, HashMap::new())).await,
                None => Response::status(Status::NotFound),
            },
        }
    }

    fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(path: &str) -> http::Request<Bytes> {
        http::Request::builder().uri(path).body(Bytes::new()).unwrap()
    }

    async fn echo_id(req: Request) -> Response {
        Response::text(req.param("id").unwrap_or("none").to_owned())
    }

    #[tokio::test]
    async fn routes_by_method_and_extracts_params() {
        let router = Router::new().on(Method::Get, "/articulo/{id}", echo_id);

        let res = router.handle(get("/articulo/hola_mundo")).await;
        assert_eq!(res.status_code(), Status::Ok);
        assert_eq!(res.body_text(), "hola_mundo");

        let post = http::Request::builder()
            .method(http::Method::POST)
            .uri("/articulo/hola_mundo")
            .body(Bytes::new())
            .unwrap();
        assert_eq!(router.handle(post).await.status_code(), Status::NotFound);
    }

    #[tokio::test]
    async fn unmatched_requests_reach_the_fallback() {
        let router = Router::new()
            .on(Method::Get, "/", |_req: Request| async { "home" })
            .fallback(|_req: Request| async { Status::Forbidden });

        assert_eq!(router.handle(get("/nope")).await.status_code(), Status::Forbidden);
        assert_eq!(router.handle(get("/articulo/a/b")).await.status_code(), Status::Forbidden);
    }

    #[tokio::test]
    async fn without_fallback_unmatched_is_404() {
        let router = Router::new();
        assert_eq!(router.handle(get("/")).await.status_code(), Status::NotFound);
    }
}
