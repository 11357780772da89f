//! Integration tests for Cardapio.
//!
//! The storefront router is driven in-process with `tower::ServiceExt`, so
//! no server, network or external catalog is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cardapio-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use cardapio_core::{Catalog, Destination};
use cardapio_storefront::catalog::{CatalogSource, CatalogStatus};
use cardapio_storefront::config::{CatalogConfig, OrderConfig, StorefrontConfig};
use cardapio_storefront::state::AppState;
use tokio::task::JoinSet;
use tower::ServiceExt;

/// Destination number used by every test app.
pub const TEST_DESTINATION: &str = "5598991875270";

/// Catalog served by [`TestApp::new`].
pub const TEST_CATALOG: &str = r#"[
    {"id": 1, "name": "X-Burguer", "description": "Hambúrguer e queijo", "price": 10.00, "category": "Lanches", "img": "/static/img/x.jpg"},
    {"id": 2, "name": "X-Bacon", "description": "Com bacon crocante", "price": 12.00, "category": "Lanches", "img": "/static/img/xb.jpg"},
    {"id": 3, "name": "Milkshake", "price": 5.50, "category": "Bebidas", "img": "/static/img/shake.jpg",
     "options": {"title": "Sabor", "flavors": ["Morango", "Doce de Leite"]}},
    {"id": 4, "name": "Açaí", "category": "Sobremesas", "img": "/static/img/acai.jpg",
     "options": {"title": "Tamanho", "flavors": ["300ml"]}}
]"#;

/// Configuration pointing at nothing external.
///
/// # Panics
///
/// Panics if the test destination constant is not a valid number.
#[must_use]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        catalog: CatalogConfig {
            source: CatalogSource::File(PathBuf::from("unused.json")),
            timeout: Duration::from_secs(1),
        },
        order: OrderConfig {
            destination: Destination::parse(TEST_DESTINATION).unwrap(),
            store_name: "JS BURGUER".to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A response with its body collected.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The `Location` header, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// One browser session against an in-process storefront.
///
/// Keeps the session cookie between requests.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    /// Storefront with [`TEST_CATALOG`] loaded.
    ///
    /// # Panics
    ///
    /// Panics if [`TEST_CATALOG`] does not parse.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn new() -> Self {
        let catalog = Catalog::from_json(TEST_CATALOG.as_bytes()).unwrap();
        Self::with_catalog(CatalogStatus::Loaded(catalog))
    }

    /// Storefront whose catalog failed to load.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::with_catalog(CatalogStatus::Unavailable)
    }

    fn with_catalog(catalog: CatalogStatus) -> Self {
        let state = AppState::new(test_config(), catalog);
        Self {
            router: cardapio_storefront::app(state),
            cookie: None,
        }
    }

    /// Send a GET request.
    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = self.request(Request::get(path), Body::empty());
        self.send(request).await
    }

    /// Send a form-encoded POST request.
    pub async fn post_form(&mut self, path: &str, form: &str) -> TestResponse {
        let request = self.form_request(path, form);
        self.send(request).await
    }

    /// Send the same form POST `times` times at once, all with the current
    /// session cookie, and return the statuses once every request finished.
    ///
    /// # Panics
    ///
    /// Panics if a request task fails.
    #[allow(clippy::unwrap_used)]
    pub async fn post_form_concurrently(
        &self,
        path: &str,
        form: &str,
        times: usize,
    ) -> Vec<StatusCode> {
        let mut tasks = JoinSet::new();
        for _ in 0..times {
            let router = self.router.clone();
            let request = self.form_request(path, form);
            tasks.spawn(async move { router.oneshot(request).await.unwrap().status() });
        }

        let mut statuses = Vec::with_capacity(times);
        while let Some(status) = tasks.join_next().await {
            statuses.push(status.unwrap());
        }
        statuses
    }

    /// Current cart count as reported by the badge fragment.
    ///
    /// # Panics
    ///
    /// Panics if the badge does not contain a number.
    #[allow(clippy::unwrap_used)]
    pub async fn cart_count(&mut self) -> u32 {
        let response = self.get("/cart/count").await;
        let start = response.body.find('>').unwrap() + 1;
        let end = response.body.rfind("</span>").unwrap();
        response.body.get(start..end).unwrap().trim().parse().unwrap()
    }

    fn form_request(&self, path: &str, form: &str) -> Request<Body> {
        let builder = Request::post(path).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        self.request(builder, Body::from(form.to_string()))
    }

    #[allow(clippy::unwrap_used)]
    fn request(&self, mut builder: axum::http::request::Builder, body: Body) -> Request<Body> {
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(body).unwrap()
    }

    #[allow(clippy::unwrap_used)]
    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            && let Some(pair) = set_cookie.split(';').next()
        {
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
