//! Integration tests for CartoonCart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartoon-cart-integration-tests
//! ```
//!
//! Tests drive the storefront router in-process with
//! `tower::ServiceExt::oneshot`. Remote collaborators (auth API, documents
//! API, visit counter, price feed) are replaced by a small axum server bound
//! to an ephemeral local port; see [`Collaborators`].
//!
//! # Test Categories
//!
//! - `catalog` - categories, products, home page
//! - `cart` - cart mutations and persistence across restarts
//! - `account` - sign-in, registration, documents, sign-out
//! - `ticker` - price polling and SOL conversion

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use cartoon_cart_storefront::config::StorefrontConfig;
use cartoon_cart_storefront::services::price_feed::PriceTicker;
use cartoon_cart_storefront::state::AppState;
use cartoon_cart_storefront::storage::{FileStorage, MemoryStorage, Storage};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

/// Login accepted by the fake auth API.
pub const LOGIN: &str = "ivan.petrov";
/// Password accepted by the fake auth API.
pub const PASSWORD: &str = "correct-horse";
/// Token issued by the fake auth API.
pub const TOKEN: &str = "tok-ivan-petrov";
/// Login the fake auth API reports as already registered.
pub const TAKEN_LOGIN: &str = "taken";
/// SOL price served by the fake price feed.
pub const SOL_USD: f64 = 150.25;

// =============================================================================
// Fake collaborators
// =============================================================================

/// What the fake collaborators have seen.
#[derive(Clone, Default)]
struct Recorded {
    visits: Arc<AtomicUsize>,
    uploads: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

/// Handle to the fake collaborator server.
pub struct Collaborators {
    pub base_url: Url,
    recorded: Recorded,
}

impl Collaborators {
    /// Start the fake server on an ephemeral port.
    pub async fn spawn() -> Self {
        let recorded = Recorded::default();
        let router = Router::new()
            .route("/auth/login", post(fake_login))
            .route("/auth/register", post(fake_register))
            .route("/documents", post(fake_documents))
            .route("/visits", post(fake_visit))
            .route("/price", get(fake_price))
            .route("/price/broken", get(fake_broken_price))
            .with_state(recorded.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake collaborators");
        let addr = listener.local_addr().expect("fake collaborator address");
        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("fake collaborators crashed");
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}/")).expect("fake base url"),
            recorded,
        }
    }

    /// URL of a path on the fake server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        self.base_url.join(path).expect("fake url").to_string()
    }

    /// Number of visit pings received.
    #[must_use]
    pub fn visits(&self) -> usize {
        self.recorded.visits.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` visit pings arrived, or give up after a second.
    pub async fn wait_for_visits(&self, n: usize) -> usize {
        for _ in 0..50 {
            if self.visits() >= n {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.visits()
    }

    /// Multipart fields received by the documents endpoint, with file names.
    #[must_use]
    pub fn uploads(&self) -> Vec<(String, Option<String>)> {
        self.recorded
            .uploads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn fake_login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["login"] == LOGIN && body["password"] == PASSWORD {
        (
            StatusCode::OK,
            Json(json!({
                "token": TOKEN,
                "user": { "firstName": "Ivan", "lastName": "Petrov", "login": LOGIN }
            })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid login or password" })),
        )
    }
}

async fn fake_register(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["login"] == TAKEN_LOGIN {
        (
            StatusCode::CONFLICT,
            Json(json!({ "error": "User already exists" })),
        )
    } else {
        (StatusCode::CREATED, Json(json!({ "message": "created" })))
    }
}

async fn fake_documents(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(TOKEN) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid token" })),
        );
    }

    let mut fields = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let _ = field.bytes().await;
        fields.push((name, file_name));
    }
    *recorded
        .uploads
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = fields;

    (
        StatusCode::OK,
        Json(json!({ "message": "Documents received" })),
    )
}

async fn fake_visit(State(recorded): State<Recorded>) -> StatusCode {
    recorded.visits.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

async fn fake_price() -> Json<Value> {
    Json(json!({ "solana": { "usd": SOL_USD } }))
}

async fn fake_broken_price() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

// =============================================================================
// Storefront under test
// =============================================================================

/// A storefront wired to fake collaborators and a temporary data directory.
pub struct TestContext {
    pub app: Router,
    pub state: AppState,
    pub config: StorefrontConfig,
    pub collaborators: Collaborators,
    data_dir: TempDir,
    local: Option<Arc<dyn Storage>>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::build(None).await
    }

    /// Use `local` as persistent storage instead of the data directory.
    pub async fn with_local_storage(local: Arc<dyn Storage>) -> Self {
        Self::build(Some(local)).await
    }

    async fn build(local: Option<Arc<dyn Storage>>) -> Self {
        let collaborators = Collaborators::spawn().await;
        let data_dir = tempfile::tempdir().expect("temp data dir");

        let vars = [
            ("STOREFRONT_DATA_DIR", data_dir.path().to_string_lossy().into_owned()),
            ("AUTH_API_URL", collaborators.url("auth")),
            ("DOCUMENTS_API_URL", collaborators.url("documents")),
            ("VISIT_COUNTER_URL", collaborators.url("visits")),
            ("PRICE_FEED_URL", collaborators.url("price")),
        ];
        let config = StorefrontConfig::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        })
        .expect("test config");

        let state = build_state(&config, local.clone());
        Self {
            app: cartoon_cart_storefront::app(state.clone()),
            state,
            config,
            collaborators,
            data_dir,
            local,
        }
    }

    /// Simulate a server restart: fresh state and session over the same
    /// persistent storage.
    pub fn restart(&mut self) {
        self.state = build_state(&self.config, self.local.clone());
        self.app = cartoon_cart_storefront::app(self.state.clone());
    }

    /// Storage over the data directory (the persistent storage unless one was
    /// injected).
    #[must_use]
    pub fn local_storage(&self) -> FileStorage {
        FileStorage::open(self.data_dir.path()).expect("open data dir")
    }

    /// Send a request and decode the JSON response (or `Null` for no body).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, headers, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).expect("request");
        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    pub async fn post(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    /// Post `multipart/form-data`. Parts are `(field, file name, content)`.
    pub async fn post_multipart(
        &self,
        uri: &str,
        parts: &[(&str, Option<&str>, &[u8])],
    ) -> (StatusCode, Value) {
        let boundary = format!("cartoon-cart-{}", uuid::Uuid::new_v4().simple());
        let mut body = Vec::new();
        for (field, file_name, content) in parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        let request = Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request");
        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    /// Sign in as the fake auth API's known user.
    pub async fn sign_in(&self) -> Value {
        let (status, body) = self
            .post("/auth/login", &json!({ "login": LOGIN, "password": PASSWORD }))
            .await;
        assert_eq!(status, StatusCode::OK, "sign-in failed: {body}");
        body
    }
}

fn build_state(config: &StorefrontConfig, local: Option<Arc<dyn Storage>>) -> AppState {
    let local = local.unwrap_or_else(|| -> Arc<dyn Storage> {
        Arc::new(FileStorage::open(&config.data_dir).expect("open data dir"))
    });
    let session: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    AppState::new(config.clone(), local, session, PriceTicker::new()).expect("app state")
}
