//! In-process fake blobstore used by the integration tests.
//!
//! Serves objects under `/deeper/` and listings under `/deeper/_dir/`,
//! recording every request it receives.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use blobstore::sdk::{BlobStoreClient, DirectCredentialProvider};

pub const READ_SECRET: &str = "read secret";
pub const WRITE_SECRET: &str = "write secret";
pub const NOT_FOUND_BODY: &str = "{\"code\":\"NotFound\",\"message\":\"File not found\"}";

const BASE_PATH: &str = "/deeper/";
const LIST_PATH: &str = "_dir/";

/// A request as seen by the fake server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub read_acl: Option<String>,
    pub write_acl: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Default)]
struct FakeState {
    objects: BTreeMap<String, StoredObject>,
    requests: Vec<RecordedRequest>,
    fail_with: Option<(StatusCode, String)>,
}

type SharedState = Arc<Mutex<FakeState>>;

pub struct FakeBlobStore {
    pub base_url: String,
    state: SharedState,
    server: JoinHandle<()>,
}

impl FakeBlobStore {
    pub async fn start() -> Self {
        let state = SharedState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake blobstore");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake blobstore failed");
        });

        Self {
            base_url: format!("http://{}/deeper", addr),
            state,
            server,
        }
    }

    /// Client authorized with the test secrets.
    pub fn client(&self) -> BlobStoreClient {
        client_for(&self.base_url)
    }

    pub fn put(&self, path: &str, content_type: &str, contents: &[u8]) {
        self.state.lock().unwrap().objects.insert(
            path.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                contents: contents.to_vec(),
            },
        );
    }

    pub fn object(&self, path: &str) -> Option<StoredObject> {
        self.state.lock().unwrap().objects.get(path).cloned()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn methods(&self) -> Vec<Method> {
        self.requests().into_iter().map(|r| r.method).collect()
    }

    /// Answer every subsequent request with `status` and `body`.
    pub fn fail_with(&self, status: StatusCode, body: &str) {
        self.state.lock().unwrap().fail_with = Some((status, body.to_string()));
    }
}

impl Drop for FakeBlobStore {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Answer a single connection with a canned raw HTTP `response`, then close it.
///
/// Returns a base URL for a client. Used where the response must carry
/// headers an axum handler would rewrite.
pub async fn serve_raw_once(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind raw server");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });
    format!("http://{}/deeper", addr)
}

/// Client for a base URL not served by [`FakeBlobStore`].
pub fn client_for(base_url: &str) -> BlobStoreClient {
    BlobStoreClient::new(
        base_url,
        Arc::new(DirectCredentialProvider::new(READ_SECRET, WRITE_SECRET)),
    )
    .expect("Failed to create client")
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

fn list(objects: &BTreeMap<String, StoredObject>, prefix: &str, recursive: bool) -> Vec<String> {
    let mut entries = BTreeSet::new();
    for key in objects.keys().filter(|k| k.starts_with(prefix)) {
        let rest = &key[prefix.len()..];
        match rest.find('/') {
            Some(idx) if !recursive => {
                entries.insert(format!("{}{}", prefix, &rest[..=idx]));
            }
            _ => {
                entries.insert(key.clone());
            }
        }
    }
    entries.into_iter().collect()
}

async fn handle(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests.push(RecordedRequest {
        method: method.clone(),
        uri: uri.to_string(),
        read_acl: header_string(&headers, "X-BlobStore-Read-Acl"),
        write_acl: header_string(&headers, "X-BlobStore-Write-Acl"),
        content_type: header_string(&headers, "Content-Type"),
        body: body.to_vec(),
    });

    if let Some((status, body)) = state.fail_with.clone() {
        return (status, body).into_response();
    }

    let Some(key) = uri.path().strip_prefix(BASE_PATH) else {
        return not_found();
    };

    if let Some(prefix) = key.strip_prefix(LIST_PATH) {
        if method != Method::GET {
            return StatusCode::METHOD_NOT_ALLOWED.into_response();
        }
        let recursive = uri.query() == Some("recursive=true");
        return Json(list(&state.objects, prefix, recursive)).into_response();
    }

    match method {
        Method::GET | Method::HEAD => match state.objects.get(key) {
            Some(object) => (
                [(header::CONTENT_TYPE, object.content_type.clone())],
                object.contents.clone(),
            )
                .into_response(),
            None => not_found(),
        },
        Method::POST => {
            let content_type = header_string(&headers, "Content-Type").unwrap_or_default();
            state.objects.insert(
                key.to_string(),
                StoredObject {
                    content_type,
                    contents: body.to_vec(),
                },
            );
            StatusCode::OK.into_response()
        }
        Method::DELETE => match state.objects.remove(key) {
            Some(_) => StatusCode::OK.into_response(),
            None => not_found(),
        },
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}
