//! Test-only loopback HTTP server answering exactly one request.

use axum::Router;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

/// What the server saw of the request it answered.
#[derive(Debug)]
pub struct CapturedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: String,
}

impl CapturedRequest {
    pub fn query_param(&self, key: &str) -> Option<String> {
        url::form_urlencoded::parse(self.uri.query().unwrap_or_default().as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Answer the first request with `status` and a JSON `body`; the handle yields that request.
///
/// The server keeps running until the test's runtime shuts down.
pub async fn serve_once(status: StatusCode, body: String) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let app = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, payload: String| {
            let tx = tx.clone();
            let body = body.clone();
            async move {
                if let Some(tx) = tx.lock().await.take() {
                    let _ = tx.send(CapturedRequest {
                        method,
                        uri,
                        headers,
                        body: payload,
                    });
                }
                (status, [(header::CONTENT_TYPE, "application/json")], body)
            }
        },
    );
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let handle = tokio::spawn(async move { rx.await.unwrap() });
    (format!("http://{addr}"), handle)
}

/// Client that never routes loopback traffic through an environment proxy.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
