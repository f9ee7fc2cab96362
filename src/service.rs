use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Method, StatusCode};
use std::fmt::Debug;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::Service;
use tracing::debug;
use tracing::debug_span;
use tracing::Instrument;

/// A named cookie sent along with a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Debug for Cookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cookie")
            .field("name", &self.name)
            .field("value", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub cookie: Option<Cookie>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    RequestError(#[from] reqwest::Error),
    #[error("invalid cookie value for '{0}'")]
    InvalidCookie(String),
    #[error("request timed out")]
    Cancelled,
}

/// Default transport, backed by a `reqwest` client that only speaks HTTP/2.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::builder(reqwest::Client::builder())
    }

    /// Aborts requests which take longer than `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        Self::builder(reqwest::Client::builder().timeout(timeout))
    }

    fn builder(builder: reqwest::ClientBuilder) -> Result<Self, TransportError> {
        let client = builder.http2_prior_knowledge().build()?;
        Ok(Self { client })
    }

    /// Wraps an existing client. The remote service rejects anything but
    /// HTTP/2, so `client` must be configured accordingly.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Service<HttpRequest> for ReqwestTransport {
    type Response = HttpResponse;
    type Error = TransportError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: HttpRequest) -> Self::Future {
        let client = self.client.clone();
        let span = debug_span!("reqwest_transport", method = %req.method, url = %req.url);
        let fut = async move {
            let mut headers = req.headers;
            if let Some(cookie) = &req.cookie {
                let value = HeaderValue::from_str(&format!("{}={}", cookie.name, cookie.value))
                    .map_err(|_e| TransportError::InvalidCookie(cookie.name.clone()))?;
                headers.append(COOKIE, value);
            }

            let response = client
                .request(req.method, &req.url)
                .headers(headers)
                .send()
                .await
                .map_err(timeout_as_cancelled)?;
            let status = response.status();
            let headers = response.headers().clone();
            debug!(%status, version = ?response.version());
            let body = response
                .bytes()
                .await
                .map_err(timeout_as_cancelled)?
                .to_vec();
            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        };

        Box::pin(fut.instrument(span))
    }
}

fn timeout_as_cancelled(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Cancelled
    } else {
        TransportError::RequestError(e)
    }
}
