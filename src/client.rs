use super::{GcdError, QueryError};
use crate::query::{IssueQuery, SeriesQuery};
use crate::resource::{Issue, Series, SeriesPage};
use crate::service::{Cookie, HttpRequest, HttpResponse, ReqwestTransport, TransportError};
use derive_builder::Builder;
use getset::Getters;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_CHARSET, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::fmt;
use tower::{BoxError, Service, ServiceExt};
use tracing::debug;
use tracing::instrument;

pub const DEFAULT_PREFIX: &str = "https://www.comics.org/api";
pub const DEFAULT_USER_AGENT: &str = concat!("GCD Client/Rust ", env!("CARGO_PKG_VERSION"));
/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "gcdsessionid";

#[derive(Clone, Builder, Getters)]
#[builder(build_fn(validate = "Self::validate"))]
#[getset(get = "pub")]
pub struct ClientConfig {
    #[builder(setter(into), default = "DEFAULT_PREFIX.to_string()")]
    prefix: String,
    #[builder(setter(into), default = "DEFAULT_USER_AGENT.to_string()")]
    user_agent: String,
    #[builder(setter(into, strip_option), default)]
    session_id: Option<String>,
}

impl ClientConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(prefix) = &self.prefix {
            if prefix.trim_end_matches('/').is_empty() {
                return Err("prefix must not be empty".to_string());
            }
        }
        if let Some(user_agent) = &self.user_agent {
            if HeaderValue::from_str(user_agent).is_err() {
                return Err(format!("invalid user agent '{user_agent}'"));
            }
        }
        if let Some(Some(session_id)) = &self.session_id {
            if HeaderValue::from_str(session_id).is_err() || session_id.contains(';') {
                return Err("invalid session id".to_string());
            }
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            session_id: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("prefix", &self.prefix)
            .field("user_agent", &self.user_agent)
            .field("session_id", &self.session_id.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Read-only client of the GCD api.
///
/// The transport is any `tower::Service` taking an [`HttpRequest`]. It is
/// cloned for every call, so a client can be shared between tasks.
#[derive(Debug, Clone)]
pub struct GcdClient<T = ReqwestTransport> {
    config: ClientConfig,
    headers: HeaderMap,
    transport: T,
}

impl GcdClient<ReqwestTransport> {
    /// Client with the default configuration over an HTTP/2 `reqwest` transport.
    pub fn with_defaults() -> Result<Self, GcdError> {
        let transport = ReqwestTransport::new().map_err(|e| GcdError::Transport(e.into()))?;
        Ok(Self::new(ClientConfig::default(), transport))
    }
}

impl<T> GcdClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("utf-8"));
        // the builder already rejected user agents which are not valid headers
        if let Ok(user_agent) = HeaderValue::from_str(config.user_agent()) {
            headers.insert(USER_AGENT, user_agent);
        }
        if let Some(session_id) = config.session_id() {
            debug!(
                "session id configured: {}",
                session_id.replace(|c: char| c.is_alphanumeric(), "*")
            );
        }
        Self {
            config,
            headers,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, url: &str) -> HttpRequest {
        HttpRequest {
            method: Method::GET,
            url: url.to_string(),
            headers: self.headers.clone(),
            cookie: self.config.session_id.as_ref().map(|value| Cookie {
                name: SESSION_COOKIE.to_string(),
                value: value.clone(),
            }),
        }
    }
}

impl<T> GcdClient<T>
where
    T: Service<HttpRequest, Response = HttpResponse> + Clone,
    T::Error: Into<BoxError>,
{
    #[instrument(skip(self))]
    pub async fn issue(&self, query: &IssueQuery) -> Result<Issue, GcdError> {
        let url = query
            .url(self.config.prefix())
            .map_err(|source| GcdError::Request {
                operation: "issue",
                source,
            })?;
        self.issue_from_url(&url).await
    }

    /// Fetches an issue from a url as found in `Series::active_issues` or
    /// `Issue::variant_of`.
    #[instrument(skip(self))]
    pub async fn issue_from_url(&self, url: &str) -> Result<Issue, GcdError> {
        self.get(url).await
    }

    #[instrument(skip(self))]
    pub async fn series(&self, query: &SeriesQuery) -> Result<SeriesPage, GcdError> {
        let url = query
            .url(self.config.prefix())
            .map_err(|source| GcdError::Request {
                operation: "series",
                source,
            })?;
        self.series_from_url(&url).await
    }

    /// Fetches a page of series, typically `SeriesPage::next` or
    /// `SeriesPage::previous` of an earlier page.
    #[instrument(skip(self))]
    pub async fn series_from_url(&self, url: &str) -> Result<SeriesPage, GcdError> {
        self.get(url).await
    }

    #[instrument(skip(self))]
    pub async fn series_instance(&self, id: i64) -> Result<Series, GcdError> {
        let url = if id > 0 {
            SeriesQuery::new().id(id).url(self.config.prefix())
        } else {
            Err(QueryError::InvalidSeriesId(id))
        }
        .map_err(|source| GcdError::Request {
            operation: "series instance",
            source,
        })?;
        self.series_instance_from_url(&url).await
    }

    /// Fetches a single series, e.g. the one referenced by `Issue::series`.
    #[instrument(skip(self))]
    pub async fn series_instance_from_url(&self, url: &str) -> Result<Series, GcdError> {
        self.get(url).await
    }

    async fn get<R: DeserializeOwned>(&self, url: &str) -> Result<R, GcdError> {
        let req = self.request(url);
        debug!(?req);
        let response = self
            .transport
            .clone()
            .oneshot(req)
            .await
            .map_err(|e| transport_error(e.into()))?;
        debug!(status = %response.status, bytes = response.body.len());
        if !response.status.is_success() {
            return Err(GcdError::UnexpectedStatus(response.status.as_u16()));
        }
        Ok(serde_json::from_slice(&response.body)?)
    }
}

fn transport_error(e: BoxError) -> GcdError {
    let cancelled = e.is::<tower::timeout::error::Elapsed>()
        || matches!(
            e.downcast_ref::<TransportError>(),
            Some(TransportError::Cancelled)
        );
    if cancelled {
        GcdError::Cancelled
    } else {
        GcdError::Transport(e)
    }
}
