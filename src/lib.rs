mod client;
mod query;
mod resource;
mod service;

pub use client::{
    ClientConfig, ClientConfigBuilder, ClientConfigBuilderError, GcdClient, DEFAULT_PREFIX,
    DEFAULT_USER_AGENT, SESSION_COOKIE,
};
pub use query::{Format, IssueQuery, SeriesQuery};
pub use resource::{Issue, Series, SeriesPage, StorySet};
pub use service::{Cookie, HttpRequest, HttpResponse, ReqwestTransport, TransportError};

/// Validation failures of a query, raised before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("invalid issue id {0}, it needs to be greater than zero")]
    InvalidIssueId(i64),
    #[error("invalid series id {0}, if provided it needs to be greater than zero")]
    NegativeSeriesId(i64),
    #[error("invalid series id {0}, it needs to be greater than zero")]
    InvalidSeriesId(i64),
    #[error("cannot specify both series id and name")]
    IdAndName,
}

#[derive(Debug, thiserror::Error)]
pub enum GcdError {
    #[error("failed to construct {operation} url: {source}")]
    Request {
        operation: &'static str,
        #[source]
        source: QueryError,
    },
    #[error("transport error: {0}")]
    Transport(#[source] tower::BoxError),
    #[error("request cancelled")]
    Cancelled,
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),
    #[error(transparent)]
    DeserializeError(#[from] serde_json::Error),
    #[error("invalid url '{0}'")]
    UrlParseError(String),
    #[error(transparent)]
    Config(#[from] ClientConfigBuilderError),
}
