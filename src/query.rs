use super::{GcdError, QueryError};
use reqwest::IntoUrl;
use std::fmt;

/// Response format requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Api,
    Json,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Api => "api",
            Format::Json => "json",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup of a single issue by its database id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueQuery {
    pub(crate) id: i64,
    pub(crate) format: Option<Format>,
}

/// Lookup of series, either a specific one by id or a listing by name.
///
/// `issue_no` is a position within the series, not an issue id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesQuery {
    pub(crate) id: Option<i64>,
    pub(crate) name: Option<String>,
    pub(crate) issue_no: Option<i64>,
    pub(crate) year: Option<i64>,
    pub(crate) format: Option<Format>,
    pub(crate) page: Option<u32>,
}

impl IssueQuery {
    pub fn new(id: i64) -> Self {
        Self { id, format: None }
    }

    /// Accepts links such as `https://www.comics.org/issue/2495111/`.
    pub fn from_url(url: impl IntoUrl + Clone + ToString) -> Result<Self, GcdError> {
        id_from_url(url, "issue").map(Self::new)
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn url(&self, prefix: &str) -> Result<String, QueryError> {
        if self.id <= 0 {
            return Err(QueryError::InvalidIssueId(self.id));
        }

        let mut url = format!("{}/issue/{}/", trim_prefix(prefix), self.id);
        let mut params = Vec::new();
        if let Some(format) = self.format {
            params.push(format!("format={format}"));
        }
        push_params(&mut url, &params);
        Ok(url)
    }
}

impl SeriesQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts links such as `https://www.comics.org/series/196803/`.
    pub fn from_url(url: impl IntoUrl + Clone + ToString) -> Result<Self, GcdError> {
        id_from_url(url, "series").map(|id| Self::new().id(id))
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// The series id, when one greater than zero is set.
    pub fn series_id(&self) -> Option<i64> {
        self.id.filter(|x| *x > 0)
    }

    pub fn name(mut self, name: impl ToString) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn issue_no(mut self, issue_no: i64) -> Self {
        self.issue_no = Some(issue_no);
        self
    }

    pub fn year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Renders the query against `prefix`.
    ///
    /// Path segments always come in the order id or name, issue number, year.
    /// The name is inserted as given, without percent-encoding.
    pub fn url(&self, prefix: &str) -> Result<String, QueryError> {
        let id = self.id.unwrap_or(0);
        if id < 0 {
            return Err(QueryError::NegativeSeriesId(id));
        }
        let name = self.name.as_deref().unwrap_or("");
        if id > 0 && !name.is_empty() {
            return Err(QueryError::IdAndName);
        }

        let mut url = format!("{}/series", trim_prefix(prefix));
        if id > 0 {
            url.push_str(&format!("/{id}"));
        }
        if !name.is_empty() {
            url.push_str(&format!("/name/{name}"));
        }
        if let Some(issue_no) = self.issue_no.filter(|x| *x > 0) {
            url.push_str(&format!("/issue/{issue_no}"));
        }
        if let Some(year) = self.year.filter(|x| *x > 0) {
            url.push_str(&format!("/year/{year}"));
        }
        url.push('/');

        let mut params = Vec::new();
        if let Some(format) = self.format {
            params.push(format!("format={format}"));
        }
        if let Some(page) = self.page.filter(|x| *x > 0) {
            params.push(format!("page={page}"));
        }
        push_params(&mut url, &params);
        Ok(url)
    }
}

fn trim_prefix(prefix: &str) -> &str {
    prefix.strip_suffix('/').unwrap_or(prefix)
}

fn push_params(url: &mut String, params: &[String]) {
    if !params.is_empty() {
        url.push('?');
        url.push_str(&params.join("&"));
    }
}

fn id_from_url(url: impl IntoUrl + Clone + ToString, kind: &str) -> Result<i64, GcdError> {
    let url = url
        .clone()
        .into_url()
        .map_err(|_e| GcdError::UrlParseError(url.to_string()))?;
    if !url
        .domain()
        .is_some_and(|x| x == "comics.org" || x.ends_with(".comics.org"))
    {
        return Err(GcdError::UrlParseError(url.to_string()));
    }
    if let Some(mut segments) = url.path_segments().map(Iterator::peekable) {
        let _ = segments.next_if_eq(&"api");
        if segments.next().is_some_and(|x| x == kind) {
            if let Some(id) = segments
                .next()
                .and_then(|x| x.parse::<i64>().ok())
                .filter(|x| *x > 0)
            {
                return Ok(id);
            }
        }
    }
    Err(GcdError::UrlParseError(url.to_string()))
}
