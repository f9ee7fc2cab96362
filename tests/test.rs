use gcd::{
    ClientConfigBuilder, Format, GcdClient, GcdError, HttpRequest, HttpResponse, IssueQuery,
    QueryError, SeriesQuery, DEFAULT_PREFIX, SESSION_COOKIE,
};
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, StatusCode};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::{service_fn, BoxError, ServiceBuilder};

const ISSUE: &str = include_str!("data/issue_2495111.json");
const SERIES: &str = include_str!("data/series_196803.json");
const SERIES_PAGE: &str = include_str!("data/series_superman_2023.json");

const PREFIX: &str = "http://localhost:8000/api/";

type Requests = Arc<Mutex<Vec<HttpRequest>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn response(status: StatusCode, body: &str) -> HttpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
    HttpResponse {
        status,
        headers,
        body: body.as_bytes().to_vec(),
    }
}

/// Transport answering from a table of url paths, 404 for anything else.
fn mock_transport(
    routes: &[(&str, &'static str)],
    requests: Requests,
) -> impl tower::Service<
    HttpRequest,
    Response = HttpResponse,
    Error = Infallible,
> + Clone {
    let routes: Arc<HashMap<String, &'static str>> = Arc::new(
        routes
            .iter()
            .map(|(path, body)| (path.to_string(), *body))
            .collect(),
    );
    service_fn(move |req: HttpRequest| {
        let routes = routes.clone();
        let requests = requests.clone();
        async move {
            let path = reqwest::Url::parse(&req.url).unwrap().path().to_string();
            requests.lock().unwrap().push(req);
            Ok::<_, Infallible>(match routes.get(&path) {
                Some(body) => response(StatusCode::OK, body),
                None => response(StatusCode::NOT_FOUND, r#"{"detail": "Not found."}"#),
            })
        }
    })
}

fn client_with(
    routes: &[(&str, &'static str)],
    session_id: Option<&str>,
) -> (
    GcdClient<impl tower::Service<HttpRequest, Response = HttpResponse, Error = Infallible> + Clone>,
    Requests,
) {
    init_tracing();
    let requests = Requests::default();
    let mut config = ClientConfigBuilder::default();
    config.prefix(PREFIX);
    if let Some(session_id) = session_id {
        config.session_id(session_id);
    }
    let client = GcdClient::new(
        config.build().unwrap(),
        mock_transport(routes, requests.clone()),
    );
    (client, requests)
}

#[tokio::test]
async fn test_issue() {
    let (client, requests) = client_with(&[("/api/issue/2495111/", ISSUE)], None);
    let issue = client.issue(&IssueQuery::new(2495111)).await.unwrap();
    assert_eq!(issue.story_set().len(), 4);
    assert_eq!(issue.publication_date(), "April 2023");
    let sequence: Vec<i32> = issue.story_set().iter().map(|x| *x.sequence_number()).collect();
    assert_eq!(sequence, [0, 1, 2, 3]);

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, Method::GET);
    assert_eq!(req.url, "http://localhost:8000/api/issue/2495111/");
    assert_eq!(req.headers[ACCEPT], "application/json");
    assert!(req.headers[USER_AGENT]
        .to_str()
        .unwrap()
        .starts_with("GCD Client/Rust"));
    assert!(req.cookie.is_none());
}

#[tokio::test]
async fn test_issue_with_format() {
    let (client, requests) = client_with(&[("/api/issue/2495111/", ISSUE)], None);
    client
        .issue(&IssueQuery::new(2495111).format(Format::Json))
        .await
        .unwrap();
    assert_eq!(
        requests.lock().unwrap()[0].url,
        "http://localhost:8000/api/issue/2495111/?format=json"
    );
}

#[tokio::test]
async fn test_series() {
    let (client, requests) = client_with(
        &[("/api/series/name/Superman/year/2023/", SERIES_PAGE)],
        None,
    );
    let page = client
        .series(&SeriesQuery::new().name("Superman").year(2023))
        .await
        .unwrap();
    assert_eq!(*page.count(), 2);
    assert_eq!(page.results().len(), *page.count());
    assert_eq!(page.results()[1].name(), "Superman");
    assert_eq!(
        requests.lock().unwrap()[0].url,
        "http://localhost:8000/api/series/name/Superman/year/2023/"
    );
}

#[tokio::test]
async fn test_series_instance() {
    let (client, _requests) = client_with(&[("/api/series/196803/", SERIES)], None);
    let series = client.series_instance(196803).await.unwrap();
    assert_eq!(series.active_issues().len(), 2);
    assert_eq!(series.name(), "Superman");
}

#[tokio::test]
async fn test_series_back_reference() {
    let (client, requests) = client_with(
        &[
            ("/api/issue/2495111/", ISSUE),
            ("/api/series/196803/", SERIES),
        ],
        None,
    );
    let issue = client.issue(&IssueQuery::new(2495111)).await.unwrap();
    let series = client
        .series_instance_from_url(&issue.series().replace(
            "https://www.comics.org/api/",
            "http://localhost:8000/api/",
        ))
        .await
        .unwrap();
    assert_eq!(series.api_url(), issue.series());
    assert_eq!(requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_series_session_id() {
    let (client, requests) = client_with(
        &[("/api/series/name/Batman/", SERIES_PAGE)],
        Some("foobar123"),
    );
    let page = client
        .series(&SeriesQuery::new().name("Batman"))
        .await
        .unwrap();
    assert_eq!(*page.count(), 2);

    client
        .series(&SeriesQuery::new().name("Batman"))
        .await
        .unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    for req in requests.iter() {
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.url, "http://localhost:8000/api/series/name/Batman/");
        let cookie = req.cookie.as_ref().unwrap();
        assert_eq!(cookie.name, SESSION_COOKIE);
        assert_eq!(cookie.name, "gcdsessionid");
        assert_eq!(cookie.value, "foobar123");
    }
}

#[tokio::test]
async fn test_unexpected_status() {
    let (client, _requests) = client_with(&[], None);
    assert!(matches!(
        client.issue(&IssueQuery::new(1)).await,
        Err(GcdError::UnexpectedStatus(404))
    ));
    assert!(matches!(
        client.series(&SeriesQuery::new().id(1)).await,
        Err(GcdError::UnexpectedStatus(404))
    ));
    assert!(matches!(
        client.series_instance(1).await,
        Err(GcdError::UnexpectedStatus(404))
    ));
}

#[tokio::test]
async fn test_invalid_query_is_not_sent() {
    let (client, requests) = client_with(&[], None);
    assert!(matches!(
        client.issue(&IssueQuery::new(0)).await,
        Err(GcdError::Request {
            operation: "issue",
            source: QueryError::InvalidIssueId(0)
        })
    ));
    assert!(matches!(
        client
            .series(&SeriesQuery::new().id(7096).name("Batman"))
            .await,
        Err(GcdError::Request {
            source: QueryError::IdAndName,
            ..
        })
    ));
    assert!(matches!(
        client.series_instance(-2).await,
        Err(GcdError::Request {
            source: QueryError::InvalidSeriesId(-2),
            ..
        })
    ));
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body() {
    let (client, _requests) = client_with(
        &[
            ("/api/issue/1/", "<html>oops</html>"),
            ("/api/series/1/", r#"{"name": "no api url"}"#),
        ],
        None,
    );
    assert!(matches!(
        client.issue(&IssueQuery::new(1)).await,
        Err(GcdError::DeserializeError(_))
    ));
    assert!(matches!(
        client.series_instance(1).await,
        Err(GcdError::DeserializeError(_))
    ));
}

#[tokio::test]
async fn test_transport_error() {
    init_tracing();
    let transport = service_fn(|_req: HttpRequest| async {
        Err::<HttpResponse, BoxError>("connection refused".into())
    });
    let client = GcdClient::new(Default::default(), transport);
    let err = client.issue(&IssueQuery::new(1)).await.unwrap_err();
    assert!(matches!(err, GcdError::Transport(_)));
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_timeout_is_cancelled() {
    init_tracing();
    let slow = service_fn(|_req: HttpRequest| async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok::<_, Infallible>(response(StatusCode::OK, ISSUE))
    });
    let transport = ServiceBuilder::new()
        .timeout(Duration::from_millis(10))
        .service(slow);
    let client = GcdClient::new(Default::default(), transport);
    assert!(matches!(
        client.issue(&IssueQuery::new(2495111)).await,
        Err(GcdError::Cancelled)
    ));
}

#[tokio::test]
async fn test_default_prefix() {
    init_tracing();
    let requests = Requests::default();
    let client = GcdClient::new(
        ClientConfigBuilder::default().build().unwrap(),
        mock_transport(&[("/api/issue/2495111/", ISSUE)], requests.clone()),
    );
    client.issue(&IssueQuery::new(2495111)).await.unwrap();
    assert_eq!(
        requests.lock().unwrap()[0].url,
        format!("{DEFAULT_PREFIX}/issue/2495111/")
    );
}

#[tokio::test]
async fn test_series_rejects_instance_body() {
    let (client, _requests) = client_with(&[("/api/series/196803/", SERIES)], None);
    assert!(matches!(
        client.series(&SeriesQuery::new().id(196803)).await,
        Err(GcdError::DeserializeError(_))
    ));
    assert!(client.series_instance(196803).await.is_ok());
}

#[tokio::test]
async fn test_series_misaligned_issue_lists() {
    let (client, _requests) = client_with(
        &[(
            "/api/series/7/",
            r#"{"api_url": "a", "active_issues": ["x", "y", "z"], "issue_descriptors": ["1"]}"#,
        )],
        None,
    );
    assert!(matches!(
        client.series_instance(7).await,
        Err(GcdError::DeserializeError(_))
    ));
}
