//! Router tests driven through `tower::ServiceExt::oneshot`

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use datawash::app::Settings;
use datawash::capability::Capabilities;
use datawash::config::Config;
use datawash::http::{create_router, AppState};

const BOUNDARY: &str = "datawash-test-boundary";
const SCORES: &str = "id,score\n1,10\n2,\n3,30\n";

enum Part<'a> {
    Field(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Field(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, content) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(content);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn router_with_limit(max_upload_bytes: usize) -> Router {
    let settings = Settings::default().with_capabilities(Capabilities::none());
    let state = AppState::new(&Config::default()).with_settings(settings);
    create_router(state, max_upload_bytes)
}

fn router() -> Router {
    router_with_limit(Config::default().max_upload_bytes)
}

async fn post(app: &Router, uri: &str, cookie: Option<&str>, parts: &[Part<'_>]) -> Response {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    let request = request.body(Body::from(multipart_body(parts))).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// `name=value` part of the Set-Cookie header
fn session_cookie(response: &Response) -> String {
    let value = response.headers()[header::SET_COOKIE].to_str().unwrap();
    value.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let response = get(&router(), "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["capabilities"]["charts"], false);
    assert_eq!(json["capabilities"]["xlsx_export"], false);
}

#[tokio::test]
async fn test_first_visit_issues_cookie() {
    let app = router();
    let response = get(&app, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert!(cookie.starts_with("datawash_session="));
    assert!(body_text(response).await.contains("action=\"/upload\""));

    let again = get(&app, "/", Some(&cookie)).await;
    assert!(again.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_upload_fill_export_remove() {
    let app = router();
    let cookie = session_cookie(&get(&app, "/", None).await);

    let response = post(
        &app,
        "/upload",
        Some(&cookie),
        &[Part::File("files", "data.csv", SCORES.as_bytes())],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Loaded 3 rows and 2 columns"));
    assert!(page.contains("data.csv"));

    let response = post(
        &app,
        "/export",
        Some(&cookie),
        &[
            Part::Field("file", "data.csv"),
            Part::Field("controls", "1"),
            Part::Field("fill_missing", "on"),
            Part::Field("columns", "id"),
            Part::Field("columns", "score"),
            Part::Field("format", "csv"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"data.csv\""
    );
    assert_eq!(body_text(response).await, "id,score\n1,10\n2,20\n3,30\n");

    // notices queued by the export show on the next page
    let page = body_text(get(&app, "/", Some(&cookie)).await).await;
    assert!(page.contains("Missing values filled"));
    assert!(page.contains("File ready for download"));

    let response = post(&app, "/remove", Some(&cookie), &[Part::Field("file", "data.csv")]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!body_text(response).await.contains("data.csv"));
}

#[tokio::test]
async fn test_excel_without_capability_shows_error() {
    let app = router();
    let cookie = session_cookie(&get(&app, "/", None).await);
    post(
        &app,
        "/upload",
        Some(&cookie),
        &[
            Part::File("files", "a.csv", SCORES.as_bytes()),
            Part::File("files", "b.csv", b"x\n1\n"),
        ],
    )
    .await;

    let response = post(
        &app,
        "/export",
        Some(&cookie),
        &[Part::Field("file", "a.csv"), Part::Field("format", "xlsx")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(body_text(response).await.contains("Excel export requires"));

    let response = post(
        &app,
        "/export",
        Some(&cookie),
        &[Part::Field("file", "b.csv"), Part::Field("format", "pdf")],
    )
    .await;
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = router();
    let alice = session_cookie(&get(&app, "/", None).await);
    let bob = session_cookie(&get(&app, "/", None).await);
    assert_ne!(alice, bob);

    post(
        &app,
        "/upload",
        Some(&alice),
        &[Part::File("files", "private.csv", SCORES.as_bytes())],
    )
    .await;

    let page = body_text(get(&app, "/", Some(&bob)).await).await;
    assert!(!page.contains("private.csv"));
}

#[tokio::test]
async fn test_unknown_file_is_a_page_warning() {
    let app = router();
    let response = post(&app, "/remove", None, &[Part::Field("file", "ghost.csv")]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No file named &#39;ghost.csv&#39;"));
}

#[tokio::test]
async fn test_malformed_requests() {
    let app = router();

    let response = post(&app, "/controls", None, &[Part::Field("fill_missing", "on")]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["code"], "BAD_REQUEST");

    let response = post(
        &app,
        "/export",
        None,
        &[Part::Field("file", "a.csv"), Part::Field("format", "docx")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("not a form"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let app = router_with_limit(256);
    let big = "n\n".to_string() + &"1\n".repeat(1024);
    let response = post(&app, "/upload", None, &[Part::File("files", "big.csv", big.as_bytes())]).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
