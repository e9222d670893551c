//! HTTP API integration tests.
//!
//! Requests go through the real router with `tower::ServiceExt::oneshot`.
//! Page fetching is stubbed and the chat-completion service is a wiremock
//! server, so nothing leaves the machine.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catalog_forge::{ProductExtractor, UploadStore};
use catalog_forge_server::error::NAVIGATION_FAILED;
use catalog_forge_server::fetcher::{FetchError, FetchedPage, PageFetcher};
use catalog_forge_server::llm::{OpenAiClient, TextGenerator, UnconfiguredGenerator};
use catalog_forge_server::{router, AppState};

// ─────────────────────── helpers ───────────────────────

const PRODUCT_PAGE: &str = r#"<html><body>
  <h1 class="product-title">Aurora Desk Lamp</h1>
  <div class="price">$49.00</div>
  <div class="product-description">Dimmable LED desk lamp with USB-C charging.</div>
  <div class="product-images">
    <img src="/img/lamp-front.jpg" alt="Front">
    <img src="/img/lamp-side.jpg">
  </div>
  <table><tr><td>Power</td><td>12W</td></tr></table>
</body></html>"#;

/// Serves a canned page, or fails navigation.
struct StubFetcher {
    fail: bool,
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        if self.fail {
            return Err(FetchError::Navigation("net::ERR_CONNECTION_REFUSED".into()));
        }
        Ok(FetchedPage {
            html: PRODUCT_PAGE.to_string(),
            final_url: url.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

fn app_with(
    dir: &tempfile::TempDir,
    fail_fetch: bool,
    generator: Arc<dyn TextGenerator>,
) -> Router {
    let state = AppState::new(
        ProductExtractor::with_defaults().unwrap(),
        UploadStore::open(dir.path()).unwrap(),
        Arc::new(StubFetcher { fail: fail_fetch }),
        generator,
    );
    router(state)
}

fn app(dir: &tempfile::TempDir) -> Router {
    app_with(dir, false, Arc::new(UnconfiguredGenerator))
}

/// Mock chat-completions endpoint answering with `reply`.
async fn openai_replying(reply: &str) -> (MockServer, Arc<dyn TextGenerator>) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": reply}}]
        })))
        .mount(&server)
        .await;
    let client = OpenAiClient::new("sk-test".into(), "gpt-4".into(), server.uri()).unwrap();
    (server, Arc::new(client))
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send_raw(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, headers, bytes.to_vec())
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(app, req).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::new_rgb8(width, height);
    let mut buf = Vec::new();
    img.write_with_encoder(image::codecs::png::PngEncoder::new(&mut buf))
        .unwrap();
    buf
}

fn multipart_request(field: &str, files: &[(&str, &str, Vec<u8>)]) -> Request<Body> {
    let boundary = "catalogforgeboundary";
    let mut body = Vec::new();
    for (name, mime, bytes) in files {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{name}\"\r\n\
                 Content-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/images/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn product_input() -> Value {
    json!({
        "title": "Aurora Desk Lamp",
        "description": "Dimmable LED desk lamp.",
        "specifications": {"Power": "12W"},
        "price": "$49.00",
        "url": "https://shop.example/lamp"
    })
}

// ─────────────────────── health & scrape ───────────────────────

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let req = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app(&dir), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["fetcher"], "stub");
}

#[tokio::test]
async fn test_scrape_extracts_product() {
    let dir = tempfile::tempdir().unwrap();
    let req = json_request(
        Method::POST,
        "/api/scrape",
        json!({"url": "https://shop.example/lamp"}),
    );
    let (status, body) = send(&app(&dir), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["title"], "Aurora Desk Lamp");
    assert_eq!(data["price"], "$49.00");
    assert_eq!(data["sourceUrl"], "https://shop.example/lamp");
    assert_eq!(data["specifications"]["Power"], "12W");
    assert_eq!(data["images"][0]["url"], "https://shop.example/img/lamp-front.jpg");
    assert_eq!(data["images"][1]["alt"], "Product image");
}

#[tokio::test]
async fn test_scrape_rejects_bad_url() {
    let dir = tempfile::tempdir().unwrap();
    let req = json_request(Method::POST, "/api/scrape", json!({"url": "not-a-url"}));
    let (status, body) = send(&app(&dir), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Validation error");
}

#[tokio::test]
async fn test_scrape_navigation_failure() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(&dir, true, Arc::new(UnconfiguredGenerator));
    let req = json_request(
        Method::POST,
        "/api/scrape",
        json!({"url": "https://down.example/"}),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], NAVIGATION_FAILED);
    assert_eq!(body["message"], "net::ERR_CONNECTION_REFUSED");
}

#[tokio::test]
async fn test_malformed_json_uses_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/scrape")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app(&dir), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

// ─────────────────────── content generation ───────────────────────

#[tokio::test]
async fn test_generate_content_parses_fenced_reply() {
    let dir = tempfile::tempdir().unwrap();
    let reply = "Here you go:\n```json\n{\"title\": \"Aurora Pro Lamp\", \"description\": \"Light that adapts.\", \"features\": [\"Dimmable\", \"USB-C\"], \"benefits\": [\"Less eye strain\"], \"keywords\": [\"lamp\"], \"category\": \"Lighting\", \"targetAudience\": \"Home office\", \"specifications\": {\"Colour\": \"White\"}}\n```";
    let (_server, generator) = openai_replying(reply).await;
    let app = app_with(&dir, false, generator);

    let req = json_request(
        Method::POST,
        "/api/ai/generate-content",
        json!({"productData": product_input(), "options": {"tone": "casual"}}),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["title"], "Aurora Pro Lamp");
    assert_eq!(data["features"], json!(["Dimmable", "USB-C"]));
    assert_eq!(data["specifications"]["Power"], "12W");
    assert_eq!(data["specifications"]["Colour"], "White");
    assert_eq!(data["targetAudience"], "Home office");
}

#[tokio::test]
async fn test_generate_content_falls_back_on_prose() {
    let dir = tempfile::tempdir().unwrap();
    let (_server, generator) = openai_replying("Sorry, I cannot help with that.").await;
    let app = app_with(&dir, false, generator);

    let req = json_request(
        Method::POST,
        "/api/ai/generate-content",
        json!({"productData": product_input()}),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Aurora Desk Lamp");
    assert_eq!(body["data"]["category"], "General Product");
    assert_eq!(body["data"]["features"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_generate_content_service_failure_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let req = json_request(
        Method::POST,
        "/api/ai/generate-content",
        json!({"productData": product_input()}),
    );
    let (status, body) = send(&app(&dir), req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate AI content");
}

#[tokio::test]
async fn test_generate_content_requires_title() {
    let dir = tempfile::tempdir().unwrap();
    let mut product = product_input();
    product["title"] = json!("  ");
    let req = json_request(
        Method::POST,
        "/api/ai/generate-content",
        json!({"productData": product}),
    );
    let (status, _) = send(&app(&dir), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_suggestions() {
    let dir = tempfile::tempdir().unwrap();
    let (_server, generator) =
        openai_replying(r#"{"titleSuggestions": ["Aurora Lamp: Light Your Desk"]}"#).await;
    let app = app_with(&dir, false, generator);
    let req = json_request(
        Method::POST,
        "/api/ai/suggest-improvements",
        json!({"productData": product_input()}),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["titleSuggestions"][0], "Aurora Lamp: Light Your Desk");
}

#[tokio::test]
async fn test_suggestions_validate_product() {
    let dir = tempfile::tempdir().unwrap();
    let (server, generator) = openai_replying("{}").await;
    let app = app_with(&dir, false, generator);

    for (field, value) in [("title", ""), ("description", " "), ("url", "not-a-url")] {
        let mut product = product_input();
        product[field] = json!(value);
        let req = json_request(
            Method::POST,
            "/api/ai/suggest-improvements",
            json!({"productData": product}),
        );
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{field}");
        assert_eq!(body["error"], "Validation error");
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ─────────────────────── images ───────────────────────

#[tokio::test]
async fn test_upload_serve_optimize_delete() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let req = multipart_request("images", &[("lamp.png", "image/png", png(1600, 800))]);
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let uploaded = &body["data"][0];
    assert_eq!(uploaded["originalName"], "lamp.png");
    assert_eq!(uploaded["width"], 1600);
    assert_eq!(uploaded["format"], "webp");
    let id = uploaded["id"].as_str().unwrap().to_string();
    let url = uploaded["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));

    let (status, headers, bytes) =
        send_raw(&app, Request::get(url.as_str()).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/webp");
    let stored = image::load_from_memory(&bytes).unwrap();
    assert_eq!((stored.width(), stored.height()), (1200, 600));

    let req = json_request(
        Method::POST,
        &format!("/api/images/optimize/{id}"),
        json!({"width": 300, "format": "jpeg", "quality": 70}),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let optimized_url = body["data"]["url"].as_str().unwrap();
    assert!(optimized_url.ends_with("-q70.jpeg"));
    let (status, _, _) =
        send_raw(&app, Request::get(optimized_url).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let delete = || {
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/images/{id}"))
            .body(Body::empty())
            .unwrap()
    };
    let (status, body) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Image deleted successfully");
    let (status, body) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_upload_rejects_other_types() {
    let dir = tempfile::tempdir().unwrap();
    let req = multipart_request("images", &[("notes.gif", "image/gif", b"GIF89a".to_vec())]);
    let (status, body) = send(&app(&dir), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Only JPEG, PNG, and WebP"));
}

#[tokio::test]
async fn test_upload_without_files() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(
        &app(&dir),
        multipart_request("attachment", &[("lamp.png", "image/png", png(10, 10))]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No files uploaded");
}

#[tokio::test]
async fn test_optimize_rejects_traversal_id() {
    let dir = tempfile::tempdir().unwrap();
    let req = json_request(Method::POST, "/api/images/optimize/..%2Fsecret", json!({}));
    let (status, _) = send(&app(&dir), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stock_search() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let req = json_request(
        Method::POST,
        "/api/images/search-unsplash",
        json!({"query": "desk lamp", "count": 3, "orientation": "squarish"}),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["data"][0]["orientation"], "squarish");

    let req = json_request(Method::POST, "/api/images/search-unsplash", json!({"query": "a"}));
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─────────────────────── catalog & export ───────────────────────

async fn assembled_catalog(app: &Router) -> Value {
    let req = json_request(Method::POST, "/api/scrape", json!({"url": "https://shop.example/lamp"}));
    let (_, scraped) = send(app, req).await;
    let generated = json!({
        "title": "Aurora Desk Lamp",
        "description": "A lamp that makes late nights easier on the eyes. ".repeat(10),
        "specifications": {"Power": "12W"},
        "features": ["Dimmable", "USB-C charging"],
        "benefits": ["Less eye strain"],
        "keywords": ["lamp"],
        "category": "Lighting",
        "targetAudience": "Home office"
    });
    let req = json_request(
        Method::POST,
        "/api/catalog/assemble",
        json!({"product": scraped["data"], "generatedContent": generated}),
    );
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    body["data"].clone()
}

#[tokio::test]
async fn test_assemble_and_edit() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    let catalog = assembled_catalog(&app).await;
    assert_eq!(catalog["images"].as_array().unwrap().len(), 2);
    assert_eq!(catalog["contentBlocks"][0]["type"], "imageGallery");
    assert_eq!(catalog["layout"]["colorScheme"], "blue");

    let req = json_request(
        Method::POST,
        "/api/catalog/edit",
        json!({
            "catalog": catalog,
            "edits": [
                {"op": "reorderImages", "imageIds": ["img2", "img1"]},
                {"op": "addFeature", "text": "Touch controls"},
                {"op": "setLayout", "layout": {"theme": "minimal", "colorScheme": "green", "typography": "serif"}}
            ]
        }),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let edited = &body["data"];
    assert_eq!(edited["images"][0]["id"], "img2");
    assert_eq!(edited["images"][0]["position"], 0);
    assert_eq!(edited["generatedContent"]["features"][2], "Touch controls");
    assert_eq!(edited["layout"]["theme"], "minimal");

    let req = json_request(
        Method::POST,
        "/api/catalog/edit",
        json!({"catalog": catalog, "edits": [{"op": "removeBenefit", "index": 7}]}),
    );
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_pdf_and_docx() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    let catalog = assembled_catalog(&app).await;

    let req = json_request(
        Method::POST,
        "/api/export/pdf",
        json!({"catalogData": catalog, "format": "pdf"}),
    );
    let (status, headers, bytes) = send_raw(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Aurora-Desk-Lamp.pdf\""
    );
    assert!(bytes.starts_with(b"%PDF-"));

    let req = json_request(
        Method::POST,
        "/api/export/docx",
        json!({"catalogData": catalog, "format": "docx", "options": {"includeBenefits": false}}),
    );
    let (status, headers, bytes) = send_raw(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .contains("wordprocessingml"));
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_export_rejects_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    let catalog = assembled_catalog(&app).await;
    let req = json_request(
        Method::POST,
        "/api/export/pdf",
        json!({"catalogData": catalog, "format": "rtf"}),
    );
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
