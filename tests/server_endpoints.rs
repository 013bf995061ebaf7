//! HTTP surface tests using actix-web's test harness

#![cfg(feature = "server")]

mod common;

use actix_web::{
    http::{header, StatusCode},
    test, web, App,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bg_studio::{
    content,
    error::MISSING_IMAGE_MESSAGE,
    server::{configure_routes, AppState, SESSION_COOKIE, SESSION_HEADER},
    BlurIntensity, ExampleCatalog, Gateway, ProcessingBackend, QuotaBackend,
};
use common::{multipart_body, multipart_content_type, png_bytes, FormField, RecordedCall, RecordingBackend};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

const MAX_UPLOAD: usize = 1024 * 1024;

fn state(backend: Arc<dyn ProcessingBackend>, catalog: ExampleCatalog) -> web::Data<AppState> {
    web::Data::new(AppState::new(Gateway::new(backend), catalog, MAX_UPLOAD))
}

fn upload(uri: &str, fields: &[FormField<'_>]) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((header::CONTENT_TYPE, multipart_content_type()))
        .set_payload(multipart_body(fields))
}

#[actix_web::test]
async fn test_index_and_static_content() {
    let app = test::init_service(
        App::new()
            .app_data(state(Arc::new(RecordingBackend::new()), ExampleCatalog::empty()))
            .configure(configure_routes),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let page = String::from_utf8(body.to_vec()).unwrap();
    assert!(page.contains(content::TITLE));
    assert!(page.contains("Want unlimited generations?"));

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/static/style.css").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/css"));

    let health: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request())
            .await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["backend"], "recording");
}

#[actix_web::test]
async fn test_upscale_returns_comparison_pair() {
    let backend = Arc::new(RecordingBackend::new());
    let app = test::init_service(
        App::new()
            .app_data(state(backend.clone(), ExampleCatalog::empty()))
            .configure(configure_routes),
    )
    .await;

    let bytes = png_bytes(12, 9);
    let req = upload("/api/upscale", &[FormField::file("image", bytes.clone())]).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .response()
        .cookies()
        .any(|cookie| cookie.name() == SESSION_COOKIE));

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["original"],
        format!("data:image/png;base64,{}", STANDARD.encode(&bytes))
    );
    assert!(body["processed"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert_eq!(body["width"], 12);
    assert_eq!(body["height"], 9);
    assert_eq!(body["processed_width"], 24);
    assert_eq!(body["processed_height"], 18);
    assert_eq!(body["feature"], "upscale");
    assert!(body["request_id"].is_string());
    assert_eq!(backend.call_count(), 1);
}

#[actix_web::test]
async fn test_missing_image_is_bad_request() {
    let backend = Arc::new(RecordingBackend::new());
    let app = test::init_service(
        App::new()
            .app_data(state(backend.clone(), ExampleCatalog::empty()))
            .configure(configure_routes),
    )
    .await;

    for uri in ["/api/remove-background", "/api/upscale", "/api/blur"] {
        let req = upload(uri, &[FormField::file("image", Vec::new())]).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], MISSING_IMAGE_MESSAGE);
    }

    let req = upload("/api/upscale", &[FormField::file("image", b"not an image".to_vec())]).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert_eq!(backend.call_count(), 0);
}

#[actix_web::test]
async fn test_missing_image_reported_before_invalid_options() {
    let backend = Arc::new(RecordingBackend::new());
    let app = test::init_service(
        App::new()
            .app_data(state(backend.clone(), ExampleCatalog::empty()))
            .configure(configure_routes),
    )
    .await;

    let cases = [
        ("/api/remove-background", FormField::text("background_color", "green")),
        ("/api/blur", FormField::text("intensity", "strong")),
    ];
    for (uri, field) in cases {
        let req = upload(uri, &[field]).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], MISSING_IMAGE_MESSAGE, "{}", uri);
    }
    assert_eq!(backend.call_count(), 0);
}

#[actix_web::test]
async fn test_blur_and_remove_background_options() {
    let backend = Arc::new(RecordingBackend::new());
    let app = test::init_service(
        App::new()
            .app_data(state(backend.clone(), ExampleCatalog::empty()))
            .configure(configure_routes),
    )
    .await;

    let req = upload(
        "/api/blur",
        &[
            FormField::file("image", png_bytes(6, 6)),
            FormField::text("intensity", "0.0"),
        ],
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = upload("/api/blur", &[FormField::file("image", png_bytes(6, 6))]).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = upload(
        "/api/remove-background",
        &[
            FormField::file("image", png_bytes(6, 6)),
            FormField::file("background_image", png_bytes(3, 2)),
            FormField::text("background_color", "#ff0000"),
        ],
    )
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = upload(
        "/api/remove-background",
        &[
            FormField::file("image", png_bytes(6, 6)),
            FormField::text("background_color", "crimson"),
        ],
    )
    .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let calls = backend.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0],
        RecordedCall::BlurBackground {
            size: (6, 6),
            intensity: BlurIntensity::new(0.1),
        }
    );
    assert_eq!(
        calls[1],
        RecordedCall::BlurBackground {
            size: (6, 6),
            intensity: BlurIntensity::default(),
        }
    );
    assert!(matches!(
        calls[2],
        RecordedCall::RemoveBackground {
            background_image: Some((3, 2)),
            background_color: Some(_),
            ..
        }
    ));
}

#[actix_web::test]
async fn test_backend_failure_maps_to_bad_gateway() {
    let app = test::init_service(
        App::new()
            .app_data(state(
                Arc::new(RecordingBackend::failing("upstream exploded")),
                ExampleCatalog::empty(),
            ))
            .configure(configure_routes),
    )
    .await;

    let req = upload("/api/upscale", &[FormField::file("image", png_bytes(4, 4))]).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("upstream exploded"));
}

#[actix_web::test]
async fn test_quota_is_tracked_per_session_header() {
    let recording = Arc::new(RecordingBackend::new());
    let app = test::init_service(
        App::new()
            .app_data(state(
                Arc::new(QuotaBackend::new(recording.clone(), 1)),
                ExampleCatalog::empty(),
            ))
            .configure(configure_routes),
    )
    .await;

    let request = |session: &str| {
        upload("/api/upscale", &[FormField::file("image", png_bytes(4, 4))])
            .insert_header((SESSION_HEADER, session.to_string()))
            .to_request()
    };

    assert_eq!(test::call_service(&app, request("a")).await.status(), StatusCode::OK);
    assert_eq!(
        test::call_service(&app, request("a")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(test::call_service(&app, request("b")).await.status(), StatusCode::OK);
    assert_eq!(recording.sessions(), vec!["a", "b"]);
}

#[actix_web::test]
async fn test_oversized_upload_is_rejected() {
    let backend = Arc::new(RecordingBackend::new());
    let app = test::init_service(
        App::new()
            .app_data(state(backend.clone(), ExampleCatalog::empty()))
            .configure(configure_routes),
    )
    .await;

    let req = upload(
        "/api/upscale",
        &[FormField::file("image", vec![0u8; MAX_UPLOAD + 1])],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(backend.call_count(), 0);
}

#[actix_web::test]
async fn test_example_gallery_endpoints() {
    let dir = TempDir::new().unwrap();
    let upscale_dir = dir.path().join("upscale");
    std::fs::create_dir_all(&upscale_dir).unwrap();
    let sample = png_bytes(5, 5);
    std::fs::write(upscale_dir.join("cat.png"), &sample).unwrap();
    std::fs::write(upscale_dir.join("notes.txt"), b"not an example").unwrap();

    let app = test::init_service(
        App::new()
            .app_data(state(
                Arc::new(RecordingBackend::new()),
                ExampleCatalog::scan(dir.path()),
            ))
            .configure(configure_routes),
    )
    .await;

    let listing: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/examples/upscale").to_request(),
    )
    .await;
    assert_eq!(listing["feature"], "upscale");
    assert_eq!(listing["page_count"], 1);
    assert_eq!(listing["examples"].as_array().unwrap().len(), 1);
    assert_eq!(listing["examples"][0]["name"], "cat.png");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/examples/upscale/cat.png").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(test::read_body(resp).await.to_vec(), sample);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/examples/upscale/notes.txt").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/examples/teleport").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
