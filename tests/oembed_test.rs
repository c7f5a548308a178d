use std::collections::HashMap;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use vimeo_bridge::oembed::{OEmbedClient, OEmbedError, OEmbedLoader};
use vimeo_bridge::EmbedOptions;

async fn oembed(Query(params): Query<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
    let url = params.get("url").ok_or(StatusCode::BAD_REQUEST)?;
    if url.ends_with("/404") {
        return Err(StatusCode::NOT_FOUND);
    }
    let video_id: u64 = url
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
        .unwrap_or_default();
    Ok(Json(json!({
        "type": "video",
        "version": "1.0",
        "provider_name": "Vimeo",
        "title": format!("video {video_id}"),
        "description": params.get("color").cloned().unwrap_or_default(),
        "width": 640,
        "height": 360,
        "video_id": video_id,
    })))
}

async fn serve() -> String {
    let app = Router::new().route("/api/oembed.json", get(oembed));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/api/oembed.json")
}

#[tokio::test]
async fn fetches_metadata_with_options() {
    let client = OEmbedClient::new(serve().await).unwrap();
    let options = EmbedOptions {
        color: Some("#ff0000".into()),
        ..Default::default()
    };

    let oembed = client
        .fetch("https://vimeo.com/76979871", Some(&options))
        .await
        .expect("metadata");
    assert_eq!(oembed.kind, "video");
    assert_eq!(oembed.title, "video 76979871");
    assert_eq!(oembed.video_id, 76979871);
    assert_eq!(oembed.width, 640);
    assert_eq!(oembed.description, "ff0000");
}

#[tokio::test]
async fn http_errors_carry_the_status() {
    let client = OEmbedClient::new(serve().await).unwrap();
    let err = client
        .fetch("https://vimeo.com/404", None)
        .await
        .expect_err("not found");
    assert!(matches!(err, OEmbedError::Status(status) if status.as_u16() == 404));
    assert!(err.to_string().starts_with("Failed to fetch oEmbed: HTTP 404"));
}

#[tokio::test]
async fn loader_publishes_results() {
    let loader = OEmbedLoader::new(OEmbedClient::new(serve().await).unwrap());

    let request = loader
        .load(Some("https://vimeo.com/1"), None)
        .expect("request");
    assert!(loader.state().is_loading);
    request.await;

    let state = loader.state();
    assert!(!state.is_loading);
    assert!(state.error.is_none());
    assert_eq!(state.oembed.expect("metadata").title, "video 1");
}

#[tokio::test]
async fn loader_reports_failures() {
    let loader = OEmbedLoader::new(OEmbedClient::new(serve().await).unwrap());

    loader
        .load(Some("https://vimeo.com/404"), None)
        .expect("request")
        .await;

    let state = loader.state();
    assert!(!state.is_loading);
    assert!(state.oembed.is_none());
    assert!(matches!(
        state.error.as_deref(),
        Some(OEmbedError::Status(_))
    ));
}

#[tokio::test]
async fn newer_load_aborts_the_previous_one() {
    let loader = OEmbedLoader::new(OEmbedClient::new(serve().await).unwrap());

    let first = loader
        .load(Some("https://vimeo.com/1"), None)
        .expect("first request");
    let second = loader
        .load(Some("https://vimeo.com/2"), None)
        .expect("second request");

    // The aborted request finishes without touching the state.
    first.await;
    assert!(loader.state().is_loading);

    second.await;
    let state = loader.state();
    assert!(!state.is_loading);
    assert_eq!(state.oembed.expect("metadata").title, "video 2");
}

#[tokio::test]
async fn cancel_leaves_no_result_behind() {
    let loader = OEmbedLoader::new(OEmbedClient::new(serve().await).unwrap());

    let request = loader
        .load(Some("https://vimeo.com/3"), None)
        .expect("request");
    loader.cancel();
    request.await;

    let state = loader.state();
    assert!(!state.is_loading);
    assert!(state.oembed.is_none());
    assert!(state.error.is_none());
}
