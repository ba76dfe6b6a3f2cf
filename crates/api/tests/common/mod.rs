#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{TimeZone, Utc};
use hanami_api::auth::jwt::JwtConfig;
use hanami_api::config::{ImageUrlMode, MasterDataConfig, ServerConfig, StorageConfig, VisionConfig};
use hanami_api::router::build_app_router;
use hanami_api::services::image_store::{ImageStore, StorageError};
use hanami_api::services::vision::FullviewValidator;
use hanami_api::state::AppState;
use hanami_core::bloom::{BloomOffsetTable, BloomStateCalculator, PrefectureOffsets};
use hanami_core::flowering::{FloweringCalendar, FloweringSpot, MonthDay};
use hanami_core::fullview::FullviewValidationResult;
use hanami_core::password::hash_password;
use hanami_core::types::DbId;
use hanami_db::models::annotator::CreateAnnotator;
use hanami_db::repositories::{AnnotationRepo, AnnotatorRepo};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

pub const PASSWORD: &str = "sakura-pass-123";
pub const CONTENTS_BUCKET: &str = "test-contents";
pub const STUB_MODEL_ID: &str = "stub-vision-model";

/// Key of a stored photo whose bytes the stub store can serve.
pub const STORED_IMAGE_KEY: &str = "2025/04/01/stored.jpg";

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 60,
        },
        storage: StorageConfig {
            assets_bucket: "test-assets".to_string(),
            contents_bucket: CONTENTS_BUCKET.to_string(),
            region: "ap-northeast-1".to_string(),
            url_mode: ImageUrlMode::Public,
            presign_expiry_secs: 60,
        },
        master: MasterDataConfig {
            flowering_date_csv: PathBuf::from("unused.csv"),
            bloom_state_csv: PathBuf::from("unused.csv"),
        },
        vision: VisionConfig {
            api_url: "http://127.0.0.1:9/unused".to_string(),
            api_key: None,
            model_id: STUB_MODEL_ID.to_string(),
            timeout_secs: 1,
        },
    }
}

/// One Tokyo forecast spot with Tokyo offsets.
pub fn test_bloom_calculator() -> BloomStateCalculator {
    let spot = FloweringSpot {
        spot_id: "13001".to_string(),
        prefecture: "東京都".to_string(),
        address: "東京都千代田区".to_string(),
        latitude: 35.69,
        longitude: 139.75,
        flowering: MonthDay { month: 3, day: 24 },
        full_bloom_start: MonthDay { month: 3, day: 31 },
        full_bloom_end: Some(MonthDay { month: 4, day: 5 }),
        variety: "ソメイヨシノ".to_string(),
        published: None,
    };
    let offsets = HashMap::from([(
        "13".to_string(),
        PrefectureOffsets {
            flowering_to_30: 2,
            flowering_to_50: 4,
            end_to_with_leaves: 4,
            end_to_leaves_only: 9,
        },
    )]);
    BloomStateCalculator::new(
        BloomOffsetTable::new(offsets),
        FloweringCalendar::new(vec![spot]),
    )
}

/// Serves deterministic URLs and the bytes of [`STORED_IMAGE_KEY`].
pub struct StubImageStore;

#[async_trait]
impl ImageStore for StubImageStore {
    async fn image_url(&self, image_obj_key: &str) -> String {
        if image_obj_key.is_empty() {
            return String::new();
        }
        format!("https://images.test/trees/{image_obj_key}")
    }

    async fn fetch(&self, image_obj_key: &str) -> Result<Vec<u8>, StorageError> {
        if image_obj_key == STORED_IMAGE_KEY {
            Ok(vec![0xFF, 0xD8, 0xFF, 0xE0])
        } else {
            Err(StorageError::NotFound(image_obj_key.to_string()))
        }
    }
}

/// Returns the same verdict for every image.
pub struct StubValidator {
    pub verdict: FullviewValidationResult,
}

#[async_trait]
impl FullviewValidator for StubValidator {
    fn model_id(&self) -> &str {
        STUB_MODEL_ID
    }

    async fn validate(&self, _image: &[u8]) -> FullviewValidationResult {
        self.verdict.clone()
    }
}

pub fn passing_verdict() -> FullviewValidationResult {
    FullviewValidationResult {
        is_valid: true,
        reason: "木全体が写っています".to_string(),
        confidence: 0.92,
    }
}

pub fn failing_verdict() -> FullviewValidationResult {
    FullviewValidationResult {
        is_valid: false,
        reason: "木の一部しか写っていません".to_string(),
        confidence: 0.81,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and a passing validator.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_verdict(pool, passing_verdict())
}

/// Same as [`build_test_app`], with a fixed validation verdict.
pub fn build_test_app_with_verdict(pool: PgPool, verdict: FullviewValidationResult) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        bloom: Arc::new(test_bloom_calculator()),
        images: Arc::new(StubImageStore),
        validator: Arc::new(StubValidator { verdict }),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create an annotator with [`PASSWORD`] and return its id.
pub async fn create_annotator(pool: &PgPool, username: &str, role: &str) -> DbId {
    let hashed = hash_password(PASSWORD).expect("hashing should succeed");
    AnnotatorRepo::create(
        pool,
        &CreateAnnotator {
            username: username.to_string(),
            password_hash: hashed,
            role: role.to_string(),
        },
    )
    .await
    .expect("annotator creation should succeed")
    .id
}

/// Insert a tree with one photo taken on the given April 2025 day in
/// Tokyo. Returns the photo (`entire_trees`) id.
pub async fn insert_photo(pool: &PgPool, image_obj_key: &str, day: u32) -> DbId {
    insert_photo_in(pool, image_obj_key, "13", day, None).await
}

pub async fn insert_photo_in(
    pool: &PgPool,
    image_obj_key: &str,
    prefecture_code: &str,
    day: u32,
    bloom_status: Option<&str>,
) -> DbId {
    let photo_date = Utc.with_ymd_and_hms(2025, 4, day, 2, 0, 0).unwrap();
    let tree_id: DbId = sqlx::query_scalar(
        "INSERT INTO trees (latitude, longitude, location, prefecture_code, photo_date)
         VALUES (35.69, 139.75, '千代田区', $1, $2) RETURNING id",
    )
    .bind(prefecture_code)
    .bind(photo_date)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query_scalar(
        "INSERT INTO entire_trees
            (tree_id, latitude, longitude, image_obj_key, thumb_obj_key, photo_date, bloom_status)
         VALUES ($1, 35.69, 139.75, $2, NULL, $3, $4) RETURNING id",
    )
    .bind(tree_id)
    .bind(image_obj_key)
    .bind(photo_date)
    .bind(bloom_status)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn mark_ready(pool: &PgPool, id: DbId) {
    AnnotationRepo::upsert_is_ready(pool, id, true)
        .await
        .expect("readiness update should succeed");
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    json_request(app, Method::POST, uri, body, None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    json_request(app, Method::POST, uri, body, Some(token)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    json_request(app, Method::PATCH, uri, body, Some(token)).await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Log in through the API and return the access token.
pub async fn login(app: Router, username: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": PASSWORD });
    let response = post_json(app, "/annotation_api/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["access_token"].as_str().unwrap().to_string()
}
