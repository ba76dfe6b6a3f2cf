use std::path::PathBuf;

use hanami_core::fullview::DEFAULT_MODEL_ID;
use hanami_core::storage::{DEFAULT_CONTENTS_BUCKET, DEFAULT_PRESIGN_EXPIRY_SECS, DEFAULT_REGION};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development, except
/// `JWT_SECRET` which must always be provided.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Object storage buckets and URL mode.
    pub storage: StorageConfig,
    /// Paths of the reference CSVs loaded at startup.
    pub master: MasterDataConfig,
    /// Multimodal full-view validation API.
    pub vision: VisionConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    ///
    /// See [`JwtConfig::from_env`], [`StorageConfig::from_env`],
    /// [`MasterDataConfig::from_env`] and [`VisionConfig::from_env`] for the
    /// remaining variables.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            storage: StorageConfig::from_env(),
            master: MasterDataConfig::from_env(),
            vision: VisionConfig::from_env(),
        }
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// How photo URLs handed to the browser are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageUrlMode {
    /// Plain `https://{bucket}.s3.{region}.amazonaws.com/...` URLs.
    Public,
    /// Time-limited S3 presigned GET URLs.
    Presigned,
}

impl ImageUrlMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Self::Public),
            "presigned" => Some(Self::Presigned),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket holding the photos and thumbnails.
    pub assets_bucket: String,
    /// Bucket named in exported `s3://` paths.
    pub contents_bucket: String,
    pub region: String,
    pub url_mode: ImageUrlMode,
    pub presign_expiry_secs: u64,
}

impl StorageConfig {
    /// | Env Var               | Default                |
    /// |-----------------------|------------------------|
    /// | `S3_ASSETS_BUCKET`    | `""`                   |
    /// | `S3_CONTENTS_BUCKET`  | `hrkz-prd-s3-contents` |
    /// | `AWS_REGION`          | `ap-northeast-1`       |
    /// | `IMAGE_URL_MODE`      | `public`               |
    /// | `PRESIGN_EXPIRY_SECS` | `3600`                 |
    pub fn from_env() -> Self {
        let assets_bucket = std::env::var("S3_ASSETS_BUCKET").unwrap_or_default();
        if assets_bucket.is_empty() {
            tracing::warn!("S3_ASSETS_BUCKET is not set, image URLs will be unusable");
        }

        let url_mode = std::env::var("IMAGE_URL_MODE")
            .map(|v| ImageUrlMode::parse(&v).expect("IMAGE_URL_MODE must be 'public' or 'presigned'"))
            .unwrap_or(ImageUrlMode::Public);

        let presign_expiry_secs: u64 = std::env::var("PRESIGN_EXPIRY_SECS")
            .unwrap_or_else(|_| DEFAULT_PRESIGN_EXPIRY_SECS.to_string())
            .parse()
            .expect("PRESIGN_EXPIRY_SECS must be a valid u64");

        Self {
            assets_bucket,
            contents_bucket: std::env::var("S3_CONTENTS_BUCKET")
                .unwrap_or_else(|_| DEFAULT_CONTENTS_BUCKET.into()),
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.into()),
            url_mode,
            presign_expiry_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Master data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MasterDataConfig {
    pub flowering_date_csv: PathBuf,
    pub bloom_state_csv: PathBuf,
}

impl MasterDataConfig {
    /// | Env Var              | Default                      |
    /// |----------------------|------------------------------|
    /// | `FLOWERING_DATE_CSV` | `master/flowering_date.csv`  |
    /// | `BLOOM_STATE_CSV`    | `master/bloom_state.csv`     |
    pub fn from_env() -> Self {
        Self {
            flowering_date_csv: std::env::var("FLOWERING_DATE_CSV")
                .unwrap_or_else(|_| "master/flowering_date.csv".into())
                .into(),
            bloom_state_csv: std::env::var("BLOOM_STATE_CSV")
                .unwrap_or_else(|_| "master/bloom_state.csv".into())
                .into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Vision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub api_url: String,
    /// Without a key every validation is skipped and passes.
    pub api_key: Option<String>,
    pub model_id: String,
    pub timeout_secs: u64,
}

impl VisionConfig {
    /// | Env Var               | Default                                  |
    /// |-----------------------|------------------------------------------|
    /// | `VISION_API_URL`      | `https://api.anthropic.com/v1/messages`  |
    /// | `VISION_API_KEY`      | unset                                    |
    /// | `VISION_MODEL_ID`     | `claude-sonnet-4-5`                      |
    /// | `VISION_TIMEOUT_SECS` | `60`                                     |
    pub fn from_env() -> Self {
        let timeout_secs: u64 = std::env::var("VISION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("VISION_TIMEOUT_SECS must be a valid u64");

        Self {
            api_url: std::env::var("VISION_API_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".into()),
            api_key: std::env::var("VISION_API_KEY").ok().filter(|k| !k.is_empty()),
            model_id: std::env::var("VISION_MODEL_ID").unwrap_or_else(|_| DEFAULT_MODEL_ID.into()),
            timeout_secs,
        }
    }
}
