use std::sync::Arc;

use hanami_core::bloom::BloomStateCalculator;

use crate::config::ServerConfig;
use crate::services::image_store::ImageStore;
use crate::services::vision::FullviewValidator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: hanami_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Flowering calendar and bloom offsets loaded at startup.
    pub bloom: Arc<BloomStateCalculator>,
    /// Photo URLs and bytes.
    pub images: Arc<dyn ImageStore>,
    /// Full-view validation model.
    pub validator: Arc<dyn FullviewValidator>,
}
