//! Outbound integrations behind async traits so handlers can be tested with
//! in-process stand-ins.
//!
//! - [`image_store`] -- photo URLs and photo bytes (S3).
//! - [`vision`] -- full-view validation model (HTTP).

pub mod image_store;
pub mod vision;
