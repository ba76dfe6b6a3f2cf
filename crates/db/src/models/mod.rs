//! Row structs and DTOs.
//!
//! Entity structs derive `FromRow`; structs that leave the API also derive
//! `Serialize` and `TS` so the annotation SPA shares their shape.

pub mod annotation;
pub mod annotator;
pub mod fullview_validation_log;
pub mod photo;
