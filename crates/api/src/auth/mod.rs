//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token generation and validation.
//!
//! Password hashing lives in `hanami_core::password` so the worker CLI can
//! provision accounts without pulling in the HTTP stack.

pub mod jwt;
