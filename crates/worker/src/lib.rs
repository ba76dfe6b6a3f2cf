//! Batch jobs and account provisioning run from the `hanami-worker` binary.

pub mod annotators;
pub mod bloom_batch;
pub mod master;
