//! Domain logic for the tree-photo annotation service.
//!
//! Nothing in this crate touches the database or the network.

pub mod annotation;
pub mod bloom;
pub mod csv;
pub mod error;
pub mod export;
pub mod flowering;
pub mod fullview;
pub mod password;
pub mod prefecture;
pub mod roles;
pub mod storage;
pub mod types;
pub mod vitality;
