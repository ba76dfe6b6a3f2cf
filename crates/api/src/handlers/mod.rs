pub mod annotation;
pub mod auth;
pub mod fullview;
