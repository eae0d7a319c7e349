//! LiReddit server: a GraphQL API for a small link-sharing forum.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub(crate) mod util;
