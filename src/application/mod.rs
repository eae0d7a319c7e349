//! Application services: account and post use cases over repository traits.

pub mod error;
#[cfg(test)]
pub(crate) mod fakes;
pub mod mail;
pub mod pagination;
pub mod posts;
pub mod repos;
pub mod sessions;
pub mod users;
