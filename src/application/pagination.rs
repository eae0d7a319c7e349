//! Cursor pagination for the post feed.
//!
//! The cursor is the `createdAt` of the last post a client has seen, rendered as
//! milliseconds since the epoch. Pages are ordered newest first and a cursor selects
//! strictly older posts.

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::timestamps::{parse_millis, to_millis_string};

/// Upper bound on a single page of posts.
pub const MAX_PAGE_LIMIT: u32 = lireddit_api_types::MAX_POSTS_PAGE as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostCursor {
    created_at: OffsetDateTime,
}

impl PostCursor {
    pub fn new(created_at: OffsetDateTime) -> Self {
        Self { created_at }
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn encode(&self) -> String {
        to_millis_string(self.created_at)
    }

    pub fn decode(cursor: &str) -> Result<Self, PaginationError> {
        parse_millis(cursor)
            .map(Self::new)
            .map_err(|_| PaginationError::InvalidCursor(cursor.to_string()))
    }
}

/// Cursor-aware pagination request.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<C> {
    pub limit: u32,
    pub cursor: Option<C>,
}

impl<C> PageRequest<C> {
    pub fn new(limit: u32, cursor: Option<C>) -> Self {
        Self { limit, cursor }
    }

    /// Limit clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_LIMIT)
    }
}

impl PageRequest<PostCursor> {
    /// Build a request from GraphQL arguments. Negative limits clamp to one.
    pub fn from_args(limit: i32, cursor: Option<&str>) -> Result<Self, PaginationError> {
        let cursor = cursor.map(PostCursor::decode).transpose()?;
        let limit = u32::try_from(limit.max(1)).unwrap_or(1);
        Ok(Self::new(limit, cursor))
    }
}

/// Cursor-aware page result.
#[derive(Debug, Clone, Serialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    /// True when another page follows this one.
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
}
