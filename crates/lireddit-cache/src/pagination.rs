//! Cursor-pagination merge.
//!
//! Every page of a paginated field is cached under its own field key. A read stitches
//! all of them together in fetch order, so a list grows as the user asks for more and
//! never loses the pages already seen.

use tracing::debug;

use super::keys::FieldKey;
use super::store::{RootValue, Store};

/// Result of merging every cached page of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatedRead {
    pub posts: Vec<i32>,
    pub has_more: bool,
    /// The page for the requested arguments is not cached itself; the caller should
    /// fetch it and read again.
    pub partial: bool,
}

/// Merge all cached pages of `requested.field_name()`.
///
/// Returns `None` when no page of the field has ever been cached. References to
/// entities that are no longer in the store are skipped.
pub fn merge_paginated_read(store: &Store, requested: &FieldKey) -> Option<PaginatedRead> {
    let pages = store.inspect_fields(requested.field_name());
    if pages.is_empty() {
        debug!(field = %requested, "paginated read missed");
        return None;
    }

    let partial = store.resolve_root(requested).is_none();
    let mut has_more = true;
    let mut posts = Vec::new();

    for (_, value) in pages {
        let RootValue::Page(page) = value else {
            continue;
        };
        if !page.has_more {
            has_more = false;
        }
        posts.extend(
            page.posts
                .iter()
                .copied()
                .filter(|id| store.post(*id).is_some()),
        );
    }

    debug!(
        field = %requested,
        posts = posts.len(),
        has_more,
        partial,
        "paginated read merged"
    );

    Some(PaginatedRead {
        posts,
        has_more,
        partial,
    })
}
