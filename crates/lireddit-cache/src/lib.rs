//! LiReddit client cache
//!
//! A normalized, single-owner cache for the forum's GraphQL results:
//!
//! - **Entities** (`Post:<id>`, `User:<id>`) are stored once and shared by every query
//!   that references them.
//! - **Root fields** (`posts(...)`, `me`) remember the order in which they were fetched,
//!   which is what cursor pagination relies on to stitch pages together.
//! - **Updates** translate mutation results into local edits: vote arithmetic,
//!   list invalidation, entity removal, and identity reconciliation.
//!
//! The cache is a plain value. Whoever composes the transport owns it and mutates it
//! through `&mut self`; there is no global instance and no locking.

mod cache;
mod identity;
mod keys;
mod optimistic;
mod pagination;
mod store;
mod telemetry;
mod updates;

pub use cache::{CacheRead, MutationResult, PostCache};
pub use identity::IdentityMutation;
pub use keys::{EntityKey, FieldArgs, FieldKey, QUERY_ROOT, posts_arguments, stringify_variables};
pub use optimistic::OptimisticVote;
pub use pagination::{PaginatedRead, merge_paginated_read};
pub use store::{PageRecord, RootValue, Store};
pub use telemetry::{
    INVALIDATION_TOTAL, LIST_HIT_TOTAL, LIST_MISS_TOTAL, LIST_PARTIAL_TOTAL, VOTE_NOOP_TOTAL,
};
pub use updates::{VoteOutcome, normalize_vote, vote_delta};
