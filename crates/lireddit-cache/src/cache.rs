//! The owned cache handle that transports talk to.

use lireddit_api_types::{PaginatedPosts, PostSnapshot, PostsArgs, UserResponse, UserSnapshot};
use metrics::counter;
use tracing::{debug, warn};

use super::identity::{self, IdentityMutation};
use super::keys::FieldKey;
use super::optimistic::{OptimisticLedger, OptimisticVote};
use super::pagination::merge_paginated_read;
use super::store::{PageRecord, RootValue, Store};
use super::telemetry::{LIST_HIT_TOTAL, LIST_MISS_TOTAL, LIST_PARTIAL_TOTAL};
use super::updates::{self, VoteOutcome};

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheRead<T> {
    /// Nothing usable is cached; go to the network.
    Miss,
    /// Cached data. When `partial` is set the data is usable but the caller should
    /// still fetch the requested arguments.
    Hit { data: T, partial: bool },
}

impl<T> CacheRead<T> {
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheRead::Miss)
    }

    /// True when the network must be asked: a miss or a partial hit.
    pub fn needs_fetch(&self) -> bool {
        match self {
            CacheRead::Miss => true,
            CacheRead::Hit { partial, .. } => *partial,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            CacheRead::Miss => None,
            CacheRead::Hit { data, .. } => Some(data),
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            CacheRead::Miss => None,
            CacheRead::Hit { data, .. } => Some(data),
        }
    }
}

/// Results of mutations whose cache effect does not depend on an optimistic write.
#[derive(Debug, Clone, Copy)]
pub enum MutationResult<'a> {
    CreatePost,
    DeletePost { id: i32 },
    Login(&'a UserResponse),
    Register(&'a UserResponse),
    ChangePassword(&'a UserResponse),
    Logout,
}

/// Normalized cache for post listings, votes, and the current identity.
#[derive(Debug, Default)]
pub struct PostCache {
    store: Store,
    ledger: OptimisticLedger,
}

impl PostCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // ========================================================================
    // Query results
    // ========================================================================

    /// Record one page returned by `posts(limit, cursor)`.
    pub fn write_posts(&mut self, args: &PostsArgs, page: &PaginatedPosts) {
        for post in &page.posts {
            self.write_post(post);
        }
        self.store.write_root(
            FieldKey::posts(args),
            RootValue::Page(PageRecord {
                posts: page.posts.iter().map(|post| post.id).collect(),
                has_more: page.has_more,
            }),
        );
        debug!(
            limit = args.limit,
            cursor = args.cursor.as_deref(),
            posts = page.posts.len(),
            has_more = page.has_more,
            "posts page cached"
        );
    }

    /// Every cached post page merged in fetch order.
    pub fn read_posts(&self, args: &PostsArgs) -> CacheRead<PaginatedPosts> {
        let Some(merged) = merge_paginated_read(&self.store, &FieldKey::posts(args)) else {
            counter!(LIST_MISS_TOTAL).increment(1);
            return CacheRead::Miss;
        };

        if merged.partial {
            counter!(LIST_PARTIAL_TOTAL).increment(1);
        } else {
            counter!(LIST_HIT_TOTAL).increment(1);
        }

        let posts = merged
            .posts
            .iter()
            .filter_map(|id| self.store.post(*id).cloned())
            .collect();

        CacheRead::Hit {
            data: PaginatedPosts {
                posts,
                has_more: merged.has_more,
            },
            partial: merged.partial,
        }
    }

    /// Record an authoritative copy of a post. Any pending optimistic vote on it is
    /// considered settled.
    pub fn write_post(&mut self, post: &PostSnapshot) {
        self.ledger.clear(post.id);
        self.store.write_post(post);
    }

    pub fn read_post(&self, id: i32) -> Option<&PostSnapshot> {
        self.store.post(id)
    }

    pub fn write_me(&mut self, me: Option<&UserSnapshot>) {
        identity::write_identity(&mut self.store, me);
    }

    pub fn read_me(&self) -> CacheRead<Option<UserSnapshot>> {
        match identity::read_identity(&self.store) {
            Some(user) => CacheRead::Hit {
                data: user.cloned(),
                partial: false,
            },
            None => CacheRead::Miss,
        }
    }

    // ========================================================================
    // Mutation effects
    // ========================================================================

    /// Apply a vote to the cached post before the server confirms it.
    pub fn apply_vote(&mut self, post_id: i32, value: i32) -> VoteOutcome {
        updates::apply_vote(&mut self.store, &mut self.ledger, post_id, value)
    }

    /// The server accepted the vote; the optimistic values stand.
    pub fn confirm_vote(&mut self, token: &OptimisticVote) {
        self.ledger.settle(token);
    }

    /// The server rejected the vote; restore what was there before, unless a newer
    /// write already replaced it.
    pub fn rollback_vote(&mut self, token: &OptimisticVote) -> bool {
        updates::rollback_vote(&mut self.store, &mut self.ledger, token)
    }

    /// Number of posts with an unconfirmed optimistic vote.
    pub fn pending_votes(&self) -> usize {
        self.ledger.len()
    }

    /// True while `token` is the latest unconfirmed vote of its post.
    pub fn is_vote_pending(&self, token: &OptimisticVote) -> bool {
        self.ledger.is_pending(token)
    }

    pub fn invalidate_all_post_lists(&mut self) -> usize {
        updates::invalidate_all_post_lists(&mut self.store)
    }

    pub fn invalidate_post(&mut self, post_id: i32) -> bool {
        updates::invalidate_post(&mut self.store, &mut self.ledger, post_id)
    }

    pub fn reconcile_identity(&mut self, mutation: IdentityMutation<'_>) -> bool {
        identity::reconcile_identity(&mut self.store, mutation)
    }

    /// Run the cache update that belongs to a mutation result.
    pub fn apply_mutation(&mut self, result: MutationResult<'_>) {
        match result {
            MutationResult::CreatePost => {
                self.invalidate_all_post_lists();
            }
            MutationResult::DeletePost { id } => {
                if !self.invalidate_post(id) {
                    warn!(post_id = id, "deleted post was not cached");
                }
            }
            MutationResult::Login(response) => {
                self.reconcile_identity(IdentityMutation::Login(response));
                // Vote status is per viewer, so every cached list is stale now.
                self.invalidate_all_post_lists();
            }
            MutationResult::Register(response) => {
                self.reconcile_identity(IdentityMutation::Register(response));
            }
            MutationResult::ChangePassword(response) => {
                self.reconcile_identity(IdentityMutation::ChangePassword(response));
            }
            MutationResult::Logout => {
                self.reconcile_identity(IdentityMutation::Logout);
            }
        }
    }
}
