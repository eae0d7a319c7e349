//! Cache updates driven by mutation results.

use metrics::counter;
use tracing::{debug, info};

use super::keys::{EntityKey, FieldKey};
use super::optimistic::{OptimisticLedger, OptimisticVote};
use super::store::Store;
use super::telemetry::{INVALIDATION_TOTAL, VOTE_NOOP_TOTAL};

pub(crate) const POSTS_FIELD: &str = "posts";

/// What a vote did to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The post is not cached; nothing to update.
    Missing,
    /// The cached vote already has the requested value.
    Unchanged,
    /// Points and vote status were rewritten optimistically.
    Applied(OptimisticVote),
}

/// Any value other than -1 counts as an upvote.
pub fn normalize_vote(value: i32) -> i32 {
    if value == -1 { -1 } else { 1 }
}

/// Point change caused by voting `value` on a post whose current vote is `previous`.
///
/// A fresh vote moves the total by one; switching sides moves it by two. Repeating the
/// current vote changes nothing.
pub fn vote_delta(previous: Option<i32>, value: i32) -> i32 {
    match previous {
        Some(current) if current == value => 0,
        Some(_) => 2 * value,
        None => value,
    }
}

pub(crate) fn apply_vote(
    store: &mut Store,
    ledger: &mut OptimisticLedger,
    post_id: i32,
    requested: i32,
) -> VoteOutcome {
    let value = normalize_vote(requested);
    let Some(post) = store.post_mut(post_id) else {
        counter!(VOTE_NOOP_TOTAL).increment(1);
        debug!(post_id, "vote skipped: post not cached");
        return VoteOutcome::Missing;
    };

    if post.vote_status == Some(value) {
        counter!(VOTE_NOOP_TOTAL).increment(1);
        debug!(post_id, value, "vote skipped: already applied");
        return VoteOutcome::Unchanged;
    }

    let previous_points = post.points;
    let previous_status = post.vote_status;
    post.points = previous_points + vote_delta(previous_status, value);
    post.vote_status = Some(value);

    debug!(
        post_id,
        value,
        points = post.points,
        "vote applied optimistically"
    );

    VoteOutcome::Applied(ledger.record(
        post_id,
        previous_points,
        previous_status,
        post.points,
        value,
    ))
}

/// Restore the values `token` replaced, provided nothing newer has been written since.
pub(crate) fn rollback_vote(
    store: &mut Store,
    ledger: &mut OptimisticLedger,
    token: &OptimisticVote,
) -> bool {
    if !ledger.is_pending(token) {
        debug!(post_id = token.post_id, "rollback ignored: write superseded");
        return false;
    }
    ledger.settle(token);

    let Some(post) = store.post_mut(token.post_id) else {
        return false;
    };
    if post.points != token.points || post.vote_status != Some(token.status) {
        return false;
    }

    post.points = token.previous_points;
    post.vote_status = token.previous_status;
    info!(
        post_id = token.post_id,
        points = post.points,
        "optimistic vote rolled back"
    );
    true
}

/// Drop every cached page of the post listing so the next read goes to the network.
pub(crate) fn invalidate_all_post_lists(store: &mut Store) -> usize {
    let keys: Vec<FieldKey> = store
        .inspect_fields(POSTS_FIELD)
        .into_iter()
        .map(|(key, _)| key.clone())
        .collect();

    let mut dropped = 0;
    for key in &keys {
        if store.invalidate_root(key) {
            dropped += 1;
        }
    }

    counter!(INVALIDATION_TOTAL, "target" => "post_lists").increment(1);
    info!(pages = dropped, "post lists invalidated");
    dropped
}

/// Remove a deleted post. Pages keep the dangling id; merged reads skip it.
pub(crate) fn invalidate_post(
    store: &mut Store,
    ledger: &mut OptimisticLedger,
    post_id: i32,
) -> bool {
    ledger.clear(post_id);
    let removed = store.remove(EntityKey::Post(post_id));
    counter!(INVALIDATION_TOTAL, "target" => "post").increment(1);
    info!(post_id, removed, "post invalidated");
    removed
}
