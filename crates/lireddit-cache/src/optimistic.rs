//! Bookkeeping for optimistic vote writes.
//!
//! Each optimistic write gets a generation number. Only the latest write for a post is
//! pending; an authoritative write of the post clears it.

use std::collections::HashMap;

/// Token describing one optimistic vote write, handed back to the caller so it can
/// confirm or roll back once the server answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticVote {
    pub post_id: i32,
    pub previous_points: i32,
    pub previous_status: Option<i32>,
    pub points: i32,
    pub status: i32,
    generation: u64,
}

#[derive(Debug, Default)]
pub(crate) struct OptimisticLedger {
    pending: HashMap<i32, u64>,
    next_generation: u64,
}

impl OptimisticLedger {
    pub(crate) fn record(
        &mut self,
        post_id: i32,
        previous_points: i32,
        previous_status: Option<i32>,
        points: i32,
        status: i32,
    ) -> OptimisticVote {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.pending.insert(post_id, generation);
        OptimisticVote {
            post_id,
            previous_points,
            previous_status,
            points,
            status,
            generation,
        }
    }

    /// True when `token` is still the latest unconfirmed write of its post.
    pub(crate) fn is_pending(&self, token: &OptimisticVote) -> bool {
        self.pending.get(&token.post_id) == Some(&token.generation)
    }

    /// Drop the tag for `token` if it is still the pending one.
    pub(crate) fn settle(&mut self, token: &OptimisticVote) -> bool {
        if self.is_pending(token) {
            self.pending.remove(&token.post_id);
            return true;
        }
        false
    }

    /// Forget any pending write of `post_id`.
    pub(crate) fn clear(&mut self, post_id: i32) {
        self.pending.remove(&post_id);
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}
