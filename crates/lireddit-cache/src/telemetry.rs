//! Metric names emitted by the cache.

pub const LIST_HIT_TOTAL: &str = "lireddit_cache_list_hit_total";
pub const LIST_MISS_TOTAL: &str = "lireddit_cache_list_miss_total";
pub const LIST_PARTIAL_TOTAL: &str = "lireddit_cache_list_partial_total";
pub const VOTE_NOOP_TOTAL: &str = "lireddit_cache_vote_noop_total";
pub const INVALIDATION_TOTAL: &str = "lireddit_cache_invalidation_total";
