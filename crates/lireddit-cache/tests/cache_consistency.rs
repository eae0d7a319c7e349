use std::collections::HashSet;

use lireddit_api_types::{
    CreatorSnapshot, FieldError, PaginatedPosts, PostSnapshot, PostsArgs, UserResponse,
    UserSnapshot,
};
use lireddit_cache::{
    CacheRead, INVALIDATION_TOTAL, LIST_HIT_TOTAL, LIST_MISS_TOTAL, LIST_PARTIAL_TOTAL,
    MutationResult, PostCache, VOTE_NOOP_TOTAL, VoteOutcome,
};
use metrics_util::debugging::DebuggingRecorder;

fn post(id: i32, points: i32, vote_status: Option<i32>) -> PostSnapshot {
    PostSnapshot {
        id,
        title: format!("post {id}"),
        text: None,
        text_snippet: format!("body of {id}"),
        points,
        vote_status,
        creator_id: 1,
        creator: CreatorSnapshot {
            id: 1,
            username: "ben".to_string(),
        },
        created_at: (1_700_000_000_000_i64 - i64::from(id)).to_string(),
        updated_at: (1_700_000_000_000_i64 - i64::from(id)).to_string(),
    }
}

fn page(ids: &[i32], has_more: bool) -> PaginatedPosts {
    PaginatedPosts {
        posts: ids.iter().map(|id| post(*id, 0, None)).collect(),
        has_more,
    }
}

fn user(id: i32, username: &str) -> UserSnapshot {
    UserSnapshot {
        id,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        created_at: "1".to_string(),
        updated_at: "1".to_string(),
    }
}

fn ids(read: &CacheRead<PaginatedPosts>) -> Vec<i32> {
    read.data()
        .map(|page| page.posts.iter().map(|post| post.id).collect())
        .unwrap_or_default()
}

#[test]
fn load_more_grows_the_list_in_fetch_order() {
    let mut cache = PostCache::new();
    let first = PostsArgs::first(2);
    assert!(cache.read_posts(&first).is_miss());

    cache.write_posts(&first, &page(&[1, 2], true));
    let second = PostsArgs::after(2, post(2, 0, None).created_at);

    let before_fetch = cache.read_posts(&second);
    assert!(before_fetch.needs_fetch());
    assert_eq!(ids(&before_fetch), vec![1, 2]);

    cache.write_posts(&second, &page(&[3, 4], true));
    let third = PostsArgs::after(2, post(4, 0, None).created_at);
    cache.write_posts(&third, &page(&[5], false));

    let merged = cache.read_posts(&third);
    assert!(!merged.needs_fetch());
    assert_eq!(ids(&merged), vec![1, 2, 3, 4, 5]);
    assert_eq!(merged.data().map(|page| page.has_more), Some(false));
}

#[test]
fn refetching_the_first_page_does_not_resurrect_has_more() {
    let mut cache = PostCache::new();
    let first = PostsArgs::first(10);
    let second = PostsArgs::after(10, "1699999999990");

    cache.write_posts(&first, &page(&[1], true));
    cache.write_posts(&second, &page(&[2], false));
    cache.write_posts(&first, &page(&[1], true));

    let merged = cache.read_posts(&first);
    assert_eq!(merged.data().map(|page| page.has_more), Some(false));
    assert_eq!(ids(&merged), vec![1, 2]);
}

#[test]
fn vote_updates_the_post_seen_by_every_page() {
    let mut cache = PostCache::new();
    let first = PostsArgs::first(1);
    cache.write_posts(
        &first,
        &PaginatedPosts {
            posts: vec![post(7, 10, Some(1))],
            has_more: false,
        },
    );

    let outcome = cache.apply_vote(7, -1);
    let VoteOutcome::Applied(token) = outcome else {
        panic!("vote should apply to a cached post");
    };
    assert_eq!((token.previous_points, token.points), (10, 8));

    let listed = cache.read_posts(&first);
    let listed_post = &listed.data().expect("hit").posts[0];
    assert_eq!(listed_post.points, 8);
    assert_eq!(listed_post.vote_status, Some(-1));

    assert_eq!(cache.apply_vote(7, -1), VoteOutcome::Unchanged);
    assert_eq!(cache.read_post(7).map(|post| post.points), Some(8));
}

#[test]
fn failed_vote_rolls_back_but_confirmed_vote_stays() {
    let mut cache = PostCache::new();
    cache.write_post(&post(3, 5, None));

    let VoteOutcome::Applied(rejected) = cache.apply_vote(3, -1) else {
        panic!("vote should apply");
    };
    assert_eq!(cache.read_post(3).map(|post| post.points), Some(4));
    assert!(cache.rollback_vote(&rejected));
    assert_eq!(cache.read_post(3).map(|post| post.points), Some(5));
    assert_eq!(cache.read_post(3).and_then(|post| post.vote_status), None);

    let VoteOutcome::Applied(accepted) = cache.apply_vote(3, 1) else {
        panic!("vote should apply");
    };
    cache.confirm_vote(&accepted);
    assert_eq!(cache.pending_votes(), 0);
    assert!(!cache.rollback_vote(&accepted));
    assert_eq!(cache.read_post(3).map(|post| post.points), Some(6));
}

#[test]
fn authoritative_refetch_settles_pending_vote() {
    let mut cache = PostCache::new();
    cache.write_post(&post(3, 5, None));
    let VoteOutcome::Applied(token) = cache.apply_vote(3, 1) else {
        panic!("vote should apply");
    };

    cache.write_post(&post(3, 9, Some(1)));

    assert!(!cache.is_vote_pending(&token));
    assert!(!cache.rollback_vote(&token));
    assert_eq!(cache.read_post(3).map(|post| post.points), Some(9));
}

#[test]
fn create_post_forces_the_next_listing_to_miss() {
    let mut cache = PostCache::new();
    let first = PostsArgs::first(10);
    cache.write_posts(&first, &page(&[1, 2], false));

    cache.apply_mutation(MutationResult::CreatePost);

    assert!(cache.read_posts(&first).is_miss());
    assert!(cache.read_post(1).is_some());
}

#[test]
fn delete_post_leaves_a_gap_until_the_next_fetch() {
    let mut cache = PostCache::new();
    let first = PostsArgs::first(10);
    cache.write_posts(&first, &page(&[1, 2, 3], false));

    cache.apply_mutation(MutationResult::DeletePost { id: 2 });

    assert_eq!(ids(&cache.read_posts(&first)), vec![1, 3]);
    assert_eq!(cache.apply_vote(2, 1), VoteOutcome::Missing);
}

#[test]
fn identity_follows_login_register_and_logout() {
    let mut cache = PostCache::new();
    assert!(cache.read_me().is_miss());
    cache.write_me(None);

    let rejected = UserResponse {
        errors: Some(vec![FieldError::new("usernameOrEmail", "username doesn't exist")]),
        users: None,
    };
    cache.apply_mutation(MutationResult::Login(&rejected));
    assert_eq!(cache.read_me().into_data(), Some(None));

    let accepted = UserResponse {
        errors: None,
        users: Some(user(4, "ada")),
    };
    cache.apply_mutation(MutationResult::Login(&accepted));
    assert_eq!(
        cache.read_me().into_data().flatten().map(|user| user.id),
        Some(4)
    );

    cache.apply_mutation(MutationResult::Logout);
    assert_eq!(cache.read_me().into_data(), Some(None));

    let registered = UserResponse {
        errors: None,
        users: Some(user(5, "grace")),
    };
    cache.apply_mutation(MutationResult::Register(&registered));
    assert_eq!(
        cache.read_me().into_data().flatten().map(|user| user.username),
        Some("grace".to_string())
    );
}

#[test]
fn login_invalidates_cached_listings() {
    let mut cache = PostCache::new();
    let first = PostsArgs::first(10);
    cache.write_posts(&first, &page(&[1], false));

    let accepted = UserResponse {
        errors: None,
        users: Some(user(1, "ben")),
    };
    cache.apply_mutation(MutationResult::Login(&accepted));

    assert!(cache.read_posts(&first).is_miss());
}

#[test]
fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let mut cache = PostCache::new();
        let first = PostsArgs::first(1);
        let _ = cache.read_posts(&first);
        cache.write_posts(&first, &page(&[1], true));
        let _ = cache.read_posts(&first);
        let _ = cache.read_posts(&PostsArgs::after(1, "1699999999999"));
        let _ = cache.apply_vote(99, 1);
        cache.apply_mutation(MutationResult::CreatePost);
    });

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for metric in [
        LIST_HIT_TOTAL,
        LIST_MISS_TOTAL,
        LIST_PARTIAL_TOTAL,
        VOTE_NOOP_TOTAL,
        INVALIDATION_TOTAL,
    ] {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
