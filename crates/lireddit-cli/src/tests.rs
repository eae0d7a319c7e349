#![deny(clippy::all, clippy::pedantic)]

use httpmock::{Mock, MockServer};
use lireddit_api_types::documents::{
    CREATE_POST_MUTATION, LOGIN_MUTATION, ME_QUERY, POSTS_QUERY, VOTE_MUTATION,
};
use lireddit_api_types::{PostInput, PostsArgs};
use lireddit_cache::VoteOutcome;
use serde_json::{Value, json};

use crate::client::{CliError, Transport};
use crate::session::ForumSession;
use crate::shell::{ShellCommand, parse_line};

fn session(server: &MockServer) -> ForumSession {
    let transport = Transport::new(&server.url("/graphql")).expect("transport");
    ForumSession::new(transport, 2)
}

fn post(id: i32, points: i32, vote_status: Option<i32>, created_at: &str) -> Value {
    json!({
        "id": id,
        "title": format!("post {id}"),
        "textSnippet": "snippet",
        "points": points,
        "voteStatus": vote_status,
        "creatorId": 1,
        "creator": { "id": 1, "username": "ben" },
        "createdAt": created_at,
        "updatedAt": created_at,
    })
}

fn mock_operation<'a>(server: &'a MockServer, body: Value, response: Value) -> Mock<'a> {
    server.mock(|when, then| {
        when.method("POST")
            .path("/graphql")
            .json_body_includes(body.to_string());
        then.status(200)
            .header("content-type", "application/json")
            .body(response.to_string());
    })
}

fn mock_front_page<'a>(server: &'a MockServer, posts: Vec<Value>, has_more: bool) -> Mock<'a> {
    mock_operation(
        server,
        json!({ "query": POSTS_QUERY, "variables": { "limit": 2, "cursor": null } }),
        json!({ "data": { "posts": { "posts": posts, "hasMore": has_more } } }),
    )
}

#[tokio::test]
async fn repeated_listing_is_served_from_cache() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = mock_front_page(&server, vec![post(2, 1, None, "2000")], false);

    let mut session = session(&server);
    let first = session.front_page().await?;
    let second = session.front_page().await?;

    assert_eq!(first, second);
    assert_eq!(second.posts[0].id, 2);
    mock.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn more_fetches_after_last_cursor_and_merges() -> Result<(), CliError> {
    let server = MockServer::start();
    let first = mock_front_page(
        &server,
        vec![post(3, 0, None, "3000"), post(2, 0, None, "2000")],
        true,
    );
    let second = mock_operation(
        &server,
        json!({ "query": POSTS_QUERY, "variables": { "limit": 2, "cursor": "2000" } }),
        json!({ "data": { "posts": { "posts": [post(1, 0, None, "1000")], "hasMore": false } } }),
    );

    let mut session = session(&server);
    session.front_page().await?;
    let merged = session.more().await?;

    let ids: Vec<i32> = merged.posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert!(!merged.has_more);

    // Nothing left to load.
    let again = session.more().await?;
    assert_eq!(again.posts.len(), 3);
    first.assert_hits(1);
    second.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn successful_vote_keeps_optimistic_points() -> Result<(), CliError> {
    let server = MockServer::start();
    mock_front_page(&server, vec![post(7, 10, Some(1), "2000")], false);
    let vote = mock_operation(
        &server,
        json!({ "query": VOTE_MUTATION, "variables": { "postId": 7, "value": -1 } }),
        json!({ "data": { "vote": true } }),
    );

    let mut session = session(&server);
    session.front_page().await?;
    let outcome = session.vote(7, -1).await?;

    assert!(matches!(outcome, VoteOutcome::Applied(_)));
    let cached = session.cache().read_post(7).expect("cached post");
    assert_eq!(cached.points, 8);
    assert_eq!(cached.vote_status, Some(-1));
    assert_eq!(session.cache().pending_votes(), 0);
    vote.assert();
    Ok(())
}

#[tokio::test]
async fn rejected_vote_is_rolled_back() -> Result<(), CliError> {
    let server = MockServer::start();
    mock_front_page(&server, vec![post(5, 5, None, "2000")], false);
    mock_operation(
        &server,
        json!({ "query": VOTE_MUTATION }),
        json!({ "data": null, "errors": [{ "message": "not authenticated", "path": ["vote"] }] }),
    );

    let mut session = session(&server);
    session.front_page().await?;
    let err = session.vote(5, -1).await.expect_err("vote should fail");

    assert!(matches!(err, CliError::NotAuthenticated));
    let cached = session.cache().read_post(5).expect("cached post");
    assert_eq!(cached.points, 5);
    assert_eq!(cached.vote_status, None);
    assert_eq!(session.cache().pending_votes(), 0);
    Ok(())
}

#[tokio::test]
async fn creating_a_post_refetches_the_listing() -> Result<(), CliError> {
    let server = MockServer::start();
    let listing = mock_front_page(&server, vec![post(1, 0, None, "1000")], false);
    mock_operation(
        &server,
        json!({ "query": CREATE_POST_MUTATION }),
        json!({ "data": { "createPost": post(2, 0, None, "2000") } }),
    );

    let mut session = session(&server);
    session.front_page().await?;
    let created = session
        .create_post(PostInput {
            title: "post 2".into(),
            text: "body".into(),
        })
        .await?;
    assert_eq!(created.id, 2);

    assert!(session.cache().read_posts(&PostsArgs::first(2)).is_miss());
    session.front_page().await?;
    listing.assert_hits(2);
    Ok(())
}

#[tokio::test]
async fn login_errors_leave_identity_untouched() -> Result<(), CliError> {
    let server = MockServer::start();
    let me = mock_operation(
        &server,
        json!({ "query": ME_QUERY }),
        json!({ "data": { "me": null } }),
    );
    mock_operation(
        &server,
        json!({ "query": LOGIN_MUTATION, "variables": { "password": "wrong" } }),
        json!({ "data": { "login": {
            "errors": [{ "field": "password", "message": "incorrect password" }],
            "users": null
        } } }),
    );
    mock_operation(
        &server,
        json!({ "query": LOGIN_MUTATION, "variables": { "password": "right" } }),
        json!({ "data": { "login": {
            "errors": null,
            "users": { "id": 1, "username": "ben", "email": "ben@example.com",
                       "createdAt": "1000", "updatedAt": "1000" }
        } } }),
    );

    let mut session = session(&server);
    assert!(session.me().await?.is_none());

    let failed = session.login("ben", "wrong").await?;
    assert!(failed.has_errors());
    assert!(session.me().await?.is_none());

    let ok = session.login("ben", "right").await?;
    assert!(!ok.has_errors());
    let current = session.me().await?.expect("logged in");
    assert_eq!(current.username, "ben");

    me.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn server_failures_surface_as_errors() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/graphql");
        then.status(500).body("boom");
    });

    let mut session = session(&server);
    let err = session.me().await.expect_err("server error");
    assert!(matches!(err, CliError::Server(_)));
}

#[test]
fn shell_parses_commands() -> Result<(), CliError> {
    assert_eq!(parse_line("   ")?, None);
    assert_eq!(parse_line("posts")?, Some(ShellCommand::Posts));
    assert_eq!(
        parse_line("vote #4 down")?,
        Some(ShellCommand::Vote {
            post_id: 4,
            value: -1
        })
    );
    assert_eq!(
        parse_line("create Hello world | some text here")?,
        Some(ShellCommand::Create {
            title: "Hello world".into(),
            text: "some text here".into(),
        })
    );
    assert_eq!(
        parse_line("register ben ben@example.com hunter2")?,
        Some(ShellCommand::Register {
            username: "ben".into(),
            email: "ben@example.com".into(),
            password: "hunter2".into(),
        })
    );
    Ok(())
}

#[test]
fn shell_rejects_malformed_input() {
    assert!(matches!(
        parse_line("vote 4 sideways"),
        Err(CliError::InvalidInput(_))
    ));
    assert!(matches!(
        parse_line("create no separator"),
        Err(CliError::InvalidInput(_))
    ));
    assert!(matches!(parse_line("dance"), Err(CliError::InvalidInput(_))));
}
