use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

use lireddit::application::mail::Mailer;
use lireddit::application::posts::PostService;
use lireddit::application::repos::{PostsRepo, PostsWriteRepo, UpdootsRepo, UsersRepo};
use lireddit::application::sessions::{KeyValueStore, SessionStore};
use lireddit::application::users::{PasswordResetSettings, UserService};
use lireddit::infra::db::PostgresRepositories;
use lireddit::infra::http::graphql::{LoaderFactory, build_schema};
use lireddit::infra::http::{self, HttpState, SESSION_COOKIE, SessionCookieSettings};
use lireddit::infra::mail::LogMailer;
use lireddit::infra::sessions::MemoryStore;

const ORIGIN: &str = "http://localhost:3000";
const TEN_YEARS: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 10);

fn build_app(pool: PgPool) -> Router {
    let repos = Arc::new(PostgresRepositories::new(pool));
    let users_repo: Arc<dyn UsersRepo> = repos.clone();
    let posts_repo: Arc<dyn PostsRepo> = repos.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repos.clone();
    let updoots_repo: Arc<dyn UpdootsRepo> = repos.clone();
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);

    let users = UserService::new(
        users_repo.clone(),
        kv.clone(),
        mailer,
        PasswordResetSettings {
            link_base: format!("{ORIGIN}/change-password"),
            token_ttl: Duration::from_secs(60 * 60 * 24 * 3),
        },
    );
    let posts = PostService::new(posts_repo, posts_write_repo, updoots_repo.clone());

    let state = HttpState {
        schema: build_schema(users, posts, true),
        sessions: SessionStore::new(kv, TEN_YEARS),
        loaders: LoaderFactory::new(users_repo, updoots_repo),
        cookies: SessionCookieSettings {
            secure: false,
            max_age: TEN_YEARS,
        },
        db: repos,
        playground: true,
    };
    http::build_router(state, ORIGIN).expect("router")
}

/// A browser-like client that keeps the session cookie between requests.
struct Browser {
    app: Router,
    cookie: Option<String>,
    last_set_cookie: Option<String>,
}

impl Browser {
    fn new(app: Router) -> Self {
        Self {
            app,
            cookie: None,
            last_set_cookie: None,
        }
    }

    async fn gql(&mut self, query: &str, variables: Value) -> Value {
        let mut request = Request::builder()
            .method("POST")
            .uri("/graphql")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ORIGIN, ORIGIN);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, format!("{SESSION_COOKIE}={cookie}"));
        }
        let body = json!({ "query": query, "variables": variables }).to_string();
        let response = self
            .app
            .clone()
            .oneshot(request.body(Body::from(body)).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        self.last_set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if let Some(set_cookie) = &self.last_set_cookie {
            let value = set_cookie
                .split(';')
                .next()
                .and_then(|pair| pair.strip_prefix(&format!("{SESSION_COOKIE}=")))
                .unwrap_or_default();
            self.cookie = (!value.is_empty()).then(|| value.to_string());
        }

        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    async fn register(&mut self, username: &str) -> i64 {
        let body = self
            .gql(
                "mutation($options: UsernamePasswordInput!) { register(options: $options) { errors { field message } users { id } } }",
                json!({ "options": {
                    "email": format!("{username}@example.com"),
                    "username": username,
                    "password": "hunter2",
                }}),
            )
            .await;
        assert!(body["data"]["register"]["errors"].is_null(), "{body}");
        body["data"]["register"]["users"]["id"]
            .as_i64()
            .expect("user id")
    }

    async fn create_post(&mut self, title: &str) -> i64 {
        let body = self
            .gql(
                "mutation($input: PostInput!) { createPost(input: $input) { id } }",
                json!({ "input": { "title": title, "text": "some body text" } }),
            )
            .await;
        body["data"]["createPost"]["id"].as_i64().expect("post id")
    }

    async fn points(&mut self, id: i64) -> (i64, Value) {
        let body = self
            .gql(
                "query($id: Int!) { post(id: $id) { points voteStatus } }",
                json!({ "id": id }),
            )
            .await;
        let post = &body["data"]["post"];
        (post["points"].as_i64().expect("points"), post["voteStatus"].clone())
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn register_issues_session_cookie(pool: PgPool) {
    let mut browser = Browser::new(build_app(pool));
    let id = browser.register("ben").await;

    let set_cookie = browser.last_set_cookie.clone().expect("session cookie");
    assert!(set_cookie.starts_with("qid="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Max-Age=315360000"));

    let body = browser.gql("{ me { id username email } }", json!({})).await;
    assert_eq!(body["data"]["me"]["id"].as_i64(), Some(id));
    assert_eq!(body["data"]["me"]["email"], "ben@example.com");
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_username_is_reported_as_field_error(pool: PgPool) {
    let app = build_app(pool);
    Browser::new(app.clone()).register("ben").await;

    let body = Browser::new(app)
        .gql(
            r#"mutation { register(options: { email: "other@example.com", username: "ben", password: "hunter2" }) { errors { field message } users { id } } }"#,
            json!({}),
        )
        .await;
    assert_eq!(
        body["data"]["register"]["errors"],
        json!([{ "field": "username", "message": "username already taken" }])
    );
    assert!(body["data"]["register"]["users"].is_null());
}

#[sqlx::test(migrations = "./migrations")]
async fn votes_adjust_points_once_per_direction(pool: PgPool) {
    let mut browser = Browser::new(build_app(pool));
    browser.register("ben").await;
    let post = browser.create_post("first").await;

    let vote = "mutation($postId: Int!, $value: Int!) { vote(postId: $postId, value: $value) }";
    browser.gql(vote, json!({ "postId": post, "value": 1 })).await;
    browser.gql(vote, json!({ "postId": post, "value": 1 })).await;
    assert_eq!(browser.points(post).await, (1, json!(1)));

    browser.gql(vote, json!({ "postId": post, "value": -1 })).await;
    assert_eq!(browser.points(post).await, (-1, json!(-1)));

    let mut stranger = Browser::new(browser.app.clone());
    assert_eq!(stranger.points(post).await, (-1, Value::Null));
    let body = stranger
        .gql(vote, json!({ "postId": post, "value": 1 }))
        .await;
    assert_eq!(body["errors"][0]["message"], "not authenticated");
}

#[sqlx::test(migrations = "./migrations")]
async fn posts_page_newest_first_with_cursor(pool: PgPool) {
    let mut browser = Browser::new(build_app(pool.clone()));
    let creator = browser.register("ben").await;

    for minutes in [3_i32, 2, 1] {
        sqlx::query(
            "INSERT INTO posts (title, text, creator_id, created_at) \
             VALUES ($1, 'body', $2, date_trunc('milliseconds', now()) - make_interval(mins => $3))",
        )
        .bind(format!("{minutes} minutes ago"))
        .bind(creator as i32)
        .bind(minutes)
        .execute(&pool)
        .await
        .expect("seed post");
    }

    let query = "query($limit: Int!, $cursor: String) { posts(limit: $limit, cursor: $cursor) { hasMore posts { title createdAt creator { username } } } }";
    let first = browser.gql(query, json!({ "limit": 2 })).await;
    let page = &first["data"]["posts"];
    assert_eq!(page["hasMore"], true);
    assert_eq!(page["posts"][0]["title"], "1 minutes ago");
    assert_eq!(page["posts"][1]["title"], "2 minutes ago");
    assert_eq!(page["posts"][0]["creator"]["username"], "ben");

    let cursor = page["posts"][1]["createdAt"].as_str().expect("cursor");
    let second = browser
        .gql(query, json!({ "limit": 2, "cursor": cursor }))
        .await;
    let page = &second["data"]["posts"];
    assert_eq!(page["hasMore"], false);
    assert_eq!(page["posts"].as_array().map(Vec::len), Some(1));
    assert_eq!(page["posts"][0]["title"], "3 minutes ago");

    let bad = browser
        .gql(query, json!({ "limit": 2, "cursor": "not-a-date" }))
        .await;
    assert_eq!(bad["errors"][0]["extensions"]["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "./migrations")]
async fn only_creator_deletes_and_votes_cascade(pool: PgPool) {
    let app = build_app(pool.clone());
    let mut owner = Browser::new(app.clone());
    owner.register("ben").await;
    let post = owner.create_post("doomed").await;

    let mut other = Browser::new(app);
    other.register("amy").await;
    other
        .gql(
            "mutation($postId: Int!) { vote(postId: $postId, value: 1) }",
            json!({ "postId": post }),
        )
        .await;

    let delete = "mutation($id: Int!) { deletePost(id: $id) }";
    let body = other.gql(delete, json!({ "id": post })).await;
    assert_eq!(body["data"]["deletePost"], false);

    let body = owner.gql(delete, json!({ "id": post })).await;
    assert_eq!(body["data"]["deletePost"], true);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM updoots WHERE post_id = $1")
        .bind(post as i32)
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(remaining, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn logout_clears_cookie_and_identity(pool: PgPool) {
    let mut browser = Browser::new(build_app(pool));
    browser.register("ben").await;

    let body = browser.gql("mutation { logout }", json!({})).await;
    assert_eq!(body["data"]["logout"], true);
    let set_cookie = browser.last_set_cookie.clone().expect("removal cookie");
    assert!(set_cookie.contains("Max-Age=0"));
    assert!(browser.cookie.is_none());

    let body = browser.gql("{ me { id } }", json!({})).await;
    assert!(body["data"]["me"].is_null());
}

#[sqlx::test(migrations = "./migrations")]
async fn cors_allows_web_origin_with_credentials(pool: PgPool) {
    let app = build_app(pool);
    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/graphql")
                .header(header::ORIGIN, ORIGIN)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    let headers = response.headers();
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some(ORIGIN)
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
}
