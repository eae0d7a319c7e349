//! GraphQL schema: queries and mutations over the account and post services.

mod error;
mod loaders;
mod posts;
mod types;
mod users;

pub use loaders::LoaderFactory;

use async_graphql::{EmptySubscription, MergedObject, Request, Schema};

use crate::application::posts::PostService;
use crate::application::sessions::SessionHandle;
use crate::application::users::UserService;

use posts::{PostMutation, PostQuery};
use users::{UserMutation, UserQuery};

#[derive(MergedObject, Default)]
pub struct QueryRoot(UserQuery, PostQuery);

#[derive(MergedObject, Default)]
pub struct MutationRoot(UserMutation, PostMutation);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(users: UserService, posts: PostService, introspection: bool) -> AppSchema {
    let builder = Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(users)
    .data(posts);

    if introspection {
        builder.finish()
    } else {
        builder.disable_introspection().finish()
    }
}

/// Attach the per-request session and batch loaders.
pub fn prepare_request(
    request: Request,
    session: SessionHandle,
    loaders: &LoaderFactory,
) -> Request {
    request
        .data(session)
        .data(loaders.users())
        .data(loaders.updoots())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::application::fakes::InMemoryRepos;
    use crate::application::sessions::SessionStore;
    use crate::application::users::PasswordResetSettings;
    use crate::infra::mail::LogMailer;
    use crate::infra::sessions::MemoryStore;

    struct Harness {
        schema: AppSchema,
        sessions: SessionStore,
        loaders: LoaderFactory,
    }

    fn harness() -> Harness {
        let repos = Arc::new(InMemoryRepos::default());
        let kv = Arc::new(MemoryStore::new());
        let users = UserService::new(
            repos.clone(),
            kv.clone(),
            Arc::new(LogMailer),
            PasswordResetSettings {
                link_base: "http://localhost:3000/change-password".to_string(),
                token_ttl: Duration::from_secs(60),
            },
        );
        let posts = PostService::new(repos.clone(), repos.clone(), repos.clone());
        Harness {
            schema: build_schema(users, posts, true),
            sessions: SessionStore::new(kv, Duration::from_secs(60)),
            loaders: LoaderFactory::new(repos.clone(), repos),
        }
    }

    impl Harness {
        async fn run(&self, session: &SessionHandle, query: &str) -> serde_json::Value {
            let request = prepare_request(Request::new(query), session.clone(), &self.loaders);
            let response = self.schema.execute(request).await;
            serde_json::to_value(&response).expect("serializable response")
        }
    }

    #[tokio::test]
    async fn hello_and_anonymous_me() {
        let h = harness();
        let session = SessionHandle::anonymous(h.sessions.clone());
        let body = h.run(&session, "{ hello me { id } }").await;
        assert_eq!(body["data"]["hello"], "hello world");
        assert!(body["data"]["me"].is_null());
    }

    #[tokio::test]
    async fn create_post_requires_login() {
        let h = harness();
        let session = SessionHandle::anonymous(h.sessions.clone());
        let body = h
            .run(
                &session,
                r#"mutation { createPost(input: { title: "t", text: "x" }) { id } }"#,
            )
            .await;
        assert_eq!(body["errors"][0]["message"], "not authenticated");
        assert_eq!(body["errors"][0]["extensions"]["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn registered_user_sees_own_email_and_vote_status() {
        let h = harness();
        let session = SessionHandle::anonymous(h.sessions.clone());
        let body = h
            .run(
                &session,
                r#"mutation { register(options: { email: "ben@example.com", username: "ben", password: "secret" }) { errors { field } users { id email } } }"#,
            )
            .await;
        assert!(body["data"]["register"]["errors"].is_null());
        assert_eq!(body["data"]["register"]["users"]["email"], "ben@example.com");

        let body = h
            .run(
                &session,
                r#"mutation { createPost(input: { title: "first", text: "hello there" }) { id points voteStatus creator { username } } }"#,
            )
            .await;
        let post = &body["data"]["createPost"];
        assert_eq!(post["points"], 0);
        assert!(post["voteStatus"].is_null());
        assert_eq!(post["creator"]["username"], "ben");
        let id = post["id"].as_i64().expect("post id");

        let body = h
            .run(&session, &format!("mutation {{ vote(postId: {id}, value: -1) }}"))
            .await;
        assert_eq!(body["data"]["vote"], true);

        let body = h
            .run(
                &session,
                "{ posts(limit: 10) { hasMore posts { points voteStatus textSnippet } } }",
            )
            .await;
        let posts = &body["data"]["posts"];
        assert_eq!(posts["hasMore"], false);
        assert_eq!(posts["posts"][0]["points"], -1);
        assert_eq!(posts["posts"][0]["voteStatus"], -1);

        let stranger = SessionHandle::anonymous(h.sessions.clone());
        let body = h.run(&stranger, "{ users { username email } }").await;
        assert_eq!(body["data"]["users"][0]["email"], "");
    }

    #[tokio::test]
    async fn failed_login_reports_field_error() {
        let h = harness();
        let session = SessionHandle::anonymous(h.sessions.clone());
        let body = h
            .run(
                &session,
                r#"mutation { login(usernameOrEmail: "ghost", password: "secret") { errors { field message } users { id } } }"#,
            )
            .await;
        let errors = &body["data"]["login"]["errors"];
        assert_eq!(errors[0]["field"], "usernameOrEmail");
        assert_eq!(errors[0]["message"], "username doesn't exist");
        assert!(body["data"]["login"]["users"].is_null());
    }
}
