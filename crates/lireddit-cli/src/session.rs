//! Composition of the GraphQL transport with the normalized cache.
//!
//! Reads are cache-first: a cached listing is returned as-is, and the network is only
//! asked on a miss or a partial read. Every mutation goes to the server and then runs the
//! cache update that belongs to it. Votes are written to the cache before the request
//! and rolled back if it fails.

#![deny(clippy::all, clippy::pedantic)]

use lireddit_api_types::documents::{
    CHANGE_PASSWORD_MUTATION, CREATE_POST_MUTATION, DELETE_POST_MUTATION,
    FORGOT_PASSWORD_MUTATION, LOGIN_MUTATION, LOGOUT_MUTATION, ME_QUERY, POST_QUERY,
    POSTS_QUERY, REGISTER_MUTATION, VOTE_MUTATION,
};
use lireddit_api_types::{
    ChangePasswordArgs, ChangePasswordData, CreatePostData, DeletePostData, ForgotPasswordData,
    LoginArgs, LoginData, LogoutData, MeData, PaginatedPosts, PostData, PostInput, PostSnapshot,
    PostsArgs, PostsData, RegisterData, UserResponse, UserSnapshot, UsernamePasswordInput,
    VoteArgs, VoteData,
};
use lireddit_cache::{CacheRead, MutationResult, PostCache, VoteOutcome};
use serde_json::json;
use tracing::{debug, warn};

use crate::client::{CliError, Transport};

pub struct ForumSession {
    transport: Transport,
    cache: PostCache,
    page_size: i32,
}

impl ForumSession {
    pub fn new(transport: Transport, page_size: i32) -> Self {
        Self {
            transport,
            cache: PostCache::new(),
            page_size,
        }
    }

    #[cfg(test)]
    pub fn cache(&self) -> &PostCache {
        &self.cache
    }

    /// All posts fetched so far for `args`, plus whether the server has more.
    pub async fn posts(&mut self, args: &PostsArgs) -> Result<PaginatedPosts, CliError> {
        let cached = self.cache.read_posts(args);
        if !cached.needs_fetch()
            && let Some(page) = cached.into_data()
        {
            debug!(limit = args.limit, "posts served from cache");
            return Ok(page);
        }

        let data: PostsData = self
            .transport
            .execute(
                POSTS_QUERY,
                json!({ "limit": args.limit, "cursor": args.cursor }),
            )
            .await?;
        self.cache.write_posts(args, &data.posts);

        Ok(self.cache.read_posts(args).into_data().unwrap_or(data.posts))
    }

    /// The front page as the web client requests it.
    pub async fn front_page(&mut self) -> Result<PaginatedPosts, CliError> {
        self.posts(&PostsArgs::first(self.page_size)).await
    }

    /// Fetch the page after the last post already cached. Returns the whole merged list.
    pub async fn more(&mut self) -> Result<PaginatedPosts, CliError> {
        let current = match self.cache.read_posts(&PostsArgs::first(self.page_size)) {
            CacheRead::Miss => return self.front_page().await,
            CacheRead::Hit { data, .. } => data,
        };
        if !current.has_more {
            return Ok(current);
        }
        let Some(last) = current.posts.last() else {
            return Ok(current);
        };
        let args = PostsArgs::after(self.page_size, last.created_at.clone());
        self.posts(&args).await
    }

    /// A single post with its full text.
    pub async fn post(&mut self, id: i32) -> Result<Option<PostSnapshot>, CliError> {
        if let Some(post) = self.cache.read_post(id)
            && post.text.is_some()
        {
            return Ok(Some(post.clone()));
        }

        let data: PostData = self.transport.execute(POST_QUERY, json!({ "id": id })).await?;
        if let Some(post) = &data.post {
            self.cache.write_post(post);
        }
        Ok(data.post)
    }

    pub async fn me(&mut self) -> Result<Option<UserSnapshot>, CliError> {
        if let CacheRead::Hit { data, .. } = self.cache.read_me() {
            return Ok(data);
        }

        let data: MeData = self.transport.execute(ME_QUERY, json!({})).await?;
        self.cache.write_me(data.me.as_ref());
        Ok(data.me)
    }

    /// Vote on a post. The cached post changes immediately; a failed request undoes it.
    pub async fn vote(&mut self, post_id: i32, value: i32) -> Result<VoteOutcome, CliError> {
        let outcome = self.cache.apply_vote(post_id, value);
        let result: Result<VoteData, CliError> = self
            .transport
            .execute(VOTE_MUTATION, json!(VoteArgs { post_id, value }))
            .await;

        match (result, &outcome) {
            (Ok(_), VoteOutcome::Applied(token)) => {
                self.cache.confirm_vote(token);
                Ok(outcome)
            }
            (Ok(_), _) => Ok(outcome),
            (Err(err), VoteOutcome::Applied(token)) => {
                if !self.cache.rollback_vote(token) {
                    warn!(post_id, "vote rollback skipped: post was refreshed");
                }
                Err(err)
            }
            (Err(err), _) => Err(err),
        }
    }

    pub async fn create_post(&mut self, input: PostInput) -> Result<PostSnapshot, CliError> {
        let data: CreatePostData = self
            .transport
            .execute(CREATE_POST_MUTATION, json!({ "input": input }))
            .await?;
        self.cache.apply_mutation(MutationResult::CreatePost);
        Ok(data.create_post)
    }

    /// Returns false when the server refused (not found or not the creator).
    pub async fn delete_post(&mut self, id: i32) -> Result<bool, CliError> {
        let data: DeletePostData = self
            .transport
            .execute(DELETE_POST_MUTATION, json!({ "id": id }))
            .await?;
        if data.delete_post {
            self.cache.apply_mutation(MutationResult::DeletePost { id });
        }
        Ok(data.delete_post)
    }

    pub async fn login(
        &mut self,
        username_or_email: &str,
        password: &str,
    ) -> Result<UserResponse, CliError> {
        let args = LoginArgs {
            username_or_email: username_or_email.to_string(),
            password: password.to_string(),
        };
        let data: LoginData = self.transport.execute(LOGIN_MUTATION, json!(args)).await?;
        self.cache.apply_mutation(MutationResult::Login(&data.login));
        Ok(data.login)
    }

    pub async fn register(
        &mut self,
        options: UsernamePasswordInput,
    ) -> Result<UserResponse, CliError> {
        let data: RegisterData = self
            .transport
            .execute(REGISTER_MUTATION, json!({ "options": options }))
            .await?;
        self.cache
            .apply_mutation(MutationResult::Register(&data.register));
        Ok(data.register)
    }

    pub async fn logout(&mut self) -> Result<bool, CliError> {
        let data: LogoutData = self.transport.execute(LOGOUT_MUTATION, json!({})).await?;
        self.cache.apply_mutation(MutationResult::Logout);
        Ok(data.logout)
    }

    pub async fn forgot_password(&mut self, email: &str) -> Result<bool, CliError> {
        let data: ForgotPasswordData = self
            .transport
            .execute(FORGOT_PASSWORD_MUTATION, json!({ "email": email }))
            .await?;
        Ok(data.forgot_password)
    }

    pub async fn change_password(
        &mut self,
        token: &str,
        new_password: &str,
    ) -> Result<UserResponse, CliError> {
        let args = ChangePasswordArgs {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        let data: ChangePasswordData = self
            .transport
            .execute(CHANGE_PASSWORD_MUTATION, json!(args))
            .await?;
        self.cache
            .apply_mutation(MutationResult::ChangePassword(&data.change_password));
        Ok(data.change_password)
    }
}
