//! Post use cases: feed pages, authoring and voting.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info};

use crate::application::error::AppError;
use crate::application::pagination::{CursorPage, PageRequest, PostCursor};
use crate::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams, UpdootsRepo,
    VoteParams,
};
use crate::application::sessions::SessionHandle;
use crate::domain::entities::PostRecord;
use crate::domain::posts::{VoteChange, VoteValue};
use crate::infra::telemetry::VOTES_TOTAL;

#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub text: String,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    updoots: Arc<dyn UpdootsRepo>,
}

/// The session's user id, or `NotAuthenticated`.
pub fn require_user(session: &SessionHandle) -> Result<i32, AppError> {
    session.user_id().ok_or(AppError::NotAuthenticated)
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        updoots: Arc<dyn UpdootsRepo>,
    ) -> Self {
        Self {
            posts,
            writer,
            updoots,
        }
    }

    pub async fn list(
        &self,
        limit: i32,
        cursor: Option<&str>,
    ) -> Result<CursorPage<PostRecord>, AppError> {
        let request = PageRequest::<PostCursor>::from_args(limit, cursor)
            .map_err(RepoError::from)?;
        debug!(
            limit = request.effective_limit(),
            cursor = cursor.unwrap_or(""),
            "listing posts"
        );
        Ok(self.posts.list_posts(request).await?)
    }

    pub async fn find(&self, id: i32) -> Result<Option<PostRecord>, AppError> {
        Ok(self.posts.find_post(id).await?)
    }

    pub async fn create(
        &self,
        session: &SessionHandle,
        input: PostInput,
    ) -> Result<PostRecord, AppError> {
        let creator_id = require_user(session)?;
        let post = self
            .writer
            .create_post(CreatePostParams {
                title: input.title,
                text: input.text,
                creator_id,
            })
            .await?;
        info!(post_id = post.id, creator_id, "post created");
        Ok(post)
    }

    /// Returns `None` when the post does not exist or belongs to someone else.
    pub async fn update(
        &self,
        session: &SessionHandle,
        id: i32,
        input: PostInput,
    ) -> Result<Option<PostRecord>, AppError> {
        let creator_id = require_user(session)?;
        Ok(self
            .writer
            .update_post(UpdatePostParams {
                id,
                creator_id,
                title: input.title,
                text: input.text,
            })
            .await?)
    }

    pub async fn delete(&self, session: &SessionHandle, id: i32) -> Result<bool, AppError> {
        let creator_id = require_user(session)?;
        let deleted = self.writer.delete_post(id, creator_id).await?;
        if deleted {
            info!(post_id = id, creator_id, "post deleted");
        }
        Ok(deleted)
    }

    pub async fn vote(
        &self,
        session: &SessionHandle,
        post_id: i32,
        value: i32,
    ) -> Result<bool, AppError> {
        let user_id = require_user(session)?;
        let value = VoteValue::from_raw(value);
        let change = self
            .updoots
            .apply_vote(VoteParams {
                post_id,
                user_id,
                value,
            })
            .await?;

        match change {
            VoteChange::Unchanged => debug!(post_id, user_id, "repeated vote ignored"),
            VoteChange::Cast { delta } | VoteChange::Switched { delta } => {
                counter!(VOTES_TOTAL).increment(1);
                info!(post_id, user_id, delta, "vote recorded");
            }
        }
        Ok(true)
    }
}
