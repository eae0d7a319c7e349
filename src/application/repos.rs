//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::{CursorPage, PageRequest, PaginationError, PostCursor};
use crate::domain::entities::{PostRecord, UpdootRecord, UserRecord};
use crate::domain::posts::{VoteChange, VoteValue};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn find_user(&self, id: i32) -> Result<Option<UserRecord>, RepoError>;

    async fn find_users_by_ids(&self, ids: &[i32]) -> Result<Vec<UserRecord>, RepoError>;

    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, RepoError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError>;

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub text: String,
    pub creator_id: i32,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: i32,
    pub creator_id: i32,
    pub title: String,
    pub text: String,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn list_posts(
        &self,
        page: PageRequest<PostCursor>,
    ) -> Result<CursorPage<PostRecord>, RepoError>;

    async fn find_post(&self, id: i32) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    /// Returns `None` when no post with that id belongs to `creator_id`.
    async fn update_post(&self, params: UpdatePostParams)
    -> Result<Option<PostRecord>, RepoError>;

    /// Delete a post owned by `creator_id`; its votes go with it.
    async fn delete_post(&self, id: i32, creator_id: i32) -> Result<bool, RepoError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpdootKey {
    pub post_id: i32,
    pub user_id: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct VoteParams {
    pub post_id: i32,
    pub user_id: i32,
    pub value: VoteValue,
}

#[async_trait]
pub trait UpdootsRepo: Send + Sync {
    /// Record a vote and adjust the post's points atomically.
    async fn apply_vote(&self, params: VoteParams) -> Result<VoteChange, RepoError>;

    async fn find_updoots(&self, keys: &[UpdootKey]) -> Result<Vec<UpdootRecord>, RepoError>;
}
