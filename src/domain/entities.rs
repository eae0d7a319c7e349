//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::posts::VoteValue;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: i32,
    pub title: String,
    pub text: String,
    pub points: i32,
    pub creator_id: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A stored vote of one user on one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdootRecord {
    pub user_id: i32,
    pub post_id: i32,
    pub value: VoteValue,
}
