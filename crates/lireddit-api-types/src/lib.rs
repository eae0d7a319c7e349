//! Wire types shared by the LiReddit server, the command-line client, and tests.
//!
//! Field names follow the GraphQL schema (camelCase). Timestamps are strings holding
//! milliseconds since the Unix epoch, which is also the format of the post-list cursor.

use serde::{Deserialize, Serialize};

pub mod documents;

/// Largest page size the server will hand out for `posts`.
pub const MAX_POSTS_PAGE: i32 = 50;

/// Length of `Post.textSnippet`, in characters.
pub const TEXT_SNIPPET_CHARS: usize = 50;

/// Error message the server uses when a protected field is resolved without a session.
pub const NOT_AUTHENTICATED: &str = "not authenticated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::SimpleObject))]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::InputObject))]
#[serde(rename_all = "camelCase")]
pub struct UsernamePasswordInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "graphql", derive(async_graphql::InputObject))]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub id: i32,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorSnapshot {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSnapshot {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub text: Option<String>,
    pub text_snippet: String,
    pub points: i32,
    pub vote_status: Option<i32>,
    pub creator_id: i32,
    pub creator: CreatorSnapshot,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedPosts {
    pub posts: Vec<PostSnapshot>,
    pub has_more: bool,
}

/// Result of `register`, `login`, and `changePassword`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(default)]
    pub errors: Option<Vec<FieldError>>,
    #[serde(default)]
    pub users: Option<UserSnapshot>,
}

impl UserResponse {
    /// True when the mutation reported at least one field error.
    pub fn has_errors(&self) -> bool {
        self.errors.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostsArgs {
    pub limit: i32,
    pub cursor: Option<String>,
}

impl PostsArgs {
    pub fn first(limit: i32) -> Self {
        Self {
            limit,
            cursor: None,
        }
    }

    pub fn after(limit: i32, cursor: impl Into<String>) -> Self {
        Self {
            limit,
            cursor: Some(cursor.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteArgs {
    pub post_id: i32,
    pub value: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginArgs {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordArgs {
    pub token: String,
    pub new_password: String,
}

// ============================================================================
// Response envelopes
// ============================================================================

/// Standard GraphQL response body.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
    #[serde(default)]
    pub extensions: Option<serde_json::Value>,
}

impl GraphqlError {
    pub fn is_not_authenticated(&self) -> bool {
        self.message.contains(NOT_AUTHENTICATED)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeData {
    pub me: Option<UserSnapshot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostsData {
    pub posts: PaginatedPosts,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostData {
    pub post: Option<PostSnapshot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub login: UserResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterData {
    pub register: UserResponse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordData {
    pub change_password: UserResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogoutData {
    pub logout: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordData {
    pub forgot_password: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoteData {
    pub vote: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostData {
    pub create_post: PostSnapshot,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePostData {
    pub delete_post: bool,
}
