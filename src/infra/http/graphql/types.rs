//! GraphQL output types.

use async_graphql::{Context, Object, SimpleObject, dataloader::DataLoader};
use lireddit_api_types::FieldError;

use crate::application::error::AppError;
use crate::application::repos::UpdootKey;
use crate::application::sessions::SessionHandle;
use crate::application::users::AccountOutcome;
use crate::domain::entities::{PostRecord, UserRecord};
use crate::domain::posts::text_snippet;
use crate::domain::timestamps::to_millis_string;

use super::error::GraphqlResultExt;
use super::loaders::{UpdootLoader, UserLoader, loader_error};

pub struct User(pub UserRecord);

#[Object]
impl User {
    async fn id(&self) -> i32 {
        self.0.id
    }

    async fn username(&self) -> &str {
        &self.0.username
    }

    /// Only the account owner sees the address; everyone else gets an empty string.
    async fn email(&self, ctx: &Context<'_>) -> async_graphql::Result<&str> {
        let session = ctx.data::<SessionHandle>()?;
        if session.user_id() == Some(self.0.id) {
            Ok(&self.0.email)
        } else {
            Ok("")
        }
    }

    async fn created_at(&self) -> String {
        to_millis_string(self.0.created_at)
    }

    async fn updated_at(&self) -> String {
        to_millis_string(self.0.updated_at)
    }
}

pub struct Post(pub PostRecord);

#[Object]
impl Post {
    async fn id(&self) -> i32 {
        self.0.id
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn text(&self) -> &str {
        &self.0.text
    }

    async fn text_snippet(&self) -> String {
        text_snippet(&self.0.text)
    }

    async fn points(&self) -> i32 {
        self.0.points
    }

    async fn creator_id(&self) -> i32 {
        self.0.creator_id
    }

    async fn creator(&self, ctx: &Context<'_>) -> async_graphql::Result<User> {
        let loader = ctx.data::<DataLoader<UserLoader>>()?;
        let creator = loader
            .load_one(self.0.creator_id)
            .await
            .map_err(loader_error)
            .into_graphql()?;
        creator
            .map(User)
            .ok_or(AppError::NotFound)
            .into_graphql()
    }

    /// The viewer's vote on this post, or null when logged out or not voted.
    async fn vote_status(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<i32>> {
        let session = ctx.data::<SessionHandle>()?;
        let Some(user_id) = session.user_id() else {
            return Ok(None);
        };
        let loader = ctx.data::<DataLoader<UpdootLoader>>()?;
        let updoot = loader
            .load_one(UpdootKey {
                post_id: self.0.id,
                user_id,
            })
            .await
            .map_err(loader_error)
            .into_graphql()?;
        Ok(updoot.map(|updoot| updoot.value.as_i32()))
    }

    async fn created_at(&self) -> String {
        to_millis_string(self.0.created_at)
    }

    async fn updated_at(&self) -> String {
        to_millis_string(self.0.updated_at)
    }
}

#[derive(SimpleObject)]
pub struct PaginatedPosts {
    pub posts: Vec<Post>,
    pub has_more: bool,
}

#[derive(SimpleObject)]
pub struct UserResponse {
    pub errors: Option<Vec<FieldError>>,
    pub users: Option<User>,
}

impl From<AccountOutcome> for UserResponse {
    fn from(outcome: AccountOutcome) -> Self {
        match outcome {
            AccountOutcome::Accepted(user) => Self {
                errors: None,
                users: Some(User(user)),
            },
            AccountOutcome::Rejected(violation) => Self {
                errors: Some(vec![FieldError::new(violation.field, violation.message)]),
                users: None,
            },
        }
    }
}
