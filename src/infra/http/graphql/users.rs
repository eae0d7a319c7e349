use async_graphql::{Context, Object};
use lireddit_api_types::UsernamePasswordInput;

use crate::application::sessions::SessionHandle;
use crate::application::users::{RegisterInput, UserService};

use super::error::GraphqlResultExt;
use super::types::{User, UserResponse};

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    async fn hello(&self) -> &'static str {
        "hello world"
    }

    async fn me(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<User>> {
        let service = ctx.data::<UserService>()?;
        let session = ctx.data::<SessionHandle>()?;
        let me = service.me(session).await.into_graphql()?;
        Ok(me.map(User))
    }

    async fn users(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<User>> {
        let service = ctx.data::<UserService>()?;
        let users = service.list_users().await.into_graphql()?;
        Ok(users.into_iter().map(User).collect())
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    async fn register(
        &self,
        ctx: &Context<'_>,
        options: UsernamePasswordInput,
    ) -> async_graphql::Result<UserResponse> {
        let service = ctx.data::<UserService>()?;
        let session = ctx.data::<SessionHandle>()?;
        let input = RegisterInput {
            email: options.email,
            username: options.username,
            password: options.password,
        };
        let outcome = service.register(session, input).await.into_graphql()?;
        Ok(outcome.into())
    }

    async fn login(
        &self,
        ctx: &Context<'_>,
        username_or_email: String,
        password: String,
    ) -> async_graphql::Result<UserResponse> {
        let service = ctx.data::<UserService>()?;
        let session = ctx.data::<SessionHandle>()?;
        let outcome = service
            .login(session, &username_or_email, &password)
            .await
            .into_graphql()?;
        Ok(outcome.into())
    }

    async fn logout(&self, ctx: &Context<'_>) -> async_graphql::Result<bool> {
        let service = ctx.data::<UserService>()?;
        let session = ctx.data::<SessionHandle>()?;
        Ok(service.logout(session).await)
    }

    async fn forgot_password(
        &self,
        ctx: &Context<'_>,
        email: String,
    ) -> async_graphql::Result<bool> {
        let service = ctx.data::<UserService>()?;
        service.forgot_password(&email).await.into_graphql()
    }

    async fn change_password(
        &self,
        ctx: &Context<'_>,
        token: String,
        new_password: String,
    ) -> async_graphql::Result<UserResponse> {
        let service = ctx.data::<UserService>()?;
        let session = ctx.data::<SessionHandle>()?;
        let outcome = service
            .change_password(session, &token, &new_password)
            .await
            .into_graphql()?;
        Ok(outcome.into())
    }
}
