use async_graphql::{Context, Object};
use lireddit_api_types::PostInput;

use crate::application::posts::{self, PostService};
use crate::application::sessions::SessionHandle;

use super::error::GraphqlResultExt;
use super::types::{PaginatedPosts, Post};

#[derive(Default)]
pub struct PostQuery;

#[Object]
impl PostQuery {
    async fn posts(
        &self,
        ctx: &Context<'_>,
        limit: i32,
        cursor: Option<String>,
    ) -> async_graphql::Result<PaginatedPosts> {
        let service = ctx.data::<PostService>()?;
        let page = service
            .list(limit, cursor.as_deref())
            .await
            .into_graphql()?;
        let has_more = page.has_more();
        Ok(PaginatedPosts {
            posts: page.items.into_iter().map(Post).collect(),
            has_more,
        })
    }

    async fn post(&self, ctx: &Context<'_>, id: i32) -> async_graphql::Result<Option<Post>> {
        let service = ctx.data::<PostService>()?;
        let post = service.find(id).await.into_graphql()?;
        Ok(post.map(Post))
    }
}

#[derive(Default)]
pub struct PostMutation;

#[Object]
impl PostMutation {
    async fn create_post(
        &self,
        ctx: &Context<'_>,
        input: PostInput,
    ) -> async_graphql::Result<Post> {
        let service = ctx.data::<PostService>()?;
        let session = ctx.data::<SessionHandle>()?;
        let input = posts::PostInput {
            title: input.title,
            text: input.text,
        };
        let post = service.create(session, input).await.into_graphql()?;
        Ok(Post(post))
    }

    async fn update_post(
        &self,
        ctx: &Context<'_>,
        id: i32,
        title: String,
        text: String,
    ) -> async_graphql::Result<Option<Post>> {
        let service = ctx.data::<PostService>()?;
        let session = ctx.data::<SessionHandle>()?;
        let input = posts::PostInput { title, text };
        let post = service.update(session, id, input).await.into_graphql()?;
        Ok(post.map(Post))
    }

    async fn delete_post(&self, ctx: &Context<'_>, id: i32) -> async_graphql::Result<bool> {
        let service = ctx.data::<PostService>()?;
        let session = ctx.data::<SessionHandle>()?;
        service.delete(session, id).await.into_graphql()
    }

    async fn vote(
        &self,
        ctx: &Context<'_>,
        post_id: i32,
        value: i32,
    ) -> async_graphql::Result<bool> {
        let service = ctx.data::<PostService>()?;
        let session = ctx.data::<SessionHandle>()?;
        service.vote(session, post_id, value).await.into_graphql()
    }
}
