use async_trait::async_trait;

use crate::application::repos::{
    CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;
use crate::infra::db::map_sqlx_error;

use super::super::PostgresRepositories;
use super::types::PostRow;

const RETURNING: &str = "RETURNING id, title, text, points, creator_id, created_at, updated_at";

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            title,
            text,
            creator_id,
        } = params;

        let sql = format!("INSERT INTO posts (title, text, creator_id) VALUES ($1, $2, $3) {RETURNING}");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(title)
            .bind(text)
            .bind(creator_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(
        &self,
        params: UpdatePostParams,
    ) -> Result<Option<PostRecord>, RepoError> {
        let UpdatePostParams {
            id,
            creator_id,
            title,
            text,
        } = params;

        let sql = format!(
            "UPDATE posts SET title = $1, text = $2, \
             updated_at = date_trunc('milliseconds', now()) \
             WHERE id = $3 AND creator_id = $4 {RETURNING}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(title)
            .bind(text)
            .bind(id)
            .bind(creator_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn delete_post(&self, id: i32, creator_id: i32) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND creator_id = $2")
            .bind(id)
            .bind(creator_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
