use async_trait::async_trait;

use crate::application::repos::{RepoError, UpdootKey, UpdootsRepo, VoteParams};
use crate::domain::entities::UpdootRecord;
use crate::domain::posts::{VoteChange, VoteValue};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct UpdootRow {
    user_id: i32,
    post_id: i32,
    value: i32,
}

impl UpdootRow {
    fn into_record(self) -> Result<UpdootRecord, RepoError> {
        let value = VoteValue::from_stored(self.value).ok_or_else(|| RepoError::Integrity {
            message: format!(
                "updoot ({}, {}) holds unsupported value {}",
                self.user_id, self.post_id, self.value
            ),
        })?;
        Ok(UpdootRecord {
            user_id: self.user_id,
            post_id: self.post_id,
            value,
        })
    }
}

#[async_trait]
impl UpdootsRepo for PostgresRepositories {
    async fn apply_vote(&self, params: VoteParams) -> Result<VoteChange, RepoError> {
        let VoteParams {
            post_id,
            user_id,
            value,
        } = params;

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        // Lock the post row so concurrent votes on it serialize.
        let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        if exists.is_none() {
            return Err(RepoError::NotFound);
        }

        let previous: Option<i32> = sqlx::query_scalar(
            "SELECT value FROM updoots WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let change = VoteChange::plan(previous.and_then(VoteValue::from_stored), value);

        match change {
            VoteChange::Unchanged => {
                tx.rollback().await.map_err(map_sqlx_error)?;
                return Ok(change);
            }
            VoteChange::Cast { .. } => {
                sqlx::query("INSERT INTO updoots (user_id, post_id, value) VALUES ($1, $2, $3)")
                    .bind(user_id)
                    .bind(post_id)
                    .bind(value.as_i32())
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;
            }
            VoteChange::Switched { .. } => {
                sqlx::query("UPDATE updoots SET value = $1 WHERE user_id = $2 AND post_id = $3")
                    .bind(value.as_i32())
                    .bind(user_id)
                    .bind(post_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;
            }
        }

        sqlx::query("UPDATE posts SET points = points + $1 WHERE id = $2")
            .bind(change.delta())
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(change)
    }

    async fn find_updoots(&self, keys: &[UpdootKey]) -> Result<Vec<UpdootRecord>, RepoError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let (post_ids, user_ids): (Vec<i32>, Vec<i32>) =
            keys.iter().map(|key| (key.post_id, key.user_id)).unzip();

        let rows = sqlx::query_as::<_, UpdootRow>(
            "SELECT u.user_id, u.post_id, u.value FROM updoots u \
             INNER JOIN UNNEST($1::int4[], $2::int4[]) AS k(post_id, user_id) \
             ON u.post_id = k.post_id AND u.user_id = k.user_id",
        )
        .bind(post_ids)
        .bind(user_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(UpdootRow::into_record).collect()
    }
}
