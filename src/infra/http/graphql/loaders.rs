//! Per-request batch loaders for `Post.creator` and `Post.voteStatus`.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dataloader::{DataLoader, Loader};

use crate::application::repos::{RepoError, UpdootKey, UpdootsRepo, UsersRepo};
use crate::domain::entities::{UpdootRecord, UserRecord};

pub struct UserLoader {
    users: Arc<dyn UsersRepo>,
}

impl Loader<i32> for UserLoader {
    type Value = UserRecord;
    type Error = Arc<RepoError>;

    async fn load(&self, keys: &[i32]) -> Result<HashMap<i32, Self::Value>, Self::Error> {
        let users = self.users.find_users_by_ids(keys).await.map_err(Arc::new)?;
        Ok(users.into_iter().map(|user| (user.id, user)).collect())
    }
}

pub struct UpdootLoader {
    updoots: Arc<dyn UpdootsRepo>,
}

impl Loader<UpdootKey> for UpdootLoader {
    type Value = UpdootRecord;
    type Error = Arc<RepoError>;

    async fn load(
        &self,
        keys: &[UpdootKey],
    ) -> Result<HashMap<UpdootKey, Self::Value>, Self::Error> {
        let updoots = self.updoots.find_updoots(keys).await.map_err(Arc::new)?;
        Ok(updoots
            .into_iter()
            .map(|updoot| {
                let key = UpdootKey {
                    post_id: updoot.post_id,
                    user_id: updoot.user_id,
                };
                (key, updoot)
            })
            .collect())
    }
}

/// Builds fresh loaders for each request so batches never outlive it.
#[derive(Clone)]
pub struct LoaderFactory {
    users: Arc<dyn UsersRepo>,
    updoots: Arc<dyn UpdootsRepo>,
}

impl LoaderFactory {
    pub fn new(users: Arc<dyn UsersRepo>, updoots: Arc<dyn UpdootsRepo>) -> Self {
        Self { users, updoots }
    }

    pub fn users(&self) -> DataLoader<UserLoader> {
        DataLoader::new(
            UserLoader {
                users: self.users.clone(),
            },
            tokio::spawn,
        )
    }

    pub fn updoots(&self) -> DataLoader<UpdootLoader> {
        DataLoader::new(
            UpdootLoader {
                updoots: self.updoots.clone(),
            },
            tokio::spawn,
        )
    }
}

pub(crate) fn loader_error(err: Arc<RepoError>) -> RepoError {
    RepoError::from_persistence(err)
}
