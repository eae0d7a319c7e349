//! In-memory repositories for service tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};

use crate::application::pagination::{CursorPage, PageRequest, PostCursor};
use crate::application::repos::{
    CreatePostParams, CreateUserParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
    UpdootKey, UpdootsRepo, UsersRepo, VoteParams,
};
use crate::domain::entities::{PostRecord, UpdootRecord, UserRecord};
use crate::domain::posts::{VoteChange, VoteValue};

#[derive(Default)]
struct State {
    users: Vec<UserRecord>,
    posts: Vec<PostRecord>,
    updoots: HashMap<(i32, i32), VoteValue>,
    ticks: i64,
}

impl State {
    /// Each write lands one millisecond after the previous one.
    fn tick(&mut self) -> OffsetDateTime {
        self.ticks += 1;
        OffsetDateTime::UNIX_EPOCH + Duration::days(19_000) + Duration::milliseconds(self.ticks)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryRepos {
    state: Mutex<State>,
}

impl InMemoryRepos {
    pub(crate) fn points(&self, post_id: i32) -> Option<i32> {
        let state = self.state.lock().unwrap();
        state.posts.iter().find(|p| p.id == post_id).map(|p| p.points)
    }
}

#[async_trait]
impl UsersRepo for InMemoryRepos {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        if state
            .users
            .iter()
            .any(|u| u.username == params.username || u.email == params.email)
        {
            return Err(RepoError::Duplicate {
                constraint: "users_username_key".to_string(),
            });
        }
        let now = state.tick();
        let user = UserRecord {
            id: state.users.len() as i32 + 1,
            username: params.username,
            email: params.email,
            password_hash: params.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i32) -> Result<Option<UserRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_users_by_ids(&self, ids: &[i32]) -> Result<Vec<UserRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError> {
        Ok(self.state.lock().unwrap().users.clone())
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), RepoError> {
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepoError::NotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }
}

#[async_trait]
impl PostsRepo for InMemoryRepos {
    async fn list_posts(
        &self,
        page: PageRequest<PostCursor>,
    ) -> Result<CursorPage<PostRecord>, RepoError> {
        let limit = page.effective_limit() as usize;
        let state = self.state.lock().unwrap();
        let mut posts: Vec<PostRecord> = state
            .posts
            .iter()
            .filter(|p| {
                page.cursor
                    .is_none_or(|cursor| p.created_at < cursor.created_at())
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit + 1);

        let has_more = posts.len() > limit;
        posts.truncate(limit);
        let next_cursor = posts
            .last()
            .filter(|_| has_more)
            .map(|last| PostCursor::new(last.created_at).encode());
        Ok(CursorPage::new(posts, next_cursor))
    }

    async fn find_post(&self, id: i32) -> Result<Option<PostRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(state.posts.iter().find(|p| p.id == id).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryRepos {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let post = PostRecord {
            id: state.posts.iter().map(|p| p.id).max().unwrap_or(0) + 1,
            title: params.title,
            text: params.text,
            points: 0,
            creator_id: params.creator_id,
            created_at: now,
            updated_at: now,
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(
        &self,
        params: UpdatePostParams,
    ) -> Result<Option<PostRecord>, RepoError> {
        let mut state = self.state.lock().unwrap();
        let now = state.tick();
        let Some(post) = state
            .posts
            .iter_mut()
            .find(|p| p.id == params.id && p.creator_id == params.creator_id)
        else {
            return Ok(None);
        };
        post.title = params.title;
        post.text = params.text;
        post.updated_at = now;
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: i32, creator_id: i32) -> Result<bool, RepoError> {
        let mut state = self.state.lock().unwrap();
        let before = state.posts.len();
        state
            .posts
            .retain(|p| !(p.id == id && p.creator_id == creator_id));
        let deleted = state.posts.len() < before;
        if deleted {
            state.updoots.retain(|(_, post_id), _| *post_id != id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl UpdootsRepo for InMemoryRepos {
    async fn apply_vote(&self, params: VoteParams) -> Result<VoteChange, RepoError> {
        let mut state = self.state.lock().unwrap();
        let key = (params.user_id, params.post_id);
        if !state.posts.iter().any(|p| p.id == params.post_id) {
            return Err(RepoError::NotFound);
        }
        let change = VoteChange::plan(state.updoots.get(&key).copied(), params.value);
        if change != VoteChange::Unchanged {
            state.updoots.insert(key, params.value);
            if let Some(post) = state.posts.iter_mut().find(|p| p.id == params.post_id) {
                post.points += change.delta();
            }
        }
        Ok(change)
    }

    async fn find_updoots(&self, keys: &[UpdootKey]) -> Result<Vec<UpdootRecord>, RepoError> {
        let state = self.state.lock().unwrap();
        Ok(keys
            .iter()
            .filter_map(|key| {
                state
                    .updoots
                    .get(&(key.user_id, key.post_id))
                    .map(|value| UpdootRecord {
                        user_id: key.user_id,
                        post_id: key.post_id,
                        value: *value,
                    })
            })
            .collect())
    }
}
