//! Normalized record storage.
//!
//! Entities live in per-type maps. Root fields live in a map keyed by their rendered
//! field key and carry a sequence number assigned on first write, so pages of the same
//! field can be replayed in the order they were fetched.

use std::collections::HashMap;

use lireddit_api_types::{PostSnapshot, UserSnapshot};

use super::keys::{EntityKey, FieldKey};

/// One cached page of a paginated field. Pages are embedded under their root field
/// rather than normalized by identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub posts: Vec<i32>,
    pub has_more: bool,
}

/// Value held by a root field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootValue {
    Page(PageRecord),
    /// Link to a user entity, or `None` for an explicit "nobody".
    Identity(Option<i32>),
}

#[derive(Debug, Clone)]
struct RootField {
    key: FieldKey,
    value: RootValue,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct Store {
    posts: HashMap<i32, PostSnapshot>,
    users: HashMap<i32, UserSnapshot>,
    root: HashMap<FieldKey, RootField>,
    next_seq: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Entities
    // ========================================================================

    pub fn post(&self, id: i32) -> Option<&PostSnapshot> {
        self.posts.get(&id)
    }

    pub fn post_mut(&mut self, id: i32) -> Option<&mut PostSnapshot> {
        self.posts.get_mut(&id)
    }

    /// Write a post as returned by the server. A selection without `text` keeps the
    /// body already cached for that post.
    pub fn write_post(&mut self, post: &PostSnapshot) {
        let mut incoming = post.clone();
        if incoming.text.is_none()
            && let Some(existing) = self.posts.get(&post.id)
        {
            incoming.text = existing.text.clone();
        }
        self.posts.insert(post.id, incoming);
    }

    pub fn user(&self, id: i32) -> Option<&UserSnapshot> {
        self.users.get(&id)
    }

    pub fn write_user(&mut self, user: &UserSnapshot) {
        self.users.insert(user.id, user.clone());
    }

    pub fn contains(&self, key: EntityKey) -> bool {
        match key {
            EntityKey::Post(id) => self.posts.contains_key(&id),
            EntityKey::User(id) => self.users.contains_key(&id),
        }
    }

    /// Drop an entity. Links pointing at it are left in place and skipped on read.
    pub fn remove(&mut self, key: EntityKey) -> bool {
        match key {
            EntityKey::Post(id) => self.posts.remove(&id).is_some(),
            EntityKey::User(id) => self.users.remove(&id).is_some(),
        }
    }

    // ========================================================================
    // Root fields
    // ========================================================================

    /// Write a root field. Overwriting keeps the field's original position.
    pub fn write_root(&mut self, key: FieldKey, value: RootValue) {
        if let Some(field) = self.root.get_mut(&key) {
            field.value = value;
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.root.insert(key.clone(), RootField { key, value, seq });
    }

    pub fn resolve_root(&self, key: &FieldKey) -> Option<&RootValue> {
        self.root.get(key).map(|field| &field.value)
    }

    /// Every cached instance of `field_name`, in the order they were first written.
    pub fn inspect_fields(&self, field_name: &str) -> Vec<(&FieldKey, &RootValue)> {
        let mut fields: Vec<&RootField> = self
            .root
            .values()
            .filter(|field| field.key.field_name() == field_name)
            .collect();
        fields.sort_by_key(|field| field.seq);
        fields
            .into_iter()
            .map(|field| (&field.key, &field.value))
            .collect()
    }

    pub fn invalidate_root(&mut self, key: &FieldKey) -> bool {
        self.root.remove(key).is_some()
    }
}
