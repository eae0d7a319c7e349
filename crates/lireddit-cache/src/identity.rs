//! The `me` query: who the cache believes is logged in.

use lireddit_api_types::{UserResponse, UserSnapshot};
use tracing::info;

use super::keys::FieldKey;
use super::store::{RootValue, Store};

/// Mutations that change the current identity.
#[derive(Debug, Clone, Copy)]
pub enum IdentityMutation<'a> {
    Login(&'a UserResponse),
    Register(&'a UserResponse),
    ChangePassword(&'a UserResponse),
    Logout,
}

impl IdentityMutation<'_> {
    fn name(&self) -> &'static str {
        match self {
            IdentityMutation::Login(_) => "login",
            IdentityMutation::Register(_) => "register",
            IdentityMutation::ChangePassword(_) => "change_password",
            IdentityMutation::Logout => "logout",
        }
    }
}

/// `None` when `me` has never been cached, `Some(None)` when it is cached as nobody.
pub(crate) fn read_identity(store: &Store) -> Option<Option<&UserSnapshot>> {
    match store.resolve_root(&FieldKey::me())? {
        RootValue::Identity(Some(id)) => Some(store.user(*id)),
        RootValue::Identity(None) => Some(None),
        RootValue::Page(_) => None,
    }
}

pub(crate) fn write_identity(store: &mut Store, user: Option<&UserSnapshot>) {
    if let Some(user) = user {
        store.write_user(user);
    }
    store.write_root(
        FieldKey::me(),
        RootValue::Identity(user.map(|user| user.id)),
    );
}

/// Apply a login-like mutation result to `me`. Results carrying field errors leave the
/// cached identity as it was. Returns whether `me` was rewritten.
pub(crate) fn reconcile_identity(store: &mut Store, mutation: IdentityMutation<'_>) -> bool {
    let response = match mutation {
        IdentityMutation::Logout => {
            write_identity(store, None);
            info!(mutation = mutation.name(), "identity cleared");
            return true;
        }
        IdentityMutation::Login(response)
        | IdentityMutation::Register(response)
        | IdentityMutation::ChangePassword(response) => response,
    };

    if response.has_errors() {
        info!(
            mutation = mutation.name(),
            "identity kept: mutation returned field errors"
        );
        return false;
    }

    write_identity(store, response.users.as_ref());
    info!(
        mutation = mutation.name(),
        user_id = response.users.as_ref().map(|user| user.id),
        "identity replaced"
    );
    true
}
