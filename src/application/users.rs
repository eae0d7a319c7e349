//! Account use cases: registration, login, logout and password reset.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::mail::{Mailer, OutgoingMail};
use crate::application::repos::{CreateUserParams, RepoError, UsersRepo};
use crate::application::sessions::{KeyValueStore, SessionHandle};
use crate::domain::entities::UserRecord;
use crate::domain::users::{
    FieldViolation, LoginIdentifier, validate_password, validate_registration,
};
use crate::infra::passwords::{hash_password, verify_password};

pub const FORGET_PASSWORD_PREFIX: &str = "forget-password: ";

/// Outcome of an account mutation. Rejections are reported to the client as field errors.
#[derive(Debug, Clone)]
pub enum AccountOutcome {
    Accepted(UserRecord),
    Rejected(FieldViolation),
}

impl AccountOutcome {
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            AccountOutcome::Accepted(user) => Some(user),
            AccountOutcome::Rejected(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct PasswordResetSettings {
    /// Base URL of the change-password page; the token is appended as a path segment.
    pub link_base: String,
    pub token_ttl: Duration,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UsersRepo>,
    tokens: Arc<dyn KeyValueStore>,
    mailer: Arc<dyn Mailer>,
    reset: PasswordResetSettings,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        tokens: Arc<dyn KeyValueStore>,
        mailer: Arc<dyn Mailer>,
        reset: PasswordResetSettings,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            reset,
        }
    }

    pub async fn me(&self, session: &SessionHandle) -> Result<Option<UserRecord>, AppError> {
        let Some(user_id) = session.user_id() else {
            return Ok(None);
        };
        Ok(self.users.find_user(user_id).await?)
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, AppError> {
        Ok(self.users.list_users().await?)
    }

    pub async fn register(
        &self,
        session: &SessionHandle,
        input: RegisterInput,
    ) -> Result<AccountOutcome, AppError> {
        let RegisterInput {
            email,
            username,
            password,
        } = input;

        if let Some(violation) = validate_registration(&email, &username, &password) {
            return Ok(AccountOutcome::Rejected(violation));
        }

        let password_hash = hash_password(&password).await?;
        let created = self
            .users
            .create_user(CreateUserParams {
                username,
                email,
                password_hash,
            })
            .await;

        let user = match created {
            Ok(user) => user,
            Err(RepoError::Duplicate { constraint }) => {
                info!(constraint = %constraint, "registration rejected: duplicate account");
                return Ok(AccountOutcome::Rejected(FieldViolation::new(
                    "username",
                    "username already taken",
                )));
            }
            Err(err) => return Err(err.into()),
        };

        session.log_in(user.id).await?;
        info!(user_id = user.id, "user registered");
        Ok(AccountOutcome::Accepted(user))
    }

    pub async fn login(
        &self,
        session: &SessionHandle,
        username_or_email: &str,
        password: &str,
    ) -> Result<AccountOutcome, AppError> {
        let user = match LoginIdentifier::parse(username_or_email) {
            LoginIdentifier::Email(email) => self.users.find_user_by_email(email).await?,
            LoginIdentifier::Username(username) => {
                self.users.find_user_by_username(username).await?
            }
        };

        let Some(user) = user else {
            return Ok(AccountOutcome::Rejected(FieldViolation::new(
                "usernameOrEmail",
                "username doesn't exist",
            )));
        };

        if !verify_password(&user.password_hash, password).await? {
            return Ok(AccountOutcome::Rejected(FieldViolation::new(
                "password",
                "incorrect password",
            )));
        }

        session.log_in(user.id).await?;
        Ok(AccountOutcome::Accepted(user))
    }

    /// Destroy the session. A store failure is logged and reported as `false`.
    pub async fn logout(&self, session: &SessionHandle) -> bool {
        match session.destroy().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to destroy session");
                false
            }
        }
    }

    /// Issue a reset token when the email is known. Unknown emails succeed silently.
    pub async fn forgot_password(&self, email: &str) -> Result<bool, AppError> {
        let Some(user) = self.users.find_user_by_email(email).await? else {
            return Ok(true);
        };

        let token = Uuid::new_v4().to_string();
        self.tokens
            .put(
                &reset_key(&token),
                &user.id.to_string(),
                self.reset.token_ttl,
            )
            .await?;

        let link = format!("{}/{}", self.reset.link_base.trim_end_matches('/'), token);
        self.mailer
            .send(OutgoingMail {
                to: user.email.clone(),
                subject: "Change password".to_string(),
                html: format!("<a href=\"{link}\">reset password</a>"),
            })
            .await?;

        info!(user_id = user.id, "password reset token issued");
        Ok(true)
    }

    pub async fn change_password(
        &self,
        session: &SessionHandle,
        token: &str,
        new_password: &str,
    ) -> Result<AccountOutcome, AppError> {
        if let Some(violation) = validate_password("newPassword", new_password) {
            return Ok(AccountOutcome::Rejected(violation));
        }

        let key = reset_key(token);
        let user_id = self
            .tokens
            .get(&key)
            .await?
            .and_then(|raw| raw.parse::<i32>().ok());
        let Some(user_id) = user_id else {
            return Ok(AccountOutcome::Rejected(FieldViolation::new(
                "token",
                "token expired",
            )));
        };

        let Some(mut user) = self.users.find_user(user_id).await? else {
            return Ok(AccountOutcome::Rejected(FieldViolation::new(
                "token",
                "user no longer exists",
            )));
        };

        let password_hash = hash_password(new_password).await?;
        self.users.update_password(user.id, &password_hash).await?;
        self.tokens.delete(&key).await?;
        user.password_hash = password_hash;

        session.log_in(user.id).await?;
        info!(user_id = user.id, "password changed");
        Ok(AccountOutcome::Accepted(user))
    }
}

fn reset_key(token: &str) -> String {
    format!("{FORGET_PASSWORD_PREFIX}{token}")
}
