//! Registration, login and profile updates.

use crate::orm::users;
use crate::session::{hash_password, verify_password};
use chrono::Utc;
use derive_more::Display;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use serde::Deserialize;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

#[derive(Debug, Display)]
pub enum AccountError {
    #[display(fmt = "A user with that username already exists.")]
    UsernameTaken,
    #[display(fmt = "Failed to hash password: {}", _0)]
    Hash(argon2::password_hash::Error),
    #[display(fmt = "{}", _0)]
    Database(DbErr),
}

impl From<DbErr> for AccountError {
    fn from(e: DbErr) -> Self {
        Self::Database(e)
    }
}

impl From<argon2::password_hash::Error> for AccountError {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self::Hash(e)
    }
}

/// Emails are stored trimmed and lowercased, and a blank one clears the
/// address, so only a non-blank value has to look like an email.
fn email_or_blank(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() || validator::validate_email(email) {
        return Ok(());
    }
    let mut err = ValidationError::new("email");
    err.message = Some(Cow::from("Enter a valid email address."));
    Err(err)
}

/// Registration payload.
#[derive(Debug, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters."))]
    pub username: String,
    #[validate(length(min = 8, max = 1000, message = "Ensure this field has at least 8 characters."))]
    pub password: String,
    #[validate(custom = "email_or_blank")]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[validate(length(max = 255))]
    pub avatar: Option<String>,
}

impl NewUser {
    /// Usernames are stored trimmed, so limits apply to the trimmed value.
    pub fn trimmed(mut self) -> Self {
        self.username = self.username.trim().to_owned();
        self
    }
}

/// Fields a user may change on their own record. Anything else is rejected.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UserUpdate {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(custom = "email_or_blank")]
    pub email: Option<String>,
    #[validate(length(max = 255))]
    pub avatar: Option<String>,
    #[validate(length(min = 8, max = 1000, message = "Ensure this field has at least 8 characters."))]
    pub password: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.avatar.is_none()
            && self.password.is_none()
    }

    /// Copies the provided fields onto `user`. `password_hash` replaces the
    /// stored password when a new one was given.
    fn apply(self, user: &mut users::ActiveModel, password_hash: Option<String>) {
        if let Some(first_name) = self.first_name {
            user.first_name = Set(first_name);
        }
        if let Some(last_name) = self.last_name {
            user.last_name = Set(last_name);
        }
        if let Some(email) = self.email {
            user.email = Set(Some(email.trim().to_lowercase()).filter(|e| !e.is_empty()));
        }
        if let Some(avatar) = self.avatar {
            user.avatar = Set(Some(avatar).filter(|a| !a.is_empty()));
        }
        if let Some(hash) = password_hash {
            user.password = Set(hash);
        }
    }
}

pub async fn find_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await
}

/// Inserts a new user with a hashed password.
pub async fn create_user(
    db: &DatabaseConnection,
    form: NewUser,
    is_staff: bool,
) -> Result<users::Model, AccountError> {
    let username = form.username.trim().to_owned();
    if find_by_username(db, &username).await?.is_some() {
        return Err(AccountError::UsernameTaken);
    }

    let password_hash = hash_password(&form.password)?;
    let inserted = users::ActiveModel {
        username: Set(username.clone()),
        password: Set(password_hash),
        email: Set(form
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())),
        first_name: Set(form.first_name),
        last_name: Set(form.last_name),
        avatar: Set(form.avatar.filter(|a| !a.is_empty())),
        is_active: Set(true),
        is_staff: Set(is_staff),
        date_joined: Set(Utc::now().naive_utc()),
        last_login: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(user) => {
            log::info!("New user registered: {} (user_id: {})", user.username, user.id);
            Ok(user)
        }
        // Lost a race against another registration of the same name.
        Err(e) => match find_by_username(db, &username).await? {
            Some(_) => Err(AccountError::UsernameTaken),
            None => Err(e.into()),
        },
    }
}

/// Applies a current-user update and returns the saved row.
pub async fn update_user(
    db: &DatabaseConnection,
    user: users::Model,
    update: UserUpdate,
) -> Result<users::Model, AccountError> {
    let password_hash = match update.password.as_deref() {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };
    let changes_password = password_hash.is_some();

    let mut active: users::ActiveModel = user.into();
    update.apply(&mut active, password_hash);
    let user = active.update(db).await?;

    log::info!(
        "User {} updated their profile{}",
        user.id,
        if changes_password { " and password" } else { "" }
    );
    Ok(user)
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginResult {
    Success(i32),
    BadCredentials,
    Inactive,
}

/// Checks credentials and stamps `last_login` on success.
pub async fn login(db: &DatabaseConnection, username: &str, password: &str) -> Result<LoginResult, DbErr> {
    let user = match find_by_username(db, username).await? {
        Some(user) => user,
        None => return Ok(LoginResult::BadCredentials),
    };

    if !verify_password(password, &user.password) {
        return Ok(LoginResult::BadCredentials);
    }

    if !user.is_active {
        return Ok(LoginResult::Inactive);
    }

    let user_id = user.id;
    let mut active: users::ActiveModel = user.into();
    active.last_login = Set(Some(Utc::now().naive_utc()));
    active.update(db).await?;

    Ok(LoginResult::Success(user_id))
}
