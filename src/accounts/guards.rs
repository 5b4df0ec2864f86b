//! Two-stage login: the shared site password first, then the user's own
//! credentials. A session carrying the auth flag exists only after both pass.

use serde::Deserialize;
use tracing::{info, warn};

use super::password::verify_password;
use crate::database_ops::db::Db;
use crate::database_ops::users::{
    create_session, find_user_by_username, site_password_matches, Session, User,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub site_password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Site password is required.")]
    SitePasswordRequired,
    #[error("Incorrect site password.")]
    SitePasswordIncorrect,
    #[error("Username is required.")]
    UsernameRequired,
    #[error("Password is required.")]
    PasswordRequired,
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LoginError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            LoginError::SitePasswordRequired | LoginError::SitePasswordIncorrect => {
                "site_password"
            }
            LoginError::UsernameRequired | LoginError::InvalidCredentials => "username",
            LoginError::PasswordRequired => "password",
            LoginError::Database(_) => "__all__",
        }
    }
}

/// First guard: the submitted site password must match a stored one.
pub async fn check_site_password(db: &Db, form: &LoginForm) -> Result<(), LoginError> {
    if form.site_password.is_empty() {
        return Err(LoginError::SitePasswordRequired);
    }
    if !site_password_matches(db, &form.site_password).await? {
        warn!(username = %form.username, "site password rejected");
        return Err(LoginError::SitePasswordIncorrect);
    }
    Ok(())
}

/// Second guard: username and password must identify an account.
pub async fn check_credentials(db: &Db, form: &LoginForm) -> Result<User, LoginError> {
    if form.username.is_empty() {
        return Err(LoginError::UsernameRequired);
    }
    if form.password.is_empty() {
        return Err(LoginError::PasswordRequired);
    }
    match find_user_by_username(db, &form.username).await? {
        Some(user) if verify_password(&form.password, &user.password_hash) => Ok(user),
        _ => {
            warn!(username = %form.username, "credentials rejected");
            Err(LoginError::InvalidCredentials)
        }
    }
}

/// Run both guards in order and open an authenticated session.
pub async fn login(db: &Db, form: &LoginForm) -> Result<(User, Session), LoginError> {
    check_site_password(db, form).await?;
    let user = check_credentials(db, form).await?;
    let session = create_session(db, user.id, true).await?;
    info!(user_id = user.id, "login succeeded");
    Ok((user, session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::users::{add_site_password, create_user, find_session};

    fn form(username: &str, password: &str, site_password: &str) -> LoginForm {
        LoginForm {
            username: username.into(),
            password: password.into(),
            site_password: site_password.into(),
        }
    }

    async fn setup() -> Db {
        let db = Db::in_memory().await.unwrap();
        add_site_password(&db, "letmein").await.unwrap();
        create_user(&db, "ana", "secret").await.unwrap();
        db
    }

    #[tokio::test]
    async fn both_guards_pass_and_session_is_flagged() {
        let db = setup().await;
        let (user, session) = login(&db, &form("ana", "secret", "letmein")).await.unwrap();
        assert_eq!(user.username, "ana");
        let stored = find_session(&db, &session.token).await.unwrap().unwrap();
        assert!(stored.auth);
    }

    #[tokio::test]
    async fn site_password_is_checked_before_credentials() {
        let db = setup().await;
        let err = login(&db, &form("nobody", "nothing", "wrong")).await.unwrap_err();
        assert!(matches!(err, LoginError::SitePasswordIncorrect));
        assert_eq!(err.field(), "site_password");

        let err = login(&db, &form("", "", "")).await.unwrap_err();
        assert!(matches!(err, LoginError::SitePasswordRequired));
    }

    #[tokio::test]
    async fn credential_errors_after_site_password() {
        let db = setup().await;
        let err = login(&db, &form("", "secret", "letmein")).await.unwrap_err();
        assert!(matches!(err, LoginError::UsernameRequired));
        let err = login(&db, &form("ana", "", "letmein")).await.unwrap_err();
        assert!(matches!(err, LoginError::PasswordRequired));
        let err = login(&db, &form("ana", "nope", "letmein")).await.unwrap_err();
        assert!(matches!(err, LoginError::InvalidCredentials));
        let err = login(&db, &form("ghost", "secret", "letmein")).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid username or password.");
    }
}
