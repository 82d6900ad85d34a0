use lazy_static::lazy_static;
use regex::Regex;
use tracing::error;

use super::{
    dto::{AuthResponse, PublicUser},
    jwt::JwtKeys,
    repo_types::User,
};
use crate::error::AppError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Signs a fresh access/refresh pair for `user`.
pub fn issue_tokens(keys: &JwtKeys, user: User) -> Result<AuthResponse, AppError> {
    let sign_failed = |e: anyhow::Error| {
        error!(error = %e, user_id = %user.id, "jwt sign failed");
        AppError::internal("Failed to issue token", e)
    };
    let access_token = keys.sign_access(user.id).map_err(sign_failed)?;
    let refresh_token = keys.sign_refresh(user.id).map_err(sign_failed)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.id,
            email: user.email,
        },
    })
}
