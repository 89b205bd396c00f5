use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    #[serde(skip)]
    pub hashed_password: String,
    pub is_active: bool,
    #[serde(serialize_with = "super::rfc3339")]
    pub created_at: i64,
    #[serde(serialize_with = "super::rfc3339")]
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

pub const MIN_PASSWORD_LEN: usize = 8;

fn validate_email(email: &str) -> Result<(), String> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(format!("Invalid email address: {email}")),
    }
}

fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err("Username must be between 3 and 50 characters".to_string());
    }
    Ok(())
}

impl UserCreate {
    pub fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)?;
        validate_username(&self.username)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ));
        }
        Ok(())
    }
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        Ok(())
    }
}
