use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{error, info};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::config::Settings;
use crate::errors::ApiError;
use crate::models::{LoginRequest, RegisterRequest, Token, User};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user email
    exp: i64,    // expiration timestamp
}

// bcrypt only looks at the first 72 bytes of input.
fn bcrypt_input(password: &str) -> &[u8] {
    let bytes = password.as_bytes();
    &bytes[..bytes.len().min(72)]
}

pub struct AuthService {
    pool: SqlitePool,
    secret_key: String,
    token_ttl_minutes: i64,
}

impl AuthService {
    pub fn new(pool: SqlitePool, settings: &Settings) -> Self {
        Self {
            pool,
            secret_key: settings.secret_key.clone(),
            token_ttl_minutes: settings.access_token_expire_minutes,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<User, ApiError> {
        if !req.email.contains('@') {
            return Err(ApiError::Validation("Invalid email address".to_string()));
        }
        if req.password.chars().count() < 6 {
            return Err(ApiError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let email_taken = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = ?")
            .bind(&req.email)
            .fetch_optional(&self.pool)
            .await?;
        if email_taken.is_some() {
            error!("Registration rejected, email already in use: {}", req.email);
            return Err(ApiError::Duplicate("Email already registered".to_string()));
        }

        let username_taken =
            sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?")
                .bind(&req.username)
                .fetch_optional(&self.pool)
                .await?;
        if username_taken.is_some() {
            error!(
                "Registration rejected, username already taken: {}",
                req.username
            );
            return Err(ApiError::Duplicate("Username already taken".to_string()));
        }

        let hashed_password = hash(bcrypt_input(&req.password), DEFAULT_COST)?;
        let now = Utc::now();

        info!("Creating new user with email: {}", req.email);
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, hashed_password, full_name, phone, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&req.email)
        .bind(&req.username)
        .bind(&hashed_password)
        .bind(&req.full_name)
        .bind(&req.phone)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!("User registered successfully: {}", user.email);
        Ok(user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<Token, ApiError> {
        info!("Attempting login for user: {}", req.email);

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(&req.email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                error!("Login failed, user not found: {}", req.email);
                ApiError::Unauthorized("Incorrect email or password".to_string())
            })?;

        if !verify(bcrypt_input(&req.password), &user.hashed_password)? {
            error!("Login failed, invalid password for user: {}", req.email);
            return Err(ApiError::Unauthorized(
                "Incorrect email or password".to_string(),
            ));
        }

        let token = self.create_token(&user.email)?;
        info!("User logged in successfully: {}", user.email);
        Ok(Token {
            access_token: token,
            token_type: "bearer".to_string(),
        })
    }

    /// Resolves a bearer token to its user. Bad signature, expiry, malformed
    /// claims and a vanished account all collapse into `Unauthorized`.
    pub async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        let email = self.verify_token(token)?;

        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        full_name: Option<String>,
        phone: Option<String>,
    ) -> Result<User, ApiError> {
        let mut updates = Vec::new();
        let mut params = Vec::new();

        if let Some(full_name) = full_name.filter(|v| !v.is_empty()) {
            updates.push("full_name = ?");
            params.push(full_name);
        }
        if let Some(phone) = phone.filter(|v| !v.is_empty()) {
            updates.push("phone = ?");
            params.push(phone);
        }

        if updates.is_empty() {
            return sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".to_string()));
        }

        let query = format!(
            "UPDATE users SET {}, updated_at = ? WHERE id = ? RETURNING *",
            updates.join(", ")
        );

        let mut query = sqlx::query_as::<_, User>(&query);
        for param in params {
            query = query.bind(param);
        }
        query = query.bind(Utc::now()).bind(user_id);

        let updated_user = query.fetch_one(&self.pool).await?;
        Ok(updated_user)
    }

    fn create_token(&self, email: &str) -> Result<String, ApiError> {
        let expiration = Utc::now() + Duration::minutes(self.token_ttl_minutes);

        let claims = Claims {
            sub: email.to_string(),
            exp: expiration.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret_key.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("token signing error: {e}")))
    }

    fn verify_token(&self, token: &str) -> Result<String, ApiError> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret_key.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?
        .claims;

        if claims.sub.is_empty() {
            return Err(ApiError::Unauthorized("Invalid token".to_string()));
        }
        Ok(claims.sub)
    }
}
