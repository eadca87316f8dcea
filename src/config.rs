use std::env;

/// Runtime configuration, read once at startup and handed to the services
/// that need it. Defaults match a local development setup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub upload_dir: String,
    pub max_file_size: usize,
    pub cors_origins: Vec<String>,
    pub model_path: String,
    pub bind_addr: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://laptopbazar.db".to_string()),
            secret_key: env::var("SECRET_KEY")
                .unwrap_or_else(|_| "change_me_in_production".to_string()),
            access_token_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_242_880),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| {
                    vec![
                        "http://localhost:3000".to_string(),
                        "http://localhost:5173".to_string(),
                    ]
                }),
            model_path: env::var("MODEL_PATH").unwrap_or_else(|_| "ml_model/model.json".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        // Only check keys that are unlikely to be set in a test environment
        let settings = Settings::from_env();
        assert_eq!(settings.max_file_size, 5_242_880);
        assert_eq!(settings.access_token_expire_minutes, 30);
        assert!(!settings.cors_origins.is_empty());
    }
}
