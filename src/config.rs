use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub media_root: PathBuf,
    pub max_upload_size: usize,
    pub secure_cookies: bool,
    pub log_level: String,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Staff account created on first start when no account exists yet.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("SHOWCASE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid SHOWCASE_HOST: {e}"))?;

        let port: u16 = env_or("SHOWCASE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid SHOWCASE_PORT: {e}"))?;

        let media_root = PathBuf::from(env_or("SHOWCASE_MEDIA_ROOT", "media"));

        let max_upload_size: usize = env_or("SHOWCASE_MAX_UPLOAD_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid SHOWCASE_MAX_UPLOAD_SIZE: {e}"))?;

        let secure_cookies = match env_or("SHOWCASE_SECURE_COOKIES", "true").as_str() {
            "false" | "0" | "no" => false,
            _ => true,
        };

        let log_level = env_or("SHOWCASE_LOG_LEVEL", "info");

        let bootstrap_admin = match (
            std::env::var("SHOWCASE_ADMIN_EMAIL").ok(),
            std::env::var("SHOWCASE_ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin { email, password })
            }
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            media_root,
            max_upload_size,
            secure_cookies,
            log_level,
            bootstrap_admin,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
