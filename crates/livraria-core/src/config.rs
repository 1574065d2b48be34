//! Configuration module
//!
//! All thresholds, credentials and timeouts are loaded from the environment
//! once at startup. Missing required keys fail fast in `Config::from_env`,
//! never at first use.

use std::env;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 24;
const MAX_IMAGE_SIZE_MB: usize = 5;
const MIN_DIMENSION: u32 = 50;
const MAX_DIMENSION: u32 = 4096;
const MIN_ASPECT_RATIO: f64 = 0.25;
const MAX_ASPECT_RATIO: f64 = 4.0;
const OUTPUT_MAX_DIMENSION: u32 = 800;
const OUTPUT_JPEG_QUALITY: u8 = 85;
const UPLOAD_TIMEOUT_SECS: u64 = 30;
const DELETE_TIMEOUT_SECS: u64 = 10;
const CACHE_MAX_ENTRIES: usize = 1000;
const CACHE_DEFAULT_TTL_SECS: u64 = 300;
const CACHE_SWEEP_INTERVAL_SECS: u64 = 60;
const EMAIL_MAX_RETRIES: u32 = 3;
const EMAIL_RETRY_BASE_DELAY_MS: u64 = 500;
const RECOVERY_MAX_REQUESTS: u32 = 3;
const RECOVERY_WINDOW_SECS: u64 = 3600;
const RECOVERY_TOKEN_TTL_MINUTES: i64 = 30;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_required(key: &str) -> Result<String, anyhow::Error> {
    env::var(key).map_err(|_| anyhow::anyhow!("{} must be set", key))
}

/// HTTP server settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
}

/// Database pool settings
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_seconds: u64,
}

/// JWT and OAuth settings
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub google_client_id: Option<String>,
}

/// Remote image store (CDN) settings. All three endpoint/credential fields
/// are required: the pipeline refuses to construct without them.
#[derive(Clone, Debug)]
pub struct CdnConfig {
    /// Multipart upload endpoint (`POST <upload_endpoint>`)
    pub upload_endpoint: String,
    /// Management API base (`GET <api_url>?name=`, `DELETE <api_url>/<fileId>`)
    pub api_url: String,
    /// Static credential, sent as `Basic base64(private_key + ":")`
    pub private_key: String,
    pub upload_timeout: Duration,
    pub delete_timeout: Duration,
}

/// Image validation and re-encode settings
#[derive(Clone, Debug)]
pub struct ImageConfig {
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
    pub min_aspect_ratio: f64,
    pub max_aspect_ratio: f64,
    /// Longer-axis cap applied before upload
    pub output_max_dimension: u32,
    pub output_jpeg_quality: u8,
}

/// TTL cache settings
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub default_ttl: Duration,
    pub sweep_interval: Duration,
}

/// SMTP settings. `enabled = false` disables outbound email entirely.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub enabled: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    pub tls: bool,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

/// Password recovery settings
#[derive(Clone, Debug)]
pub struct RecoveryConfig {
    pub max_requests_per_window: u32,
    pub window: Duration,
    pub token_ttl_minutes: i64,
    pub frontend_url: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cdn: CdnConfig,
    pub image: ImageConfig,
    pub cache: CacheConfig,
    pub smtp: SmtpConfig,
    pub recovery: RecoveryConfig,
}

impl Config {
    pub fn is_production(&self) -> bool {
        let env = self.server.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|_| "image/jpeg,image/png,image/webp".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let config = Config {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "4000".to_string())
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
                cors_origins,
                environment,
            },
            database: DatabaseConfig {
                url: env_required("DATABASE_URL")?,
                max_connections: env_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
                timeout_seconds: env_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")
                    .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
                jwt_expiry_hours: env_or("JWT_EXPIRY_HOURS", JWT_EXPIRY_HOURS),
                google_client_id: env::var("GOOGLE_CLIENT_ID").ok().filter(|s| !s.is_empty()),
            },
            cdn: CdnConfig {
                upload_endpoint: env_required("CDN_UPLOAD_ENDPOINT")?,
                api_url: env_required("CDN_API_URL")?,
                private_key: env_required("CDN_PRIVATE_KEY")?,
                upload_timeout: Duration::from_secs(env_or(
                    "CDN_UPLOAD_TIMEOUT_SECS",
                    UPLOAD_TIMEOUT_SECS,
                )),
                delete_timeout: Duration::from_secs(env_or(
                    "CDN_DELETE_TIMEOUT_SECS",
                    DELETE_TIMEOUT_SECS,
                )),
            },
            image: ImageConfig {
                max_file_size_bytes: env_or("MAX_IMAGE_SIZE_MB", MAX_IMAGE_SIZE_MB) * 1024 * 1024,
                allowed_content_types,
                min_width: env_or("MIN_IMAGE_WIDTH", MIN_DIMENSION),
                max_width: env_or("MAX_IMAGE_WIDTH", MAX_DIMENSION),
                min_height: env_or("MIN_IMAGE_HEIGHT", MIN_DIMENSION),
                max_height: env_or("MAX_IMAGE_HEIGHT", MAX_DIMENSION),
                min_aspect_ratio: env_or("MIN_ASPECT_RATIO", MIN_ASPECT_RATIO),
                max_aspect_ratio: env_or("MAX_ASPECT_RATIO", MAX_ASPECT_RATIO),
                output_max_dimension: env_or("OUTPUT_MAX_DIMENSION", OUTPUT_MAX_DIMENSION),
                output_jpeg_quality: env_or("OUTPUT_JPEG_QUALITY", OUTPUT_JPEG_QUALITY),
            },
            cache: CacheConfig {
                max_entries: env_or("CACHE_MAX_ENTRIES", CACHE_MAX_ENTRIES),
                default_ttl: Duration::from_secs(env_or(
                    "CACHE_DEFAULT_TTL_SECS",
                    CACHE_DEFAULT_TTL_SECS,
                )),
                sweep_interval: Duration::from_secs(env_or(
                    "CACHE_SWEEP_INTERVAL_SECS",
                    CACHE_SWEEP_INTERVAL_SECS,
                )),
            },
            smtp: SmtpConfig {
                enabled: env_or("EMAIL_ENABLED", false),
                host: env::var("SMTP_HOST").ok().filter(|s| !s.is_empty()),
                port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|&p: &u16| p > 0),
                user: env::var("SMTP_USER").ok().filter(|s| !s.is_empty()),
                password: env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty()),
                from: env::var("SMTP_FROM").ok().filter(|s| !s.is_empty()),
                tls: env_or("SMTP_TLS", true),
                max_retries: env_or("EMAIL_MAX_RETRIES", EMAIL_MAX_RETRIES),
                retry_base_delay_ms: env_or("EMAIL_RETRY_BASE_DELAY_MS", EMAIL_RETRY_BASE_DELAY_MS),
            },
            recovery: RecoveryConfig {
                max_requests_per_window: env_or("RECOVERY_MAX_REQUESTS", RECOVERY_MAX_REQUESTS),
                window: Duration::from_secs(env_or("RECOVERY_WINDOW_SECS", RECOVERY_WINDOW_SECS)),
                token_ttl_minutes: env_or("RECOVERY_TOKEN_TTL_MINUTES", RECOVERY_TOKEN_TTL_MINUTES),
                frontend_url: env::var("FRONTEND_URL").ok().filter(|s| !s.is_empty()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.auth.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database.url.starts_with("postgresql://")
            && !self.database.url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.smtp.enabled && (self.smtp.host.is_none() || self.smtp.from.is_none()) {
            return Err(anyhow::anyhow!(
                "EMAIL_ENABLED=true requires SMTP_HOST and SMTP_FROM to be set"
            ));
        }

        if self.image.min_width > self.image.max_width
            || self.image.min_height > self.image.max_height
        {
            return Err(anyhow::anyhow!(
                "image dimension bounds are inverted (min > max)"
            ));
        }

        if self.image.min_aspect_ratio > self.image.max_aspect_ratio {
            return Err(anyhow::anyhow!("aspect ratio bounds are inverted"));
        }

        Ok(())
    }
}
