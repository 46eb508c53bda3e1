use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub auth: AuthSettings,
    pub invitation: InvitationSettings,
    pub smtp: SmtpSettings,
    pub ai: AiSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Base URL of the web client, used to build invite links.
    pub public_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
    /// Multi-document transactions need a replica set. Standalone servers
    /// (local development, the test harness) must turn this off.
    pub use_transactions: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub issuer: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    /// Accounts registered with one of these emails get the global admin role.
    pub admin_emails: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InvitationSettings {
    pub ttl_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: String,
    pub use_tls: bool,
}

impl SmtpSettings {
    pub fn is_configured(&self) -> bool {
        self.host.as_deref().is_some_and(|h| !h.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("WORKHUB")
                    .list_separator(",")
                    .with_list_parse_key("auth.admin_emails")
                    .with_list_parse_key("app.cors_origins")
                    .try_parsing(true),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("app.public_url", "http://localhost:5173")?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "workhub")?
            .set_default("database.use_transactions", true)?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.refresh_token_ttl_secs", 604800)?
            .set_default("jwt.issuer", "workhub")?
            .set_default("auth.admin_emails", Vec::<String>::new())?
            .set_default("invitation.ttl_days", 7)?
            .set_default("smtp.host", None::<String>)?
            .set_default("smtp.port", 587)?
            .set_default("smtp.username", None::<String>)?
            .set_default("smtp.password", None::<String>)?
            .set_default("smtp.from_address", "noreply@workhub.local")?
            .set_default("smtp.from_name", "Workhub")?
            .set_default("smtp.use_tls", true)?
            .set_default("ai.api_key", None::<String>)?
            .set_default("ai.endpoint", "https://api.anthropic.com/v1/messages")?
            .set_default("ai.model", "claude-sonnet-4-5-20250929")?
            .set_default("ai.max_tokens", 2048)?
            .build()?;

        config.try_deserialize()
    }
}
