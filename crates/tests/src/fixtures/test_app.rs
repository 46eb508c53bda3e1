use mongodb::{Client, Database, options::ClientOptions};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use workhub_api::{build_router, state::AppState};
use workhub_config::Settings;
use workhub_db::indexes::ensure_indexes;

/// Registered with this address, a user gets the global admin role.
pub const ADMIN_EMAIL: &str = "root@workhub.test";

/// A running test application with its own MongoDB database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub db: Database,
    pub settings: Settings,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn a new test server connected to the test MongoDB.
    ///
    /// Requires a running MongoDB at localhost:27017 (override with
    /// WORKHUB__DATABASE__URL). Each test gets a unique database name.
    /// Transactions stay off unless WORKHUB__DATABASE__USE_TRANSACTIONS is
    /// set, so a standalone server is enough.
    pub async fn spawn() -> Self {
        Self::spawn_with_settings(|_| {}).await
    }

    /// Spawn a test server with customized settings.
    ///
    /// The `mutator` closure receives a `&mut Settings` after defaults are applied.
    pub async fn spawn_with_settings(mutator: impl FnOnce(&mut Settings)) -> Self {
        let db_name = format!("workhub_test_{}", uuid::Uuid::new_v4().simple());

        let mut settings = Settings::load().unwrap_or_else(|_| test_settings());
        if let Ok(url) = std::env::var("WORKHUB__DATABASE__URL") {
            settings.database.url = url;
        }
        if std::env::var("WORKHUB__DATABASE__USE_TRANSACTIONS").is_err() {
            settings.database.use_transactions = false;
        }
        settings.database.name = db_name.clone();
        settings.auth.admin_emails = vec![ADMIN_EMAIL.to_string()];
        settings.smtp.host = None;
        settings.ai.api_key = None;

        mutator(&mut settings);

        let client_options = ClientOptions::parse(&settings.database.url)
            .await
            .expect("Failed to parse MongoDB URL");
        let mongo_client =
            Client::with_options(client_options).expect("Failed to create MongoDB client");
        let db = mongo_client.database(&db_name);

        ensure_indexes(&db).await.expect("Failed to create indexes");

        let app_state = AppState::new(mongo_client, db.clone(), settings.clone())
            .expect("Failed to create AppState");
        let app = build_router(app_state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}", addr);
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            base_url,
            db,
            settings,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let db = self.db.clone();
        // Best effort cleanup: drop the test database
        tokio::spawn(async move {
            let _ = db.drop().await;
        });
    }
}

fn test_settings() -> Settings {
    Settings {
        app: workhub_config::AppSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
            public_url: "http://localhost:5173".to_string(),
        },
        database: workhub_config::DatabaseSettings {
            url: "mongodb://localhost:27017".to_string(),
            name: "workhub_test".to_string(),
            max_pool_size: Some(5),
            min_pool_size: Some(1),
            use_transactions: false,
        },
        jwt: workhub_config::JwtSettings {
            secret: "test-secret-key-for-jwt-signing-minimum-32-chars".to_string(),
            access_token_ttl_secs: 3600,
            refresh_token_ttl_secs: 604800,
            issuer: "workhub".to_string(),
        },
        auth: workhub_config::AuthSettings {
            admin_emails: vec![ADMIN_EMAIL.to_string()],
        },
        invitation: workhub_config::InvitationSettings { ttl_days: 7 },
        smtp: workhub_config::SmtpSettings {
            host: None,
            port: 587,
            username: None,
            password: None,
            from_address: "noreply@workhub.test".to_string(),
            from_name: "Workhub".to_string(),
            use_tls: false,
        },
        ai: workhub_config::AiSettings {
            api_key: None,
            endpoint: "http://127.0.0.1:9/v1/messages".to_string(),
            model: "test-model".to_string(),
            max_tokens: 512,
        },
    }
}
