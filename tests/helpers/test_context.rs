//! Test context for unified test setup
//!
//! Wires a test database, an optional Redis, and the mock email API into
//! the same `ServiceFactory` the server uses.

use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::redis::Redis as RedisImage;
use eventify::config::Settings;
use eventify::database::DatabaseService;
use eventify::services::notification::TriggerReceiver;
use eventify::services::{trigger_channel, ServiceFactory, SessionStore};
use eventify::{create_router, AppState};

use super::{
    database_helper::TestDatabase,
    email_mock::{EmailMockServer, TEST_EMAIL_API_KEY},
    test_data::TEST_PBKDF2_ITERATIONS,
};

pub const TEST_ADMIN_EMAIL: &str = "events-office@uni.test";

/// Test configuration options
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub use_redis: bool,
    pub email_enabled: bool,
    pub auth_requests_per_minute: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            use_redis: false,
            email_enabled: true,
            auth_requests_per_minute: 1_000,
        }
    }
}

/// Unified test context that manages all test components
pub struct TestContext {
    pub database: TestDatabase,
    pub db: DatabaseService,
    pub email_mock: EmailMockServer,
    pub settings: Settings,
    pub services: ServiceFactory,
    /// Registration triggers the confirmation worker would consume
    pub triggers: TriggerReceiver,
    _redis: Option<ContainerAsync<RedisImage>>,
}

impl TestContext {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Self::new_with_config(TestConfig::default()).await
    }

    pub async fn new_with_config(config: TestConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let database = TestDatabase::new().await?;
        let email_mock = EmailMockServer::new().await;

        let (redis_url, redis_container) = if config.use_redis {
            Self::setup_redis().await?
        } else {
            // Never connected to; the client only opens on first use
            ("redis://127.0.0.1:1".to_string(), None)
        };

        let settings = Self::create_test_settings(&database, &email_mock, &redis_url, &config);

        let db = DatabaseService::new(database.pool.clone());
        let sessions = SessionStore::new(&settings.redis)?;
        let (trigger_tx, triggers) = trigger_channel();
        let services = ServiceFactory::new(&settings, db.clone(), sessions, trigger_tx)?;

        Ok(Self {
            database,
            db,
            email_mock,
            settings,
            services,
            triggers,
            _redis: redis_container,
        })
    }

    async fn setup_redis() -> Result<(String, Option<ContainerAsync<RedisImage>>), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(url) = std::env::var("TEST_REDIS_URL") {
            return Ok((url, None));
        }

        let container = RedisImage::default().start().await?;
        let port = container.get_host_port_ipv4(6379).await?;
        Ok((format!("redis://127.0.0.1:{}", port), Some(container)))
    }

    /// Create test-specific settings
    fn create_test_settings(
        database: &TestDatabase,
        email_mock: &EmailMockServer,
        redis_url: &str,
        config: &TestConfig,
    ) -> Settings {
        let mut settings = Settings::default();

        settings.database.url = database.database_url.clone();
        settings.database.max_connections = 10;

        settings.redis.url = redis_url.to_string();
        // Unique prefix keeps runs against a shared Redis apart
        settings.redis.prefix = format!("test_eventify:{}:", uuid::Uuid::new_v4().simple());

        settings.auth.jwt_secret = "test-secret-that-is-long-enough-for-hs256".to_string();
        settings.auth.pbkdf2_iterations = TEST_PBKDF2_ITERATIONS;
        settings.auth.admin_emails = vec![TEST_ADMIN_EMAIL.to_string()];

        settings.email.enabled = config.email_enabled;
        settings.email.api_url = email_mock.api_url();
        settings.email.api_key = TEST_EMAIL_API_KEY.to_string();
        settings.email.site_url = "https://events.uni.test".to_string();
        settings.email.timeout_seconds = 2;

        settings.reminders.enabled = false;
        settings.rate_limit.auth_requests_per_minute = config.auth_requests_per_minute;
        settings.logging.level = "debug".to_string();

        settings
    }

    /// Router over the context's services, as the server builds it
    pub fn router(&self) -> axum::Router {
        create_router(AppState::new(self.settings.clone(), self.services.clone()))
    }

    pub async fn cleanup(&self) -> Result<(), sqlx::Error> {
        self.email_mock.reset().await;
        self.database.cleanup().await
    }
}
