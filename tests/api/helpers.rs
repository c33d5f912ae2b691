use std::error::Error;

use bazaar::{
    auth::{Tokenizer, UserRole},
    configuration::{DatabaseSettings, Settings},
    startup::{get_connection_pool, Application},
    telemetry::{get_subscriber, init_subscriber},
    utils::DbPool
};
use diesel::{pg::Pg, Connection, PgConnection, RunQueryDsl};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use once_cell::sync::Lazy;
use reqwest::redirect::Policy;
use uuid::Uuid;

static LOGGER_INSTANCE: Lazy<()> = Lazy::new(|| {
    let log_level = "info".to_string();
    let name = "bazaar-test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(name, log_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(name, log_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

fn run_migrations(connection: &mut impl MigrationHarness<Pg>)
    -> Result<(), Box<dyn Error + Send + Sync + 'static>>
{
    connection.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

pub struct TestApp{
    pub host: String,
    pub port: u16,
    pub pool: DbPool,
    pub tokenizer: Tokenizer,
    pub api_client: reqwest::Client
}

impl TestApp {
    fn create_db(settings: &DatabaseSettings) -> DbPool{
        let mut connection = PgConnection::establish(&settings.get_database_url())
                                .expect("Failed to connect to postgres database");

        let query = format!(r#"CREATE DATABASE "{}";"#, settings.name);
        diesel::sql_query(query)
            .execute(&mut connection)
            .expect("Failed to create test database");

        let pool = get_connection_pool(settings);
        let mut conn = pool.get().expect("Failed to get connection to test database");
        run_migrations(&mut conn).expect("Failed to run migrations");

        pool
    }

    pub fn get_app_url(&self) -> String{
        format!("http://{}:{}", self.host, self.port)
    }

    fn test_settings() -> Settings{
        let mut settings = Settings::get().expect("Failed to read configuration");
        settings.application.port = 0;
        settings.database.name = Uuid::new_v4().to_string();
        settings.database.connection_timeout_secs = 1;
        settings
    }

    /// Server whose database does not exist. Only routes that reject a
    /// request before touching the database can be exercised.
    pub async fn spawn_app() -> TestApp{
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(customise: impl FnOnce(&mut Settings)) -> TestApp{
        let mut settings = Self::test_settings();
        customise(&mut settings);
        let pool = get_connection_pool(&settings.database);
        Self::launch(settings, pool).await
    }

    /// Server backed by a fresh, migrated database
    pub async fn spawn_app_with_db() -> TestApp{
        let settings = Self::test_settings();
        let pool = TestApp::create_db(&settings.database);
        Self::launch(settings, pool).await
    }

    async fn launch(settings: Settings, pool: DbPool) -> TestApp{
        Lazy::force(&LOGGER_INSTANCE);

        let tokenizer = Tokenizer::new(&settings.jwt);
        let application = Application::new(settings)
                            .await
                            .expect("Failed to build application");

        let host = application.host.clone();
        let port = application.port;
        tokio::task::spawn(application.server);

        let api_client = reqwest::Client::builder()
                            .redirect(Policy::none())
                            .build()
                            .unwrap();

        TestApp{
            host,
            port,
            pool,
            tokenizer,
            api_client
        }
    }

    /// Signs a token for an account that need not exist
    pub fn token_for(&self, role: UserRole) -> String{
        self.tokenizer
            .generate_key(Uuid::new_v4(), "someone@example.com", role)
            .expect("Failed to sign token")
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value, token: Option<&str>) -> reqwest::Response{
        let mut request = self.api_client
            .post(format!("{}{}", self.get_app_url(), path))
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response{
        let mut request = self.api_client.get(format!("{}{}", self.get_app_url(), path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request")
    }
}
