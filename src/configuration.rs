use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::PaymentMethod;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings{
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub jwt: JWTSettings,
    pub security: SecuritySettings,
    pub payments: PaymentSettings,
    pub orders: OrderSettings
}

#[derive(Deserialize, Debug, Clone)]
pub struct ApplicationSettings{
    pub host: String,
    pub port: u16,
    pub base_url: String
}

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseSettings{
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub name: String,
    pub connection_timeout_secs: u64
}

impl DatabaseSettings {
    // Url of the postgres server, without selecting a database
    pub fn get_database_url(&self) -> String{
        format!(
            "postgres://{}:{}@{}:{}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port
        )
    }

    pub fn get_database_table_url(&self) -> String{
        format!("{}/{}", self.get_database_url(), self.name)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct JWTSettings{
    pub secret: SecretString,
    pub expiry_hours: u64
}

#[derive(Deserialize, Debug, Clone)]
pub struct SecuritySettings{
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    /// Reverse proxies allowed to report the client address in `X-Forwarded-For`
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
    pub portal_secret: Option<SecretString>,
    pub production: bool,
    pub login_max_attempts: u32,
    pub login_window_secs: u64
}

#[derive(Deserialize, Debug, Clone)]
pub struct PaymentSettings{
    pub enabled_methods: Vec<PaymentMethod>,
    pub currency: String,
    pub commission_rate: Decimal,
    pub fraud_review_threshold: Decimal
}

#[derive(Deserialize, Debug, Clone)]
pub struct OrderSettings{
    /// Fraction of the subtotal, e.g. `0.15`
    pub tax_rate: Decimal,
    pub shipping_fee: Decimal,
    pub free_shipping_threshold: Decimal,
    pub max_order_amount: Decimal
}

impl PaymentSettings {
    pub fn is_enabled(&self, method: PaymentMethod) -> bool{
        self.enabled_methods.contains(&method)
    }
}

impl Settings{
    /// Layers `configuration/base.yaml`, the environment specific file picked by
    /// `APP_ENVIRONMENT` and finally `APP_*` environment variables.
    pub fn get() -> Result<Self, ConfigError>{
        let base_path = std::env::current_dir()
            .map_err(|e| ConfigError::Message(format!("Failed to determine current directory: {}", e)))?
            .join("configuration");

        let environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into());

        Config::builder()
            .add_source(File::from(base_path.join("base.yaml")))
            .add_source(File::from(base_path.join(format!("{}.yaml", environment))).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("security.allowed_ips")
                    .with_list_parse_key("security.allowed_domains")
                    .with_list_parse_key("payments.enabled_methods")
            )
            .build()?
            .try_deserialize::<Settings>()
    }
}
