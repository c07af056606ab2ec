use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL for the durable stores.
    /// When absent the service runs on the in-memory stores.
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    /// OTP verification provider (consumed by the auth layer, not the engine)
    #[serde(default)]
    pub otp: Option<OtpConfig>,
    /// Demo accounts seeded into the in-memory stores (mock-api builds only)
    #[serde(default)]
    pub seed_accounts: Vec<SeedAccount>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret-do-not-use-in-prod".to_string(),
        }
    }
}

/// Tuning for the engine's compare-and-swap retry loop
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_backoff_ms: 2,
            max_backoff_ms: 32,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OtpConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SeedAccount {
    pub id: u64,
    pub balance: u64,
    pub email: String,
    pub name: String,
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let yaml = r#"
log_level: info
log_dir: ./logs
log_file: fundflow.log
use_json: false
rotation: daily
gateway:
  host: 127.0.0.1
  port: 8080
"#;
        let cfg: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(cfg.postgres_url.is_none());
        assert_eq!(cfg.retry.max_attempts, 8);
        assert!(cfg.otp.is_none());
        assert!(cfg.seed_accounts.is_empty());
    }

    #[test]
    fn test_seed_accounts_parse() {
        let yaml = r#"
log_level: info
log_dir: ./logs
log_file: fundflow.log
use_json: false
rotation: never
gateway:
  host: 127.0.0.1
  port: 8080
seed_accounts:
  - { id: 1, balance: 10000, email: alice@example.com, name: Alice }
  - { id: 2, balance: 5000, email: bob@example.com, name: Bob }
"#;
        let cfg: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.seed_accounts.len(), 2);
        assert_eq!(cfg.seed_accounts[0].balance, 10000);
    }
}
