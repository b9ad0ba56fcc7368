use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    #[serde(default)]
    pub depot: DepotConfig,
}

/// Depot controller configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DepotConfig {
    /// Identity written into the lease record; must differ per controller.
    pub controller_id: String,
    /// Lease duration; renewed every tick while an exchange is in flight.
    pub lease_secs: i64,
    /// Shared lease medium for the file-backed lease store.
    pub lease_path: String,
    /// Transaction audit log destination.
    pub audit_log_path: String,
    /// Delay between scheduler ticks in the demo driver.
    pub tick_interval_ms: u64,
}

impl Default for DepotConfig {
    fn default() -> Self {
        Self {
            controller_id: "depot-alpha".to_string(),
            lease_secs: 60,
            lease_path: "data/depot.lease".to_string(),
            audit_log_path: "data/audit.csv".to_string(),
            tick_interval_ms: 100,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}
