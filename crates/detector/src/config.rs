//! Daemon configuration

use anyhow::Result;
use detector_lib::config::Thresholds;
use detector_lib::detect::SweepConfig;
use serde::Deserialize;
use std::time::Duration;

/// Daemon configuration, loaded from `ZD_`-prefixed environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Prometheus base URL for series and limits queries
    #[serde(default = "default_prometheus_url")]
    pub prometheus_url: String,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Seconds between detection sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Trailing metrics window analyzed per container, in minutes
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,

    /// Composite score required to report a container
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,

    /// Comma-separated namespaces to exclude from detection
    #[serde(default = "default_exclude_namespaces")]
    pub exclude_namespaces: String,

    /// Rule threshold overrides (defaults apply per field)
    #[serde(default)]
    pub thresholds: Thresholds,
}

fn default_prometheus_url() -> String {
    "http://prometheus.monitoring:9090".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_window_minutes() -> u64 {
    60
}

fn default_score_threshold() -> f64 {
    70.0
}

fn default_exclude_namespaces() -> String {
    "kube-system,monitoring".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            prometheus_url: default_prometheus_url(),
            api_port: default_api_port(),
            sweep_interval_secs: default_sweep_interval(),
            window_minutes: default_window_minutes(),
            score_threshold: default_score_threshold(),
            exclude_namespaces: default_exclude_namespaces(),
            thresholds: Thresholds::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ZD").separator("__"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// Namespaces excluded from sweeps
    pub fn excluded_namespaces(&self) -> Vec<String> {
        self.exclude_namespaces
            .split(',')
            .map(|ns| ns.trim().to_string())
            .filter(|ns| !ns.is_empty())
            .collect()
    }

    /// Sweep settings derived from this configuration
    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig {
            score_threshold: self.score_threshold,
            exclude_namespaces: self.excluded_namespaces(),
            window: Duration::from_secs(self.window_minutes * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DaemonConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.sweep_interval_secs, 300);
        assert_eq!(config.score_threshold, 70.0);
        assert_eq!(
            config.excluded_namespaces(),
            vec!["kube-system".to_string(), "monitoring".to_string()]
        );
    }

    #[test]
    fn test_excluded_namespaces_trims_and_drops_empties() {
        let config = DaemonConfig {
            exclude_namespaces: " kube-system , ,monitoring,".to_string(),
            ..DaemonConfig::default()
        };
        assert_eq!(
            config.excluded_namespaces(),
            vec!["kube-system".to_string(), "monitoring".to_string()]
        );
    }

    #[test]
    fn test_sweep_config_uses_window_minutes() {
        let config = DaemonConfig {
            window_minutes: 120,
            ..DaemonConfig::default()
        };
        assert_eq!(
            config.sweep_config().window,
            Duration::from_secs(120 * 60)
        );
    }
}
