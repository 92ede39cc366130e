//! Bridge configuration, read once at startup and immutable afterwards.
//!
//! Every field has a default matching the reference deployment, so the
//! daemon runs with no config file at all. A TOML file passed on the
//! command line overrides whichever fields it names.

use std::collections::BTreeSet;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

// Accepted refresh_interval_secs range. Values outside it break the loop
// cadence: a tiny interval truncates toward a zero-sleep spin, a huge one
// overflows `Duration::from_secs_f64`.
const MIN_REFRESH_INTERVAL_SECS: f64 = 0.05;
const MAX_REFRESH_INTERVAL_SECS: f64 = 86_400.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP control surface binds to.
    pub http_host: String,
    pub http_port: u16,
    /// Source port shared by every bandeau socket. The panels only accept
    /// datagrams originating from this port.
    pub udp_source_port: u16,
    /// Port the panels listen on.
    pub udp_dest_port: u16,
    /// Period of the keepalive loop, in seconds. Accepted range 0.05 to
    /// 86400.
    pub refresh_interval_secs: f64,
    #[serde(rename = "bandeau")]
    pub bandeaux: Vec<BandeauConfig>,
}

/// One bandeau: a chain of panels reachable at a single address, driven as
/// a unit.
#[derive(Debug, Clone, Deserialize)]
pub struct BandeauConfig {
    pub id: u8,
    pub addr: Ipv4Addr,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            http_host: "127.0.0.1".to_string(),
            http_port: 8080,
            udp_source_port: 19522,
            udp_dest_port: 19523,
            refresh_interval_secs: 2.0,
            bandeaux: vec![
                BandeauConfig {
                    id: 1,
                    addr: Ipv4Addr::new(192, 168, 1, 109),
                },
                BandeauConfig {
                    id: 2,
                    addr: Ipv4Addr::new(192, 168, 1, 110),
                },
                BandeauConfig {
                    id: 3,
                    addr: Ipv4Addr::new(192, 168, 1, 111),
                },
            ],
        }
    }
}

impl Config {
    /// Load and validate a config file. Any failure here is fatal: the
    /// bridge must not start half-configured.
    pub fn load(path: &Path) -> Result<Config> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        // A NaN interval fails the range check too: `contains` is false
        // for every comparison involving NaN.
        if !(MIN_REFRESH_INTERVAL_SECS..=MAX_REFRESH_INTERVAL_SECS)
            .contains(&self.refresh_interval_secs)
        {
            bail!(
                "refresh_interval_secs must be between {MIN_REFRESH_INTERVAL_SECS} and \
                 {MAX_REFRESH_INTERVAL_SECS}, got {}",
                self.refresh_interval_secs
            );
        }
        let mut seen = BTreeSet::new();
        for bandeau in &self.bandeaux {
            if bandeau.id == 0 {
                bail!("bandeau ids start at 1");
            }
            if !seen.insert(bandeau.id) {
                bail!("duplicate bandeau id {}", bandeau.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = Config::default();
        assert_eq!(config.http_host, "127.0.0.1");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.udp_source_port, 19522);
        assert_eq!(config.udp_dest_port, 19523);
        assert_eq!(config.refresh_interval(), Duration::from_secs(2));
        assert_eq!(config.bandeaux.len(), 3);
        assert_eq!(config.bandeaux[0].id, 1);
        assert_eq!(config.bandeaux[0].addr, Ipv4Addr::new(192, 168, 1, 109));
        assert_eq!(config.bandeaux[2].addr, Ipv4Addr::new(192, 168, 1, 111));
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let raw = r#"
http_host = "0.0.0.0"
http_port = 9090
udp_source_port = 40000
udp_dest_port = 40001
refresh_interval_secs = 0.5

[[bandeau]]
id = 1
addr = "10.0.0.10"

[[bandeau]]
id = 5
addr = "10.0.0.11"
"#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.http_host, "0.0.0.0");
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.udp_source_port, 40000);
        assert_eq!(config.refresh_interval(), Duration::from_millis(500));
        assert_eq!(config.bandeaux.len(), 2);
        assert_eq!(config.bandeaux[1].id, 5);
        assert_eq!(config.bandeaux[1].addr, Ipv4Addr::new(10, 0, 0, 11));
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str("http_port = 9999\n").unwrap();
        assert_eq!(config.http_port, 9999);
        assert_eq!(config.http_host, "127.0.0.1");
        assert_eq!(config.udp_dest_port, 19523);
        assert_eq!(config.bandeaux.len(), 3);
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tallybridge.toml");
        fs::write(&path, "refresh_interval_secs = 1.5\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(Config::load(Path::new("/nonexistent/tallybridge.toml")).is_err());
    }

    #[test]
    fn test_malformed_config_rejected() {
        assert!(toml::from_str::<Config>("http_port = \"not a port\"\n").is_err());
    }

    #[test]
    fn test_duplicate_bandeau_id_rejected() {
        let raw = r#"
[[bandeau]]
id = 1
addr = "10.0.0.1"

[[bandeau]]
id = 1
addr = "10.0.0.2"
"#;
        let config: Config = toml::from_str(raw).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_bandeau_id_rejected() {
        let config: Config = toml::from_str("[[bandeau]]\nid = 0\naddr = \"10.0.0.1\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_interval_rejected() {
        // 1e20 would overflow Duration::from_secs_f64 and 1e-300 would
        // truncate the loop period to zero; both must die in validation.
        for raw in [
            "refresh_interval_secs = 0.0\n",
            "refresh_interval_secs = -2.0\n",
            "refresh_interval_secs = 1e20\n",
            "refresh_interval_secs = 1e-300\n",
            "refresh_interval_secs = nan\n",
        ] {
            let config: Config = toml::from_str(raw).unwrap();
            assert!(config.validate().is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_interval_bounds_are_inclusive() {
        for raw in [
            "refresh_interval_secs = 0.05\n",
            "refresh_interval_secs = 86400.0\n",
        ] {
            let config: Config = toml::from_str(raw).unwrap();
            config.validate().unwrap();
            assert!(config.refresh_interval() > Duration::ZERO);
        }
    }
}
