use std::env;
use std::time::Duration;

use rand::RngCore;

use crate::error::{MudError, MudResult};

/// Process-wide read-only configuration, resolved once at startup.
///
/// Mirrors the shape of the teacher's `ServerConfig` (a single
/// `Default`-backed struct constructed once and handed down by reference),
/// but sourced from environment variables per spec rather than `clap`.
#[derive(Debug, Clone)]
pub struct Config {
    pub telnet_port: u16,
    pub web_port: u16,
    pub admin_port: u16,
    pub admin_user: String,
    pub admin_pass: String,
    pub admin_bind_addr: String,
    pub allowed_origins: Vec<String>,
    pub log_level: String,
    pub log_pretty: bool,

    pub max_inventory_size: usize,
    pub max_connections: usize,
    pub connection_timeout: Duration,
    pub idle_timeout: Duration,
    pub default_npc_hp: i32,
    pub tick_period: Duration,
    pub auth_rate_limit: u32,
    pub auth_rate_window: Duration,
    pub cmd_rate_limit: u32,
    pub cmd_rate_window: Duration,
    pub reconnect_window: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telnet_port: 2323,
            web_port: 8080,
            admin_port: 9090,
            admin_user: "admin".to_string(),
            admin_pass: String::new(),
            admin_bind_addr: "127.0.0.1:9090".to_string(),
            allowed_origins: vec!["*".to_string()],
            log_level: "info".to_string(),
            log_pretty: true,

            max_inventory_size: 20,
            max_connections: 100,
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(30 * 60),
            default_npc_hp: 50,
            tick_period: Duration::from_millis(500),
            auth_rate_limit: 5,
            auth_rate_window: Duration::from_secs(60),
            cmd_rate_limit: 10,
            cmd_rate_window: Duration::from_secs(1),
            reconnect_window: Duration::from_secs(30 * 60),
        }
    }
}

impl Config {
    /// Resolves configuration from the environment, applying defaults and
    /// auto-generating `ADMIN_PASS` when unset (with a loud stderr warning,
    /// per spec).
    pub fn from_env() -> MudResult<Self> {
        let mut cfg = Config::default();

        if let Ok(v) = env::var("TELNET_PORT") {
            cfg.telnet_port = v
                .parse()
                .map_err(|_| MudError::Config(format!("invalid TELNET_PORT: {v}")))?;
        }
        if let Ok(v) = env::var("WEB_PORT") {
            cfg.web_port = v
                .parse()
                .map_err(|_| MudError::Config(format!("invalid WEB_PORT: {v}")))?;
        }
        if let Ok(v) = env::var("ADMIN_PORT") {
            cfg.admin_port = v
                .parse()
                .map_err(|_| MudError::Config(format!("invalid ADMIN_PORT: {v}")))?;
        }
        if let Ok(v) = env::var("ADMIN_USER") {
            cfg.admin_user = v;
        }
        if let Ok(v) = env::var("ADMIN_BIND_ADDR") {
            cfg.admin_bind_addr = v;
        }
        if let Ok(v) = env::var("ALLOWED_ORIGINS") {
            cfg.allowed_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("LOG_LEVEL") {
            cfg.log_level = v;
        }
        if let Ok(v) = env::var("LOG_PRETTY") {
            cfg.log_pretty = v.eq_ignore_ascii_case("true") || v == "1";
        }

        cfg.admin_pass = match env::var("ADMIN_PASS") {
            Ok(v) if !v.is_empty() => v,
            _ => {
                let generated = generate_admin_secret();
                eprintln!(
                    "WARNING: ADMIN_PASS not set; generated a random admin password for this \
                     process. Set ADMIN_PASS explicitly to persist one across restarts."
                );
                eprintln!("WARNING: generated ADMIN_PASS = {generated}");
                generated
            }
        };

        Ok(cfg)
    }
}

fn generate_admin_secret() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.telnet_port, 2323);
        assert_eq!(cfg.web_port, 8080);
        assert_eq!(cfg.admin_port, 9090);
        assert_eq!(cfg.admin_bind_addr, "127.0.0.1:9090");
        assert_eq!(cfg.max_inventory_size, 20);
        assert_eq!(cfg.max_connections, 100);
        assert_eq!(cfg.tick_period, Duration::from_millis(500));
    }

    #[test]
    fn admin_secret_is_hex_and_varies() {
        let a = generate_admin_secret();
        let b = generate_admin_secret();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
