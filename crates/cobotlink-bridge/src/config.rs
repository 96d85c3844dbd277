//! Connection settings for [`BridgeClient`][crate::BridgeClient].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Port `rosbridge_server` listens on out of the box.
pub const DEFAULT_PORT: u16 = 9090;

/// Where to find the bridge and how to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Hostname or IP of the arm running `rosbridge_server`.
    #[serde(default = "default_host")]
    pub host: String,

    /// rosbridge WebSocket port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// How often the readiness wait logs which channel is still silent.
    #[serde(default = "default_ready_log_interval_ms")]
    pub ready_log_interval_ms: u64,

    /// Fail construction if the TCP connect plus WebSocket handshake takes
    /// longer than this.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Give up waiting for the first image and pose after this many
    /// milliseconds. `None` waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_timeout_ms: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_ready_log_interval_ms() -> u64 {
    3_000
}
fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ready_log_interval_ms: default_ready_log_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            ready_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Bound the readiness wait (builder-style).
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout_ms = Some(duration_ms(timeout));
        self
    }

    /// Bound the connect and handshake (builder-style).
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = duration_ms(timeout);
        self
    }

    /// Override the readiness log interval (builder-style).
    pub fn with_ready_log_interval(mut self, interval: Duration) -> Self {
        self.ready_log_interval_ms = duration_ms(interval);
        self
    }

    /// `ws://host:port`, with IPv6 literals bracketed (`ws://[::1]:9090`).
    pub fn url(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("ws://[{}]:{}", self.host, self.port)
        } else {
            format!("ws://{}:{}", self.host, self.port)
        }
    }

    pub fn ready_log_interval(&self) -> Duration {
        Duration::from_millis(self.ready_log_interval_ms.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.max(1))
    }

    pub fn ready_timeout(&self) -> Option<Duration> {
        self.ready_timeout_ms.map(|ms| Duration::from_millis(ms.max(1)))
    }
}

/// Whole milliseconds, at least one.
fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_wait_forever_on_rosbridge_port() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.ready_log_interval(), Duration::from_secs(3));
        assert_eq!(cfg.ready_timeout(), None);
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.url(), "ws://localhost:9090");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: ClientConfig = serde_json::from_str(r#"{"host":"192.168.1.42"}"#).unwrap();
        assert_eq!(cfg.url(), "ws://192.168.1.42:9090");
        assert_eq!(cfg.ready_log_interval_ms, 3_000);
    }

    #[test]
    fn builders_override_timing() {
        let cfg = ClientConfig::new("cobot.local", 9091)
            .with_ready_timeout(Duration::from_secs(30))
            .with_ready_log_interval(Duration::from_millis(250));
        assert_eq!(cfg.ready_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(cfg.ready_log_interval(), Duration::from_millis(250));
        assert_eq!(cfg.url(), "ws://cobot.local:9091");
    }

    #[test]
    fn sub_second_timeouts_keep_their_precision() {
        let cfg = ClientConfig::default()
            .with_ready_timeout(Duration::from_millis(1_500))
            .with_connect_timeout(Duration::from_millis(200));
        assert_eq!(cfg.ready_timeout(), Some(Duration::from_millis(1_500)));
        assert_eq!(cfg.connect_timeout(), Duration::from_millis(200));

        let cfg = ClientConfig::default().with_ready_timeout(Duration::ZERO);
        assert_eq!(cfg.ready_timeout(), Some(Duration::from_millis(1)));
    }

    #[test]
    fn ipv6_hosts_are_bracketed() {
        assert_eq!(ClientConfig::new("::1", 9090).url(), "ws://[::1]:9090");
        assert_eq!(ClientConfig::new("[fe80::2]", 9091).url(), "ws://[fe80::2]:9091");
        assert_eq!(ClientConfig::new("10.0.0.5", 9090).url(), "ws://10.0.0.5:9090");
    }
}
