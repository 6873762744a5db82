//! Connection configuration shared by every Redis adapter.
//!
//! The same [`Configuration`] shape feeds all four adapters; each one reads
//! the subset of keys it understands and ignores the rest. A typical YAML
//! rendition:
//!
//! ```yaml
//! host: cache.internal
//! port: 6380
//! options:
//!   prefix: shop
//!   read_timeout: 1.5
//!   slave_failover: distribute
//! auth:
//!   password: secret
//! connections:
//!   - "10.0.0.1:7000"
//!   - host: 10.0.0.2
//!     port: 7001
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Options for a Redis connection or cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Full connection URL. When present it wins over `scheme`/`host`/`port`.
    pub url: Option<String>,
    /// Label used in logs and metrics instead of the adapter's default one.
    pub name: Option<String>,
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Cluster seed nodes. The first entry doubles as the address of the
    /// pooled single-node adapter.
    pub connections: Vec<ConnectionSpec>,
    pub options: Options,
    pub auth: Auth,
}

impl Configuration {
    /// Configuration that connects to exactly `url`.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Password for the connection: `options.parameters.password`, falling
    /// back to `auth.password`.
    pub fn password(&self) -> Option<&str> {
        self.options
            .parameters
            .password
            .as_deref()
            .or(self.auth.password.as_deref())
            .filter(|password| !password.is_empty())
    }

    /// Scheme configured at the top level or under `options.parameters`.
    pub fn scheme(&self) -> Option<&str> {
        self.scheme
            .as_deref()
            .or(self.options.parameters.scheme.as_deref())
    }

    /// The connection-level keys of this configuration as a single spec.
    pub(crate) fn as_spec(&self) -> ConnectionSpec {
        ConnectionSpec::Params(ConnectionParams {
            url: self.url.clone(),
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            port: self.port,
            password: None,
        })
    }
}

/// One entry of `connections`.
///
/// A plain string is used verbatim as the node address; a map is resolved
/// field by field against the surrounding [`Configuration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConnectionSpec {
    Literal(String),
    Params(ConnectionParams),
}

impl Default for ConnectionSpec {
    fn default() -> Self {
        Self::Params(ConnectionParams::default())
    }
}

impl From<&str> for ConnectionSpec {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_owned())
    }
}

impl From<ConnectionParams> for ConnectionSpec {
    fn from(value: ConnectionParams) -> Self {
        Self::Params(value)
    }
}

/// Structured node address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    pub url: Option<String>,
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Per-node password, used by the pooled cluster adapter.
    pub password: Option<String>,
}

/// Tuning knobs under `options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Connect timeout in seconds. `0` or absent means no timeout.
    pub timeout: Option<f64>,
    /// Response timeout in seconds. `0` or absent means no timeout.
    #[serde(alias = "readTimeout")]
    pub read_timeout: Option<f64>,
    /// Keep one long-lived connection instead of opening one per command.
    /// Pooled adapters ignore it.
    pub persistent: bool,
    /// Namespace prepended to every key as `{prefix}:{key}`.
    pub prefix: Option<String>,
    #[serde(alias = "slaveFailover")]
    pub slave_failover: ReplicaFailover,
    /// Skip the connectivity check at construction time.
    pub lazy: bool,
    /// Upper bound of pooled connections.
    pub pool_size: Option<usize>,
    pub parameters: Parameters,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: None,
            read_timeout: None,
            persistent: true,
            prefix: None,
            slave_failover: ReplicaFailover::default(),
            lazy: false,
            pool_size: None,
            parameters: Parameters::default(),
        }
    }
}

impl Options {
    pub fn connect_timeout(&self) -> Option<Duration> {
        seconds(self.timeout)
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        seconds(self.read_timeout)
    }

    pub(crate) fn key_prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|prefix| !prefix.is_empty())
    }
}

fn seconds(value: Option<f64>) -> Option<Duration> {
    value
        .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
        .map(Duration::from_secs_f64)
}

/// Client parameters nested under `options.parameters`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub password: Option<String>,
    pub scheme: Option<String>,
}

/// Credentials under `auth`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Auth {
    pub password: Option<String>,
}

/// Where cluster reads may be served from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicaFailover {
    /// Always read from primaries.
    None,
    /// Read from primaries; replicas are only contacted when a primary fails.
    #[default]
    Error,
    /// Spread reads across primaries and replicas.
    Distribute,
    /// Spread reads across replicas only.
    DistributeSlaves,
}

impl ReplicaFailover {
    /// Whether read commands may be routed to replica nodes.
    pub fn reads_from_replicas(self) -> bool {
        matches!(self, Self::Distribute | Self::DistributeSlaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_persistent_and_eager() {
        let config = Configuration::default();
        assert!(config.options.persistent);
        assert!(!config.options.lazy);
        assert_eq!(config.options.slave_failover, ReplicaFailover::Error);
        assert_eq!(config.options.connect_timeout(), None);
        assert_eq!(config.password(), None);
    }

    #[test]
    fn zero_timeouts_mean_none() {
        let options = Options {
            timeout: Some(0.0),
            read_timeout: Some(1.5),
            ..Options::default()
        };
        assert_eq!(options.connect_timeout(), None);
        assert_eq!(options.response_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn connections_accept_strings_and_maps() {
        let config: Configuration = serde_json::from_value(serde_json::json!({
            "connections": [
                "10.0.0.1:7000",
                { "host": "10.0.0.2", "port": 7001, "password": "node" }
            ],
            "options": { "slave_failover": "distribute_slaves", "readTimeout": 2 }
        }))
        .unwrap();

        assert_eq!(
            config.connections,
            vec![
                ConnectionSpec::Literal("10.0.0.1:7000".to_owned()),
                ConnectionSpec::Params(ConnectionParams {
                    host: Some("10.0.0.2".to_owned()),
                    port: Some(7001),
                    password: Some("node".to_owned()),
                    ..ConnectionParams::default()
                }),
            ]
        );
        assert!(config.options.slave_failover.reads_from_replicas());
        assert_eq!(config.options.response_timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn parameter_password_wins_over_auth() {
        let mut config = Configuration::default();
        config.auth.password = Some("auth".to_owned());
        assert_eq!(config.password(), Some("auth"));

        config.options.parameters.password = Some("param".to_owned());
        assert_eq!(config.password(), Some("param"));
    }

    #[test]
    fn failover_routing() {
        assert!(!ReplicaFailover::None.reads_from_replicas());
        assert!(!ReplicaFailover::Error.reads_from_replicas());
        assert!(ReplicaFailover::Distribute.reads_from_replicas());
    }
}
