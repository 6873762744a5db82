use std::time::Duration;

use pretty_assertions::assert_eq;
use redcache::{Backend, FailurePolicy, KeyPolicy};
use redcache_configuration::{
    CacheDocument, ConfigError, ConnectionSource, Driver, ValueSerialization,
};
use redcache_redis::{Configuration, ConnectionParams, ConnectionSpec, ReplicaFailover};

#[test]
fn test_url_document_deserialize() {
    let yaml = r#"
driver: redis
connection: "redis://10.0.0.5:6380/1"
"#;

    let document = CacheDocument::from_yaml(yaml).expect("failed to deserialize");

    assert_eq!(document.driver, Driver::Redis);
    assert_eq!(
        document.connection,
        ConnectionSource::Url("redis://10.0.0.5:6380/1".to_string())
    );
    assert_eq!(document.format, ValueSerialization::Json);
    assert_eq!(document.failure, FailurePolicy::Propagate);
    assert_eq!(document.keys, KeyPolicy::Verbatim);
}

#[test]
fn test_full_document_deserialize() {
    let yaml = r#"
driver: pooled_cluster
label: sessions
format: Bincode
failure: disable
keys:
  type: Sanitize
  prefix: v1
connection:
  connections:
    - "10.0.0.1:7000"
    - host: 10.0.0.2
      port: 7001
      password: node-secret
  options:
    timeout: 0.5
    read_timeout: 2
    prefix: shop
    slave_failover: distribute
    pool_size: 16
    persistent: false
  auth:
    password: cluster-secret
"#;

    let document = CacheDocument::from_yaml(yaml).expect("failed to deserialize");

    assert_eq!(document.driver, Driver::PooledCluster);
    assert_eq!(document.label.as_deref(), Some("sessions"));
    assert_eq!(document.format, ValueSerialization::Bincode);
    assert_eq!(document.failure, FailurePolicy::Disable);
    assert_eq!(
        document.keys,
        KeyPolicy::Sanitize {
            prefix: Some("v1".to_string())
        }
    );

    let config: Configuration = document.connection.into();
    assert_eq!(
        config.connections,
        vec![
            ConnectionSpec::Literal("10.0.0.1:7000".to_string()),
            ConnectionSpec::Params(ConnectionParams {
                host: Some("10.0.0.2".to_string()),
                port: Some(7001),
                password: Some("node-secret".to_string()),
                ..ConnectionParams::default()
            }),
        ]
    );
    assert_eq!(config.options.connect_timeout(), Some(Duration::from_millis(500)));
    assert_eq!(config.options.response_timeout(), Some(Duration::from_secs(2)));
    assert_eq!(config.options.prefix.as_deref(), Some("shop"));
    assert_eq!(config.options.slave_failover, ReplicaFailover::Distribute);
    assert_eq!(config.options.pool_size, Some(16));
    assert!(!config.options.persistent);
    assert_eq!(config.auth.password.as_deref(), Some("cluster-secret"));
}

#[test]
fn test_defaults() {
    let document = CacheDocument::from_yaml("label: plain").expect("failed to deserialize");

    assert_eq!(document.driver, Driver::Redis);
    assert_eq!(document.connection, ConnectionSource::default());
    assert_eq!(document.label.as_deref(), Some("plain"));
}

#[test]
fn test_unknown_driver_is_rejected() {
    let result = CacheDocument::from_yaml("driver: memcached");
    assert!(matches!(result, Err(ConfigError::Yaml(_))));
}

#[test]
fn test_document_roundtrip() {
    let document = CacheDocument {
        driver: Driver::RedisCluster,
        connection: ConnectionSource::Url("redis://cache:7000".to_string()),
        failure: FailurePolicy::Disable,
        ..CacheDocument::default()
    };

    let yaml = serde_saphyr::to_string(&document).expect("failed to serialize");
    let parsed = CacheDocument::from_yaml(&yaml).expect("failed to deserialize");
    assert_eq!(parsed, document);
}

#[tokio::test]
async fn test_lazy_documents_build_caches() {
    for driver in ["redis", "redis_cluster", "pooled", "pooled_cluster"] {
        let yaml = format!(
            r#"
driver: {driver}
label: {driver}-cache
connection:
  host: 127.0.0.1
  options:
    lazy: true
"#
        );

        let cache = CacheDocument::from_yaml(&yaml)
            .expect("failed to deserialize")
            .into_cache()
            .await
            .expect("lazy adapters do not connect");
        assert_eq!(cache.manager().label().as_str(), format!("{driver}-cache"));
        assert!(cache.is_enabled());
    }
}

#[tokio::test]
async fn test_unreachable_server_fails_to_connect() {
    let yaml = r#"
driver: pooled
connection:
  url: "redis://127.0.0.1:1"
  options:
    timeout: 0.5
"#;

    let result = CacheDocument::from_yaml(yaml)
        .expect("failed to deserialize")
        .into_cache()
        .await;
    assert!(matches!(result, Err(ConfigError::Connect(_))));
}
