//! Turning connection specs into addresses the Redis clients accept.

use std::fmt::Write as _;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use redis::{ConnectionInfo, IntoConnectionInfo};

use crate::config::{ConnectionSpec, Configuration};
use crate::error::Error;

/// Characters left untouched when a password is placed into a URL.
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Per-adapter fallbacks for fields a spec leaves out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionDefaults {
    pub scheme: Option<&'static str>,
    pub host: &'static str,
    pub port: u16,
    /// Whether the resolved port becomes part of the address string.
    pub append_port: bool,
}

impl ConnectionDefaults {
    /// Managed single node: bare host, the port travels separately.
    pub const MANAGED: Self = Self {
        scheme: None,
        host: "127.0.0.1",
        port: 6379,
        append_port: false,
    };

    /// Managed cluster: `host:port` seeds.
    pub const MANAGED_CLUSTER: Self = Self {
        scheme: None,
        host: "127.0.0.1",
        port: 6379,
        append_port: true,
    };

    /// Pooled single node and cluster: full `redis://host:port` URLs.
    pub const POOLED: Self = Self {
        scheme: Some("redis"),
        host: "127.0.0.1",
        port: 6379,
        append_port: true,
    };
}

/// Resolves [`ConnectionSpec`]s against a [`Configuration`] and a set of
/// [`ConnectionDefaults`].
///
/// Resolution itself never fails; malformed addresses surface later, when
/// the client parses them.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionResolver<'a> {
    config: &'a Configuration,
    defaults: ConnectionDefaults,
}

impl<'a> ConnectionResolver<'a> {
    pub fn new(config: &'a Configuration, defaults: ConnectionDefaults) -> Self {
        Self { config, defaults }
    }

    /// Address string for `spec`.
    ///
    /// A literal is returned as is, a non-empty `url` wins over the
    /// individual fields, anything else is assembled as
    /// `[scheme://]host[:port]` with each field taken from `spec` itself, then the
    /// configuration, then the defaults.
    pub fn resolve(&self, spec: &ConnectionSpec) -> String {
        let params = match spec {
            ConnectionSpec::Literal(address) => return address.clone(),
            ConnectionSpec::Params(params) => params,
        };
        if let Some(url) = params.url.as_deref().filter(|url| !url.is_empty()) {
            return url.to_owned();
        }

        let scheme = params
            .scheme
            .as_deref()
            .or(self.config.scheme())
            .or(self.defaults.scheme)
            .filter(|scheme| !scheme.is_empty());
        let host = params
            .host
            .as_deref()
            .or(self.config.host.as_deref())
            .unwrap_or(self.defaults.host);

        let mut address = String::new();
        if let Some(scheme) = scheme {
            address.push_str(scheme);
            address.push_str("://");
        }
        address.push_str(host);
        if self.defaults.append_port {
            let _ = write!(address, ":{}", self.port(spec));
        }
        address
    }

    /// Port for `spec`: its own, then the configuration's, then the default.
    pub fn port(&self, spec: &ConnectionSpec) -> u16 {
        let own = match spec {
            ConnectionSpec::Params(params) => params.port,
            ConnectionSpec::Literal(_) => None,
        };
        own.or(self.config.port).unwrap_or(self.defaults.port)
    }

    /// Spec of a single-node connection: the first configured connection, or
    /// the top-level keys of the configuration.
    pub fn primary(&self) -> ConnectionSpec {
        self.config
            .connections
            .first()
            .cloned()
            .unwrap_or_else(|| self.config.as_spec())
    }

    /// Cluster seeds. An empty `connections` list yields a single default seed.
    pub fn seeds(&self) -> Vec<ConnectionSpec> {
        if self.config.connections.is_empty() {
            vec![ConnectionSpec::default()]
        } else {
            self.config.connections.clone()
        }
    }
}

/// Parse a resolved address into [`ConnectionInfo`].
///
/// Addresses with `://` are Redis URLs (`tcp` and `tls` are accepted as
/// aliases of `redis` and `rediss`); anything else is `host[:port]`. Either
/// form falls back to `port` when it names none.
pub fn parse_address(address: &str, port: u16) -> Result<ConnectionInfo, Error> {
    let address = address.trim();
    if address.is_empty() {
        return Err(Error::Address(address.to_owned()));
    }

    let Some((scheme, rest)) = address.split_once("://") else {
        let (host, port) = split_port(address).unwrap_or((address, port));
        if host.is_empty() {
            return Err(Error::Address(address.to_owned()));
        }
        return Ok((host, port).into_connection_info()?);
    };

    let scheme = redis_scheme(scheme);
    if scheme.ends_with("unix") {
        return Ok(format!("{scheme}://{rest}").as_str().into_connection_info()?);
    }

    let (authority, tail) = rest.split_at(rest.find('/').unwrap_or(rest.len()));
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let url = if split_port(host).is_some() {
        format!("{scheme}://{rest}")
    } else {
        format!("{scheme}://{authority}:{port}{tail}")
    };
    Ok(url.as_str().into_connection_info()?)
}

/// Build a Redis URL for the pooled adapters, injecting `password` when the
/// address carries no credentials of its own.
pub fn redis_url(address: &str, password: Option<&str>) -> String {
    let (scheme, rest) = address.trim().split_once("://").unwrap_or(("redis", address.trim()));
    let scheme = redis_scheme(scheme);
    let authority = rest.split('/').next().unwrap_or_default();
    match password.filter(|password| !password.is_empty()) {
        Some(password) if !authority.contains('@') => {
            format!(
                "{scheme}://:{}@{rest}",
                utf8_percent_encode(password, USERINFO)
            )
        }
        _ => format!("{scheme}://{rest}"),
    }
}

fn redis_scheme(scheme: &str) -> &str {
    if scheme.eq_ignore_ascii_case("tcp") {
        "redis"
    } else if scheme.eq_ignore_ascii_case("tls") {
        "rediss"
    } else {
        scheme
    }
}

fn split_port(address: &str) -> Option<(&str, u16)> {
    let (host, port) = address.rsplit_once(':')?;
    let port = port.parse().ok()?;
    Some((host, port))
}
