//! Redis commands issued by every adapter, generic over the connection type.

use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;

use redcache_backend::DeleteStatus;
use redis::{RedisResult, aio::ConnectionLike};

use crate::error::Error;

/// `options.prefix`, applied as `{prefix}:{key}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct KeyPrefix(Option<String>);

impl KeyPrefix {
    pub(crate) fn new(prefix: Option<&str>) -> Self {
        Self(prefix.map(str::to_owned))
    }

    pub(crate) fn apply<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match &self.0 {
            Some(prefix) => Cow::Owned(format!("{prefix}:{key}")),
            None => Cow::Borrowed(key),
        }
    }
}

pub(crate) async fn ping<C: ConnectionLike + Send>(con: &mut C) -> RedisResult<()> {
    let _: String = redis::cmd("PING").query_async(con).await?;
    Ok(())
}

pub(crate) async fn get<C: ConnectionLike + Send>(
    con: &mut C,
    key: &str,
) -> RedisResult<Option<Vec<u8>>> {
    redis::cmd("GET").arg(key).query_async(con).await
}

/// `SET key value`, with `PX ms` only when a TTL is given.
pub(crate) async fn set<C: ConnectionLike + Send>(
    con: &mut C,
    key: &str,
    value: &[u8],
    ttl: Option<Duration>,
) -> RedisResult<()> {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value);
    if let Some(ttl) = ttl {
        cmd.arg("PX").arg(px_millis(ttl));
    }
    cmd.query_async(con).await
}

/// Redis adds the current time to `PX` and rejects sums past `i64::MAX`.
const MAX_PX_MILLIS: u64 = (i64::MAX / 2) as u64;

/// `PX` argument for `ttl`. `PX` rejects 0, so sub-millisecond TTLs round up.
fn px_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis())
        .unwrap_or(MAX_PX_MILLIS)
        .clamp(1, MAX_PX_MILLIS)
}

pub(crate) async fn incr_by<C: ConnectionLike + Send>(
    con: &mut C,
    key: &str,
    delta: i64,
) -> RedisResult<i64> {
    redis::cmd("INCRBY").arg(key).arg(delta).query_async(con).await
}

pub(crate) async fn decr_by<C: ConnectionLike + Send>(
    con: &mut C,
    key: &str,
    delta: i64,
) -> RedisResult<i64> {
    redis::cmd("DECRBY").arg(key).arg(delta).query_async(con).await
}

pub(crate) async fn del<C: ConnectionLike + Send>(
    con: &mut C,
    key: &str,
) -> RedisResult<DeleteStatus> {
    let deleted: u32 = redis::cmd("DEL").arg(key).query_async(con).await?;
    Ok(if deleted > 0 {
        DeleteStatus::Deleted(deleted)
    } else {
        DeleteStatus::Missing
    })
}

/// Run a command future, failing with [`Error::Timeout`] after `limit`.
pub(crate) async fn within<T, F>(limit: Option<Duration>, command: F) -> Result<T, Error>
where
    F: Future<Output = RedisResult<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, command)
            .await
            .map_err(|_| Error::Timeout(limit))?
            .map_err(Error::from),
        None => command.await.map_err(Error::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_joined_with_colon() {
        assert_eq!(KeyPrefix::new(Some("shop")).apply("cart:1"), "shop:cart:1");
        assert_eq!(KeyPrefix::new(None).apply("cart:1"), "cart:1");
    }

    #[test]
    fn px_millis_stays_in_range() {
        assert_eq!(px_millis(Duration::from_micros(10)), 1);
        assert_eq!(px_millis(Duration::from_secs(2)), 2_000);
        assert_eq!(px_millis(Duration::from_secs(u64::MAX)), MAX_PX_MILLIS);
        assert!(px_millis(Duration::MAX) <= i64::MAX as u64);
    }

    #[tokio::test(start_paused = true)]
    async fn within_times_out_slow_commands() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, redis::RedisError>(1)
        };
        let result = within(Some(Duration::from_secs(1)), slow).await;
        assert!(matches!(result, Err(Error::Timeout(limit)) if limit == Duration::from_secs(1)));

        let fast = async { Ok::<_, redis::RedisError>(2) };
        assert_eq!(within(Some(Duration::from_secs(1)), fast).await.unwrap(), 2);
        assert_eq!(within(None, async { Ok(3) }).await.unwrap(), 3);
    }
}
