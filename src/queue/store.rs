use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::RedisConfig;
use crate::error::{QueueError, QueueResult};

/// 队列依赖的列表存储原语
#[async_trait]
pub trait ListStore: Send {
    /// 列表长度，不存在的键视为 0
    async fn len(&mut self, key: &str) -> QueueResult<u64>;

    /// 从头部弹出一个元素，列表为空时返回 `None`
    async fn pop_head(&mut self, key: &str) -> QueueResult<Option<Vec<u8>>>;

    /// 追加到尾部，返回追加后的长度
    async fn push_tail(&mut self, key: &str, value: Vec<u8>) -> QueueResult<u64>;

    /// 阻塞弹出，超时返回 `None`
    async fn pop_head_blocking(
        &mut self,
        key: &str,
        timeout: Duration,
    ) -> QueueResult<Option<Vec<u8>>>;

    async fn ping(&mut self) -> QueueResult<bool>;
}

/// Redis 列表存储。连接由持有者独占。
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(config: &RedisConfig) -> QueueResult<Self> {
        let url = config.url();
        let client = redis::Client::open(url.as_str())?;
        let conn = client.get_multiplexed_async_connection().await?;

        info!(host = %config.host, port = config.port, db = config.db, "Connected to Redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl ListStore for RedisStore {
    async fn len(&mut self, key: &str) -> QueueResult<u64> {
        let len: u64 = self.conn.llen(key).await?;
        debug!(key = %key, len = len, "LLEN");
        Ok(len)
    }

    async fn pop_head(&mut self, key: &str) -> QueueResult<Option<Vec<u8>>> {
        let value: Option<Vec<u8>> = self.conn.lpop(key, None).await?;
        debug!(key = %key, hit = value.is_some(), "LPOP");
        Ok(value)
    }

    async fn push_tail(&mut self, key: &str, value: Vec<u8>) -> QueueResult<u64> {
        let len: u64 = self.conn.rpush(key, value).await?;
        debug!(key = %key, len = len, "RPUSH");
        Ok(len)
    }

    async fn pop_head_blocking(
        &mut self,
        key: &str,
        timeout: Duration,
    ) -> QueueResult<Option<Vec<u8>>> {
        let reply: Option<(String, Vec<u8>)> = redis::cmd("BLPOP")
            .arg(key)
            .arg(timeout.as_secs_f64())
            .query_async(&mut self.conn)
            .await?;
        debug!(key = %key, hit = reply.is_some(), "BLPOP");
        Ok(reply.map(|(_, value)| value))
    }

    async fn ping(&mut self) -> QueueResult<bool> {
        let pong: String = redis::cmd("PING")
            .query_async(&mut self.conn)
            .await
            .map_err(QueueError::Connection)?;

        Ok(pong == "PONG")
    }
}
