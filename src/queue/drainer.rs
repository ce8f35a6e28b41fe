use futures::Stream;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::store::{ListStore, RedisStore};
use super::{Item, queue_key};
use crate::config::RedisConfig;
use crate::error::{QueueError, QueueResult};

/// 阻塞弹出允许的最小超时
pub const MIN_WAIT_TIMEOUT: Duration = Duration::from_millis(1);

/// 持有一个独占的存储连接，提供队列的 drain 与 publish。
///
/// 所有操作都接收调用方的基础名称，并通过 [`queue_key`] 统一加上
/// `:product_info` 后缀。连接在 `close` 或 drop 时释放。
pub struct QueueDrainer<S: ListStore = RedisStore> {
    store: S,
}

impl QueueDrainer<RedisStore> {
    /// 连接到 `address:port` 上的 Redis
    pub async fn connect(address: &str, port: u16) -> QueueResult<Self> {
        Self::connect_with(&RedisConfig::new(address, port)).await
    }

    pub async fn connect_with(config: &RedisConfig) -> QueueResult<Self> {
        let store = RedisStore::connect(config).await?;
        Ok(Self::new(store))
    }
}

impl<S: ListStore> QueueDrainer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 开始 drain 一个队列。
    ///
    /// 返回的游标由调用方逐个拉取，每次 `next` 做一次“查长度再弹出”。
    /// 名称为空时在任何往返之前返回 `InvalidArgument`。
    pub fn drain(&mut self, name: &str) -> QueueResult<Drain<'_, S>> {
        let key = queue_key(name).inspect_err(|e| {
            warn!(name = %name, error = %e, "Refusing to drain queue");
        })?;

        debug!(key = %key, "Starting drain");
        Ok(Drain {
            store: &mut self.store,
            key,
            finished: false,
            yielded: 0,
        })
    }

    /// 序列化 `item` 并追加到队列尾部，返回追加后的队列长度。
    pub async fn publish<T>(&mut self, item: &T, name: &str) -> QueueResult<u64>
    where
        T: Serialize + ?Sized,
    {
        let key = queue_key(name)?;
        let item = Item::encode(item)?;
        self.push(&key, item.into_bytes()).await
    }

    /// 追加一条已编码的记录
    pub async fn publish_raw(&mut self, item: &Item, name: &str) -> QueueResult<u64> {
        let key = queue_key(name)?;
        self.push(&key, item.as_bytes().to_vec()).await
    }

    pub async fn len(&mut self, name: &str) -> QueueResult<u64> {
        let key = queue_key(name)?;
        self.store.len(&key).await
    }

    /// 阻塞等待一条记录，超时返回 `None`
    pub async fn pop_wait(&mut self, name: &str, timeout: Duration) -> QueueResult<Option<Item>> {
        let key = queue_key(name)?;
        // Redis 按毫秒截断超时，截断为 0 即永久阻塞
        if timeout < MIN_WAIT_TIMEOUT {
            return Err(QueueError::invalid_argument("wait timeout must be at least 1ms"));
        }

        let value = self.store.pop_head_blocking(&key, timeout).await?;
        Ok(value.map(Item::from_bytes))
    }

    pub async fn ping(&mut self) -> QueueResult<bool> {
        self.store.ping().await
    }

    /// 释放连接
    pub fn close(self) {
        info!("Closing queue connection");
        drop(self.store);
    }

    async fn push(&mut self, key: &str, value: Vec<u8>) -> QueueResult<u64> {
        let len = self.store.push_tail(key, value).await?;
        if len == 0 {
            return Err(QueueError::rejected(format!(
                "push to {} reported an empty list",
                key
            )));
        }
        Ok(len)
    }
}

/// 按需拉取的 drain 游标。
///
/// 每次 [`Drain::next`] 先查询列表长度，为 0 则结束，否则从头部弹出一个元素。
/// 查长度与弹出是两次独立的往返，不是原子操作：两者之间其他生产者或消费者
/// 可能修改同一个列表。因此长度检查通过后弹出仍可能拿到空值，这种情况
/// 直接视为序列结束，不会产出空记录。多个游标并发 drain 同一个队列时，
/// 记录在它们之间任意分配，但每次弹出在存储端是原子的，不会重复也不会丢失。
///
/// 只有在写入方停止后才能保证 drain 结束。游标结束后（列表为空、弹出空值
/// 或出错）再调用 `next` 不会访问存储。
pub struct Drain<'a, S: ListStore> {
    store: &'a mut S,
    key: String,
    finished: bool,
    yielded: usize,
}

impl<'a, S: ListStore> Drain<'a, S> {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 已产出的记录数
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 拉取下一条记录，`Ok(None)` 表示序列结束。
    ///
    /// 出错时序列随之结束，已产出的记录不受影响。
    pub async fn next(&mut self) -> QueueResult<Option<Item>> {
        if self.finished {
            return Ok(None);
        }

        match self.step().await {
            Ok(Some(item)) => {
                self.yielded += 1;
                Ok(Some(item))
            }
            Ok(None) => {
                self.finished = true;
                debug!(key = %self.key, yielded = self.yielded, "Drain finished");
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                warn!(key = %self.key, yielded = self.yielded, error = %e, "Drain aborted");
                Err(e)
            }
        }
    }

    async fn step(&mut self) -> QueueResult<Option<Item>> {
        if self.store.len(&self.key).await? == 0 {
            return Ok(None);
        }

        // check-then-act: 长度检查之后列表可能已被其他消费者清空
        match self.store.pop_head(&self.key).await? {
            Some(value) => Ok(Some(Item::from_bytes(value))),
            None => {
                debug!(key = %self.key, "Pop returned nothing after length check");
                Ok(None)
            }
        }
    }

    /// 拉取剩余的全部记录
    pub async fn collect_all(mut self) -> QueueResult<Vec<Item>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// 转换为 `Stream`，出错的那一项之后流结束
    pub fn into_stream(self) -> impl Stream<Item = QueueResult<Item>> + 'a
    where
        S: 'a,
    {
        futures::stream::unfold(self, |mut drain| async move {
            match drain.next().await {
                Ok(Some(item)) => Some((Ok(item), drain)),
                Ok(None) => None,
                Err(e) => Some((Err(e), drain)),
            }
        })
    }
}
