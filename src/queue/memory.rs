use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use super::store::ListStore;
use crate::error::{QueueError, QueueResult};

#[derive(Default)]
struct Shared {
    lists: Mutex<HashMap<String, VecDeque<Vec<u8>>>>,
    pushed: Notify,
    round_trips: AtomicUsize,
    offline: AtomicBool,
}

/// 进程内的列表存储，语义与 Redis 列表一致。
///
/// 克隆出的句柄共享同一份数据，可以模拟多个独立进程访问同一个队列。
/// 每个操作在拿锁前都会让出一次调度，以便并发的 drain 真正交错执行。
#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已执行的存储往返次数
    pub fn round_trips(&self) -> usize {
        self.shared.round_trips.load(Ordering::SeqCst)
    }

    /// 模拟存储不可达，之后的每个操作都返回连接错误
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.store(offline, Ordering::SeqCst);
    }

    /// 不计入往返次数地查看列表内容
    pub async fn snapshot(&self, key: &str) -> Vec<Vec<u8>> {
        let lists = self.shared.lists.lock().await;
        lists
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn round_trip(&self) -> QueueResult<()> {
        tokio::task::yield_now().await;
        self.shared.round_trips.fetch_add(1, Ordering::SeqCst);

        if self.shared.offline.load(Ordering::SeqCst) {
            return Err(QueueError::Connection(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "memory store offline",
            ))));
        }
        Ok(())
    }

    async fn try_pop(&self, key: &str) -> Option<Vec<u8>> {
        let mut lists = self.shared.lists.lock().await;
        let list = lists.get_mut(key)?;
        let value = list.pop_front();
        // 空列表不再存在
        if list.is_empty() {
            lists.remove(key);
        }
        value
    }
}

#[async_trait]
impl ListStore for MemoryStore {
    async fn len(&mut self, key: &str) -> QueueResult<u64> {
        self.round_trip().await?;
        let lists = self.shared.lists.lock().await;
        Ok(lists.get(key).map_or(0, |list| list.len() as u64))
    }

    async fn pop_head(&mut self, key: &str) -> QueueResult<Option<Vec<u8>>> {
        self.round_trip().await?;
        Ok(self.try_pop(key).await)
    }

    async fn push_tail(&mut self, key: &str, value: Vec<u8>) -> QueueResult<u64> {
        self.round_trip().await?;
        let len = {
            let mut lists = self.shared.lists.lock().await;
            let list = lists.entry(key.to_string()).or_default();
            list.push_back(value);
            list.len() as u64
        };
        self.shared.pushed.notify_waiters();
        Ok(len)
    }

    async fn pop_head_blocking(
        &mut self,
        key: &str,
        timeout: Duration,
    ) -> QueueResult<Option<Vec<u8>>> {
        self.round_trip().await?;
        let deadline = Instant::now() + timeout;

        loop {
            let notified = self.shared.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(value) = self.try_pop(key).await {
                return Ok(Some(value));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn ping(&mut self) -> QueueResult<bool> {
        self.round_trip().await?;
        Ok(true)
    }
}
