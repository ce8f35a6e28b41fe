pub mod drainer;
pub mod memory;
pub mod store;

pub use drainer::{Drain, MIN_WAIT_TIMEOUT, QueueDrainer};
pub use memory::MemoryStore;
pub use store::{ListStore, RedisStore};

use crate::error::{QueueError, QueueResult};
use serde::de::DeserializeOwned;
use std::fmt;

/// 队列键后缀，drain 与 publish 共用
pub const QUEUE_SUFFIX: &str = "product_info";

/// 由调用方提供的基础名称生成队列键：`<base>:product_info`
///
/// 空名称（或只有空白）在任何存储往返之前就会被拒绝。
pub fn queue_key(base: &str) -> QueueResult<String> {
    if base.trim().is_empty() {
        return Err(QueueError::invalid_argument(
            "queue name must not be empty",
        ));
    }
    Ok(format!("{}:{}", base, QUEUE_SUFFIX))
}

/// 队列中的一条记录。对队列本身是不透明的。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// UTF-8 文本，通常是 JSON
    Text(String),
    Bytes(Vec<u8>),
}

impl Item {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Item::Text(text),
            Err(e) => Item::Bytes(e.into_bytes()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Item::Text(text) => text.as_bytes(),
            Item::Bytes(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Item::Text(text) => text.into_bytes(),
            Item::Bytes(bytes) => bytes,
        }
    }

    pub fn encode<T: serde::Serialize + ?Sized>(value: &T) -> QueueResult<Self> {
        Ok(Item::Text(serde_json::to_string(value)?))
    }

    pub fn decode<T: DeserializeOwned>(&self) -> QueueResult<T> {
        Ok(serde_json::from_slice(self.as_bytes())?)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Text(text) => write!(f, "{}", text),
            Item::Bytes(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
        }
    }
}
