use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Store rejected write: {message}")]
    Rejected { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type QueueResult<T> = Result<T, QueueError>;

// 便捷的错误创建函数
impl QueueError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// 连接类错误：对当前会话是致命的
    pub fn is_connection(&self) -> bool {
        matches!(self, QueueError::Connection(_) | QueueError::Rejected { .. })
    }
}
