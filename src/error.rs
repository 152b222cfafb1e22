//! 错误类型

use thiserror::Error;

/// 报表端操作失败 (在派发线程内记录后丢弃)
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("invalid range reference {0:?}")]
    InvalidRange(String),

    #[error("http request failed: {0}")]
    Http(String),

    #[error("unexpected response: {0}")]
    Response(String),

    #[error("no data found in {0}")]
    Empty(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 检测输入错误
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("read failed: {0}")]
    Read(#[from] std::io::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
