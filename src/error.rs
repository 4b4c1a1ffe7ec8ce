//! Модуль обработки ошибок библиотеки karaoke-sync
//!
//! Этот модуль содержит типы ошибок, которые могут возникнуть при работе библиотеки.

use thiserror::Error;

/// Ошибки библиотеки karaoke-sync
#[derive(Debug, Error)]
pub enum KaraokeSyncError {
    /// Ошибка HTTP запроса
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ошибка синтеза речи (единственная ошибка, показываемая пользователю)
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Ошибка декодирования аудио-полезной нагрузки
    #[error("Audio payload error: {0}")]
    AudioPayload(String),

    /// Ошибка конфигурации
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Другая ошибка
    #[error("Other error: {0}")]
    Other(String),
}

impl From<&str> for KaraokeSyncError {
    fn from(s: &str) -> Self {
        KaraokeSyncError::Other(s.to_string())
    }
}

impl From<String> for KaraokeSyncError {
    fn from(s: String) -> Self {
        KaraokeSyncError::Other(s)
    }
}

/// Тип Result для библиотеки karaoke-sync
pub type Result<T> = std::result::Result<T, KaraokeSyncError>;
