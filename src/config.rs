//! Модуль конфигурации библиотеки karaoke-sync
//!
//! Этот модуль содержит структуры для настройки библиотеки.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Конфигурация библиотеки
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KaraokeSyncConfig {
    /// Базовый URL сервиса синтеза речи
    pub api_base_url: String,
    /// Голос по умолчанию
    pub default_voice: String,
    /// MIME-тип аудио, возвращаемого сервисом (контейнер определяет сервис,
    /// клиент не должен его жёстко задавать)
    pub audio_mime: String,
    /// Задержка дебаунса для определения языка
    #[serde(with = "duration_millis")]
    pub debounce: Duration,
    /// Таймаут HTTP запросов
    #[serde(with = "duration_millis")]
    pub request_timeout: Duration,
}

impl Default for KaraokeSyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            default_voice: "en-US-Wavenet-D".to_string(),
            audio_mime: "audio/mp3".to_string(),
            debounce: Duration::from_millis(800),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl KaraokeSyncConfig {
    /// Проверить конфигурацию перед использованием
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(crate::error::KaraokeSyncError::Configuration(
                "API base URL is required".to_string(),
            ));
        }
        if self.debounce.is_zero() {
            return Err(crate::error::KaraokeSyncError::Configuration(
                "Debounce delay must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Сериализация Duration в миллисекундах
mod duration_millis {
    use std::time::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(d)?;
        Ok(Duration::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KaraokeSyncConfig::default();
        assert_eq!(config.default_voice, "en-US-Wavenet-D");
        assert_eq!(config.audio_mime, "audio/mp3");
        assert_eq!(config.debounce, Duration::from_millis(800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let config = KaraokeSyncConfig {
            api_base_url: "  ".to_string(),
            ..KaraokeSyncConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = KaraokeSyncConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: KaraokeSyncConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.debounce, config.debounce);
        assert_eq!(parsed.api_base_url, config.api_base_url);
    }
}
