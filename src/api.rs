//! Модуль для интеграции с HTTP сервисами чтения
//!
//! Этот модуль содержит клиент для сервиса синтеза речи, каталога голосов
//! и сервиса определения языка. Только путь синтеза возвращает ошибку
//! пользователю; каталог и определение языка деградируют молча.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::KaraokeSyncConfig;
use crate::error::{KaraokeSyncError, Result};
use crate::timepoint::Timepoint;

/// Тело запроса на синтез речи
#[derive(Debug, Clone, Serialize)]
pub struct SynthesizeRequest {
    /// Текст для озвучивания
    pub text: String,
    /// Идентификатор голоса
    pub voice_id: String,
}

/// Ответ сервиса синтеза речи
///
/// Поля `timepoints` и `disp_world_list` могут отсутствовать — тогда они
/// считаются пустыми списками, а не ошибкой. Имя `disp_world_list`
/// передаётся сервисом дословно.
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesizeResponse {
    /// Аудио в кодировке base64
    pub audio_base64: String,
    /// Временные метки слов
    #[serde(default)]
    pub timepoints: Vec<Timepoint>,
    /// Список отображаемых слов
    #[serde(default, rename = "disp_world_list")]
    pub words: Vec<String>,
}

/// Описание голоса из каталога
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Voice {
    /// Уникальный идентификатор голоса
    pub name: String,
    /// Пол голоса в терминах SSML
    pub ssml_gender: String,
}

/// Ответ сервиса определения языка
#[derive(Debug, Clone, Deserialize)]
pub struct DetectResponse {
    /// Рекомендованный голос (может отсутствовать)
    #[serde(default)]
    pub recommended_voice: Option<String>,
}

/// Интерфейс сервисов чтения
///
/// Трейт отделяет логику сессии от транспорта: в тестах его реализуют
/// заглушки без сети.
#[async_trait]
pub trait ReaderApi: Send + Sync {
    /// Синтезировать речь для текста выбранным голосом
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<SynthesizeResponse>;

    /// Получить каталог голосов; при сбое транспорта — пустой список
    async fn voices(&self) -> Vec<Voice>;

    /// Определить рекомендованный голос для текста; при сбое — None
    async fn detect_voice(&self, text: &str) -> Option<String>;
}

/// HTTP реализация ReaderApi поверх reqwest
pub struct HttpReaderApi {
    client: Client,
    base_url: String,
}

impl HttpReaderApi {
    /// Создать новый клиент по конфигурации
    pub fn new(config: &KaraokeSyncConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(KaraokeSyncError::Http)?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ReaderApi for HttpReaderApi {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<SynthesizeResponse> {
        let body = SynthesizeRequest {
            text: text.to_string(),
            voice_id: voice_id.to_string(),
        };

        log::info!("Sending synthesis request for text length {}", text.len());
        let response = self
            .client
            .post(self.url("/api/v1/synthesize"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = match response.text().await {
                Ok(text) => text,
                Err(e) => format!("Failed to read error response: {}", e),
            };
            log::error!("Synthesis request failed (status {}): {}", status, error_text);
            // Предпочитаем структурированное сообщение сервиса, иначе общее
            let detail = extract_detail(&error_text)
                .unwrap_or_else(|| format!("Synthesis service returned status {}", status));
            return Err(KaraokeSyncError::Synthesis(detail));
        }

        let parsed = response.json::<SynthesizeResponse>().await?;
        log::info!(
            "Synthesis response: {} words, {} timepoints",
            parsed.words.len(),
            parsed.timepoints.len()
        );
        Ok(parsed)
    }

    async fn voices(&self) -> Vec<Voice> {
        let response = self.client.get(self.url("/api/v1/voices")).send().await;

        match response {
            Ok(response) if response.status().is_success() => {
                match response.json::<Vec<Voice>>().await {
                    Ok(voices) => voices,
                    Err(e) => {
                        log::warn!("Failed to parse voice catalog: {}", e);
                        Vec::new()
                    }
                }
            }
            Ok(response) => {
                log::warn!("Voice catalog request failed with status {}", response.status());
                Vec::new()
            }
            Err(e) => {
                log::warn!("Voice catalog request failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn detect_voice(&self, text: &str) -> Option<String> {
        let response = self
            .client
            .post(self.url("/api/v1/detect"))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                match response.json::<DetectResponse>().await {
                    Ok(detect) => detect.recommended_voice,
                    Err(e) => {
                        log::warn!("Failed to parse detection response: {}", e);
                        None
                    }
                }
            }
            Ok(response) => {
                log::warn!("Detection request failed with status {}", response.status());
                None
            }
            Err(e) => {
                log::warn!("Detection request failed: {}", e);
                None
            }
        }
    }
}

/// Извлечь поле `detail` из тела ошибки сервиса
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(|d| d.as_str())
        .map(|d| d.to_string())
}
