//! Модуль контроллера сессии синтеза
//!
//! Этот модуль содержит состояние одного цикла "текст → аудио + слова +
//! временные метки" и контроллер, который им владеет. Состояние очищается
//! перед каждым новым запросом, чтобы медленный ответ никогда не смешивался
//! с устаревшими результатами на экране.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use base64::Engine;

use crate::api::{ReaderApi, Voice};
use crate::error::{KaraokeSyncError, Result};
use crate::timepoint::{sanitize_timepoints, WordTimepoint};

/// Состояние сессии синтеза
///
/// Владелец — SessionController; мост воспроизведения получает разделяемый
/// дескриптор и изменяет только `active_word_index`.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Декодированное аудио последнего успешного синтеза
    pub audio: Option<Vec<u8>>,
    /// Список отображаемых слов
    pub words: Vec<String>,
    /// Проверенные временные метки слов
    pub timepoints: Vec<WordTimepoint>,
    /// Индекс активного слова; None — ни одно слово не активно
    pub active_word_index: Option<usize>,
    /// Выбранный голос
    pub selected_voice: String,
    /// Признак выполняющегося запроса синтеза
    pub is_loading: bool,
}

/// Контроллер сессии синтеза
pub struct SessionController {
    api: Arc<dyn ReaderApi>,
    state: Arc<RwLock<SessionState>>,
    voices: Arc<RwLock<Vec<Voice>>>,
    /// Счётчик поколений запросов: результат применяется только если за время
    /// запроса не стартовал более новый
    generation: Arc<AtomicU64>,
    audio_mime: String,
}

impl SessionController {
    /// Создать новый контроллер сессии
    pub fn new(api: Arc<dyn ReaderApi>, default_voice: String, audio_mime: String) -> Self {
        let state = SessionState {
            selected_voice: default_voice,
            ..SessionState::default()
        };

        Self {
            api,
            state: Arc::new(RwLock::new(state)),
            voices: Arc::new(RwLock::new(Vec::new())),
            generation: Arc::new(AtomicU64::new(0)),
            audio_mime,
        }
    }

    /// Получить разделяемый дескриптор состояния сессии
    pub fn state(&self) -> Arc<RwLock<SessionState>> {
        self.state.clone()
    }

    /// Получить разделяемый дескриптор каталога голосов
    pub fn voices(&self) -> Arc<RwLock<Vec<Voice>>> {
        self.voices.clone()
    }

    /// Выполнить один цикл синтеза для текста
    ///
    /// Пустой текст — тихий no-op. Повторный вызов во время выполняющегося
    /// запроса — тоже no-op (кнопка в эталонном поведении заблокирована на
    /// время загрузки). Ошибка синтеза — единственная ошибка, которую видит
    /// пользователь; состояние при этом остаётся очищенным.
    pub async fn synthesize(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            log::debug!("Ignoring synthesis request for empty text");
            return Ok(());
        }

        let voice = {
            let mut state = self.state.write().unwrap();
            if state.is_loading {
                log::warn!("Synthesis request ignored: another request is in flight");
                return Ok(());
            }
            // Очищаем прежние результаты до отправки запроса
            state.audio = None;
            state.words.clear();
            state.timepoints.clear();
            state.active_word_index = None;
            state.is_loading = true;
            state.selected_voice.clone()
        };

        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let outcome = self.api.synthesize(text, &voice).await;

        if self.generation.load(Ordering::SeqCst) != my_generation {
            // За время запроса стартовал более новый: его результат главнее
            log::warn!("Discarding superseded synthesis response");
            return Ok(());
        }

        match outcome {
            Ok(response) => {
                let audio = base64::engine::general_purpose::STANDARD
                    .decode(response.audio_base64.as_bytes())
                    .map_err(|e| {
                        let mut state = self.state.write().unwrap();
                        state.is_loading = false;
                        KaraokeSyncError::AudioPayload(format!(
                            "Failed to decode audio payload: {}",
                            e
                        ))
                    })?;

                let timepoints = sanitize_timepoints(&response.timepoints);

                let mut state = self.state.write().unwrap();
                state.audio = Some(audio);
                state.words = response.words;
                state.timepoints = timepoints;
                state.active_word_index = None;
                state.is_loading = false;

                log::info!(
                    "Synthesis session ready: {} words, {} timepoints",
                    state.words.len(),
                    state.timepoints.len()
                );
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.write().unwrap();
                state.is_loading = false;
                log::error!("Synthesis failed: {}", e);
                Err(e)
            }
        }
    }

    /// Обновить каталог голосов; при сбое транспорта каталог пуст
    pub async fn refresh_voices(&self) {
        let catalog = self.api.voices().await;
        log::info!("Voice catalog refreshed: {} voice(s)", catalog.len());
        let mut voices = self.voices.write().unwrap();
        *voices = catalog;
    }

    /// Установить выбранный голос
    pub fn set_selected_voice(&self, voice: impl Into<String>) {
        let mut state = self.state.write().unwrap();
        state.selected_voice = voice.into();
    }

    /// Получить выбранный голос
    pub fn selected_voice(&self) -> String {
        self.state.read().unwrap().selected_voice.clone()
    }

    /// Признак выполняющегося запроса
    pub fn is_loading(&self) -> bool {
        self.state.read().unwrap().is_loading
    }

    /// Собрать data-URI для непрозрачного элемента воспроизведения
    ///
    /// MIME-тип контейнера задаётся конфигурацией, а не кодом: сервис уже
    /// менял формат один раз.
    pub fn audio_data_uri(&self) -> Option<String> {
        let state = self.state.read().unwrap();
        state.audio.as_ref().map(|bytes| {
            format!(
                "data:{};base64,{}",
                self.audio_mime,
                base64::engine::general_purpose::STANDARD.encode(bytes)
            )
        })
    }
}
