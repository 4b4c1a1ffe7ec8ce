//! Основной файл библиотеки karaoke-sync
//!
//! Эта библиотека предоставляет движок синхронизации воспроизведения TTS
//! с подсветкой произносимого слова: отображение позиции воспроизведения
//! на индекс активного слова по временным меткам сервиса синтеза,
//! дебаунс-рекомендацию голоса по языку текста и управление состоянием
//! одной сессии синтеза.

pub mod api;
pub mod config;
pub mod error;
pub mod notification;
pub mod playback;
pub mod recommend;
pub mod session;
pub mod timepoint;

use std::sync::Arc;

use crate::api::{HttpReaderApi, ReaderApi, Voice};
use crate::config::KaraokeSyncConfig;
use crate::error::Result;
use crate::notification::HighlightObserver;
use crate::playback::{PlaybackBridge, PlaybackState};
use crate::recommend::VoiceRecommender;
use crate::session::SessionController;

pub use crate::error::KaraokeSyncError;
pub use crate::notification::HighlightEvent;
pub use crate::timepoint::{active_index_at, sanitize_timepoints, Timepoint, WordTimepoint};

/// Основная структура для работы с библиотекой
///
/// Связывает контроллер сессии, дебаунс-рекомендацию голоса и мост
/// воспроизведения вокруг одного состояния сессии. Каждый экземпляр —
/// независимая сессия: никакого глобального состояния.
pub struct KaraokeSync {
    /// Конфигурация библиотеки
    config: KaraokeSyncConfig,
    /// Контроллер сессии синтеза
    session: SessionController,
    /// Дебаунс-контроллер рекомендации голоса
    recommender: VoiceRecommender,
    /// Мост событий воспроизведения
    playback: PlaybackBridge,
}

impl KaraokeSync {
    /// Создать новый экземпляр KaraokeSync с указанной конфигурацией
    pub fn new(config: KaraokeSyncConfig) -> Result<Self> {
        config.validate()?;
        let api: Arc<dyn ReaderApi> = Arc::new(HttpReaderApi::new(&config)?);
        Ok(Self::with_api(config, api))
    }

    /// Создать экземпляр поверх готовой реализации сервисов чтения
    ///
    /// Используется в тестах и там, где транспорт не HTTP.
    pub fn with_api(config: KaraokeSyncConfig, api: Arc<dyn ReaderApi>) -> Self {
        let session = SessionController::new(
            api.clone(),
            config.default_voice.clone(),
            config.audio_mime.clone(),
        );
        let recommender = VoiceRecommender::new(
            api,
            session.state(),
            session.voices(),
            config.debounce,
        );
        let playback = PlaybackBridge::new(session.state());

        Self {
            config,
            session,
            recommender,
            playback,
        }
    }

    /// Создать экземпляр с настройками по умолчанию
    pub fn default_instance() -> Result<Self> {
        Self::new(KaraokeSyncConfig::default())
    }

    /// Конфигурация экземпляра
    pub fn config(&self) -> &KaraokeSyncConfig {
        &self.config
    }

    /// Добавить наблюдателя подсветки для слоя отрисовки
    pub fn add_observer(&self, observer: Box<dyn HighlightObserver>) -> usize {
        self.playback.add_observer(observer)
    }

    /// Удалить наблюдателя подсветки
    pub fn remove_observer(&self, id: usize) -> Option<Box<dyn HighlightObserver>> {
        self.playback.remove_observer(id)
    }

    /// Загрузить каталог голосов; при сбое транспорта каталог пуст
    pub async fn refresh_voices(&self) {
        self.session.refresh_voices().await;
    }

    /// Текущий каталог голосов
    pub fn voices(&self) -> Vec<Voice> {
        self.session.voices().read().unwrap().clone()
    }

    /// Сообщить об изменении текста (запускает дебаунс-рекомендацию голоса)
    pub fn text_changed(&self, text: impl Into<String>) {
        self.recommender.text_changed(text);
    }

    /// Установить голос явно (выбор пользователя)
    pub fn set_selected_voice(&self, voice: impl Into<String>) {
        self.session.set_selected_voice(voice);
    }

    /// Текущий выбранный голос
    pub fn selected_voice(&self) -> String {
        self.session.selected_voice()
    }

    /// Выполнить синтез для текста выбранным голосом
    ///
    /// Пустой текст и повторный вызов во время загрузки — тихие no-op.
    /// При успехе машина воспроизведения переходит в Ready, при ошибке —
    /// обратно в Idle, а ошибка возвращается вызывающему ровно один раз.
    pub async fn synthesize(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        if self.session.is_loading() {
            return Ok(());
        }

        self.playback.mark_loading();

        match self.session.synthesize(text).await {
            Ok(()) => {
                self.playback.mark_ready();
                Ok(())
            }
            Err(e) => {
                self.playback.mark_idle();
                Err(e)
            }
        }
    }

    /// data-URI аудио для непрозрачного элемента воспроизведения
    pub fn audio_data_uri(&self) -> Option<String> {
        self.session.audio_data_uri()
    }

    /// Уведомление о позиции воспроизведения от аудиоэлемента
    pub fn on_time_update(&self, seconds: f64) {
        self.playback.on_time_update(seconds);
    }

    /// Уведомление о начале воспроизведения
    pub fn on_play(&self) {
        self.playback.on_play();
    }

    /// Уведомление о паузе
    pub fn on_pause(&self) {
        self.playback.on_pause();
    }

    /// Текущее состояние воспроизведения
    pub fn playback_state(&self) -> PlaybackState {
        self.playback.playback_state()
    }

    /// Индекс активного слова; None — ни одно слово не активно
    pub fn active_word_index(&self) -> Option<usize> {
        self.session.state().read().unwrap().active_word_index
    }

    /// Список отображаемых слов текущей сессии
    pub fn words(&self) -> Vec<String> {
        self.session.state().read().unwrap().words.clone()
    }

    /// Остановить фоновую работу (отложенные таймеры рекомендации)
    pub fn shutdown(&self) {
        self.recommender.shutdown();
    }
}

/// Публичный API для удобного использования: создать сессию, загрузить
/// каталог голосов и выполнить синтез одним вызовом
pub async fn read_aloud(config: KaraokeSyncConfig, text: &str) -> Result<KaraokeSync> {
    let engine = KaraokeSync::new(config)?;
    engine.refresh_voices().await;
    engine.synthesize(text).await?;
    Ok(engine)
}

/// Публичный API с подпиской наблюдателя подсветки
pub async fn read_aloud_with_observer(
    config: KaraokeSyncConfig,
    text: &str,
    observer: Box<dyn HighlightObserver>,
) -> Result<KaraokeSync> {
    let engine = KaraokeSync::new(config)?;
    engine.add_observer(observer);
    engine.refresh_voices().await;
    engine.synthesize(text).await?;
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SynthesizeResponse;
    use crate::notification::MemoryHighlightObserver;
    use crate::timepoint::Timepoint;
    use async_trait::async_trait;

    /// Заглушка полного сервиса чтения для сквозных тестов
    struct FakeReaderApi {
        fail_synthesis: bool,
    }

    #[async_trait]
    impl ReaderApi for FakeReaderApi {
        async fn synthesize(
            &self,
            _text: &str,
            _voice_id: &str,
        ) -> Result<SynthesizeResponse> {
            if self.fail_synthesis {
                return Err(KaraokeSyncError::Synthesis(
                    "Synthesis backend unavailable".to_string(),
                ));
            }
            Ok(SynthesizeResponse {
                // "X" в base64
                audio_base64: "WA==".to_string(),
                timepoints: vec![
                    Timepoint {
                        mark_name: "0".to_string(),
                        time_seconds: 0.1,
                    },
                    Timepoint {
                        mark_name: "1".to_string(),
                        time_seconds: 0.5,
                    },
                ],
                words: vec!["Hello".to_string(), "World".to_string()],
            })
        }

        async fn voices(&self) -> Vec<Voice> {
            vec![Voice {
                name: "en-US-Wavenet-D".to_string(),
                ssml_gender: "MALE".to_string(),
            }]
        }

        async fn detect_voice(&self, _text: &str) -> Option<String> {
            None
        }
    }

    fn engine(fail: bool) -> KaraokeSync {
        KaraokeSync::with_api(
            KaraokeSyncConfig::default(),
            Arc::new(FakeReaderApi {
                fail_synthesis: fail,
            }),
        )
    }

    #[tokio::test]
    async fn test_end_to_end_hello_world() {
        let engine = engine(false);
        let observer = MemoryHighlightObserver::new();
        engine.add_observer(Box::new(observer.clone()));

        engine.refresh_voices().await;
        engine.synthesize("Hello World").await.unwrap();

        assert_eq!(engine.words(), vec!["Hello", "World"]);
        assert_eq!(engine.playback_state(), PlaybackState::Ready);
        assert!(engine.audio_data_uri().unwrap().starts_with("data:audio/mp3;base64,"));

        engine.on_play();
        assert_eq!(engine.playback_state(), PlaybackState::Playing);

        engine.on_time_update(0.2);
        assert_eq!(engine.active_word_index(), Some(0));

        engine.on_time_update(0.6);
        assert_eq!(engine.active_word_index(), Some(1));

        let history = observer.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].word.as_deref(), Some("Hello"));
        assert_eq!(history[1].word.as_deref(), Some("World"));
    }

    #[tokio::test]
    async fn test_failed_synthesis_surfaces_single_error() {
        let engine = engine(true);

        let err = engine.synthesize("Hello").await.unwrap_err();
        assert!(err.to_string().contains("Synthesis backend unavailable"));

        assert!(engine.words().is_empty());
        assert!(engine.audio_data_uri().is_none());
        assert_eq!(engine.active_word_index(), None);
        assert_eq!(engine.playback_state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_empty_text_keeps_state_machine_idle() {
        let engine = engine(false);

        engine.synthesize("   ").await.unwrap();

        assert_eq!(engine.playback_state(), PlaybackState::Idle);
        assert!(engine.words().is_empty());
    }

    #[tokio::test]
    async fn test_new_synthesis_resets_playback_to_loading_then_ready() {
        let engine = engine(false);

        engine.synthesize("Hello World").await.unwrap();
        engine.on_play();
        engine.on_time_update(0.6);
        assert_eq!(engine.active_word_index(), Some(1));

        // Новый запрос: активный индекс сброшен, машина снова Ready
        engine.synthesize("Hello World").await.unwrap();
        assert_eq!(engine.active_word_index(), None);
        assert_eq!(engine.playback_state(), PlaybackState::Ready);
    }

    #[tokio::test]
    async fn test_voice_catalog_exposed() {
        let engine = engine(false);
        engine.refresh_voices().await;

        let voices = engine.voices();
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].name, "en-US-Wavenet-D");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = KaraokeSyncConfig {
            api_base_url: String::new(),
            ..KaraokeSyncConfig::default()
        };
        assert!(KaraokeSync::new(config).is_err());
    }
}
