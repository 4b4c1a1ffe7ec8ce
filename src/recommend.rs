//! Модуль дебаунс-контроллера рекомендации голоса
//!
//! Этот модуль откладывает обращение к сервису определения языка, пока
//! пользователь печатает: каждое изменение текста перезапускает таймер,
//! и запрос уходит только после паузы во вводе. Рекомендация применяется
//! лишь тогда, когда рекомендованный голос есть в уже загруженном каталоге.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::api::{ReaderApi, Voice};
use crate::session::SessionState;

/// Дебаунс-контроллер рекомендации голоса
///
/// На каждое изменение текста перезапускает таймер фиксированной задержки;
/// одновременно ожидает не более одного таймера. Остановка (`shutdown` или
/// Drop) гарантирует, что отложенная задача не сработает после демонтажа.
pub struct VoiceRecommender {
    api: Arc<dyn ReaderApi>,
    state: Arc<RwLock<SessionState>>,
    voices: Arc<RwLock<Vec<Voice>>>,
    debounce: Duration,
    /// Счётчик поколений: более позднее изменение текста обесценивает и
    /// таймер, и ещё не применённый результат более раннего
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl VoiceRecommender {
    /// Создать новый контроллер
    pub fn new(
        api: Arc<dyn ReaderApi>,
        state: Arc<RwLock<SessionState>>,
        voices: Arc<RwLock<Vec<Voice>>>,
        debounce: Duration,
    ) -> Self {
        Self {
            api,
            state,
            voices,
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    /// Сообщить об изменении текста
    ///
    /// Перезапускает таймер задержки. Когда таймер срабатывает без перебоя
    /// и длина текста (после обрезки пробелов) больше одного символа,
    /// выполняется ровно один запрос определения языка.
    pub fn text_changed(&self, text: impl Into<String>) {
        let text = text.into();
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let api = self.api.clone();
        let state = self.state.clone();
        let voices = self.voices.clone();
        let generation = self.generation.clone();
        let debounce = self.debounce;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            if generation.load(Ordering::SeqCst) != my_generation {
                return;
            }
            if text.trim().chars().count() <= 1 {
                return;
            }

            let recommended = api.detect_voice(&text).await;

            // Текст мог измениться, пока запрос был в полёте
            if generation.load(Ordering::SeqCst) != my_generation {
                return;
            }

            let Some(recommended) = recommended else {
                return;
            };

            let known = {
                let voices = voices.read().unwrap();
                voices.iter().any(|v| v.name == recommended)
            };

            if known {
                log::info!("Applying recommended voice: {}", recommended);
                let mut state = state.write().unwrap();
                state.selected_voice = recommended;
            } else {
                // Каталог ещё не загружен или не содержит рекомендацию
                log::debug!(
                    "Recommended voice {} not in catalog, keeping current selection",
                    recommended
                );
            }
        });

        let mut pending = self.pending.lock().unwrap();
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Остановить контроллер: отложенный таймер никогда не сработает
    pub fn shutdown(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut pending = self.pending.lock().unwrap();
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }
}

impl Drop for VoiceRecommender {
    fn drop(&mut self) {
        self.shutdown();
    }
}
