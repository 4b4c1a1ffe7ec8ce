//! Модуль моста событий воспроизведения
//!
//! Этот модуль соединяет уведомления непрозрачного аудиоэлемента о позиции
//! воспроизведения с индексом временных меток и рассылает слою отрисовки
//! события смены активного слова — только при фактическом изменении индекса.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::notification::{HighlightEvent, HighlightObserver};
use crate::session::SessionState;
use crate::timepoint::active_index_at;

/// Состояние воспроизведения
///
/// `Idle → Loading → Ready → Playing ⇄ Paused`; любой новый запрос синтеза
/// возвращает машину в `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Начальное состояние до первого запроса
    Idle,
    /// Запрос синтеза выполняется
    Loading,
    /// Аудио получено, воспроизведение не начато
    Ready,
    /// Воспроизведение идёт
    Playing,
    /// Воспроизведение приостановлено
    Paused,
}

impl PlaybackState {
    /// Получить название состояния в виде строки
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Playing => "playing",
            Self::Paused => "paused",
        }
    }
}

/// Мост между аудиоэлементом и подсветкой слов
pub struct PlaybackBridge {
    session: Arc<RwLock<SessionState>>,
    playback_state: RwLock<PlaybackState>,
    /// Список наблюдателей подсветки
    observers: RwLock<HashMap<usize, Box<dyn HighlightObserver>>>,
    /// Счётчик для генерации идентификаторов наблюдателей
    next_id: AtomicUsize,
}

impl PlaybackBridge {
    /// Создать новый мост для дескриптора состояния сессии
    pub fn new(session: Arc<RwLock<SessionState>>) -> Self {
        Self {
            session,
            playback_state: RwLock::new(PlaybackState::Idle),
            observers: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Добавить наблюдателя подсветки
    ///
    /// Возвращает идентификатор, по которому наблюдателя можно удалить.
    pub fn add_observer(&self, observer: Box<dyn HighlightObserver>) -> usize {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut observers = self.observers.write().unwrap();
        observers.insert(id, observer);
        id
    }

    /// Удалить наблюдателя по идентификатору
    pub fn remove_observer(&self, id: usize) -> Option<Box<dyn HighlightObserver>> {
        let mut observers = self.observers.write().unwrap();
        observers.remove(&id)
    }

    /// Обработать уведомление о позиции воспроизведения
    ///
    /// Вычисляет индекс активного слова и уведомляет наблюдателей только
    /// при его изменении, чтобы не гонять лишние перерисовки. При пустом
    /// списке меток ничего не делает.
    pub fn on_time_update(&self, seconds: f64) {
        let event = {
            let mut session = self.session.write().unwrap();
            if session.timepoints.is_empty() {
                return;
            }

            let new_index = active_index_at(seconds, &session.timepoints);
            if new_index == session.active_word_index {
                return;
            }

            session.active_word_index = new_index;
            HighlightEvent {
                word_index: new_index,
                word: new_index.and_then(|i| session.words.get(i).cloned()),
                seconds,
            }
        };

        log::debug!(
            "Active word changed to {:?} at {:.2}s",
            event.word_index,
            seconds
        );
        let observers = self.observers.read().unwrap();
        for observer in observers.values() {
            observer.on_highlight_change(event.clone());
        }
    }

    /// Уведомление о начале воспроизведения
    pub fn on_play(&self) {
        self.transition(PlaybackState::Playing);
    }

    /// Уведомление о паузе
    pub fn on_pause(&self) {
        self.transition(PlaybackState::Paused);
    }

    /// Новый запрос синтеза: машина возвращается в Loading из любого состояния
    pub fn mark_loading(&self) {
        self.transition(PlaybackState::Loading);
    }

    /// Аудио получено и передано элементу воспроизведения
    pub fn mark_ready(&self) {
        self.transition(PlaybackState::Ready);
    }

    /// Запрос синтеза завершился ошибкой: воспроизводить нечего
    pub fn mark_idle(&self) {
        self.transition(PlaybackState::Idle);
    }

    /// Текущее состояние воспроизведения
    pub fn playback_state(&self) -> PlaybackState {
        *self.playback_state.read().unwrap()
    }

    /// Идёт ли воспроизведение (чисто информационный флаг)
    pub fn is_playing(&self) -> bool {
        self.playback_state() == PlaybackState::Playing
    }

    fn transition(&self, to: PlaybackState) {
        let mut state = self.playback_state.write().unwrap();
        if *state != to {
            log::debug!("Playback state: {} -> {}", state.as_str(), to.as_str());
            *state = to;
        }
    }
}
