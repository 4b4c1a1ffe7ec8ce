//! Модуль для реализации системы уведомлений о подсветке
//!
//! Этот модуль предоставляет конкретные реализации наблюдателей, через
//! которые слой отрисовки узнаёт о смене активного слова. Мост
//! воспроизведения уведомляет наблюдателей только при изменении индекса.

use std::sync::{Arc, Mutex};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Событие смены активного слова
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighlightEvent {
    /// Индекс активного слова; None — ни одно слово не активно
    pub word_index: Option<usize>,
    /// Само слово, если индекс попадает в список слов
    pub word: Option<String>,
    /// Позиция воспроизведения, при которой произошла смена
    pub seconds: f64,
}

/// Трейт для наблюдателя, получающего уведомления о подсветке
pub trait HighlightObserver: Send + Sync {
    /// Метод, вызываемый при смене активного слова
    fn on_highlight_change(&self, event: HighlightEvent);
}

/// Наблюдатель, выводящий смену подсветки в консоль
pub struct ConsoleHighlightObserver {
    /// Префикс для вывода (опционально)
    prefix: Option<String>,
}

impl ConsoleHighlightObserver {
    /// Создать новый экземпляр ConsoleHighlightObserver
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Создать новый экземпляр ConsoleHighlightObserver с префиксом
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl Default for ConsoleHighlightObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightObserver for ConsoleHighlightObserver {
    fn on_highlight_change(&self, event: HighlightEvent) {
        let prefix = self.prefix.as_deref().unwrap_or("");
        match (&event.word_index, &event.word) {
            (Some(index), Some(word)) => {
                println!("{}[{:.2}s] word {}: {}", prefix, event.seconds, index, word)
            }
            (Some(index), None) => {
                println!("{}[{:.2}s] word {}", prefix, event.seconds, index)
            }
            _ => println!("{}[{:.2}s] no active word", prefix, event.seconds),
        }
    }
}

/// Наблюдатель, сохраняющий события подсветки в памяти
#[derive(Clone)]
pub struct MemoryHighlightObserver {
    /// История событий
    history: Arc<Mutex<Vec<HighlightEvent>>>,
}

impl MemoryHighlightObserver {
    /// Создать новый экземпляр MemoryHighlightObserver
    pub fn new() -> Self {
        Self {
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Получить историю событий
    pub fn history(&self) -> Vec<HighlightEvent> {
        let history = self.history.lock().unwrap();
        history.clone()
    }

    /// Очистить историю событий
    pub fn clear_history(&self) {
        let mut history = self.history.lock().unwrap();
        history.clear();
    }
}

impl Default for MemoryHighlightObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightObserver for MemoryHighlightObserver {
    fn on_highlight_change(&self, event: HighlightEvent) {
        let mut history = self.history.lock().unwrap();
        history.push(event);
    }
}

/// Наблюдатель, отправляющий события подсветки через канал
pub struct ChannelHighlightObserver {
    /// Отправитель для канала
    sender: mpsc::Sender<HighlightEvent>,
}

impl ChannelHighlightObserver {
    /// Создать новый экземпляр ChannelHighlightObserver
    pub fn new(sender: mpsc::Sender<HighlightEvent>) -> Self {
        Self { sender }
    }
}

impl HighlightObserver for ChannelHighlightObserver {
    fn on_highlight_change(&self, event: HighlightEvent) {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let _ = sender.send(event).await;
        });
    }
}

/// Наблюдатель, вызывающий функцию обратного вызова при смене подсветки
pub struct CallbackHighlightObserver<F>
where
    F: Fn(HighlightEvent) + Send + Sync + 'static,
{
    /// Функция обратного вызова
    callback: F,
}

impl<F> CallbackHighlightObserver<F>
where
    F: Fn(HighlightEvent) + Send + Sync + 'static,
{
    /// Создать новый экземпляр CallbackHighlightObserver
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> HighlightObserver for CallbackHighlightObserver<F>
where
    F: Fn(HighlightEvent) + Send + Sync + 'static,
{
    fn on_highlight_change(&self, event: HighlightEvent) {
        (self.callback)(event);
    }
}

/// Комбинированный наблюдатель, объединяющий несколько наблюдателей
pub struct CompositeHighlightObserver {
    /// Список наблюдателей
    observers: Vec<Box<dyn HighlightObserver>>,
}

impl CompositeHighlightObserver {
    /// Создать новый экземпляр CompositeHighlightObserver
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Добавить наблюдателя
    pub fn add_observer(&mut self, observer: Box<dyn HighlightObserver>) {
        self.observers.push(observer);
    }

    /// Удалить всех наблюдателей
    pub fn clear(&mut self) {
        self.observers.clear();
    }
}

impl Default for CompositeHighlightObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightObserver for CompositeHighlightObserver {
    fn on_highlight_change(&self, event: HighlightEvent) {
        for observer in &self.observers {
            observer.on_highlight_change(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(index: Option<usize>, seconds: f64) -> HighlightEvent {
        HighlightEvent {
            word_index: index,
            word: index.map(|i| format!("word{}", i)),
            seconds,
        }
    }

    #[test]
    fn test_console_observer() {
        let observer = ConsoleHighlightObserver::with_prefix("[Test] ");
        // Этот тест просто проверяет, что метод не вызывает панику
        observer.on_highlight_change(event(Some(0), 0.2));
        observer.on_highlight_change(event(None, 0.0));
    }

    #[test]
    fn test_memory_observer() {
        let observer = MemoryHighlightObserver::new();

        observer.on_highlight_change(event(None, 0.0));
        observer.on_highlight_change(event(Some(0), 0.2));
        observer.on_highlight_change(event(Some(1), 0.6));

        let history = observer.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].word_index, None);
        assert_eq!(history[1].word_index, Some(0));
        assert_eq!(history[2].word.as_deref(), Some("word1"));

        observer.clear_history();
        assert_eq!(observer.history().len(), 0);
    }

    #[test]
    fn test_callback_observer() {
        let counter = Arc::new(Mutex::new(0));
        let counter_clone = counter.clone();

        let observer = CallbackHighlightObserver::new(move |_| {
            let mut count = counter_clone.lock().unwrap();
            *count += 1;
        });

        observer.on_highlight_change(event(Some(0), 0.1));
        observer.on_highlight_change(event(Some(1), 0.5));

        assert_eq!(*counter.lock().unwrap(), 2);
    }

    #[test]
    fn test_composite_observer() {
        let memory_observer = MemoryHighlightObserver::new();
        let counter = Arc::new(Mutex::new(0));
        let counter_clone = counter.clone();

        let callback_observer = CallbackHighlightObserver::new(move |_| {
            let mut count = counter_clone.lock().unwrap();
            *count += 1;
        });

        let mut composite = CompositeHighlightObserver::new();
        composite.add_observer(Box::new(memory_observer.clone()));
        composite.add_observer(Box::new(callback_observer));

        composite.on_highlight_change(event(Some(0), 0.2));

        // Оба наблюдателя получили уведомление
        assert_eq!(memory_observer.history().len(), 1);
        assert_eq!(*counter.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_channel_observer() {
        let (tx, mut rx) = mpsc::channel(8);
        let observer = ChannelHighlightObserver::new(tx);

        observer.on_highlight_change(event(Some(2), 1.0));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.word_index, Some(2));
    }

    #[test]
    fn test_event_serialization_none_as_null() {
        let json = serde_json::to_string(&event(None, 0.0)).unwrap();
        assert!(json.contains("\"word_index\":null"));
    }
}
