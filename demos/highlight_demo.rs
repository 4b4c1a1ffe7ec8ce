//! Пример использования движка синхронизации подсветки
//!
//! Этот пример демонстрирует полный цикл: синтез текста, подписка
//! наблюдателей подсветки и имитация уведомлений о позиции воспроизведения
//! от аудиоэлемента.

use karaoke_sync::config::KaraokeSyncConfig;
use karaoke_sync::notification::{
    CompositeHighlightObserver, ConsoleHighlightObserver, MemoryHighlightObserver,
};
use karaoke_sync::KaraokeSync;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Инициализируем логирование
    env_logger::init();

    // Базовый URL сервиса берём из переменной окружения
    let base_url = std::env::var("READER_API_URL")
        .unwrap_or_else(|_| "http://localhost:8080".to_string());

    let config = KaraokeSyncConfig {
        api_base_url: base_url,
        ..KaraokeSyncConfig::default()
    };

    let engine = KaraokeSync::new(config)?;

    // Создаем комбинированный наблюдатель: консоль + память
    let memory = MemoryHighlightObserver::new();
    let mut composite = CompositeHighlightObserver::new();
    composite.add_observer(Box::new(ConsoleHighlightObserver::with_prefix("[karaoke] ")));
    composite.add_observer(Box::new(memory.clone()));
    engine.add_observer(Box::new(composite));

    // Загружаем каталог голосов (при недоступном сервисе он просто пуст)
    engine.refresh_voices().await;
    println!("Доступно голосов: {}", engine.voices().len());

    // Имитируем набор текста: сработает дебаунс-рекомендация голоса
    engine.text_changed("Hello Wo");
    engine.text_changed("Hello World");

    // Синтезируем и "воспроизводим"
    engine.synthesize("Hello World").await?;
    println!("Слова: {:?}", engine.words());

    if let Some(uri) = engine.audio_data_uri() {
        println!("data-URI аудио: {} байт", uri.len());
    }

    engine.on_play();
    for step in 0..10 {
        let seconds = step as f64 * 0.1;
        engine.on_time_update(seconds);
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    engine.on_pause();

    println!("Событий подсветки: {}", memory.history().len());

    engine.shutdown();
    Ok(())
}
