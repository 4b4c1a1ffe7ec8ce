//! Модуль индекса временных меток
//!
//! Этот модуль содержит чистую функцию отображения позиции воспроизведения
//! на индекс активного слова, а также валидацию временных меток на границе
//! с сервисом синтеза.

use serde::{Deserialize, Serialize};

/// Временная метка слова, как её возвращает сервис синтеза
///
/// `mark_name` содержит индекс слова в виде текста ("0", "1", ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Timepoint {
    /// Индекс слова в виде текста
    pub mark_name: String,
    /// Время начала слова в секундах
    pub time_seconds: f64,
}

/// Проверенная временная метка с разобранным индексом слова
#[derive(Debug, Clone, PartialEq)]
pub struct WordTimepoint {
    /// Индекс слова в списке отображаемых слов
    pub word_index: usize,
    /// Время начала слова в секундах
    pub seconds: f64,
}

/// Валидация временных меток на границе с сервисом
///
/// Сервис обязан возвращать отсортированный список с уникальными индексами,
/// но клиент защищается: метки с нечисловым `mark_name`, повторным индексом
/// или нарушением монотонности по времени отбрасываются с предупреждением.
/// Чистая функция `active_index_at` работает только с проверенным списком.
pub fn sanitize_timepoints(raw: &[Timepoint]) -> Vec<WordTimepoint> {
    let mut result: Vec<WordTimepoint> = Vec::with_capacity(raw.len());
    let mut seen = std::collections::HashSet::new();
    let mut dropped = 0usize;

    for tp in raw {
        let word_index = match tp.mark_name.trim().parse::<usize>() {
            Ok(i) => i,
            Err(_) => {
                dropped += 1;
                continue;
            }
        };
        if !seen.insert(word_index) {
            dropped += 1;
            continue;
        }
        if tp.time_seconds < 0.0 || !tp.time_seconds.is_finite() {
            dropped += 1;
            continue;
        }
        if let Some(last) = result.last() {
            if tp.time_seconds < last.seconds {
                dropped += 1;
                continue;
            }
        }
        result.push(WordTimepoint {
            word_index,
            seconds: tp.time_seconds,
        });
    }

    if dropped > 0 {
        log::warn!(
            "Dropped {} malformed timepoint(s) out of {} returned by the service",
            dropped,
            raw.len()
        );
    }

    result
}

/// Вычислить индекс активного слова для позиции воспроизведения
///
/// Активное слово — последняя метка, чьё время не превышает текущую позицию
/// (граница включительно: слово становится активным ровно в свой момент).
/// `None` — до первой метки или при пустом списке. Список обязан быть
/// отсортирован по времени (см. `sanitize_timepoints`), поэтому достаточно
/// бинарного поиска.
pub fn active_index_at(seconds: f64, timepoints: &[WordTimepoint]) -> Option<usize> {
    let qualified = timepoints.partition_point(|tp| tp.seconds <= seconds);
    if qualified == 0 {
        None
    } else {
        Some(timepoints[qualified - 1].word_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tp(mark: &str, seconds: f64) -> Timepoint {
        Timepoint {
            mark_name: mark.to_string(),
            time_seconds: seconds,
        }
    }

    fn reference_list() -> Vec<WordTimepoint> {
        sanitize_timepoints(&[tp("0", 0.1), tp("1", 0.5)])
    }

    #[test]
    fn test_active_index_reference_values() {
        let t = reference_list();
        assert_eq!(active_index_at(0.0, &t), None);
        assert_eq!(active_index_at(0.1, &t), Some(0));
        assert_eq!(active_index_at(0.3, &t), Some(0));
        assert_eq!(active_index_at(0.5, &t), Some(1));
        assert_eq!(active_index_at(10.0, &t), Some(1));
    }

    #[test]
    fn test_empty_list_always_none() {
        assert_eq!(active_index_at(0.0, &[]), None);
        assert_eq!(active_index_at(100.0, &[]), None);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let t = sanitize_timepoints(&[tp("0", 1.0)]);
        assert_eq!(active_index_at(0.999_999, &t), None);
        assert_eq!(active_index_at(1.0, &t), Some(0));
    }

    #[test]
    fn test_pure_and_idempotent() {
        let t = reference_list();
        let first = active_index_at(0.3, &t);
        for _ in 0..10 {
            assert_eq!(active_index_at(0.3, &t), first);
        }
    }

    #[test]
    fn test_sparse_indices() {
        // Не у каждого слова есть метка: индексы могут идти с пропусками
        let t = sanitize_timepoints(&[tp("0", 0.1), tp("3", 0.9)]);
        assert_eq!(active_index_at(0.5, &t), Some(0));
        assert_eq!(active_index_at(1.0, &t), Some(3));
    }

    #[test]
    fn test_sanitize_drops_garbage_marks() {
        let t = sanitize_timepoints(&[tp("0", 0.1), tp("abc", 0.2), tp("1", 0.5)]);
        assert_eq!(t.len(), 2);
        assert_eq!(t[1].word_index, 1);
    }

    #[test]
    fn test_sanitize_drops_duplicates_and_backwards_time() {
        let t = sanitize_timepoints(&[
            tp("0", 0.1),
            tp("0", 0.2),
            tp("1", 0.05),
            tp("2", 0.5),
        ]);
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].word_index, 0);
        assert_eq!(t[1].word_index, 2);
    }

    #[test]
    fn test_sanitize_drops_negative_and_nan() {
        let t = sanitize_timepoints(&[tp("0", -0.5), tp("1", f64::NAN), tp("2", 0.3)]);
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].word_index, 2);
    }

    #[test]
    fn test_wire_format_deserialization() {
        let json = r#"[{"mark_name": "0", "time_seconds": 0.1}, {"mark_name": "1", "time_seconds": 0.5}]"#;
        let raw: Vec<Timepoint> = serde_json::from_str(json).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].mark_name, "0");
        assert!((raw[1].time_seconds - 0.5).abs() < f64::EPSILON);
    }
}
