//! Конфигурация тайминга стола.
//!
//! Здесь описываем только "правила", без состояния и без привязки к конкретному столу.

use serde::{Deserialize, Serialize};

/// Правила тайминга для одного стола.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeRules {
    /// Сколько секунд даётся на ход.
    pub action_secs: u32,
    /// Сколько секунд ждём ответа на предложение run-it-twice.
    pub run_it_twice_prompt_secs: u32,
}

impl Default for TimeRules {
    fn default() -> Self {
        Self::standard()
    }
}

impl TimeRules {
    /// Строгий конструктор.
    pub const fn new(action_secs: u32, run_it_twice_prompt_secs: u32) -> Self {
        Self {
            action_secs,
            run_it_twice_prompt_secs,
        }
    }

    pub const fn standard() -> Self {
        Self::new(20, 15)
    }
}
