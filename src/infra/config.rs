use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time_ctrl::TimeRules;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Не удалось прочитать конфиг {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Некорректный конфиг: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Настройки движка (общие для всех столов процесса).
///
/// Все поля необязательны в JSON: недостающие берутся из `Default`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub time_rules: TimeRules,
    /// Как часто пингуем подключённых игроков.
    pub ping_interval_ms: u64,
    /// Сколько ждём pong, прежде чем считать соединение потерянным.
    pub pong_timeout_ms: u64,
    /// Период опроса "ждём игроков", пока раздача не идёт.
    pub idle_poll_ms: u64,
    /// Пауза между концом раздачи и следующей.
    pub pause_between_hands_ms: u64,
    /// Сколько раз пробуем сохранить чекпоинт, прежде чем остановить стол.
    pub persist_retry_attempts: u32,
    pub persist_retry_backoff_ms: u64,
    /// Сдавать следующую раздачу автоматически.
    pub auto_deal: bool,
    /// Ёмкость каждого mailbox стола.
    pub mailbox_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_rules: TimeRules::standard(),
            ping_interval_ms: 5_000,
            pong_timeout_ms: 15_000,
            idle_poll_ms: 500,
            pause_between_hands_ms: 3_000,
            persist_retry_attempts: 5,
            persist_retry_backoff_ms: 100,
            auto_deal: true,
            mailbox_capacity: 256,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}
