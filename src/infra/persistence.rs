use std::collections::BTreeMap;

use parking_lot::Mutex;
use thiserror::Error;

use crate::engine::hand_state::HandState;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Ошибка хранилища чекпоинтов: {0}")]
    Backend(String),

    #[error("Ошибка сериализации чекпоинта: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Хранилище чекпоинтов раздачи, ключ – код стола.
///
/// Запись атомарна по ключу. Пишет в ключ только воркер своего стола,
/// так что last-writer-wins достаточно.
pub trait HandStateStore: Send + Sync {
    fn load(&self, table_code: &str) -> Result<Option<HandState>, PersistError>;

    fn save(&self, table_code: &str, state: &HandState) -> Result<(), PersistError>;

    fn remove(&self, table_code: &str) -> Result<(), PersistError>;
}

/// Чекпоинт в байты (JSON). Одинаковое состояние – одинаковые байты.
pub fn encode_hand_state(state: &HandState) -> Result<Vec<u8>, PersistError> {
    Ok(serde_json::to_vec(state)?)
}

pub fn decode_hand_state(bytes: &[u8]) -> Result<HandState, PersistError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Простая in-memory реализация для тестов и локального запуска.
///
/// Хранит сериализованные байты, а не объекты: загрузка проходит через
/// тот же codec, что и у настоящего хранилища.
#[derive(Debug, Default)]
pub struct InMemoryHandStateStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
    /// Сколько следующих `save` должны упасть (для тестов ретраев).
    failing_saves: Mutex<u32>,
}

impl InMemoryHandStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Следующие `n` вызовов `save` вернут `PersistError::Backend`.
    pub fn fail_next_saves(&self, n: u32) {
        *self.failing_saves.lock() = n;
    }

    /// Сырые байты чекпоинта.
    pub fn raw(&self, table_code: &str) -> Option<Vec<u8>> {
        self.entries.lock().get(table_code).cloned()
    }

    pub fn table_codes(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }
}

impl HandStateStore for InMemoryHandStateStore {
    fn load(&self, table_code: &str) -> Result<Option<HandState>, PersistError> {
        let bytes = self.entries.lock().get(table_code).cloned();
        bytes.map(|b| decode_hand_state(&b)).transpose()
    }

    fn save(&self, table_code: &str, state: &HandState) -> Result<(), PersistError> {
        {
            let mut failing = self.failing_saves.lock();
            if *failing > 0 {
                *failing -= 1;
                return Err(PersistError::Backend(format!("запись {table_code} отклонена")));
            }
        }
        let bytes = encode_hand_state(state)?;
        self.entries.lock().insert(table_code.to_string(), bytes);
        Ok(())
    }

    fn remove(&self, table_code: &str) -> Result<(), PersistError> {
        self.entries.lock().remove(table_code);
        Ok(())
    }
}
