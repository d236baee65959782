use thiserror::Error;

use crate::engine::errors::EngineError;
use crate::infra::persistence::PersistError;

/// Ошибки уровня стола (актор, реестр).
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Mailbox стола {0} закрыт")]
    MailboxClosed(String),

    #[error("Стол {0} не найден")]
    TableNotFound(String),

    #[error("Стол {0} уже существует")]
    TableAlreadyExists(String),

    #[error("Ошибка хранилища: {0}")]
    Persist(#[from] PersistError),

    #[error("Ошибка движка: {0}")]
    Engine(#[from] EngineError),
}
