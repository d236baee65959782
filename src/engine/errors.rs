use crate::domain::{HandNum, PlayerId, SeatIndex};
use crate::engine::flow::FlowState;

use thiserror::Error;

/// Ошибки движка раздачи.
///
/// Ни одна из них не портит HandState: при ошибке состояние не меняется.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Неожиданное состояние раздачи: ожидалось {expected:?}, сейчас {actual:?}")]
    FlowStateMismatch { expected: FlowState, actual: FlowState },

    #[error("Сейчас не ход места {0}")]
    NotPlayersTurn(SeatIndex),

    #[error("Номер раздачи не совпадает: пришёл {got}, текущий {current}")]
    HandNumberMismatch { got: HandNum, current: HandNum },

    #[error("Сообщение {0} уже обработано")]
    DuplicateMessage(String),

    #[error("Игрок {player_id} не сидит на месте {seat}")]
    PlayerMismatch { seat: SeatIndex, player_id: PlayerId },

    #[error("Сумма call не совпадает: ожидалось {expected}, пришло {got}")]
    CallAmountMismatch { expected: u64, got: u64 },

    #[error("Размер рейза слишком мал: минимум до {min}")]
    RaiseTooSmall { min: u64 },

    #[error("Невозможно выполнить check – нужно хотя бы уравнять ставку")]
    CannotCheck,

    #[error("Недопустимое действие в текущем состоянии раздачи")]
    IllegalAction,

    #[error("Недостаточно фишек для этой ставки")]
    NotEnoughChips,

    #[error("Недостаточно активных игроков для раздачи")]
    NotEnoughPlayers,

    #[error("Не найдено место для кнопки")]
    NoButtonSeat,

    #[error("В колоде {got} карт, на раздачу нужно {needed}")]
    DeckTooShort { needed: usize, got: usize },

    #[error("Внутренняя ошибка: {0}")]
    Internal(&'static str),
}

impl EngineError {
    /// Ошибки порядка/протокола: отправителю всё равно шлём ack,
    /// чтобы он перестал ретраить.
    pub fn is_stale_retry(&self) -> bool {
        matches!(self, EngineError::DuplicateMessage(_))
            || matches!(self, EngineError::HandNumberMismatch { got, current } if got < current)
    }
}
