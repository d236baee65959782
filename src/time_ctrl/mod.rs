//! Контроль времени стола: часы хода, проверка живости, правила тайминга.
//!
//! Обе задачи общаются с воркером стола только через его timer-mailbox.

pub mod action_timer;
pub mod liveness;
pub mod time_rules;

pub use action_timer::{ActionTimer, TimerPurpose, TimerRequest};
pub use liveness::{LivenessSettings, NetworkLivenessCheck};
pub use time_rules::TimeRules;

use crate::domain::{HandNum, PlayerId};
use crate::engine::actions::PlayerActed;

/// Состояние соединения игрока поменялось.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LivenessEvent {
    ConnectivityLost { player_id: PlayerId },
    ConnectivityRestored { player_id: PlayerId },
}

/// Сообщения timer-mailbox стола.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerMessage {
    /// Время хода вышло: ход по умолчанию, помечен `timed_out`.
    ActionExpired(PlayerActed),
    /// Время ответа на run-it-twice вышло.
    RunItTwiceExpired { hand_num: HandNum },
    Liveness(LivenessEvent),
}
