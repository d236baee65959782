use core::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Chips, HandNum, PlayerId, SeatIndex};

/// Тип действия игрока.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Fold,
    Check,
    Call,
    /// Bet на улице, где ещё нет ставки.
    Bet,
    /// Raise существующей ставки.
    Raise,
    /// All-in – поставить весь стек.
    AllIn,
    /// Ответ на предложение run-it-twice.
    RunItTwiceYes,
    RunItTwiceNo,
}

impl ActionKind {
    pub fn is_run_it_twice(self) -> bool {
        matches!(self, ActionKind::RunItTwiceYes | ActionKind::RunItTwiceNo)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionKind::Fold => "FOLD",
            ActionKind::Check => "CHECK",
            ActionKind::Call => "CALL",
            ActionKind::Bet => "BET",
            ActionKind::Raise => "RAISE",
            ActionKind::AllIn => "ALLIN",
            ActionKind::RunItTwiceYes => "RUN_IT_TWICE_YES",
            ActionKind::RunItTwiceNo => "RUN_IT_TWICE_NO",
        };
        f.write_str(s)
    }
}

/// Входящее сообщение "игрок сделал ход".
///
/// Тот же тип использует таймер: при истечении времени он синтезирует
/// ход с `timed_out = true` и кладёт его в mailbox стола.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerActed {
    /// Уникальный id сообщения. По нему ловим повторы.
    pub message_id: String,
    pub hand_num: HandNum,
    pub seat: SeatIndex,
    pub player_id: PlayerId,
    pub action: ActionKind,
    /// Для CALL – сумма доплаты, для BET/RAISE – итоговая ставка раунда (raise-to).
    pub amount: Chips,
    pub timed_out: bool,
}

impl PlayerActed {
    /// Id сообщения, которое таймер синтезирует при истечении времени.
    pub fn timeout_message_id(hand_num: HandNum, action_id: u32) -> String {
        format!("timeout-{hand_num}-{action_id}")
    }
}
