use core::fmt;

use serde::{Deserialize, Serialize};

/// Шаг жизненного цикла раздачи. Хранится в HandState и переживает рестарт.
///
/// Каждая функция перехода проверяет, что её вызвали в нужном состоянии.
/// Несовпадение – no-op + строка в логе, это и делает повторы безопасными.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowState {
    DealHand,
    WaitForNextAction,
    PrepareNextAction,
    MoveToNextAction,
    MoveToNextRound,
    AllPlayersAllIn,
    OnePlayerRemaining,
    #[serde(rename = "RUNITTWICE_UP_PROMPT")]
    RunItTwiceUpPrompt,
    Showdown,
    HandEnded,
    MoveToNextHand,
    WaitForPendingUpdate,
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowState::DealHand => "DEAL_HAND",
            FlowState::WaitForNextAction => "WAIT_FOR_NEXT_ACTION",
            FlowState::PrepareNextAction => "PREPARE_NEXT_ACTION",
            FlowState::MoveToNextAction => "MOVE_TO_NEXT_ACTION",
            FlowState::MoveToNextRound => "MOVE_TO_NEXT_ROUND",
            FlowState::AllPlayersAllIn => "ALL_PLAYERS_ALL_IN",
            FlowState::OnePlayerRemaining => "ONE_PLAYER_REMAINING",
            FlowState::RunItTwiceUpPrompt => "RUNITTWICE_UP_PROMPT",
            FlowState::Showdown => "SHOWDOWN",
            FlowState::HandEnded => "HAND_ENDED",
            FlowState::MoveToNextHand => "MOVE_TO_NEXT_HAND",
            FlowState::WaitForPendingUpdate => "WAIT_FOR_PENDING_UPDATE",
        };
        f.write_str(s)
    }
}
