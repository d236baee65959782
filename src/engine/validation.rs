use crate::domain::chips::Chips;
use crate::engine::actions::{ActionKind, PlayerActed};
use crate::engine::errors::EngineError;
use crate::engine::hand_state::HandState;
use crate::engine::next_action::NextSeatAction;

/// Действие после проверки: что реально делаем и какой станет ставка места.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedAction {
    pub kind: ActionKind,
    /// Ставка места в раунде после действия.
    pub new_bet: Chips,
}

/// Проверка хода против текущего `NextSeatAction`. Состояние не меняется.
///
/// Ход по таймауту всегда превращается в check/fold, сумма игнорируется.
/// PLO-рейз выше лимита банка урезается до лимита, а не отклоняется.
pub fn validate_action(state: &HandState, next: &NextSeatAction, msg: &PlayerActed) -> Result<ResolvedAction, EngineError> {
    let bet = state.round.bet_of(next.seat);

    let kind = if msg.timed_out { next.default_action() } else { msg.action };

    if !next.allows(kind) {
        return Err(match kind {
            ActionKind::Check => EngineError::CannotCheck,
            _ => EngineError::IllegalAction,
        });
    }

    match kind {
        ActionKind::Fold | ActionKind::Check => Ok(ResolvedAction { kind, new_bet: bet }),

        ActionKind::Call => {
            if msg.amount != next.call_amount {
                return Err(EngineError::CallAmountMismatch {
                    expected: next.call_amount.0,
                    got: msg.amount.0,
                });
            }
            Ok(ResolvedAction {
                kind,
                new_bet: bet + next.call_amount,
            })
        }

        ActionKind::Bet | ActionKind::Raise => {
            let mut target = msg.amount;
            if target > next.max_raise_to {
                if state.game_type.is_pot_limit() {
                    target = next.max_raise_to;
                } else {
                    return Err(EngineError::NotEnoughChips);
                }
            }
            if target >= next.all_in_amount {
                return Ok(ResolvedAction {
                    kind: ActionKind::AllIn,
                    new_bet: next.all_in_amount,
                });
            }
            if target < next.min_raise_to {
                return Err(EngineError::RaiseTooSmall {
                    min: next.min_raise_to.0,
                });
            }
            Ok(ResolvedAction { kind, new_bet: target })
        }

        ActionKind::AllIn => Ok(ResolvedAction {
            kind,
            new_bet: next.all_in_amount,
        }),

        ActionKind::RunItTwiceYes | ActionKind::RunItTwiceNo => Err(EngineError::IllegalAction),
    }
}
