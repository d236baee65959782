//! Что место может сделать прямо сейчас. Пересчитывается на каждом ходе.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;
use crate::domain::hand::Street;
use crate::domain::{HandNum, PlayerId, SeatIndex};
use crate::engine::actions::ActionKind;
use crate::engine::errors::EngineError;
use crate::engine::hand_state::HandState;

/// Пресет размера ставки для кнопок клиента.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BetOption {
    pub label: String,
    /// Итоговая ставка раунда (raise-to).
    pub amount: Chips,
}

/// Допустимые действия одного места.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NextSeatAction {
    pub seat: SeatIndex,
    pub player_id: PlayerId,
    pub hand_num: HandNum,
    pub action_id: u32,
    pub available_actions: Vec<ActionKind>,
    /// Сколько доплатить до call (не больше стека).
    pub call_amount: Chips,
    pub min_raise_to: Chips,
    pub max_raise_to: Chips,
    /// Итоговая ставка раунда при all-in.
    pub all_in_amount: Chips,
    pub bet_options: Vec<BetOption>,
    pub expires_at: DateTime<Utc>,
}

impl NextSeatAction {
    pub fn allows(&self, kind: ActionKind) -> bool {
        self.available_actions.contains(&kind)
    }

    /// Что делаем за игрока по таймауту: check, если можно, иначе fold.
    pub fn default_action(&self) -> ActionKind {
        if self.allows(ActionKind::Check) {
            ActionKind::Check
        } else {
            ActionKind::Fold
        }
    }
}

/// Пересчитать `NextSeatAction` для места.
pub fn compute_next_seat_action(
    state: &HandState,
    seat: SeatIndex,
    now: DateTime<Utc>,
) -> Result<NextSeatAction, EngineError> {
    let player_id = state.player_at(seat).ok_or(EngineError::Internal("ход пустого места"))?;
    let act = state.act(seat);
    if !act.can_act() {
        return Err(EngineError::Internal("ход места, которое не может ходить"));
    }

    let round = &state.round;
    let stack = state.stack_of(seat);
    let bet = round.bet_of(seat);
    let to_call = round.to_call(seat);
    let all_in_to = bet + stack;

    // Есть ли соперник, который ещё может ответить на рейз.
    let opponents_can_act = state.actionable_seats().iter().any(|&s| s != seat);
    let may_raise = opponents_can_act && round.can_reraise(&act);

    let min_raise_to = round.min_raise_to(state.big_blind);
    let max_raise_to = if state.game_type.is_pot_limit() {
        let pot_limit = round.current_raise + state.pot_with_bets() + to_call;
        pot_limit.min(all_in_to)
    } else {
        all_in_to
    };

    let mut available = vec![ActionKind::Fold];
    if to_call.is_zero() {
        available.push(ActionKind::Check);
    } else if stack > to_call {
        available.push(ActionKind::Call);
    }

    // Полный рейз: стека хватает больше чем на минимум, и лимит его пускает.
    // Ровно на минимум – это уже all-in.
    let full_raise_possible = may_raise && all_in_to > min_raise_to && max_raise_to >= min_raise_to;
    if full_raise_possible {
        if round.current_raise.is_zero() {
            available.push(ActionKind::Bet);
        } else {
            available.push(ActionKind::Raise);
        }
    }

    // All-in: либо как call на последние фишки, либо как рейз в пределах лимита.
    let all_in_as_call = stack <= to_call;
    let all_in_as_raise = may_raise && all_in_to <= max_raise_to;
    if !stack.is_zero() && (all_in_as_call || all_in_as_raise) {
        available.push(ActionKind::AllIn);
    }

    let bet_options = if available.contains(&ActionKind::Bet) || available.contains(&ActionKind::Raise) {
        bet_presets(state, to_call, min_raise_to, max_raise_to)
    } else {
        Vec::new()
    };

    Ok(NextSeatAction {
        seat,
        player_id,
        hand_num: state.hand_num,
        action_id: state.action_seq,
        available_actions: available,
        call_amount: to_call.min(stack),
        min_raise_to: min_raise_to.min(all_in_to),
        max_raise_to,
        all_in_amount: all_in_to,
        bet_options,
        expires_at: state.action_deadline(now),
    })
}

/// Префлоп: 2x/3x/4x BB. Постфлоп: 1/2, 2/3 и полный банк.
/// Пресеты вне [min, max] отбрасываются.
fn bet_presets(state: &HandState, to_call: Chips, min: Chips, max: Chips) -> Vec<BetOption> {
    let candidates: Vec<(String, Chips)> = if state.street == Street::Preflop {
        [2u64, 3, 4]
            .iter()
            .map(|&k| (format!("{k}x"), Chips(state.big_blind.0 * k)))
            .collect()
    } else {
        let pot_after_call = state.pot_with_bets() + to_call;
        [("1/2", 1u64, 2u64), ("2/3", 2, 3), ("pot", 1, 1)]
            .iter()
            .map(|&(label, num, den)| {
                let raise = Chips(pot_after_call.0 * num / den);
                (label.to_string(), state.round.current_raise + raise)
            })
            .collect()
    };

    let mut out: Vec<BetOption> = Vec::new();
    for (label, amount) in candidates {
        if amount < min || amount > max {
            continue;
        }
        if out.iter().any(|o| o.amount == amount) {
            continue;
        }
        out.push(BetOption { label, amount });
    }
    out
}
