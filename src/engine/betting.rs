use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;
use crate::domain::hand::Street;
use crate::domain::SeatIndex;

/// Что место сделало в текущем раунде ставок.
///
/// `Folded` и `AllIn` переживают смену улицы, остальное сбрасывается в `NotActed`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActState {
    NotActed,
    Checked,
    Called,
    Raised,
    Folded,
    AllIn,
    /// Место пустое или не получило карт в этой раздаче.
    Empty,
}

/// Состояние одного места в раунде ставок.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerActRound {
    pub state: ActState,
    /// Сумма последнего действия (raise-to / call).
    pub amount: Chips,
    /// bet_index раунда на момент последнего действия.
    pub bet_index: u32,
}

impl PlayerActRound {
    pub fn new(state: ActState) -> Self {
        Self {
            state,
            amount: Chips::ZERO,
            bet_index: 0,
        }
    }

    /// Место ещё борется за банк.
    pub fn is_live(&self) -> bool {
        !matches!(self.state, ActState::Folded | ActState::Empty)
    }

    /// Место может делать ходы (живое и не в all-in).
    pub fn can_act(&self) -> bool {
        self.is_live() && self.state != ActState::AllIn
    }

    pub fn has_acted(&self) -> bool {
        !matches!(self.state, ActState::NotActed | ActState::Empty)
    }

    /// Сброс на новую улицу.
    pub fn reset_for_round(&mut self) {
        if matches!(self.state, ActState::Checked | ActState::Called | ActState::Raised) {
            self.state = ActState::NotActed;
        }
        self.amount = Chips::ZERO;
        self.bet_index = 0;
    }
}

/// Состояние раунда ставок (на конкретной улице).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BettingRoundState {
    pub street: Street,
    /// Ставки мест в этом раунде, индекс = seat.
    pub bets: Vec<Chips>,
    /// Растёт на каждом полном bet/raise. По нему видно, можно ли месту ререйзить.
    pub bet_index: u32,
    /// Текущая целевая ставка, до которой должны дотянуться игроки.
    pub current_raise: Chips,
    /// От какой ставки был сделан последний полный рейз.
    pub raised_from: Chips,
    /// Seat последнего агрессора (bet/raise/all-in сверху).
    pub last_aggressor: Option<SeatIndex>,
}

impl BettingRoundState {
    pub fn new(street: Street, max_seats: u8) -> Self {
        Self {
            street,
            bets: vec![Chips::ZERO; max_seats as usize],
            bet_index: 0,
            current_raise: Chips::ZERO,
            raised_from: Chips::ZERO,
            last_aggressor: None,
        }
    }

    pub fn bet_of(&self, seat: SeatIndex) -> Chips {
        self.bets.get(seat as usize).copied().unwrap_or(Chips::ZERO)
    }

    /// Сумма всех ставок раунда (ещё не сметённых в банки).
    pub fn total_bets(&self) -> Chips {
        self.bets.iter().sum()
    }

    /// Сколько месту нужно доплатить до текущей ставки.
    pub fn to_call(&self, seat: SeatIndex) -> Chips {
        self.current_raise.saturating_sub(self.bet_of(seat))
    }

    /// Минимальный шаг рейза: последний полный рейз, но не меньше BB.
    pub fn min_increment(&self, big_blind: Chips) -> Chips {
        let last = self.current_raise.saturating_sub(self.raised_from);
        last.max(big_blind)
    }

    /// Минимальная итоговая ставка для bet/raise.
    pub fn min_raise_to(&self, big_blind: Chips) -> Chips {
        self.current_raise + self.min_increment(big_blind)
    }

    /// Может ли место рейзить: ещё не ходило или после его хода был полный рейз.
    pub fn can_reraise(&self, act: &PlayerActRound) -> bool {
        act.state == ActState::NotActed || act.bet_index < self.bet_index
    }

    /// Обновить "водяной знак" после того, как ставка места стала `new_bet`.
    ///
    /// Полный рейз двигает `raised_from` и `bet_index`. Неполный all-in рейз
    /// двигает только `current_raise`; шаг минимального рейза сохраняется.
    /// Возвращает true, если рейз полный.
    pub fn register_bet(&mut self, seat: SeatIndex, new_bet: Chips, big_blind: Chips) -> bool {
        if new_bet <= self.current_raise {
            return false;
        }
        let full_increment = self.min_increment(big_blind);
        let increment = new_bet - self.current_raise;
        self.last_aggressor = Some(seat);

        if increment >= full_increment {
            self.raised_from = self.current_raise;
            self.current_raise = new_bet;
            self.bet_index += 1;
            true
        } else {
            self.current_raise = new_bet;
            self.raised_from = new_bet.saturating_sub(full_increment);
            false
        }
    }
}
