//! Движок одной раздачи: машина состояний, ставки, сайд-поты, шоудаун.
//!
//! Высокоуровневый объект: `HandState`
//! Основные операции:
//!   - `deal_hand` – сдать раздачу
//!   - `on_player_acted` – принять ход игрока
//!   - `step` – выполнить автоматический переход текущего `FlowState`

pub mod actions;
pub mod betting;
pub mod errors;
pub mod flow;
pub mod hand_history;
pub mod hand_state;
pub mod next_action;
pub mod notifications;
pub mod positions;
pub mod pot;
pub mod run_it_twice;
pub mod showdown;
pub mod transitions;
pub mod validation;

use crate::domain::card::Card;

pub use actions::{ActionKind, PlayerActed};
pub use betting::{ActState, BettingRoundState, PlayerActRound};
pub use errors::EngineError;
pub use flow::FlowState;
pub use hand_history::{HandEvent, HandEventKind, HandHistory};
pub use hand_state::{HandState, NewHandParams};
pub use next_action::{compute_next_seat_action, BetOption, NextSeatAction};
pub use notifications::{Notification, Outbound, Recipient, SeatBalance, ShownHand};
pub use pot::{settle_round, Pot};
pub use run_it_twice::RunItTwiceState;
pub use showdown::{compute_rake, evaluate_winners, HandResult};
pub use transitions::{deal_hand, on_player_acted, on_run_it_twice_timeout, step, ActedOutcome, StepResult};

/// RNG интерфейс для движка. Реализации – в infra (обёртки над `rand`).
pub trait RandomSource: Send {
    fn shuffle_cards(&mut self, cards: &mut [Card]);
}
