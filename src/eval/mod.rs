//! Оценка рук для всех вариантов игры.
//!
//! Снаружи используется только `evaluator_for(game_type)`: движок не знает,
//! как именно считается сила руки в конкретном варианте.

pub mod five_card;
pub mod hand_rank;
pub mod holdem;
pub mod low;
pub mod omaha;

use serde::{Deserialize, Serialize};

use crate::domain::card::Card;
use crate::domain::hand::{GameType, HandRank, LowRank};

pub use five_card::score_five;
pub use hand_rank::{describe_hand, HandCategory};
pub use holdem::HoldemEvaluator;
pub use low::score_low;
pub use omaha::{OmahaEvaluator, OmahaHiLoEvaluator};

/// Результат оценки руки одного игрока на одном борде.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoredHand {
    pub hi_rank: HandRank,
    /// Пять карт, составляющих лучшую хай-комбинацию.
    pub hi_cards: Vec<Card>,
    /// Лоу есть только в Hi-Lo и только если рука квалифицируется.
    pub lo_rank: Option<LowRank>,
    pub lo_cards: Vec<Card>,
}

impl ScoredHand {
    pub fn hi_only(hi_rank: HandRank, hi_cards: Vec<Card>) -> Self {
        Self {
            hi_rank,
            hi_cards,
            lo_rank: None,
            lo_cards: Vec::new(),
        }
    }

    /// Карт не хватает на комбинацию (в норме не бывает: борд сдаётся целиком).
    pub fn unscored(cards: Vec<Card>) -> Self {
        Self::hi_only(HandRank(0), cards)
    }
}

/// Эвалюатор конкретного варианта игры.
pub trait HandEvaluator: Send + Sync {
    fn evaluate(&self, hole: &[Card], board: &[Card]) -> ScoredHand;
}

static HOLDEM: HoldemEvaluator = HoldemEvaluator;
static OMAHA: OmahaEvaluator = OmahaEvaluator;
static OMAHA_HI_LO: OmahaHiLoEvaluator = OmahaHiLoEvaluator;

/// Выбор эвалюатора по варианту игры.
pub fn evaluator_for(game_type: GameType) -> &'static dyn HandEvaluator {
    match game_type {
        GameType::Holdem => &HOLDEM,
        GameType::Plo => &OMAHA,
        GameType::PloHiLo => &OMAHA_HI_LO,
    }
}
