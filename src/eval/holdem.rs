use crate::domain::card::Card;

use super::five_card::best_hi_any;
use super::{HandEvaluator, ScoredHand};

/// Texas Hold'em: лучшие 5 из 7 (любое сочетание карманных и борда).
#[derive(Clone, Copy, Debug, Default)]
pub struct HoldemEvaluator;

impl HandEvaluator for HoldemEvaluator {
    fn evaluate(&self, hole: &[Card], board: &[Card]) -> ScoredHand {
        let all: Vec<Card> = hole.iter().chain(board.iter()).copied().collect();
        match best_hi_any(&all) {
            Some((rank, cards)) => ScoredHand::hi_only(rank, cards.to_vec()),
            None => ScoredHand::unscored(all),
        }
    }
}
