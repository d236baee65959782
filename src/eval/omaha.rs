//! Омаха: ровно 2 карманные + ровно 3 с борда. И для хай, и для лоу.

use crate::domain::card::Card;
use crate::domain::hand::{HandRank, LowRank};

use super::five_card::{index_combinations, score_five};
use super::low::score_low;
use super::{HandEvaluator, ScoredHand};

/// Pot-limit Omaha (только хай).
#[derive(Clone, Copy, Debug, Default)]
pub struct OmahaEvaluator;

/// Pot-limit Omaha Hi-Lo 8 or better.
#[derive(Clone, Copy, Debug, Default)]
pub struct OmahaHiLoEvaluator;

/// Все допустимые пятёрки: 2 из руки + 3 с борда.
fn omaha_fives(hole: &[Card], board: &[Card]) -> Vec<[Card; 5]> {
    let hole_pairs = index_combinations(hole.len(), 2);
    let board_triples = index_combinations(board.len(), 3);
    let mut out = Vec::with_capacity(hole_pairs.len() * board_triples.len());
    for hp in &hole_pairs {
        for bt in &board_triples {
            out.push([hole[hp[0]], hole[hp[1]], board[bt[0]], board[bt[1]], board[bt[2]]]);
        }
    }
    out
}

fn best_hi(fives: &[[Card; 5]]) -> Option<(HandRank, [Card; 5])> {
    let mut best: Option<(HandRank, [Card; 5])> = None;
    for five in fives {
        let rank = score_five(five);
        if best.map_or(true, |(b, _)| rank > b) {
            best = Some((rank, *five));
        }
    }
    best
}

fn best_lo(fives: &[[Card; 5]]) -> Option<(LowRank, [Card; 5])> {
    let mut best: Option<(LowRank, [Card; 5])> = None;
    for five in fives {
        if let Some(rank) = score_low(five) {
            if best.map_or(true, |(b, _)| rank < b) {
                best = Some((rank, *five));
            }
        }
    }
    best
}

impl HandEvaluator for OmahaEvaluator {
    fn evaluate(&self, hole: &[Card], board: &[Card]) -> ScoredHand {
        let fives = omaha_fives(hole, board);
        match best_hi(&fives) {
            Some((rank, cards)) => ScoredHand::hi_only(rank, cards.to_vec()),
            None => ScoredHand::unscored(hole.to_vec()),
        }
    }
}

impl HandEvaluator for OmahaHiLoEvaluator {
    fn evaluate(&self, hole: &[Card], board: &[Card]) -> ScoredHand {
        let fives = omaha_fives(hole, board);
        let mut scored = match best_hi(&fives) {
            Some((rank, cards)) => ScoredHand::hi_only(rank, cards.to_vec()),
            None => return ScoredHand::unscored(hole.to_vec()),
        };
        if let Some((lo, cards)) = best_lo(&fives) {
            scored.lo_rank = Some(lo);
            scored.lo_cards = cards.to_vec();
        }
        scored
    }
}
