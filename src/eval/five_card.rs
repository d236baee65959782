//! Оценка ровно пяти карт (хай) и перебор комбинаций.

use crate::domain::card::{Card, Rank};
use crate::domain::hand::HandRank;

use super::hand_rank::HandCategory;

/// Маска рангов: бит (value - 2) для 2..A.
type RankMask = u16;

const WHEEL: RankMask = 0b1_0000_0000_1111; // A,5,4,3,2

/// Старшая карта стрита, если он есть (для колеса A2345 – пятёрка).
fn straight_high(mask: RankMask) -> Option<Rank> {
    for high in (6u8..=14).rev() {
        let run: RankMask = 0b1_1111 << (high - 6);
        if mask & run == run {
            return Rank::from_value(high);
        }
    }
    if mask & WHEEL == WHEEL {
        return Some(Rank::Five);
    }
    None
}

/// Оценка строго 5-карточной комбинации.
pub fn score_five(cards: &[Card; 5]) -> HandRank {
    let mut counts = [0u8; 15];
    let mut mask: RankMask = 0;
    let first_suit = cards[0].suit;
    let mut is_flush = true;

    for card in cards {
        counts[card.rank.value() as usize] += 1;
        mask |= 1 << (card.rank.value() - 2);
        if card.suit != first_suit {
            is_flush = false;
        }
    }

    // (count, rank), сначала по количеству, потом по рангу – оба по убыванию.
    let mut groups: Vec<(u8, Rank)> = Rank::ALL
        .iter()
        .rev()
        .filter(|r| counts[r.value() as usize] > 0)
        .map(|&r| (counts[r.value() as usize], r))
        .collect();
    groups.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

    let shape: Vec<u8> = groups.iter().map(|g| g.0).collect();
    let ordered: Vec<Rank> = groups.iter().map(|g| g.1).collect();
    let straight = straight_high(mask);

    let category = match (is_flush, straight, shape.as_slice()) {
        (true, Some(high), _) => {
            return HandRank::from_category_and_ranks(HandCategory::StraightFlush, &[high])
        }
        (_, _, [4, 1]) => HandCategory::FourOfAKind,
        (_, _, [3, 2]) => HandCategory::FullHouse,
        (true, None, _) => HandCategory::Flush,
        (false, Some(high), _) => {
            return HandRank::from_category_and_ranks(HandCategory::Straight, &[high])
        }
        (_, _, [3, 1, 1]) => HandCategory::ThreeOfAKind,
        (_, _, [2, 2, 1]) => HandCategory::TwoPair,
        (_, _, [2, 1, 1, 1]) => HandCategory::OnePair,
        _ => HandCategory::HighCard,
    };

    HandRank::from_category_and_ranks(category, &ordered)
}

/// Все сочетания `k` индексов из `0..n` в лексикографическом порядке.
pub fn index_combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(k);
    fn walk(start: usize, n: usize, k: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            if n - i < k - current.len() {
                break;
            }
            current.push(i);
            walk(i + 1, n, k, current, out);
            current.pop();
        }
    }
    walk(0, n, k, &mut current, &mut out);
    out
}

/// Лучшая хай-комбинация из любых 5 карт набора (Hold'em).
///
/// Возвращает None, если карт меньше пяти.
pub fn best_hi_any(cards: &[Card]) -> Option<(HandRank, [Card; 5])> {
    let mut best: Option<(HandRank, [Card; 5])> = None;
    for idx in index_combinations(cards.len(), 5) {
        let five = [cards[idx[0]], cards[idx[1]], cards[idx[2]], cards[idx[3]], cards[idx[4]]];
        let rank = score_five(&five);
        if best.map_or(true, |(b, _)| rank > b) {
            best = Some((rank, five));
        }
    }
    best
}
