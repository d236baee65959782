//! Лоу-рука A-5, "8 or better": стриты и флеши не мешают, туз = 1.

use crate::domain::card::Card;
use crate::domain::hand::LowRank;

/// Оценить 5 карт как лоу. None – рука не квалифицируется
/// (есть пара или карта старше восьмёрки).
///
/// Кодирование: значения по убыванию, по 4 бита на карту, старшая карта
/// в старших битах. Меньшее число = лучшая лоу-рука.
pub fn score_low(cards: &[Card; 5]) -> Option<LowRank> {
    let mut values: Vec<u8> = cards.iter().map(|c| c.rank.low_value()).collect();
    values.sort_unstable_by(|a, b| b.cmp(a));

    if values[0] > 8 {
        return None;
    }
    if values.windows(2).any(|w| w[0] == w[1]) {
        return None;
    }

    let encoded = values.iter().fold(0u32, |acc, &v| (acc << 4) | v as u32);
    Some(LowRank(encoded))
}
