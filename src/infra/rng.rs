use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};

use crate::domain::card::Card;
use crate::domain::deck::Deck;
use crate::engine::RandomSource;

/// Боевой RNG: `thread_rng`.
#[derive(Clone, Debug, Default)]
pub struct SystemRng;

impl RandomSource for SystemRng {
    fn shuffle_cards(&mut self, cards: &mut [Card]) {
        cards.shuffle(&mut thread_rng());
    }
}

/// Детерминированный RNG для тестов и реплея.
/// Позволяет воспроизводить одни и те же раздачи при одинаковом seed.
#[derive(Clone, Debug)]
pub struct DeterministicRng {
    inner: StdRng,
}

impl DeterministicRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for DeterministicRng {
    fn shuffle_cards(&mut self, cards: &mut [Card]) {
        cards.shuffle(&mut self.inner);
    }
}

/// Свежая перемешанная колода.
pub fn shuffled_deck(rng: &mut dyn RandomSource) -> Deck {
    let mut deck = Deck::standard_52();
    rng.shuffle_cards(&mut deck.cards);
    deck
}
