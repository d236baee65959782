use core::fmt;

use serde::{Deserialize, Serialize};

/// Улица раздачи.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Street {
    /// Сколько карт борда открыто на этой улице.
    pub fn board_len(self) -> usize {
        match self {
            Street::Preflop => 0,
            Street::Flop => 3,
            Street::Turn => 4,
            Street::River | Street::Showdown => 5,
        }
    }

    /// Следующая улица (Showdown – терминальная).
    pub fn next(self) -> Street {
        match self {
            Street::Preflop => Street::Flop,
            Street::Flop => Street::Turn,
            Street::Turn => Street::River,
            Street::River | Street::Showdown => Street::Showdown,
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Street::Preflop => "PREFLOP",
            Street::Flop => "FLOP",
            Street::Turn => "TURN",
            Street::River => "RIVER",
            Street::Showdown => "SHOWDOWN",
        };
        f.write_str(s)
    }
}

/// Вариант игры за столом. Выбирается один раз на раздачу.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GameType {
    /// No-limit Texas Hold'em.
    Holdem,
    /// Pot-limit Omaha.
    Plo,
    /// Pot-limit Omaha Hi-Lo (8 or better).
    PloHiLo,
}

impl GameType {
    /// Сколько карманных карт получает каждый игрок.
    pub fn hole_cards(self) -> usize {
        match self {
            GameType::Holdem => 2,
            GameType::Plo | GameType::PloHiLo => 4,
        }
    }

    /// Рейзы ограничены размером банка.
    pub fn is_pot_limit(self) -> bool {
        matches!(self, GameType::Plo | GameType::PloHiLo)
    }

    /// Банк делится между хай и лоу.
    pub fn has_low(self) -> bool {
        matches!(self, GameType::PloHiLo)
    }
}

/// Сила хай-руки: чем больше значение, тем сильнее рука.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandRank(pub u32);

/// Сила лоу-руки (A-5, 8 or better): чем МЕНЬШЕ значение, тем лучше.
///
/// Существует только для квалифицированных лоу-рук.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LowRank(pub u32);
