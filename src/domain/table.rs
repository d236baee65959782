use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;
use crate::domain::hand::GameType;

/// Индекс места за столом (0..max_seats-1).
pub type SeatIndex = u8;

/// Конфиг стола: вариант игры, лимиты, рейк, флаги.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TableConfig {
    /// Код стола. Это же ключ чекпоинта в хранилище.
    pub table_code: String,
    pub game_type: GameType,
    /// Максимальное количество мест за столом (обычно 2–9).
    pub max_seats: u8,
    pub small_blind: Chips,
    pub big_blind: Chips,
    /// Процент рейка (5.0 = 5%). 0 – без рейка.
    pub rake_percentage: f64,
    /// Максимальный рейк с раздачи. 0 – без ограничения.
    pub rake_cap: Chips,
    /// Не брать рейк, если раздача закончилась до флопа.
    pub no_flop_no_drop: bool,
    /// Разрешён ли run-it-twice за этим столом.
    pub allow_run_it_twice: bool,
    /// Минимум игроков для старта раздачи.
    pub min_players: u8,
}

impl TableConfig {
    /// Конфиг без рейка с разумными дефолтами – удобно для тестов.
    pub fn new(table_code: impl Into<String>, game_type: GameType, small_blind: Chips, big_blind: Chips) -> Self {
        Self {
            table_code: table_code.into(),
            game_type,
            max_seats: 9,
            small_blind,
            big_blind,
            rake_percentage: 0.0,
            rake_cap: Chips::ZERO,
            no_flop_no_drop: false,
            allow_run_it_twice: true,
            min_players: 2,
        }
    }

    pub fn with_max_seats(mut self, max_seats: u8) -> Self {
        self.max_seats = max_seats;
        self
    }

    pub fn with_rake(mut self, percentage: f64, cap: Chips) -> Self {
        self.rake_percentage = percentage;
        self.rake_cap = cap;
        self
    }
}
