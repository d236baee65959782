use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;
use crate::domain::PlayerId;

/// Статус места за столом (не раздачи!).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SeatStatus {
    /// Игрок сидит и получает карты.
    Playing,
    /// Игрок сидит, но пропускает раздачи (sit out / вылетел в ноль).
    SittingOut,
}

/// Занятость места за столом: кто сидит, сколько фишек, хочет ли run-it-twice.
///
/// Живёт на уровне Game (стола), а не раздачи. Обновляется из внешнего
/// источника истины перед каждой раздачей (`PlayerRosterUpdate`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatPlayer {
    pub player_id: PlayerId,
    pub name: String,
    /// Текущий стек за столом.
    pub stack: Chips,
    pub status: SeatStatus,
    /// Игрок заранее согласен на run-it-twice.
    pub run_it_twice: bool,
}

impl SeatPlayer {
    pub fn new(player_id: PlayerId, name: impl Into<String>, stack: Chips) -> Self {
        Self {
            player_id,
            name: name.into(),
            stack,
            status: SeatStatus::Playing,
            run_it_twice: false,
        }
    }

    pub fn with_run_it_twice(mut self, opt_in: bool) -> Self {
        self.run_it_twice = opt_in;
        self
    }

    /// Может ли игрок получить карты в следующей раздаче.
    pub fn can_be_dealt(&self) -> bool {
        self.status == SeatStatus::Playing && !self.stack.is_zero()
    }
}
