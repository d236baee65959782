//! Поиск мест по кругу (по часовой стрелке): кнопка, блайнды, следующий ходящий.
//!
//! Все функции возвращают `Result`/`Option` – "мало игроков" решает вызывающий.

use serde::{Deserialize, Serialize};

use crate::domain::SeatIndex;
use crate::engine::errors::EngineError;

/// Найти следующее место по кругу, удовлетворяющее `pred` (включая/исключая start).
pub fn next_seat_where<F>(max_seats: u8, start: SeatIndex, include_start: bool, pred: F) -> Option<SeatIndex>
where
    F: Fn(SeatIndex) -> bool,
{
    let max = max_seats as usize;
    if max == 0 {
        return None;
    }

    let mut idx = start as usize % max;
    if !include_start {
        idx = (idx + 1) % max;
    }

    for _ in 0..max {
        if pred(idx as SeatIndex) {
            return Some(idx as SeatIndex);
        }
        idx = (idx + 1) % max;
    }

    None
}

/// Все места, удовлетворяющие `pred`, по кругу начиная со `start` (включительно).
pub fn seats_clockwise_from<F>(max_seats: u8, start: SeatIndex, pred: F) -> Vec<SeatIndex>
where
    F: Fn(SeatIndex) -> bool,
{
    let max = max_seats as usize;
    let mut seats = Vec::new();
    if max == 0 {
        return seats;
    }

    let mut idx = start as usize % max;
    for _ in 0..max {
        if pred(idx as SeatIndex) {
            seats.push(idx as SeatIndex);
        }
        idx = (idx + 1) % max;
    }

    seats
}

/// Следующая позиция кнопки:
/// - если кнопка уже была – следующее место, получающее карты;
/// - если нет – первое такое место с нуля.
pub fn next_button(dealt: &[bool], prev_button: Option<SeatIndex>) -> Result<SeatIndex, EngineError> {
    let max = dealt.len() as u8;
    let is_dealt = |s: SeatIndex| dealt.get(s as usize).copied().unwrap_or(false);
    let found = match prev_button {
        Some(button) => next_seat_where(max, button, false, is_dealt),
        None => next_seat_where(max, 0, true, is_dealt),
    };
    found.ok_or(EngineError::NoButtonSeat)
}

/// Кнопка и блайнды одной раздачи.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlindPositions {
    pub button: SeatIndex,
    pub small_blind: SeatIndex,
    pub big_blind: SeatIndex,
}

/// Позиции блайндов от кнопки.
///
/// Хедз-ап: кнопка ставит SB, второй игрок – BB.
pub fn blind_positions(dealt: &[bool], button: SeatIndex) -> Result<BlindPositions, EngineError> {
    let max = dealt.len() as u8;
    let is_dealt = |s: SeatIndex| dealt.get(s as usize).copied().unwrap_or(false);
    let players = dealt.iter().filter(|d| **d).count();
    if players < 2 {
        return Err(EngineError::NotEnoughPlayers);
    }
    if !is_dealt(button) {
        return Err(EngineError::NoButtonSeat);
    }

    let small_blind = if players == 2 {
        button
    } else {
        next_seat_where(max, button, false, is_dealt).ok_or(EngineError::NotEnoughPlayers)?
    };
    let big_blind = next_seat_where(max, small_blind, false, is_dealt).ok_or(EngineError::NotEnoughPlayers)?;

    Ok(BlindPositions {
        button,
        small_blind,
        big_blind,
    })
}
