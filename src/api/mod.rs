//! Внешнее представление раздачи: то, что видит клиент за столом.

pub mod dto;

pub use dto::{hand_view_for, HandView, SeatView};
