//! Доменная модель стола: карты, фишки, места, конфиг стола, вариант игры.

pub mod card;
pub mod chips;
pub mod deck;
pub mod hand;
pub mod player;
pub mod table;

/// Идентификатор игрока (приходит снаружи, из системы аккаунтов).
pub type PlayerId = u64;

/// Номер раздачи за столом (монотонно растёт).
pub type HandNum = u32;

pub use card::*;
pub use chips::*;
pub use deck::*;
pub use hand::*;
pub use player::*;
pub use table::*;
