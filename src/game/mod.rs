//! Уровень стола: актор `Game` владеет HandState и гоняет его по переходам.
//!
//! Снаружи со столом говорят только через `GameHandle`.

pub mod errors;
pub mod handle;
pub mod manager;
pub mod messages;
pub mod worker;

pub use errors::GameError;
pub use handle::GameHandle;
pub use manager::GameManager;
pub use messages::{ActionMessage, ControlMessage, GameStatus, HandSetup};
pub use worker::Game;
