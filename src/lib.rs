//! Оркестратор покерного стола: одна раздача за раз, переживает рестарт процесса.
//!
//! Слои:
//! - `domain` – карты, фишки, места, конфиг стола;
//! - `eval` – оценка рук (Hold'em, PLO, PLO Hi-Lo);
//! - `engine` – HandState и машина состояний раздачи;
//! - `time_ctrl` – часы хода и проверка живости соединений;
//! - `infra` – чекпоинты, RNG, конфиг, логи, транспорт;
//! - `game` – актор стола и реестр столов;
//! - `api` – представления раздачи для клиентов.

pub mod api;
pub mod domain;
pub mod engine;
pub mod eval;
pub mod game;
pub mod infra;
pub mod time_ctrl;

pub use engine::{EngineError, FlowState, HandState};
pub use game::{GameError, GameHandle, GameManager};
