//! Инфраструктура: хранилище чекпоинтов, RNG, конфиг, логи.

pub mod config;
pub mod logging;
pub mod persistence;
pub mod rng;
pub mod sink;

pub use config::{ConfigError, EngineConfig};
pub use logging::{init_logging, init_test_logging};
pub use persistence::{HandStateStore, InMemoryHandStateStore, PersistError};
pub use rng::{shuffled_deck, DeterministicRng, SystemRng};
pub use sink::{ChannelSink, MessageSink};
