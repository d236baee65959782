use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::player::SeatPlayer;
use crate::domain::table::TableConfig;
use crate::engine::RandomSource;
use crate::infra::config::EngineConfig;
use crate::infra::persistence::HandStateStore;
use crate::infra::rng::SystemRng;
use crate::infra::sink::MessageSink;
use crate::time_ctrl::{ActionTimer, LivenessSettings, NetworkLivenessCheck};

use super::errors::GameError;
use super::handle::GameHandle;
use super::worker::{Game, GameParts, Mailboxes};

struct ManagedGame {
    handle: GameHandle,
    task: JoinHandle<()>,
}

/// Реестр столов процесса: создаёт воркеры, находит их по коду, закрывает.
pub struct GameManager {
    config: EngineConfig,
    store: Arc<dyn HandStateStore>,
    sink: Arc<dyn MessageSink>,
    games: RwLock<HashMap<String, ManagedGame>>,
}

impl GameManager {
    pub fn new(config: EngineConfig, store: Arc<dyn HandStateStore>, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            config,
            store,
            sink,
            games: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Запустить стол с системным RNG.
    pub fn create_game(&self, table: TableConfig, seats: Vec<Option<SeatPlayer>>) -> Result<GameHandle, GameError> {
        self.create_game_with_rng(table, seats, Box::new(SystemRng))
    }

    /// Запустить стол. Нужен работающий tokio runtime.
    pub fn create_game_with_rng(
        &self,
        table: TableConfig,
        seats: Vec<Option<SeatPlayer>>,
        rng: Box<dyn RandomSource>,
    ) -> Result<GameHandle, GameError> {
        self.spawn_game(table, seats, rng, false)
    }

    /// Поднять стол после рестарта. Воркер загружает чекпоинт до того,
    /// как начнёт разбирать mailbox'ы и сдавать новые раздачи.
    pub fn resume_game(&self, table: TableConfig, seats: Vec<Option<SeatPlayer>>) -> Result<GameHandle, GameError> {
        self.spawn_game(table, seats, Box::new(SystemRng), true)
    }

    fn spawn_game(
        &self,
        table: TableConfig,
        seats: Vec<Option<SeatPlayer>>,
        rng: Box<dyn RandomSource>,
        resume: bool,
    ) -> Result<GameHandle, GameError> {
        let code = table.table_code.clone();
        let mut games = self.games.write();
        if games.contains_key(&code) {
            return Err(GameError::TableAlreadyExists(code));
        }

        let capacity = self.config.mailbox_capacity.max(1);
        let (control_tx, control_rx) = mpsc::channel(capacity);
        let (action_tx, action_rx) = mpsc::channel(capacity);
        let (timer_tx, timer_rx) = mpsc::channel(capacity);

        let (timer, _timer_task) = ActionTimer::spawn(timer_tx.clone());
        let settings = LivenessSettings {
            ping_interval: Duration::from_millis(self.config.ping_interval_ms),
            pong_timeout: Duration::from_millis(self.config.pong_timeout_ms),
        };
        let (liveness, _liveness_task) =
            NetworkLivenessCheck::spawn(code.clone(), settings, Arc::clone(&self.sink), timer_tx);

        let game = Game::new(GameParts {
            table,
            config: self.config.clone(),
            seats,
            store: Arc::clone(&self.store),
            sink: Arc::clone(&self.sink),
            rng,
            timer,
            liveness: liveness.clone(),
            resume,
            mailboxes: Mailboxes {
                control: control_rx,
                action: action_rx,
                timer: timer_rx,
            },
        });
        let task = tokio::spawn(game.run());

        let handle = GameHandle::new(code.clone(), control_tx, action_tx, liveness);
        games.insert(
            code.clone(),
            ManagedGame {
                handle: handle.clone(),
                task,
            },
        );
        info!(table = %code, resume, "table registered");
        Ok(handle)
    }

    pub fn game(&self, table_code: &str) -> Result<GameHandle, GameError> {
        self.games
            .read()
            .get(table_code)
            .map(|g| g.handle.clone())
            .ok_or_else(|| GameError::TableNotFound(table_code.to_string()))
    }

    /// Остановить воркер и дождаться его завершения.
    pub async fn end_game(&self, table_code: &str) -> Result<(), GameError> {
        let managed = self
            .games
            .write()
            .remove(table_code)
            .ok_or_else(|| GameError::TableNotFound(table_code.to_string()))?;

        // Воркер мог уже выйти сам (стол закрыт статусом Ended).
        let _ = managed.handle.shutdown().await;
        if let Err(err) = managed.task.await {
            warn!(table = table_code, error = %err, "game task failed");
        }
        info!(table = table_code, "table removed");
        Ok(())
    }

    pub fn table_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.games.read().keys().cloned().collect();
        codes.sort();
        codes
    }
}
