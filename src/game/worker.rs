//! Воркер стола: единственная задача, которая трогает HandState.
//!
//! Сначала сохраняем чекпоинт, потом рассылаем: падение между записью и
//! рассылкой даёт повторную рассылку после рестарта, но не потерю.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::api::dto::hand_view_for;
use crate::domain::deck::Deck;
use crate::domain::player::{SeatPlayer, SeatStatus};
use crate::domain::table::TableConfig;
use crate::domain::{HandNum, PlayerId, SeatIndex};
use crate::engine::actions::PlayerActed;
use crate::engine::flow::FlowState;
use crate::engine::hand_history::HandHistory;
use crate::engine::hand_state::{HandState, NewHandParams};
use crate::engine::notifications::{Notification, Outbound};
use crate::engine::transitions::{self, ActedOutcome, StepResult};
use crate::engine::{EngineError, RandomSource};
use crate::infra::config::EngineConfig;
use crate::infra::persistence::HandStateStore;
use crate::infra::rng::shuffled_deck;
use crate::infra::sink::MessageSink;
use crate::time_ctrl::{ActionTimer, LivenessEvent, NetworkLivenessCheck, TimerMessage, TimerPurpose, TimerRequest};

use super::messages::{ActionMessage, ControlMessage, GameStatus, HandSetup};

/// Входящие mailbox'ы воркера.
pub(crate) struct Mailboxes {
    pub control: mpsc::Receiver<ControlMessage>,
    pub action: mpsc::Receiver<ActionMessage>,
    pub timer: mpsc::Receiver<TimerMessage>,
}

/// Что делать после обработки команды.
#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Оркестратор одного стола.
pub struct Game {
    table: TableConfig,
    config: EngineConfig,
    seats: Vec<Option<SeatPlayer>>,
    hand: Option<HandState>,
    last_hand_num: HandNum,
    prev_button: Option<SeatIndex>,
    last_log: Option<HandHistory>,
    status: GameStatus,
    awaiting_roster: bool,
    pending_roster: Option<Vec<Option<SeatPlayer>>>,
    next_setup: Option<HandSetup>,
    next_hand_at: Option<Instant>,
    /// Чекпоинт не записался: стоим, пока не придёт `Resume`.
    stalled: bool,
    store: Arc<dyn HandStateStore>,
    sink: Arc<dyn MessageSink>,
    rng: Box<dyn RandomSource>,
    timer: ActionTimer,
    liveness: NetworkLivenessCheck,
    resume_on_start: bool,
    mailboxes: Mailboxes,
}

pub(crate) struct GameParts {
    pub table: TableConfig,
    pub config: EngineConfig,
    pub seats: Vec<Option<SeatPlayer>>,
    pub store: Arc<dyn HandStateStore>,
    pub sink: Arc<dyn MessageSink>,
    pub rng: Box<dyn RandomSource>,
    pub timer: ActionTimer,
    pub liveness: NetworkLivenessCheck,
    /// Поднять чекпоинт до первого сообщения.
    pub resume: bool,
    pub mailboxes: Mailboxes,
}

impl Game {
    pub(crate) fn new(parts: GameParts) -> Self {
        let mut seats = parts.seats;
        seats.resize(parts.table.max_seats as usize, None);
        Self {
            table: parts.table,
            config: parts.config,
            seats,
            hand: None,
            last_hand_num: 0,
            prev_button: None,
            last_log: None,
            status: GameStatus::Active,
            awaiting_roster: false,
            pending_roster: None,
            next_setup: None,
            next_hand_at: None,
            stalled: false,
            store: parts.store,
            sink: parts.sink,
            rng: parts.rng,
            timer: parts.timer,
            liveness: parts.liveness,
            resume_on_start: parts.resume,
            mailboxes: parts.mailboxes,
        }
    }

    fn code(&self) -> &str {
        &self.table.table_code
    }

    /// Главный цикл: команды стола важнее таймеров, таймеры важнее ходов.
    pub async fn run(mut self) {
        info!(table = %self.code(), "game started");
        self.watch_roster();
        if self.resume_on_start {
            self.resume().await;
        }
        let idle = Duration::from_millis(self.config.idle_poll_ms.max(1));

        loop {
            tokio::select! {
                biased;
                msg = self.mailboxes.control.recv() => match msg {
                    Some(msg) => {
                        if self.on_control(msg).await == Flow::Stop {
                            break;
                        }
                    }
                    None => break,
                },
                Some(msg) = self.mailboxes.timer.recv() => self.on_timer(msg).await,
                Some(msg) = self.mailboxes.action.recv() => self.on_action(msg).await,
                _ = sleep(idle) => {
                    if self.on_idle().await == Flow::Stop {
                        break;
                    }
                }
            }
        }

        self.timer.shutdown();
        self.liveness.shutdown();
        info!(table = %self.code(), "game stopped");
    }

    async fn on_control(&mut self, msg: ControlMessage) -> Flow {
        match msg {
            ControlMessage::DealNextHand => {
                if self.hand.is_some() {
                    debug!(table = %self.code(), "deal requested while hand in progress");
                } else if self.awaiting_roster {
                    debug!(table = %self.code(), "deal requested while waiting for roster update");
                } else {
                    self.start_hand().await;
                }
            }
            ControlMessage::SetupNextHand(setup) => {
                self.next_setup = Some(setup);
            }
            ControlMessage::MoveToNextHand { hand_num } => {
                let ready = self
                    .hand
                    .as_ref()
                    .map_or(false, |h| h.hand_num == hand_num && h.flow_state == FlowState::MoveToNextHand);
                if ready {
                    return self.finish_hand().await;
                }
                debug!(table = %self.code(), hand = hand_num, "move to next hand ignored");
            }
            ControlMessage::Resume => self.resume().await,
            ControlMessage::GetHandLog { reply } => {
                let log = self.hand.as_ref().map(|h| h.log.clone()).or_else(|| self.last_log.clone());
                let _ = reply.send(log);
            }
            ControlMessage::PlayerRosterUpdate { seats } => return self.on_roster_update(seats).await,
            ControlMessage::GameStatusChanged { status, pending_updates } => {
                info!(table = %self.code(), ?status, pending_updates, "game status changed");
                self.status = status;
                self.awaiting_roster = pending_updates;
                if status == GameStatus::Ended && self.hand.is_none() {
                    return Flow::Stop;
                }
            }
            ControlMessage::Shutdown => return Flow::Stop,
        }
        Flow::Continue
    }

    async fn on_action(&mut self, msg: ActionMessage) {
        match msg {
            ActionMessage::PlayerActed(acted) => self.on_player_acted(acted).await,
            ActionMessage::QueryCurrentHand { player_id, reply } => {
                let view = self.hand.as_ref().map(|h| hand_view_for(h, player_id));
                let _ = reply.send(view);
            }
        }
    }

    async fn on_timer(&mut self, msg: TimerMessage) {
        match msg {
            TimerMessage::ActionExpired(acted) => {
                info!(table = %self.code(), hand = acted.hand_num, seat = acted.seat, "action timed out");
                self.on_player_acted(acted).await;
            }
            TimerMessage::RunItTwiceExpired { hand_num } => {
                let now = Utc::now();
                let Some(hand) = self.hand.as_mut() else { return };
                if hand.hand_num != hand_num {
                    return;
                }
                match transitions::on_run_it_twice_timeout(hand, now) {
                    Ok(()) => {
                        if self.commit().await {
                            self.drive().await;
                        }
                    }
                    Err(err) => debug!(table = %self.table.table_code, error = %err, "run-it-twice timeout ignored"),
                }
            }
            TimerMessage::Liveness(event) => {
                let message = match event {
                    LivenessEvent::ConnectivityLost { player_id } => Notification::PlayerConnectivityLost { player_id },
                    LivenessEvent::ConnectivityRestored { player_id } => {
                        Notification::PlayerConnectivityRestored { player_id }
                    }
                };
                self.sink.deliver(&self.table.table_code, &Outbound::all(message));
            }
        }
    }

    /// Пока раздачи нет – проверяем, не пора ли сдавать.
    async fn on_idle(&mut self) -> Flow {
        if self.hand.is_some() || self.stalled || self.awaiting_roster {
            return Flow::Continue;
        }
        match self.status {
            GameStatus::Ended => return Flow::Stop,
            GameStatus::Paused => return Flow::Continue,
            GameStatus::Active => {}
        }
        if !self.config.auto_deal {
            return Flow::Continue;
        }
        if self.next_hand_at.map_or(false, |at| Instant::now() < at) {
            return Flow::Continue;
        }
        self.start_hand().await;
        Flow::Continue
    }

    async fn on_player_acted(&mut self, acted: PlayerActed) {
        if self.stalled {
            warn!(table = %self.code(), "table stalled, action dropped");
            return;
        }
        let now = Utc::now();
        let Some(hand) = self.hand.as_mut() else {
            debug!(table = %self.table.table_code, "action without hand");
            return;
        };

        let seat = acted.seat;
        match transitions::on_player_acted(hand, acted, now) {
            Ok(ActedOutcome::Accepted) => {
                self.timer.pause();
                if self.commit().await {
                    self.drive().await;
                }
            }
            Ok(ActedOutcome::Acknowledged(ack)) => {
                debug!(table = %self.table.table_code, seat, "duplicate action acknowledged");
                self.sink.deliver(&self.table.table_code, &ack);
            }
            Err(err) => {
                warn!(table = %self.table.table_code, hand = hand.hand_num, seat, error = %err, "action rejected");
            }
        }
    }

    /// Начать новую раздачу, если хватает игроков.
    async fn start_hand(&mut self) {
        // Сценарий снимается только после удачного старта раздачи.
        let (deck, button_override) = match &self.next_setup {
            Some(setup) => (Deck::from_dealing_order(setup.deck.clone()), setup.button),
            None => (shuffled_deck(self.rng.as_mut()), None),
        };

        let hand_num = self.last_hand_num + 1;
        let params = NewHandParams {
            config: &self.table,
            time_rules: &self.config.time_rules,
            hand_num,
            seats: &self.seats,
            deck,
            prev_button: self.prev_button,
            button_override,
        };

        match HandState::new(params) {
            Ok(state) => {
                info!(table = %self.code(), hand = hand_num, button = state.button_pos, "new hand");
                self.next_setup = None;
                self.last_hand_num = hand_num;
                self.hand = Some(state);
                if self.commit().await {
                    self.drive().await;
                }
            }
            Err(EngineError::NotEnoughPlayers) => {
                debug!(table = %self.code(), "waiting for players");
            }
            Err(err) if self.next_setup.is_some() => {
                warn!(table = %self.code(), error = %err, "hand setup rejected");
                self.next_setup = None;
            }
            Err(err) => warn!(table = %self.code(), error = %err, "cannot start hand"),
        }
    }

    /// Прогнать автоматические переходы до ожидания ввода.
    async fn drive(&mut self) {
        loop {
            let now = Utc::now();
            let Some(hand) = self.hand.as_mut() else { return };

            match transitions::step(hand, now) {
                Ok(StepResult::Advanced) => {
                    if !self.commit().await {
                        return;
                    }
                }
                Ok(StepResult::Waiting) => break,
                Err(err) => {
                    warn!(table = %self.table.table_code, hand = hand.hand_num, flow = %hand.flow_state, error = %err, "transition failed");
                    if !self.commit().await {
                        return;
                    }
                    break;
                }
            }
        }

        self.arm_timer();

        let finished = self
            .hand
            .as_ref()
            .map_or(false, |h| h.flow_state == FlowState::MoveToNextHand);
        if finished && self.config.auto_deal {
            // Stop здесь невозможен: закрытие стола проверяется в on_idle.
            let _ = self.finish_hand().await;
        }
    }

    /// Сохранить чекпоинт, затем отдать outbox транспорту.
    async fn commit(&mut self) -> bool {
        if !self.save_checkpoint().await {
            return false;
        }
        if let Some(hand) = self.hand.as_mut() {
            for outbound in hand.take_outbox() {
                self.sink.deliver(&self.table.table_code, &outbound);
            }
        }
        true
    }

    /// Запись с ограниченным числом попыток. Неудача – стол встаёт.
    async fn save_checkpoint(&mut self) -> bool {
        let Some(hand) = self.hand.as_ref() else { return true };
        let attempts = self.config.persist_retry_attempts.max(1);

        for attempt in 1..=attempts {
            match self.store.save(&self.table.table_code, hand) {
                Ok(()) => {
                    self.stalled = false;
                    return true;
                }
                Err(err) => {
                    warn!(table = %self.table.table_code, hand = hand.hand_num, attempt, error = %err, "checkpoint save failed");
                    if attempt < attempts {
                        let backoff = self.config.persist_retry_backoff_ms * attempt as u64;
                        sleep(Duration::from_millis(backoff)).await;
                    }
                }
            }
        }

        error!(table = %self.table.table_code, hand = hand.hand_num, "checkpoint not saved, table stalled");
        self.stalled = true;
        self.timer.pause();
        false
    }

    /// Таймер под текущее состояние.
    fn arm_timer(&self) {
        let Some(hand) = self.hand.as_ref() else {
            self.timer.pause();
            return;
        };

        match hand.flow_state {
            FlowState::WaitForNextAction => {
                if let Some(next) = &hand.next_seat_action {
                    self.timer.reset(TimerRequest {
                        hand_num: hand.hand_num,
                        purpose: TimerPurpose::Action {
                            seat: next.seat,
                            player_id: next.player_id,
                            action_id: next.action_id,
                            default_action: next.default_action(),
                        },
                        expires_at: next.expires_at,
                    });
                }
            }
            FlowState::RunItTwiceUpPrompt => {
                if let Some(prompt) = &hand.run_it_twice {
                    self.timer.reset(TimerRequest {
                        hand_num: hand.hand_num,
                        purpose: TimerPurpose::RunItTwice,
                        expires_at: prompt.expires_at,
                    });
                }
            }
            _ => self.timer.pause(),
        }
    }

    /// Раздача доиграна: стеки в места, чекпоинт удаляется.
    async fn finish_hand(&mut self) -> Flow {
        let Some(hand) = self.hand.as_mut() else { return Flow::Continue };

        if self.awaiting_roster && hand.flow_state == FlowState::MoveToNextHand {
            hand.flow_state = FlowState::WaitForPendingUpdate;
            info!(table = %self.table.table_code, hand = hand.hand_num, "waiting for roster update");
            self.apply_hand_stacks();
            self.save_checkpoint().await;
            return Flow::Continue;
        }

        if hand.flow_state == FlowState::MoveToNextHand {
            self.apply_hand_stacks();
        }

        let Some(hand) = self.hand.take() else { return Flow::Continue };
        self.prev_button = Some(hand.button_pos);
        self.last_hand_num = self.last_hand_num.max(hand.hand_num);
        if let Err(err) = self.store.remove(&self.table.table_code) {
            warn!(table = %self.table.table_code, hand = hand.hand_num, error = %err, "checkpoint not removed");
        }
        self.last_log = Some(hand.log);

        if let Some(seats) = self.pending_roster.take() {
            self.apply_roster(seats);
        }

        self.next_hand_at = Some(Instant::now() + Duration::from_millis(self.config.pause_between_hands_ms));
        if self.status == GameStatus::Ended {
            return Flow::Stop;
        }
        Flow::Continue
    }

    /// Перенести стеки раздачи в места стола. Вылетевшие садятся в sit-out.
    fn apply_hand_stacks(&mut self) {
        let Some(hand) = self.hand.as_ref() else { return };
        for (idx, player) in hand.players_in_seats.iter().enumerate() {
            let Some(player_id) = player else { continue };
            let Some(Some(seat)) = self.seats.get_mut(idx) else { continue };
            if seat.player_id != *player_id {
                continue;
            }
            seat.stack = hand.stacks[idx];
            if seat.stack.is_zero() {
                info!(table = %self.table.table_code, player = seat.player_id, "player busted, sitting out");
                seat.status = SeatStatus::SittingOut;
            }
        }
    }

    async fn on_roster_update(&mut self, seats: Vec<Option<SeatPlayer>>) -> Flow {
        let flow = self.hand.as_ref().map(|h| h.flow_state);
        match flow {
            None => {
                self.awaiting_roster = false;
                self.apply_roster(seats);
            }
            Some(FlowState::WaitForPendingUpdate) => {
                self.awaiting_roster = false;
                self.pending_roster = Some(seats);
                return self.finish_hand().await;
            }
            Some(_) => {
                debug!(table = %self.code(), "roster update deferred until hand ends");
                self.pending_roster = Some(seats);
            }
        }
        Flow::Continue
    }

    fn apply_roster(&mut self, mut seats: Vec<Option<SeatPlayer>>) {
        seats.resize(self.table.max_seats as usize, None);
        let before: Vec<PlayerId> = self.seats.iter().flatten().map(|p| p.player_id).collect();
        let after: Vec<PlayerId> = seats.iter().flatten().map(|p| p.player_id).collect();
        for gone in before.iter().filter(|p| !after.contains(p)) {
            self.liveness.unwatch(*gone);
        }
        for new in after.iter().filter(|p| !before.contains(p)) {
            self.liveness.watch(*new);
        }
        self.seats = seats;
    }

    fn watch_roster(&self) {
        for player in self.seats.iter().flatten() {
            self.liveness.watch(player.player_id);
        }
    }

    /// Поднять раздачу из чекпоинта и войти в машину состояний по сохранённому FlowState.
    async fn resume(&mut self) {
        if self.stalled {
            info!(table = %self.code(), "retrying stalled checkpoint");
            if self.commit().await {
                self.drive().await;
            }
            return;
        }
        if self.hand.is_some() {
            debug!(table = %self.code(), "resume ignored, hand in memory");
            return;
        }

        let loaded = match self.store.load(&self.table.table_code) {
            Ok(loaded) => loaded,
            Err(err) => {
                error!(table = %self.code(), error = %err, "checkpoint load failed");
                return;
            }
        };
        let Some(mut state) = loaded else {
            debug!(table = %self.code(), "no checkpoint to resume");
            return;
        };

        info!(table = %self.code(), hand = state.hand_num, flow = %state.flow_state, "resuming hand");
        self.last_hand_num = state.hand_num;
        self.prev_button = Some(state.button_pos);

        if let Err(err) = transitions::resume(&mut state, Utc::now()) {
            warn!(table = %self.code(), error = %err, "resume transition failed");
        }
        let flow = state.flow_state;
        self.hand = Some(state);

        match flow {
            FlowState::MoveToNextHand | FlowState::WaitForPendingUpdate => {
                // Стеки уже в чекпоинте; места обновляем из него.
                if self.commit().await {
                    if flow == FlowState::WaitForPendingUpdate {
                        self.awaiting_roster = true;
                        self.apply_hand_stacks();
                    } else {
                        let _ = self.finish_hand().await;
                    }
                }
            }
            _ => {
                if self.commit().await {
                    self.drive().await;
                }
            }
        }
    }
}
