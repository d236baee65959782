//! Часы хода: один слот на стол.
//!
//! `reset` взводит таймер с абсолютным дедлайном, `pause` снимает.
//! По истечении таймер кладёт в mailbox стола сообщение, из которого
//! воркер делает ход по умолчанию – тем же путём, что и настоящий ход.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::domain::{Chips, HandNum, PlayerId, SeatIndex};
use crate::engine::actions::{ActionKind, PlayerActed};

use super::TimerMessage;

/// Зачем взведён таймер.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerPurpose {
    /// Ход места. По истечении – `default_action` (check или fold).
    Action {
        seat: SeatIndex,
        player_id: PlayerId,
        action_id: u32,
        default_action: ActionKind,
    },
    /// Ответ на предложение run-it-twice.
    RunItTwice,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerRequest {
    pub hand_num: HandNum,
    pub purpose: TimerPurpose,
    pub expires_at: DateTime<Utc>,
}

impl TimerRequest {
    /// Сообщение, которое уйдёт в mailbox при срабатывании.
    pub fn expiry_message(&self) -> TimerMessage {
        match &self.purpose {
            TimerPurpose::Action {
                seat,
                player_id,
                action_id,
                default_action,
            } => TimerMessage::ActionExpired(PlayerActed {
                message_id: PlayerActed::timeout_message_id(self.hand_num, *action_id),
                hand_num: self.hand_num,
                seat: *seat,
                player_id: *player_id,
                action: *default_action,
                amount: Chips::ZERO,
                timed_out: true,
            }),
            TimerPurpose::RunItTwice => TimerMessage::RunItTwiceExpired { hand_num: self.hand_num },
        }
    }
}

enum TimerCommand {
    Reset(TimerRequest),
    Pause,
    Shutdown,
}

/// Ручка таймера. Сам таймер живёт в отдельной задаче.
#[derive(Clone, Debug)]
pub struct ActionTimer {
    tx: mpsc::UnboundedSender<TimerCommand>,
}

impl std::fmt::Debug for TimerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerCommand::Reset(r) => write!(f, "Reset({:?})", r.purpose),
            TimerCommand::Pause => f.write_str("Pause"),
            TimerCommand::Shutdown => f.write_str("Shutdown"),
        }
    }
}

impl ActionTimer {
    /// Запустить задачу таймера. Срабатывания уходят в `out`.
    pub fn spawn(out: mpsc::Sender<TimerMessage>) -> (ActionTimer, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_timer(rx, out));
        (ActionTimer { tx }, handle)
    }

    /// Взвести (или перевзвести) таймер. Предыдущий слот теряется.
    pub fn reset(&self, request: TimerRequest) {
        self.send(TimerCommand::Reset(request));
    }

    /// Снять таймер: ход пришёл вовремя.
    pub fn pause(&self) {
        self.send(TimerCommand::Pause);
    }

    pub fn shutdown(&self) {
        self.send(TimerCommand::Shutdown);
    }

    fn send(&self, cmd: TimerCommand) {
        if self.tx.send(cmd).is_err() {
            debug!("action timer already stopped");
        }
    }
}

/// Абсолютное время -> tokio Instant. Прошедший дедлайн срабатывает сразу.
fn to_instant(expires_at: DateTime<Utc>) -> Instant {
    let left = (expires_at - Utc::now()).to_std().unwrap_or_default();
    Instant::now() + left
}

async fn run_timer(mut rx: mpsc::UnboundedReceiver<TimerCommand>, out: mpsc::Sender<TimerMessage>) {
    let mut armed: Option<(TimerRequest, Instant)> = None;

    loop {
        let deadline = armed.as_ref().map(|(_, at)| *at);
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(TimerCommand::Reset(request)) => {
                    let at = to_instant(request.expires_at);
                    armed = Some((request, at));
                }
                Some(TimerCommand::Pause) => armed = None,
                Some(TimerCommand::Shutdown) | None => break,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some((request, _)) = armed.take() {
                    debug!(hand = request.hand_num, purpose = ?request.purpose, "timer expired");
                    if out.send(request.expiry_message()).await.is_err() {
                        warn!("table mailbox closed, timer stops");
                        break;
                    }
                }
            }
        }
    }
}
