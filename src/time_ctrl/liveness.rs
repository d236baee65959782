//! Проверка живости соединений: ping по расписанию, ожидание pong.
//!
//! Потеря соединения – информационное событие, на раздачу не влияет:
//! ход за игрока всё равно сделает таймер.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::domain::PlayerId;
use crate::engine::notifications::{Notification, Outbound};
use crate::infra::sink::MessageSink;

use super::{LivenessEvent, TimerMessage};

#[derive(Debug)]
enum LivenessCommand {
    Watch(PlayerId),
    Unwatch(PlayerId),
    Pong { player_id: PlayerId, seq: u64 },
    Shutdown,
}

/// Состояние одного игрока.
#[derive(Debug, Default)]
struct Peer {
    /// Последний отправленный seq.
    seq: u64,
    /// Ждём pong на этот ping с такого момента.
    awaiting_since: Option<Instant>,
    lost: bool,
}

/// Параметры пинга.
#[derive(Clone, Copy, Debug)]
pub struct LivenessSettings {
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
}

/// Ручка проверки живости одного стола.
#[derive(Clone, Debug)]
pub struct NetworkLivenessCheck {
    tx: mpsc::UnboundedSender<LivenessCommand>,
}

impl NetworkLivenessCheck {
    pub fn spawn(
        table_code: String,
        settings: LivenessSettings,
        sink: Arc<dyn MessageSink>,
        out: mpsc::Sender<TimerMessage>,
    ) -> (NetworkLivenessCheck, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_liveness(table_code, settings, sink, rx, out));
        (NetworkLivenessCheck { tx }, handle)
    }

    /// Начать пинговать игрока.
    pub fn watch(&self, player_id: PlayerId) {
        self.send(LivenessCommand::Watch(player_id));
    }

    pub fn unwatch(&self, player_id: PlayerId) {
        self.send(LivenessCommand::Unwatch(player_id));
    }

    /// Пришёл pong от клиента.
    pub fn pong(&self, player_id: PlayerId, seq: u64) {
        self.send(LivenessCommand::Pong { player_id, seq });
    }

    pub fn shutdown(&self) {
        self.send(LivenessCommand::Shutdown);
    }

    fn send(&self, cmd: LivenessCommand) {
        if self.tx.send(cmd).is_err() {
            debug!("liveness check already stopped");
        }
    }
}

async fn run_liveness(
    table_code: String,
    settings: LivenessSettings,
    sink: Arc<dyn MessageSink>,
    mut rx: mpsc::UnboundedReceiver<LivenessCommand>,
    out: mpsc::Sender<TimerMessage>,
) {
    let mut peers: BTreeMap<PlayerId, Peer> = BTreeMap::new();
    let mut ticker = interval(settings.ping_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(LivenessCommand::Watch(player_id)) => {
                    peers.entry(player_id).or_default();
                }
                Some(LivenessCommand::Unwatch(player_id)) => {
                    peers.remove(&player_id);
                }
                Some(LivenessCommand::Pong { player_id, seq }) => {
                    let Some(peer) = peers.get_mut(&player_id) else { continue };
                    if seq > peer.seq {
                        continue;
                    }
                    peer.awaiting_since = None;
                    if peer.lost {
                        peer.lost = false;
                        info!(table = %table_code, player = player_id, "connectivity restored");
                        let event = TimerMessage::Liveness(LivenessEvent::ConnectivityRestored { player_id });
                        if out.send(event).await.is_err() {
                            break;
                        }
                    }
                }
                Some(LivenessCommand::Shutdown) | None => break,
            },
            _ = ticker.tick() => {
                let now = Instant::now();
                let mut lost_now = Vec::new();
                for (&player_id, peer) in peers.iter_mut() {
                    if let Some(since) = peer.awaiting_since {
                        if now.duration_since(since) < settings.pong_timeout {
                            continue;
                        }
                        if !peer.lost {
                            peer.lost = true;
                            lost_now.push(player_id);
                        }
                    }
                    peer.seq += 1;
                    peer.awaiting_since = Some(now);
                    sink.deliver(&table_code, &Outbound::to_player(player_id, Notification::Ping { seq: peer.seq }));
                }
                for player_id in lost_now {
                    info!(table = %table_code, player = player_id, "connectivity lost");
                    let event = TimerMessage::Liveness(LivenessEvent::ConnectivityLost { player_id });
                    if out.send(event).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}
