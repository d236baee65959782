use tokio::sync::{mpsc, oneshot};

use crate::api::dto::HandView;
use crate::domain::player::SeatPlayer;
use crate::domain::{HandNum, PlayerId};
use crate::engine::actions::PlayerActed;
use crate::engine::hand_history::HandHistory;
use crate::time_ctrl::NetworkLivenessCheck;

use super::errors::GameError;
use super::messages::{ActionMessage, ControlMessage, GameStatus, HandSetup};

/// Ручка стола для внешнего мира. Дешёво клонируется.
#[derive(Clone, Debug)]
pub struct GameHandle {
    table_code: String,
    control_tx: mpsc::Sender<ControlMessage>,
    action_tx: mpsc::Sender<ActionMessage>,
    liveness: NetworkLivenessCheck,
}

impl GameHandle {
    pub(crate) fn new(
        table_code: String,
        control_tx: mpsc::Sender<ControlMessage>,
        action_tx: mpsc::Sender<ActionMessage>,
        liveness: NetworkLivenessCheck,
    ) -> Self {
        Self {
            table_code,
            control_tx,
            action_tx,
            liveness,
        }
    }

    pub fn table_code(&self) -> &str {
        &self.table_code
    }

    pub async fn send_control(&self, msg: ControlMessage) -> Result<(), GameError> {
        self.control_tx
            .send(msg)
            .await
            .map_err(|_| GameError::MailboxClosed(self.table_code.clone()))
    }

    async fn send_action(&self, msg: ActionMessage) -> Result<(), GameError> {
        self.action_tx
            .send(msg)
            .await
            .map_err(|_| GameError::MailboxClosed(self.table_code.clone()))
    }

    /// Отправить ход игрока. Результат придёт через транспорт (ack / отказ в логе).
    pub async fn player_acted(&self, acted: PlayerActed) -> Result<(), GameError> {
        self.send_action(ActionMessage::PlayerActed(acted)).await
    }

    /// Текущая раздача глазами `player_id` (None – наблюдатель).
    pub async fn query_hand_state(&self, player_id: Option<PlayerId>) -> Result<Option<HandView>, GameError> {
        let (reply, rx) = oneshot::channel();
        self.send_action(ActionMessage::QueryCurrentHand { player_id, reply }).await?;
        rx.await.map_err(|_| GameError::MailboxClosed(self.table_code.clone()))
    }

    /// Лог текущей раздачи, а если её нет – последней сыгранной.
    pub async fn hand_log(&self) -> Result<Option<HandHistory>, GameError> {
        let (reply, rx) = oneshot::channel();
        self.send_control(ControlMessage::GetHandLog { reply }).await?;
        rx.await.map_err(|_| GameError::MailboxClosed(self.table_code.clone()))
    }

    pub async fn deal_next_hand(&self) -> Result<(), GameError> {
        self.send_control(ControlMessage::DealNextHand).await
    }

    pub async fn setup_next_hand(&self, setup: HandSetup) -> Result<(), GameError> {
        self.send_control(ControlMessage::SetupNextHand(setup)).await
    }

    pub async fn move_to_next_hand(&self, hand_num: HandNum) -> Result<(), GameError> {
        self.send_control(ControlMessage::MoveToNextHand { hand_num }).await
    }

    pub async fn update_roster(&self, seats: Vec<Option<SeatPlayer>>) -> Result<(), GameError> {
        self.send_control(ControlMessage::PlayerRosterUpdate { seats }).await
    }

    pub async fn set_status(&self, status: GameStatus, pending_updates: bool) -> Result<(), GameError> {
        self.send_control(ControlMessage::GameStatusChanged { status, pending_updates })
            .await
    }

    pub async fn resume(&self) -> Result<(), GameError> {
        self.send_control(ControlMessage::Resume).await
    }

    /// Ответ клиента на ping. Идёт мимо mailbox стола.
    pub fn pong(&self, player_id: PlayerId, seq: u64) {
        self.liveness.pong(player_id, seq);
    }

    pub async fn shutdown(&self) -> Result<(), GameError> {
        self.send_control(ControlMessage::Shutdown).await
    }
}
