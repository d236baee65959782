use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::api::dto::HandView;
use crate::domain::card::Card;
use crate::domain::player::SeatPlayer;
use crate::domain::{HandNum, PlayerId, SeatIndex};
use crate::engine::actions::PlayerActed;
use crate::engine::hand_history::HandHistory;

/// Подмена колоды и кнопки для следующей раздачи (тесты, боты).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandSetup {
    /// Карты в порядке раздачи: сначала карманные по кругу, потом борд.
    pub deck: Vec<Card>,
    pub button: Option<SeatIndex>,
}

/// Статус стола, который задаёт внешний источник истины.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum GameStatus {
    Active,
    /// Текущая раздача доигрывается, новые не сдаются.
    Paused,
    /// После текущей раздачи стол закрывается.
    Ended,
}

/// Команды стола.
#[derive(Debug)]
pub enum ControlMessage {
    DealNextHand,
    SetupNextHand(HandSetup),
    /// Закрыть раздачу `hand_num` (когда следующую сдаёт внешний планировщик).
    MoveToNextHand { hand_num: HandNum },
    /// Поднять раздачу из чекпоинта (или повторить упавшую запись).
    Resume,
    GetHandLog { reply: oneshot::Sender<Option<HandHistory>> },
    /// Новый состав мест. Посреди раздачи откладывается до её конца.
    PlayerRosterUpdate { seats: Vec<Option<SeatPlayer>> },
    /// `pending_updates`: перед следующей раздачей ждать `PlayerRosterUpdate`.
    GameStatusChanged { status: GameStatus, pending_updates: bool },
    Shutdown,
}

/// Сообщения уровня раздачи.
#[derive(Debug)]
pub enum ActionMessage {
    PlayerActed(PlayerActed),
    /// `player_id` – кто спрашивает: его карты видны, чужие скрыты.
    QueryCurrentHand {
        player_id: Option<PlayerId>,
        reply: oneshot::Sender<Option<HandView>>,
    },
}
