//! Исходящие сообщения стола. Транспорт сам решает, как их доставить.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::card::Card;
use crate::domain::chips::Chips;
use crate::domain::hand::{GameType, Street};
use crate::domain::{HandNum, PlayerId, SeatIndex};
use crate::engine::actions::ActionKind;
use crate::engine::next_action::NextSeatAction;
use crate::engine::pot::Pot;
use crate::engine::showdown::HandResult;

/// Кому адресовано сообщение.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Recipient {
    /// Всем за столом (и наблюдателям).
    All,
    /// Только одному игроку.
    Player(PlayerId),
}

/// Баланс места: стек и ставка текущего раунда.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatBalance {
    pub seat: SeatIndex,
    pub player_id: PlayerId,
    pub stack: Chips,
    pub bet: Chips,
}

/// Открытые карманные карты места.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShownHand {
    pub seat: SeatIndex,
    pub player_id: PlayerId,
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Notification {
    NewHand {
        hand_num: HandNum,
        game_type: GameType,
        button: SeatIndex,
        small_blind: (SeatIndex, Chips),
        big_blind: (SeatIndex, Chips),
        balances: Vec<SeatBalance>,
    },
    /// Карманные карты. Всегда адресно: у каждого игрока свои.
    CardsDealt {
        hand_num: HandNum,
        seat: SeatIndex,
        cards: Vec<Card>,
    },
    YourAction(NextSeatAction),
    /// Всем: чей ход и до какого момента.
    NextAction {
        hand_num: HandNum,
        seat: SeatIndex,
        player_id: PlayerId,
        expires_at: DateTime<Utc>,
    },
    ActionAck {
        hand_num: HandNum,
        message_id: String,
    },
    ActionChanged {
        hand_num: HandNum,
        seat: SeatIndex,
        player_id: PlayerId,
        action: ActionKind,
        amount: Chips,
        timed_out: bool,
        pots: Vec<Pot>,
        balances: Vec<SeatBalance>,
    },
    /// Флоп / тёрн / ривер.
    BoardRevealed {
        hand_num: HandNum,
        street: Street,
        board: Vec<Card>,
        pots: Vec<Pot>,
        balances: Vec<SeatBalance>,
    },
    /// Ходов больше не будет: карты открываются, борд докладывается.
    NoMoreActions {
        hand_num: HandNum,
        hands: Vec<ShownHand>,
        pots: Vec<Pot>,
    },
    RunItTwicePrompt {
        hand_num: HandNum,
        seats: Vec<SeatIndex>,
        expires_at: DateTime<Utc>,
    },
    RunItTwiceDecision {
        hand_num: HandNum,
        confirmed: bool,
    },
    RunItTwiceBoards {
        hand_num: HandNum,
        board1: Vec<Card>,
        board2: Vec<Card>,
    },
    HandResult(HandResult),
    HandEnded {
        hand_num: HandNum,
    },
    Ping {
        seq: u64,
    },
    PlayerConnectivityLost {
        player_id: PlayerId,
    },
    PlayerConnectivityRestored {
        player_id: PlayerId,
    },
}

/// Сообщение + адресат.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Outbound {
    pub to: Recipient,
    pub message: Notification,
}

impl Outbound {
    pub fn all(message: Notification) -> Self {
        Self {
            to: Recipient::All,
            message,
        }
    }

    pub fn to_player(player_id: PlayerId, message: Notification) -> Self {
        Self {
            to: Recipient::Player(player_id),
            message,
        }
    }
}
