use serde::{Deserialize, Serialize};

use crate::domain::card::Card;
use crate::domain::chips::Chips;
use crate::domain::hand::{GameType, Street};
use crate::domain::{HandNum, PlayerId, SeatIndex};
use crate::engine::actions::ActionKind;
use crate::engine::pot::Pot;

/// Тип события в раздаче.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum HandEventKind {
    /// Новая раздача началась.
    HandStarted {
        table_code: String,
        hand_num: HandNum,
        game_type: GameType,
    },

    /// Кнопка/блайнды.
    BlindsPosted {
        button: SeatIndex,
        small_blind: (SeatIndex, Chips),
        big_blind: (SeatIndex, Chips),
    },

    /// Игрок получил карманные карты.
    HoleCardsDealt { seat: SeatIndex, cards: Vec<Card> },

    /// Действие игрока.
    PlayerActed {
        player_id: PlayerId,
        seat: SeatIndex,
        action: ActionKind,
        amount: Chips,
        new_stack: Chips,
        timed_out: bool,
    },

    /// Неуравненная часть ставки вернулась владельцу.
    UncalledReturned { seat: SeatIndex, amount: Chips },

    /// Ставки раунда сметены в банки.
    PotsSettled { street: Street, pots: Vec<Pot> },

    /// Открыты общие карты на борде.
    BoardDealt { street: Street, cards: Vec<Card> },

    /// Решение по run-it-twice.
    RunItTwiceDecided { confirmed: bool },

    /// Второй борд (run-it-twice).
    SecondBoardDealt { cards: Vec<Card> },

    /// Шоудаун – открытие карт.
    ShowdownReveal {
        seat: SeatIndex,
        player_id: PlayerId,
        hole_cards: Vec<Card>,
    },

    /// Выплата части банка.
    PotAwarded {
        pot_no: usize,
        board_no: u8,
        seat: SeatIndex,
        player_id: PlayerId,
        amount: Chips,
        low: bool,
    },

    /// Рейк со всей раздачи.
    RakeCollected { amount: Chips },

    /// Раздача завершена.
    HandFinished { hand_num: HandNum },
}

/// Событие в раздаче с порядковым номером.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HandEvent {
    pub index: u32,
    pub kind: HandEventKind,
}

/// Полная история раздачи. Лежит внутри HandState и попадает в чекпоинт.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct HandHistory {
    pub events: Vec<HandEvent>,
}

impl HandHistory {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, kind: HandEventKind) {
        let idx = self.events.len() as u32;
        self.events.push(HandEvent { index: idx, kind });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
