//! Авторитетное состояние одной раздачи.
//!
//! Всё, что индексируется местом, лежит в `Vec` по значению (индекс = seat).
//! Производные представления (`NextSeatAction`, балансы) пересчитываются,
//! а не хранятся ссылками. Состояние целиком сериализуется в чекпоинт.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::card::Card;
use crate::domain::chips::Chips;
use crate::domain::deck::Deck;
use crate::domain::hand::{GameType, Street};
use crate::domain::player::SeatPlayer;
use crate::domain::table::TableConfig;
use crate::domain::{HandNum, PlayerId, SeatIndex};
use crate::engine::actions::PlayerActed;
use crate::engine::betting::{ActState, BettingRoundState, PlayerActRound};
use crate::engine::errors::EngineError;
use crate::engine::flow::FlowState;
use crate::engine::hand_history::HandHistory;
use crate::engine::next_action::NextSeatAction;
use crate::engine::notifications::{Outbound, SeatBalance, ShownHand};
use crate::engine::positions::{blind_positions, next_button, next_seat_where};
use crate::engine::pot::{pots_total, Pot};
use crate::engine::run_it_twice::RunItTwiceState;
use crate::engine::showdown::HandResult;
use crate::time_ctrl::TimeRules;

/// Входные данные для новой раздачи.
pub struct NewHandParams<'a> {
    pub config: &'a TableConfig,
    pub time_rules: &'a TimeRules,
    pub hand_num: HandNum,
    /// Места стола (индекс = seat). Карты получают только `can_be_dealt()`.
    pub seats: &'a [Option<SeatPlayer>],
    /// Уже перемешанная колода.
    pub deck: Deck,
    /// Кнопка прошлой раздачи.
    pub prev_button: Option<SeatIndex>,
    /// Явная кнопка (сценарий `SetupNextHand`).
    pub button_override: Option<SeatIndex>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HandState {
    pub table_code: String,
    pub hand_num: HandNum,
    pub game_type: GameType,
    pub max_seats: u8,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub rake_percentage: f64,
    pub rake_cap: Chips,
    pub no_flop_no_drop: bool,
    pub allow_run_it_twice: bool,
    pub action_secs: u32,
    pub run_it_twice_prompt_secs: u32,

    pub button_pos: SeatIndex,
    pub sb_pos: SeatIndex,
    pub bb_pos: SeatIndex,
    /// Кто сидит на месте и получил карты. None – места нет в раздаче.
    pub players_in_seats: Vec<Option<PlayerId>>,
    pub run_it_twice_opt_in: Vec<bool>,
    pub stacks: Vec<Chips>,
    /// Сколько место внесло за всю раздачу (с блайндами).
    pub contributed: Vec<Chips>,

    pub hole_cards: Vec<Vec<Card>>,
    pub deck: Deck,
    /// Все пять карт борда сдаются сразу, открываются по улицам.
    pub board: Vec<Card>,
    pub board2: Option<Vec<Card>>,
    pub street: Street,

    pub pots: Vec<Pot>,
    pub round: BettingRoundState,
    pub act_round: Vec<PlayerActRound>,
    pub next_seat_action: Option<NextSeatAction>,
    /// Кто ходил последним в этом раунде (отсюда ищем следующего).
    pub last_actor: Option<SeatIndex>,
    /// Счётчик ходов, из него берётся `action_id`.
    pub action_seq: u32,

    pub flow_state: FlowState,
    /// Ход, который сейчас применяется. Сохраняется до применения,
    /// чтобы после падения доиграть его ровно один раз.
    pub action_msg_in_progress: Option<PlayerActed>,
    pub processed_messages: Vec<String>,

    pub run_it_twice: Option<RunItTwiceState>,
    /// Вопрос про run-it-twice уже решён в этой раздаче.
    pub run_it_twice_decided: bool,
    pub run_it_twice_confirmed: bool,
    /// Карманные карты живых мест уже открыты всем (all-in или шоудаун).
    pub hands_shown: bool,
    pub result: Option<HandResult>,
    pub log: HandHistory,

    /// Сообщения, которые ещё не отданы транспорту.
    /// Сохраняются вместе с чекпоинтом: после рестарта уйдут повторно.
    pub outbox: Vec<Outbound>,
}

impl HandState {
    /// Новая раздача в состоянии `DealHand`. Карты ещё не сданы.
    pub fn new(params: NewHandParams<'_>) -> Result<HandState, EngineError> {
        let config = params.config;
        let max_seats = config.max_seats;
        let n = max_seats as usize;

        let mut players_in_seats = vec![None; n];
        let mut stacks = vec![Chips::ZERO; n];
        let mut run_it_twice_opt_in = vec![false; n];
        let mut act_round = vec![PlayerActRound::new(ActState::Empty); n];
        let mut dealt = vec![false; n];

        for (idx, seat) in params.seats.iter().enumerate().take(n) {
            let Some(player) = seat else { continue };
            if !player.can_be_dealt() {
                continue;
            }
            players_in_seats[idx] = Some(player.player_id);
            stacks[idx] = player.stack;
            run_it_twice_opt_in[idx] = player.run_it_twice;
            act_round[idx] = PlayerActRound::new(ActState::NotActed);
            dealt[idx] = true;
        }

        let players = dealt.iter().filter(|d| **d).count();
        if players < config.min_players.max(2) as usize {
            return Err(EngineError::NotEnoughPlayers);
        }
        let needed = players * config.game_type.hole_cards() + 5;
        if params.deck.len() < needed {
            return Err(EngineError::DeckTooShort {
                needed,
                got: params.deck.len(),
            });
        }

        let button = match params.button_override {
            Some(seat) if dealt.get(seat as usize).copied().unwrap_or(false) => seat,
            Some(_) => return Err(EngineError::NoButtonSeat),
            None => next_button(&dealt, params.prev_button)?,
        };
        let blinds = blind_positions(&dealt, button)?;

        Ok(HandState {
            table_code: config.table_code.clone(),
            hand_num: params.hand_num,
            game_type: config.game_type,
            max_seats,
            small_blind: config.small_blind,
            big_blind: config.big_blind,
            rake_percentage: config.rake_percentage,
            rake_cap: config.rake_cap,
            no_flop_no_drop: config.no_flop_no_drop,
            allow_run_it_twice: config.allow_run_it_twice,
            action_secs: params.time_rules.action_secs,
            run_it_twice_prompt_secs: params.time_rules.run_it_twice_prompt_secs,
            button_pos: blinds.button,
            sb_pos: blinds.small_blind,
            bb_pos: blinds.big_blind,
            players_in_seats,
            run_it_twice_opt_in,
            stacks,
            contributed: vec![Chips::ZERO; n],
            hole_cards: vec![Vec::new(); n],
            deck: params.deck,
            board: Vec::new(),
            board2: None,
            street: Street::Preflop,
            pots: Vec::new(),
            round: BettingRoundState::new(Street::Preflop, max_seats),
            act_round,
            next_seat_action: None,
            last_actor: None,
            action_seq: 0,
            flow_state: FlowState::DealHand,
            action_msg_in_progress: None,
            processed_messages: Vec::new(),
            run_it_twice: None,
            run_it_twice_decided: false,
            run_it_twice_confirmed: false,
            hands_shown: false,
            result: None,
            log: HandHistory::new(),
            outbox: Vec::new(),
        })
    }

    pub fn player_at(&self, seat: SeatIndex) -> Option<PlayerId> {
        self.players_in_seats.get(seat as usize).copied().flatten()
    }

    pub fn seat_of(&self, player_id: PlayerId) -> Option<SeatIndex> {
        self.players_in_seats
            .iter()
            .position(|p| *p == Some(player_id))
            .map(|idx| idx as SeatIndex)
    }

    pub fn stack_of(&self, seat: SeatIndex) -> Chips {
        self.stacks.get(seat as usize).copied().unwrap_or(Chips::ZERO)
    }

    pub fn act(&self, seat: SeatIndex) -> PlayerActRound {
        self.act_round
            .get(seat as usize)
            .copied()
            .unwrap_or(PlayerActRound::new(ActState::Empty))
    }

    /// Места, которые ещё борются за банк, по возрастанию.
    pub fn live_seats(&self) -> Vec<SeatIndex> {
        self.seats_where(|a| a.is_live())
    }

    /// Места, которые могут ходить (живые и не all-in).
    pub fn actionable_seats(&self) -> Vec<SeatIndex> {
        self.seats_where(|a| a.can_act())
    }

    fn seats_where<F: Fn(&PlayerActRound) -> bool>(&self, pred: F) -> Vec<SeatIndex> {
        self.act_round
            .iter()
            .enumerate()
            .filter(|(_, a)| pred(a))
            .map(|(idx, _)| idx as SeatIndex)
            .collect()
    }

    pub fn is_all_in(&self, seat: SeatIndex) -> bool {
        self.act(seat).state == ActState::AllIn
    }

    pub fn pots_total(&self) -> Chips {
        pots_total(&self.pots)
    }

    /// Банк вместе с несметёнными ставками раунда.
    pub fn pot_with_bets(&self) -> Chips {
        self.pots_total() + self.round.total_bets()
    }

    /// Открытая часть борда на текущей улице.
    pub fn revealed_board(&self) -> &[Card] {
        let len = self.street.board_len().min(self.board.len());
        &self.board[..len]
    }

    /// Раунд ставок закончен?
    ///
    /// Каждое место, которое может ходить, уже ходило и уравняло текущую ставку.
    /// Если ходить может только одно место и его ставка не меньше чужих,
    /// ему не с кем торговаться.
    pub fn is_round_complete(&self) -> bool {
        let actionable = self.actionable_seats();
        if actionable.is_empty() {
            return true;
        }

        if actionable.len() == 1 {
            let seat = actionable[0];
            let max_other = self
                .live_seats()
                .into_iter()
                .filter(|&s| s != seat)
                .map(|s| self.round.bet_of(s))
                .max()
                .unwrap_or(Chips::ZERO);
            if self.round.bet_of(seat) >= max_other {
                return true;
            }
        }

        actionable
            .iter()
            .all(|&s| self.act(s).has_acted() && self.round.bet_of(s) >= self.round.current_raise)
    }

    /// Следующее место, которому нужно ходить, по часовой от последнего ходившего.
    pub fn next_to_act(&self) -> Option<SeatIndex> {
        let start = match self.last_actor {
            Some(seat) => seat,
            None if self.street == Street::Preflop => self.bb_pos,
            None => self.button_pos,
        };
        next_seat_where(self.max_seats, start, false, |s| {
            let act = self.act(s);
            act.can_act() && (!act.has_acted() || self.round.bet_of(s) < self.round.current_raise)
        })
    }

    /// Балансы всех мест раздачи.
    pub fn balances(&self) -> Vec<SeatBalance> {
        self.players_in_seats
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| {
                p.map(|player_id| SeatBalance {
                    seat: idx as SeatIndex,
                    player_id,
                    stack: self.stacks[idx],
                    bet: self.round.bet_of(idx as SeatIndex),
                })
            })
            .collect()
    }

    /// Карманные карты живых мест (для открытия).
    pub fn shown_hands(&self) -> Vec<ShownHand> {
        self.live_seats()
            .into_iter()
            .filter_map(|seat| {
                self.player_at(seat).map(|player_id| ShownHand {
                    seat,
                    player_id,
                    cards: self.hole_cards[seat as usize].clone(),
                })
            })
            .collect()
    }

    /// Таймаут хода по абсолютному времени.
    pub fn action_deadline(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + chrono::Duration::seconds(self.action_secs as i64)
    }

    pub fn run_it_twice_deadline(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + chrono::Duration::seconds(self.run_it_twice_prompt_secs as i64)
    }

    /// Забрать накопленные исходящие сообщения.
    pub fn take_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    pub(crate) fn push_all(&mut self, message: crate::engine::notifications::Notification) {
        self.outbox.push(Outbound::all(message));
    }

    pub(crate) fn push_to(&mut self, player_id: PlayerId, message: crate::engine::notifications::Notification) {
        self.outbox.push(Outbound::to_player(player_id, message));
    }

    /// Общее количество фишек раздачи: стеки + банки + ставки.
    /// Не меняется от начала раздачи до выплаты (минус рейк).
    pub fn chips_in_play(&self) -> Chips {
        self.stacks.iter().sum::<Chips>() + self.pot_with_bets()
    }
}
