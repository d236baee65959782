// tests/common/mod.rs

//! Общие утилиты интеграционных тестов: фиксированное время, колоды
//! в порядке раздачи, прогон машины состояний до ожидания.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use poker_table_engine::domain::card::{parse_cards, Card};
use poker_table_engine::domain::chips::Chips;
use poker_table_engine::domain::deck::Deck;
use poker_table_engine::domain::hand::GameType;
use poker_table_engine::domain::player::SeatPlayer;
use poker_table_engine::domain::table::TableConfig;
use poker_table_engine::domain::SeatIndex;
use poker_table_engine::engine::{
    on_player_acted, step, ActedOutcome, ActionKind, FlowState, HandState, NewHandParams, PlayerActed, StepResult,
};
use poker_table_engine::time_ctrl::TimeRules;

/// Фиксированное "сейчас": тесты не зависят от часов.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn cards(s: &str) -> Vec<Card> {
    parse_cards(s).unwrap()
}

/// Порядок раздачи: карманные по кругу (первая рука – место после кнопки),
/// затем борд, затем остаток колоды.
pub fn dealing_order(holes: &[&str], board: &str) -> Vec<Card> {
    let holes: Vec<Vec<Card>> = holes.iter().map(|h| cards(h)).collect();
    let per_seat = holes.first().map_or(0, |h| h.len());

    let mut order = Vec::new();
    for round in 0..per_seat {
        for hole in &holes {
            order.push(hole[round]);
        }
    }
    order.extend(cards(board));

    for card in Deck::standard_52().cards {
        if !order.contains(&card) {
            order.push(card);
        }
    }
    order
}

pub fn holdem_table(max_seats: u8) -> TableConfig {
    TableConfig::new("T-1", GameType::Holdem, Chips(50), Chips(100)).with_max_seats(max_seats)
}

pub fn player(id: u64, stack: u64) -> Option<SeatPlayer> {
    Some(SeatPlayer::new(id, format!("p{id}"), Chips(stack)))
}

pub fn rit_player(id: u64, stack: u64) -> Option<SeatPlayer> {
    Some(SeatPlayer::new(id, format!("p{id}"), Chips(stack)).with_run_it_twice(true))
}

/// Новая раздача №1 с заданной кнопкой и колодой.
pub fn new_hand(config: &TableConfig, seats: &[Option<SeatPlayer>], order: Vec<Card>, button: SeatIndex) -> HandState {
    HandState::new(NewHandParams {
        config,
        time_rules: &TimeRules::default(),
        hand_num: 1,
        seats,
        deck: Deck::from_dealing_order(order),
        prev_button: None,
        button_override: Some(button),
    })
    .unwrap()
}

/// Крутить автоматические переходы, пока движок не начнёт ждать.
pub fn run(state: &mut HandState) {
    for _ in 0..64 {
        match step(state, now()).unwrap() {
            StepResult::Advanced => continue,
            StepResult::Waiting => return,
        }
    }
    panic!("машина состояний не остановилась: {}", state.flow_state);
}

/// Сообщение хода для места `seat`.
pub fn acted(state: &HandState, seat: SeatIndex, action: ActionKind, amount: u64) -> PlayerActed {
    PlayerActed {
        message_id: format!("m-{}-{}-{}", state.hand_num, state.action_seq, seat),
        hand_num: state.hand_num,
        seat,
        player_id: state.player_at(seat).unwrap(),
        action,
        amount: Chips(amount),
        timed_out: false,
    }
}

/// Сделать ход и прогнать машину до следующего ожидания.
pub fn act(state: &mut HandState, seat: SeatIndex, action: ActionKind, amount: u64) {
    let msg = acted(state, seat, action, amount);
    let outcome = on_player_acted(state, msg, now()).unwrap();
    assert_eq!(outcome, ActedOutcome::Accepted);
    run(state);
}

/// Место, чей сейчас ход.
pub fn to_act(state: &HandState) -> SeatIndex {
    assert_eq!(state.flow_state, FlowState::WaitForNextAction);
    state.next_seat_action.as_ref().unwrap().seat
}

/// Ход "check, а если нельзя – call" за того, чья очередь.
pub fn check_or_call(state: &mut HandState) {
    let next = state.next_seat_action.clone().unwrap();
    if next.allows(ActionKind::Check) {
        act(state, next.seat, ActionKind::Check, 0);
    } else {
        act(state, next.seat, ActionKind::Call, next.call_amount.0);
    }
}

/// Отыграть раздачу чеками/коллами до конца.
pub fn check_down(state: &mut HandState) {
    for _ in 0..32 {
        if state.flow_state != FlowState::WaitForNextAction {
            return;
        }
        check_or_call(state);
    }
    panic!("раздача не закончилась");
}

pub fn chips(state: &HandState) -> Vec<u64> {
    state.stacks.iter().map(|c| c.0).collect()
}
