// tests/engine_messages_tests.rs

//! Входящие сообщения: повторы, чужой ход, устаревшие номера раздач,
//! таймауты, проверки сумм. Ошибка никогда не меняет HandState.

mod common;

use common::*;
use poker_table_engine::domain::chips::Chips;
use poker_table_engine::engine::{
    deal_hand, on_player_acted, step, ActedOutcome, ActionKind, EngineError, FlowState, HandState, Notification,
    PlayerActed, StepResult,
};
use poker_table_engine::infra::persistence::encode_hand_state;

fn heads_up() -> HandState {
    let config = holdem_table(2);
    let seats = vec![player(1, 1000), player(2, 1000)];
    let mut state = new_hand(&config, &seats, dealing_order(&["Kd Kc", "As Ah"], "2c 7d 9h Js 3c"), 0);
    run(&mut state);
    state.take_outbox();
    state
}

fn snapshot(state: &HandState) -> Vec<u8> {
    encode_hand_state(state).unwrap()
}

#[test]
fn retried_message_is_acknowledged_without_changes() {
    let mut state = heads_up();
    let msg = acted(&state, 0, ActionKind::Call, 50);

    assert_eq!(on_player_acted(&mut state, msg.clone(), now()).unwrap(), ActedOutcome::Accepted);
    run(&mut state);
    state.take_outbox();
    let before = snapshot(&state);

    let outcome = on_player_acted(&mut state, msg.clone(), now()).unwrap();
    match outcome {
        ActedOutcome::Acknowledged(ack) => match ack.message {
            Notification::ActionAck { message_id, .. } => assert_eq!(message_id, msg.message_id),
            other => panic!("ожидали ack, пришло {other:?}"),
        },
        other => panic!("ожидали ack, пришло {other:?}"),
    }
    assert_eq!(snapshot(&state), before);
}

#[test]
fn retry_while_action_in_progress_is_acknowledged() {
    let mut state = heads_up();
    let msg = acted(&state, 0, ActionKind::Call, 50);

    on_player_acted(&mut state, msg.clone(), now()).unwrap();
    assert_eq!(state.flow_state, FlowState::PrepareNextAction);
    let before = snapshot(&state);

    let outcome = on_player_acted(&mut state, msg, now()).unwrap();
    assert!(matches!(outcome, ActedOutcome::Acknowledged(_)));
    assert_eq!(snapshot(&state), before);

    // Ход применяется ровно один раз.
    run(&mut state);
    assert_eq!(state.stacks[0], Chips(900));
}

#[test]
fn old_hand_number_is_acknowledged_future_is_rejected() {
    let mut state = heads_up();
    let before = snapshot(&state);

    let mut old = acted(&state, 0, ActionKind::Call, 50);
    old.hand_num = 0;
    assert!(matches!(on_player_acted(&mut state, old, now()).unwrap(), ActedOutcome::Acknowledged(_)));

    let mut future = acted(&state, 0, ActionKind::Call, 50);
    future.hand_num = 2;
    let err = on_player_acted(&mut state, future, now()).unwrap_err();
    assert_eq!(err, EngineError::HandNumberMismatch { got: 2, current: 1 });

    assert_eq!(snapshot(&state), before);
}

#[test]
fn invalid_actions_are_rejected_without_changes() {
    let mut state = heads_up();
    let before = snapshot(&state);

    let wrong_seat = acted(&state, 1, ActionKind::Check, 0);
    assert_eq!(on_player_acted(&mut state, wrong_seat, now()), Err(EngineError::NotPlayersTurn(1)));

    let mut wrong_player = acted(&state, 0, ActionKind::Call, 50);
    wrong_player.player_id = 2;
    assert_eq!(
        on_player_acted(&mut state, wrong_player, now()),
        Err(EngineError::PlayerMismatch { seat: 0, player_id: 2 })
    );

    let short_call = acted(&state, 0, ActionKind::Call, 40);
    assert_eq!(
        on_player_acted(&mut state, short_call, now()),
        Err(EngineError::CallAmountMismatch { expected: 50, got: 40 })
    );

    let check = acted(&state, 0, ActionKind::Check, 0);
    assert_eq!(on_player_acted(&mut state, check, now()), Err(EngineError::CannotCheck));

    let small = acted(&state, 0, ActionKind::Raise, 150);
    assert_eq!(on_player_acted(&mut state, small, now()), Err(EngineError::RaiseTooSmall { min: 200 }));

    let rit = acted(&state, 0, ActionKind::RunItTwiceYes, 0);
    assert_eq!(on_player_acted(&mut state, rit, now()), Err(EngineError::IllegalAction));

    assert_eq!(snapshot(&state), before);
}

#[test]
fn transitions_check_flow_state() {
    let mut state = heads_up();
    let before = snapshot(&state);

    let err = deal_hand(&mut state, now()).unwrap_err();
    assert_eq!(
        err,
        EngineError::FlowStateMismatch {
            expected: FlowState::DealHand,
            actual: FlowState::WaitForNextAction,
        }
    );
    assert_eq!(step(&mut state, now()).unwrap(), StepResult::Waiting);
    assert_eq!(snapshot(&state), before);
}

fn timeout_for(state: &HandState) -> PlayerActed {
    let next = state.next_seat_action.clone().unwrap();
    PlayerActed {
        message_id: PlayerActed::timeout_message_id(state.hand_num, next.action_id),
        hand_num: state.hand_num,
        seat: next.seat,
        player_id: next.player_id,
        action: next.default_action(),
        amount: Chips::ZERO,
        timed_out: true,
    }
}

#[test]
fn timeout_folds_when_facing_a_bet() {
    let mut state = heads_up();
    let msg = timeout_for(&state);
    assert_eq!(msg.action, ActionKind::Fold);

    on_player_acted(&mut state, msg, now()).unwrap();
    run(&mut state);

    assert_eq!(state.flow_state, FlowState::MoveToNextHand);
    let timed_out = state.log.events.iter().any(|e| {
        matches!(
            e.kind,
            poker_table_engine::engine::HandEventKind::PlayerActed {
                action: ActionKind::Fold,
                timed_out: true,
                ..
            }
        )
    });
    assert!(timed_out);
}

#[test]
fn timeout_checks_when_possible() {
    let mut state = heads_up();
    act(&mut state, 0, ActionKind::Call, 50);

    let msg = timeout_for(&state);
    assert_eq!(msg.action, ActionKind::Check);
    on_player_acted(&mut state, msg, now()).unwrap();
    run(&mut state);

    assert_eq!(state.flow_state, FlowState::WaitForNextAction);
    assert_eq!(state.street, poker_table_engine::domain::hand::Street::Flop);
}

#[test]
fn stale_timer_from_previous_action_is_rejected() {
    let mut state = heads_up();
    let stale = timeout_for(&state);
    act(&mut state, 0, ActionKind::Call, 50);

    // Таймер места 0 из прошлого хода; сейчас ходит место 1.
    let before = snapshot(&state);
    assert_eq!(on_player_acted(&mut state, stale.clone(), now()), Err(EngineError::NotPlayersTurn(0)));

    // Тот же seat, но action_id устарел.
    let mut wrong_id = timeout_for(&state);
    wrong_id.message_id = PlayerActed::timeout_message_id(state.hand_num, 0);
    assert_eq!(on_player_acted(&mut state, wrong_id, now()), Err(EngineError::NotPlayersTurn(1)));
    assert_eq!(snapshot(&state), before);
}

#[test]
fn next_action_offers_presets_within_limits() {
    let state = heads_up();
    let next = state.next_seat_action.clone().unwrap();

    assert_eq!(next.seat, 0);
    assert_eq!(next.call_amount, Chips(50));
    assert_eq!(next.min_raise_to, Chips(200));
    assert_eq!(next.max_raise_to, Chips(1000));
    assert_eq!(next.all_in_amount, Chips(1000));
    assert_eq!(next.default_action(), ActionKind::Fold);

    let amounts: Vec<u64> = next.bet_options.iter().map(|o| o.amount.0).collect();
    assert_eq!(amounts, vec![200, 300, 400]);
    assert_eq!(next.expires_at, now() + chrono::Duration::seconds(20));
}
