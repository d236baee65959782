// tests/crash_replay_tests.rs

//! Рестарт после любого перехода: раздача, поднятая из чекпоинта,
//! доигрывается в точности так же, как без падения.

mod common;

use common::*;
use poker_table_engine::domain::chips::Chips;
use poker_table_engine::engine::transitions::resume;
use poker_table_engine::engine::{on_player_acted, step, ActedOutcome, ActionKind, FlowState, HandState, StepResult};
use poker_table_engine::infra::persistence::{decode_hand_state, encode_hand_state, HandStateStore, InMemoryHandStateStore};

/// "Процесс упал": всё, что было в памяти, теряется, остаётся чекпоинт.
fn restart(state: HandState) -> HandState {
    let bytes = encode_hand_state(&state).unwrap();
    drop(state);
    let mut restored = decode_hand_state(&bytes).unwrap();
    resume(&mut restored, now()).unwrap();
    restored.take_outbox();
    restored
}

/// Сценарий: рейз префлоп, колл, дальше чек до конца.
fn scripted_action(state: &HandState) -> (ActionKind, u64) {
    let next = state.next_seat_action.as_ref().unwrap();
    if state.action_seq == 0 {
        return (ActionKind::Raise, 300);
    }
    if next.allows(ActionKind::Check) {
        (ActionKind::Check, 0)
    } else {
        (ActionKind::Call, next.call_amount.0)
    }
}

fn play(mut state: HandState, crash_everywhere: bool) -> HandState {
    for _ in 0..128 {
        match step(&mut state, now()).unwrap() {
            StepResult::Advanced => {}
            StepResult::Waiting => {
                if state.flow_state != FlowState::WaitForNextAction {
                    break;
                }
                let seat = state.next_seat_action.as_ref().unwrap().seat;
                let (action, amount) = scripted_action(&state);
                let msg = acted(&state, seat, action, amount);
                assert_eq!(on_player_acted(&mut state, msg, now()).unwrap(), ActedOutcome::Accepted);
            }
        }
        state.take_outbox();
        if crash_everywhere {
            state = restart(state);
        }
    }
    state
}

fn three_handed() -> HandState {
    let config = holdem_table(3).with_rake(5.0, Chips(25));
    let seats = vec![player(1, 1000), player(2, 800), player(3, 1200)];
    let order = dealing_order(&["Kd Kc", "Qd Qc", "As Ah"], "2h 7h 9s Js 3d");
    new_hand(&config, &seats, order, 0)
}

#[test]
fn crash_after_every_transition_gives_identical_hand() {
    let clean = play(three_handed(), false);
    let crashed = play(three_handed(), true);

    assert_eq!(clean.flow_state, FlowState::MoveToNextHand);
    assert_eq!(encode_hand_state(&crashed).unwrap(), encode_hand_state(&clean).unwrap());
    assert_eq!(crashed.log, clean.log);
}

#[test]
fn crash_before_applying_accepted_action_applies_it_once() {
    let mut state = three_handed();
    run(&mut state);
    state.take_outbox();

    let msg = acted(&state, 0, ActionKind::Raise, 300);
    on_player_acted(&mut state, msg.clone(), now()).unwrap();
    assert_eq!(state.flow_state, FlowState::PrepareNextAction);

    let store = InMemoryHandStateStore::new();
    store.save("T-1", &state).unwrap();
    drop(state);

    let mut restored = store.load("T-1").unwrap().unwrap();
    resume(&mut restored, now()).unwrap();

    // Клиент не получил ack и повторяет ход: это не второй рейз.
    assert!(matches!(
        on_player_acted(&mut restored, msg, now()).unwrap(),
        ActedOutcome::Acknowledged(_)
    ));
    run(&mut restored);

    assert_eq!(restored.stacks[0], Chips(700));
    assert_eq!(restored.round.current_raise, Chips(300));
    assert_eq!(to_act(&restored), 1);
}

#[test]
fn resume_in_wait_for_action_rearms_the_clock() {
    let mut state = three_handed();
    run(&mut state);
    state.take_outbox();

    let later = now() + chrono::Duration::seconds(90);
    let mut restored = decode_hand_state(&encode_hand_state(&state).unwrap()).unwrap();
    resume(&mut restored, later).unwrap();

    let next = restored.next_seat_action.clone().unwrap();
    assert_eq!(next.expires_at, later + chrono::Duration::seconds(20));
    assert_eq!(next.seat, 0);

    // Игроку заново уходит его YourAction.
    let outbox = restored.take_outbox();
    assert!(outbox.iter().any(|o| matches!(
        &o.message,
        poker_table_engine::engine::Notification::YourAction(n) if n.seat == 0
    )));
}

#[test]
fn store_roundtrip_and_failures() {
    let store = InMemoryHandStateStore::new();
    let state = three_handed();

    assert!(store.load("T-1").unwrap().is_none());
    store.save("T-1", &state).unwrap();
    assert_eq!(store.load("T-1").unwrap(), Some(state.clone()));
    assert_eq!(store.table_codes(), vec!["T-1".to_string()]);

    store.fail_next_saves(1);
    assert!(store.save("T-1", &state).is_err());
    assert!(store.save("T-1", &state).is_ok());

    store.remove("T-1").unwrap();
    assert!(store.raw("T-1").is_none());
}
