// tests/engine_hand_flow_tests.rs

//! Полные раздачи через машину состояний: фолд, шоудаун, рейк,
//! pot-limit, неполный all-in, run-it-twice, Hi-Lo.

mod common;

use common::*;
use poker_table_engine::api::hand_view_for;
use poker_table_engine::domain::chips::Chips;
use poker_table_engine::domain::deck::Deck;
use poker_table_engine::domain::hand::{GameType, Street};
use poker_table_engine::domain::table::TableConfig;
use poker_table_engine::engine::hand_history::HandEventKind;
use poker_table_engine::engine::transitions::run_it_twice_eligible;
use poker_table_engine::engine::{
    on_player_acted, on_run_it_twice_timeout, step, ActionKind, EngineError, FlowState, HandState, NewHandParams,
    Notification, Recipient, StepResult,
};
use poker_table_engine::time_ctrl::TimeRules;

#[test]
fn deal_posts_blinds_and_deals_from_seat_after_button() {
    let config = holdem_table(3);
    let seats = vec![player(1, 1000), player(2, 1000), player(3, 1000)];
    let order = dealing_order(&["Kd Kc", "Qd Qc", "As Ah"], "2h 7h 9s Js 3d");
    let mut state = new_hand(&config, &seats, order, 0);
    run(&mut state);

    assert_eq!((state.button_pos, state.sb_pos, state.bb_pos), (0, 1, 2));
    assert_eq!(chips(&state), vec![1000, 950, 900]);
    assert_eq!(state.hole_cards[1], cards("Kd Kc"));
    assert_eq!(state.hole_cards[2], cards("Qd Qc"));
    assert_eq!(state.hole_cards[0], cards("As Ah"));
    assert_eq!(state.board, cards("2h 7h 9s Js 3d"));
    assert!(state.revealed_board().is_empty());

    // Префлоп первым ходит место после BB.
    assert_eq!(to_act(&state), 0);

    // Карманные карты уходят только владельцу.
    let outbox = state.take_outbox();
    let private: Vec<_> = outbox
        .iter()
        .filter(|o| matches!(o.message, Notification::CardsDealt { .. }))
        .collect();
    assert_eq!(private.len(), 3);
    assert!(private.iter().all(|o| matches!(o.to, Recipient::Player(_))));
    assert!(outbox
        .iter()
        .any(|o| o.to == Recipient::Player(1) && matches!(o.message, Notification::YourAction(_))));
}

#[test]
fn fold_preflop_returns_uncalled_blind() {
    let config = holdem_table(2).with_rake(5.0, Chips::ZERO);
    let seats = vec![player(1, 1000), player(2, 1000)];
    let mut state = new_hand(&config, &seats, dealing_order(&["Kd Kc", "As Ah"], "2c 7d 9h Js 3c"), 0);
    run(&mut state);

    // Хедз-ап: кнопка на SB и ходит первой.
    assert_eq!(to_act(&state), 0);
    act(&mut state, 0, ActionKind::Fold, 0);

    assert_eq!(state.flow_state, FlowState::MoveToNextHand);
    let result = state.result.clone().unwrap();
    assert!(result.won_by_fold);
    assert_eq!(result.rake_collected, Chips(5));
    assert_eq!(chips(&state), vec![950, 1045]);
}

#[test]
fn no_flop_no_drop_skips_rake() {
    let mut config = holdem_table(2).with_rake(5.0, Chips::ZERO);
    config.no_flop_no_drop = true;
    let seats = vec![player(1, 1000), player(2, 1000)];
    let mut state = new_hand(&config, &seats, dealing_order(&["Kd Kc", "As Ah"], "2c 7d 9h Js 3c"), 0);
    run(&mut state);

    act(&mut state, 0, ActionKind::Fold, 0);

    let result = state.result.clone().unwrap();
    assert_eq!(result.rake_collected, Chips::ZERO);
    assert_eq!(chips(&state), vec![950, 1050]);
}

#[test]
fn check_down_to_showdown_pays_best_hand_minus_rake() {
    let config = holdem_table(2).with_rake(5.0, Chips(30));
    let seats = vec![player(1, 1000), player(2, 1000)];
    let mut state = new_hand(&config, &seats, dealing_order(&["Kd Kc", "As Ah"], "2c 7d 9h Js 3c"), 0);
    run(&mut state);

    // Префлоп: SB доплачивает, BB чекает. Постфлоп первым ходит BB.
    act(&mut state, 0, ActionKind::Call, 50);
    assert_eq!(to_act(&state), 1);
    act(&mut state, 1, ActionKind::Check, 0);
    assert_eq!(state.street, Street::Flop);
    assert_eq!(state.revealed_board(), cards("2c 7d 9h").as_slice());
    assert_eq!(to_act(&state), 1);

    check_down(&mut state);

    assert_eq!(state.flow_state, FlowState::MoveToNextHand);
    let result = state.result.clone().unwrap();
    assert!(!result.won_by_fold);
    assert_eq!(result.rake_collected, Chips(10));
    assert_eq!(result.rake_paid.get(&0), Some(&Chips(10)));
    assert_eq!(result.won_by(0), Chips(190));
    assert_eq!(chips(&state), vec![1090, 900]);

    let events = &state.log.events;
    assert!(matches!(events.first().map(|e| &e.kind), Some(HandEventKind::HandStarted { .. })));
    assert!(matches!(events.last().map(|e| &e.kind), Some(HandEventKind::HandFinished { hand_num: 1 })));
    assert!(events.iter().any(|e| matches!(e.kind, HandEventKind::ShowdownReveal { seat: 1, .. })));
}

#[test]
fn pot_limit_raise_is_capped_at_pot() {
    let config = TableConfig::new("T-PLO", GameType::Plo, Chips(50), Chips(100)).with_max_seats(2);
    let seats = vec![player(1, 10_000), player(2, 10_000)];
    let order = dealing_order(&["Kd Kc Qd Qc", "As Ah Ad 2c"], "3s 4s 5h 9d Tc");
    let mut state = new_hand(&config, &seats, order, 0);
    run(&mut state);

    // Банк 150, доплата 50: максимум до 100 + 150 + 50 = 300.
    let next = state.next_seat_action.clone().unwrap();
    assert_eq!(next.min_raise_to, Chips(200));
    assert_eq!(next.max_raise_to, Chips(300));
    assert!(next.allows(ActionKind::Raise));
    assert!(!next.allows(ActionKind::AllIn));

    act(&mut state, 0, ActionKind::Raise, 1000);

    assert_eq!(state.round.bet_of(0), Chips(300));
    assert_eq!(state.stacks[0], Chips(9_700));
    assert_eq!(to_act(&state), 1);
}

#[test]
fn no_limit_raise_above_stack_is_rejected() {
    let config = holdem_table(2);
    let seats = vec![player(1, 1000), player(2, 1000)];
    let mut state = new_hand(&config, &seats, dealing_order(&["Kd Kc", "As Ah"], "2c 7d 9h Js 3c"), 0);
    run(&mut state);

    let msg = acted(&state, 0, ActionKind::Raise, 5000);
    let err = on_player_acted(&mut state, msg, now()).unwrap_err();
    assert_eq!(err, EngineError::NotEnoughChips);
}

#[test]
fn incomplete_all_in_does_not_reopen_betting() {
    let config = holdem_table(3);
    let seats = vec![player(1, 10_000), player(2, 10_000), player(3, 350)];
    let order = dealing_order(&["Kd Kc", "Qd Qc", "As Ah"], "2h 7h 9s Js 3d");
    let mut state = new_hand(&config, &seats, order, 0);
    run(&mut state);

    act(&mut state, 0, ActionKind::Raise, 300);
    act(&mut state, 1, ActionKind::Call, 250);

    // BB: рейз на минимум (500) стеку не по карману, остаётся all-in.
    let bb = state.next_seat_action.clone().unwrap();
    assert_eq!(bb.seat, 2);
    assert!(!bb.allows(ActionKind::Raise));
    assert!(bb.allows(ActionKind::AllIn));
    act(&mut state, 2, ActionKind::AllIn, 0);
    assert_eq!(state.round.current_raise, Chips(350));

    // Рейзер и коллер могут только доплатить или сбросить.
    let back = state.next_seat_action.clone().unwrap();
    assert_eq!(back.seat, 0);
    assert_eq!(back.available_actions, vec![ActionKind::Fold, ActionKind::Call]);
    assert_eq!(back.call_amount, Chips(50));
    act(&mut state, 0, ActionKind::Call, 50);

    let sb = state.next_seat_action.clone().unwrap();
    assert_eq!(sb.seat, 1);
    assert!(!sb.allows(ActionKind::Raise));
    act(&mut state, 1, ActionKind::Call, 50);

    assert_eq!(state.street, Street::Flop);
    assert_eq!(state.pots_total(), Chips(1050));
}

fn heads_up_all_in() -> HandState {
    let config = holdem_table(2);
    let seats = vec![rit_player(1, 1000), rit_player(2, 1000)];
    let order = dealing_order(&["Kd Kc", "As Ah"], "2c 7c 9h Js 3d");
    let mut state = new_hand(&config, &seats, order, 0);
    run(&mut state);

    act(&mut state, 0, ActionKind::AllIn, 0);
    let caller = state.next_seat_action.clone().unwrap();
    assert!(!caller.allows(ActionKind::Call));
    assert!(caller.allows(ActionKind::AllIn));
    act(&mut state, 1, ActionKind::AllIn, 0);
    state
}

#[test]
fn run_it_twice_accepted_deals_second_board() {
    let mut state = heads_up_all_in();
    assert_eq!(state.flow_state, FlowState::RunItTwiceUpPrompt);
    assert_eq!(state.run_it_twice.as_ref().unwrap().seats.len(), 2);

    act(&mut state, 0, ActionKind::RunItTwiceYes, 0);
    assert_eq!(state.flow_state, FlowState::RunItTwiceUpPrompt);
    act(&mut state, 1, ActionKind::RunItTwiceYes, 0);

    assert_eq!(state.flow_state, FlowState::MoveToNextHand);
    assert_eq!(state.board2, Some(cards("3c 4c 5c 6c 8c")));

    // Первый борд – тузы, второй – флеш короля треф. Банк пополам.
    let result = state.result.clone().unwrap();
    assert!(result.run_it_twice);
    assert_eq!(result.boards.len(), 2);
    assert_eq!(result.won_by(0), Chips(1000));
    assert_eq!(result.won_by(1), Chips(1000));
    assert_eq!(chips(&state), vec![1000, 1000]);
}

#[test]
fn run_it_twice_prompt_accepts_only_yes_or_no() {
    let mut state = heads_up_all_in();
    let msg = acted(&state, 0, ActionKind::Call, 0);
    assert_eq!(on_player_acted(&mut state, msg, now()).unwrap_err(), EngineError::IllegalAction);
    assert!(state.run_it_twice.as_ref().unwrap().seats.iter().all(|s| !s.responded));
}

#[test]
fn run_it_twice_first_decline_ends_prompt() {
    let mut state = heads_up_all_in();
    act(&mut state, 1, ActionKind::RunItTwiceNo, 0);

    assert_eq!(state.flow_state, FlowState::MoveToNextHand);
    assert!(state.board2.is_none());
    assert_eq!(chips(&state), vec![2000, 0]);
}

#[test]
fn run_it_twice_timeout_counts_as_decline() {
    let mut state = heads_up_all_in();
    act(&mut state, 0, ActionKind::RunItTwiceYes, 0);

    on_run_it_twice_timeout(&mut state, now()).unwrap();
    assert!(state.run_it_twice_decided);
    assert!(!state.run_it_twice_confirmed);
    run(&mut state);

    assert_eq!(state.flow_state, FlowState::MoveToNextHand);
    assert!(!state.result.unwrap().run_it_twice);
}

#[test]
fn run_it_twice_not_offered_three_way() {
    let config = holdem_table(3);
    let seats = vec![rit_player(1, 1000), rit_player(2, 1000), rit_player(3, 1000)];
    let order = dealing_order(&["Kd Kc", "Qd Qc", "As Ah"], "2h 7h 9s Js 3d");
    let mut state = new_hand(&config, &seats, order, 0);
    run(&mut state);
    assert_eq!(state.chips_in_play(), Chips(3000));

    act(&mut state, 0, ActionKind::AllIn, 0);
    act(&mut state, 1, ActionKind::AllIn, 0);
    assert!(!run_it_twice_eligible(&state));
    act(&mut state, 2, ActionKind::AllIn, 0);

    assert_eq!(state.flow_state, FlowState::MoveToNextHand);
    assert!(state.board2.is_none());
    assert!(state
        .log
        .events
        .iter()
        .all(|e| !matches!(e.kind, HandEventKind::RunItTwiceDecided { .. })));
    assert_eq!(chips(&state), vec![3000, 0, 0]);
}

#[test]
fn run_it_twice_needs_both_opt_ins() {
    let config = holdem_table(2);
    let seats = vec![rit_player(1, 1000), player(2, 1000)];
    let mut state = new_hand(&config, &seats, dealing_order(&["Kd Kc", "As Ah"], "2c 7c 9h Js 3d"), 0);
    run(&mut state);

    act(&mut state, 0, ActionKind::AllIn, 0);
    act(&mut state, 1, ActionKind::AllIn, 0);

    assert_eq!(state.flow_state, FlowState::MoveToNextHand);
    assert!(state.board2.is_none());
}

#[test]
fn all_in_runout_reveals_cards_to_everyone() {
    let config = holdem_table(2);
    let seats = vec![player(1, 1000), player(2, 1000)];
    let mut state = new_hand(&config, &seats, dealing_order(&["Kd Kc", "As Ah"], "2c 7c 9h Js 3d"), 0);
    run(&mut state);
    assert!(hand_view_for(&state, None).seats.iter().all(|s| s.hole_cards.is_none()));

    act(&mut state, 0, ActionKind::AllIn, 0);
    let msg = acted(&state, 1, ActionKind::AllIn, 0);
    on_player_acted(&mut state, msg, now()).unwrap();
    for _ in 0..16 {
        if state.flow_state == FlowState::Showdown {
            break;
        }
        step(&mut state, now()).unwrap();
    }
    assert_eq!(state.flow_state, FlowState::Showdown);
    assert!(state.result.is_none());

    // Что ушло в NoMoreActions, то видно и наблюдателю.
    let shown: Vec<_> = state
        .take_outbox()
        .into_iter()
        .filter_map(|o| match o.message {
            Notification::NoMoreActions { hands, .. } => Some(hands),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(shown.len(), 2);
    let view = hand_view_for(&state, None);
    for hand in shown {
        assert_eq!(view.seats[hand.seat as usize].hole_cards.as_ref(), Some(&hand.cards));
    }
}

#[test]
fn run_it_twice_not_offered_when_all_in_is_covered() {
    let config = holdem_table(2);
    let seats = vec![rit_player(1, 1000), rit_player(2, 2000)];
    let mut state = new_hand(&config, &seats, dealing_order(&["Kd Kc", "As Ah"], "2c 7c 9h Js 3d"), 0);
    run(&mut state);

    act(&mut state, 0, ActionKind::AllIn, 0);
    act(&mut state, 1, ActionKind::Call, 900);

    // У коллера остался стек: второй борд не предлагается.
    assert_eq!(state.flow_state, FlowState::MoveToNextHand);
    assert!(state.board2.is_none());
    assert!(state
        .log
        .events
        .iter()
        .all(|e| !matches!(e.kind, HandEventKind::RunItTwiceDecided { .. })));
    assert_eq!(chips(&state), vec![2000, 1000]);
}

#[test]
fn odd_run_it_twice_pot_gives_extra_chip_to_first_board() {
    let config = TableConfig::new("T-1", GameType::Holdem, Chips(5), Chips(10)).with_max_seats(3);
    let seats = vec![rit_player(1, 1000), player(2, 1000), rit_player(3, 1000)];
    let order = dealing_order(&["2d 3h", "Kd Kc", "As Ah"], "2c 7c 9h Js 3d");
    let mut state = new_hand(&config, &seats, order, 0);
    run(&mut state);

    act(&mut state, 0, ActionKind::AllIn, 0);
    act(&mut state, 1, ActionKind::Fold, 0);
    act(&mut state, 2, ActionKind::AllIn, 0);
    assert_eq!(state.flow_state, FlowState::RunItTwiceUpPrompt);

    act(&mut state, 0, ActionKind::RunItTwiceYes, 0);
    act(&mut state, 2, ActionKind::RunItTwiceYes, 0);
    assert_eq!(state.board2, Some(cards("3c 4c 5c 6c 8c")));

    // Банк 2005: первому борду 1003, второму 1002.
    let result = state.result.clone().unwrap();
    assert_eq!(result.won_by(0), Chips(1003));
    assert_eq!(result.won_by(2), Chips(1002));
    assert_eq!(chips(&state), vec![1003, 995, 1002]);
}

#[test]
fn tied_odd_pot_remainder_goes_clockwise_from_button() {
    let config = TableConfig::new("T-1", GameType::Holdem, Chips(5), Chips(10)).with_max_seats(3);
    let seats = vec![player(1, 1000), player(2, 1000), player(3, 1000)];
    let order = dealing_order(&["Kd Kc", "Qd Qc", "2h 3h"], "Ts Js Qs Ks As");
    let mut state = new_hand(&config, &seats, order, 0);
    run(&mut state);

    act(&mut state, 0, ActionKind::Call, 10);
    act(&mut state, 1, ActionKind::Fold, 0);
    act(&mut state, 2, ActionKind::Check, 0);
    check_down(&mut state);

    // Роял-флеш на борде, банк 25 пополам; лишняя фишка первому после кнопки.
    let result = state.result.clone().unwrap();
    assert_eq!(result.pot_winners[0].boards[0].hi_winners.len(), 2);
    assert_eq!(result.won_by(2), Chips(13));
    assert_eq!(result.won_by(0), Chips(12));
    assert_eq!(chips(&state), vec![1002, 995, 1003]);
}

/// Прогнать переходы по одному и после каждого сверить сумму фишек на столе.
fn run_conserving(state: &mut HandState, total: Chips) {
    for _ in 0..64 {
        if state.result.is_none() {
            assert_eq!(state.chips_in_play(), total, "flow {}", state.flow_state);
        }
        match step(state, now()).unwrap() {
            StepResult::Advanced => continue,
            StepResult::Waiting => return,
        }
    }
    panic!("машина состояний не остановилась");
}

fn act_conserving(state: &mut HandState, seat: u8, action: ActionKind, amount: u64, total: Chips) {
    let msg = acted(state, seat, action, amount);
    on_player_acted(state, msg, now()).unwrap();
    run_conserving(state, total);
}

#[test]
fn side_pot_hand_conserves_chips_at_every_step() {
    let config = holdem_table(3);
    let seats = vec![player(1, 1000), player(2, 300), player(3, 1000)];
    let order = dealing_order(&["As Ah", "Kd Kc", "Qd Qc"], "2c 7d 9h Js 3c");
    let total = Chips(2300);
    let mut state = new_hand(&config, &seats, order, 0);
    run_conserving(&mut state, total);

    act_conserving(&mut state, 0, ActionKind::Raise, 300, total);
    act_conserving(&mut state, 1, ActionKind::AllIn, 0, total);
    act_conserving(&mut state, 2, ActionKind::Call, 200, total);
    assert_eq!(state.street, Street::Flop);
    assert_eq!(state.pots_total(), Chips(900));

    assert_eq!(to_act(&state), 2);
    act_conserving(&mut state, 2, ActionKind::Bet, 200, total);
    act_conserving(&mut state, 0, ActionKind::Call, 200, total);
    while state.flow_state == FlowState::WaitForNextAction {
        let seat = to_act(&state);
        act_conserving(&mut state, seat, ActionKind::Check, 0, total);
    }

    // Основной банк 900 у тузов, побочный 400 у королей.
    assert_eq!(state.flow_state, FlowState::MoveToNextHand);
    assert_eq!(chips(&state), vec![500, 900, 900]);
    assert_eq!(chips(&state).iter().sum::<u64>(), total.0);
}

#[test]
fn short_scripted_deck_is_rejected_before_dealing() {
    let config = holdem_table(2);
    let seats = vec![player(1, 1000), player(2, 1000)];
    let err = HandState::new(NewHandParams {
        config: &config,
        time_rules: &TimeRules::default(),
        hand_num: 1,
        seats: &seats,
        deck: Deck::from_dealing_order(cards("As Ah Kd")),
        prev_button: None,
        button_override: Some(0),
    })
    .unwrap_err();

    assert_eq!(err, EngineError::DeckTooShort { needed: 9, got: 3 });
}

fn hi_lo_hand(button_hole: &str, other_hole: &str) -> HandState {
    let config = TableConfig::new("T-HL", GameType::PloHiLo, Chips(50), Chips(100)).with_max_seats(2);
    let seats = vec![player(1, 1000), player(2, 1000)];
    let order = dealing_order(&[other_hole, button_hole], "2c 5d 7h Ks Kd");
    let mut state = new_hand(&config, &seats, order, 0);
    run(&mut state);
    check_down(&mut state);
    state
}

#[test]
fn hi_lo_splits_between_high_and_low() {
    let state = hi_lo_hand("Kc Kh 9s 9d", "Ac 3s Qh Jd");

    let result = state.result.clone().unwrap();
    let board = &result.pot_winners[0].boards[0];
    assert_eq!(board.hi_winners.len(), 1);
    assert_eq!(board.hi_winners[0].seat, 0);
    assert_eq!(board.lo_winners.len(), 1);
    assert_eq!(board.lo_winners[0].seat, 1);
    assert_eq!(result.won_by(0), Chips(100));
    assert_eq!(result.won_by(1), Chips(100));
    assert!(!result.scoop);
    assert_eq!(chips(&state), vec![1000, 1000]);
}

#[test]
fn hi_lo_scoop_when_one_seat_wins_both_halves() {
    let state = hi_lo_hand("Kc Kh Ac 3s", "4c 6s Qh Jd");

    let result = state.result.clone().unwrap();
    assert!(result.scoop);
    assert_eq!(result.won_by(0), Chips(200));
    assert_eq!(chips(&state), vec![1100, 900]);
}
