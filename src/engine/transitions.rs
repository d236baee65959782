//! Функции перехода машины состояний раздачи.
//!
//! Каждая функция сначала проверяет `FlowState`. Несовпадение – ошибка
//! `FlowStateMismatch` без изменения состояния; Game пишет её в лог и идёт дальше.
//! Исходящие сообщения копятся в `HandState::outbox` и уходят транспорту
//! только после сохранения чекпоинта.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::chips::Chips;
use crate::domain::hand::Street;
use crate::domain::SeatIndex;
use crate::engine::actions::{ActionKind, PlayerActed};
use crate::engine::betting::{ActState, BettingRoundState};
use crate::engine::errors::EngineError;
use crate::engine::flow::FlowState;
use crate::engine::hand_history::HandEventKind;
use crate::engine::hand_state::HandState;
use crate::engine::next_action::compute_next_seat_action;
use crate::engine::notifications::{Notification, Outbound};
use crate::engine::positions::seats_clockwise_from;
use crate::engine::pot::settle_round;
use crate::engine::run_it_twice::RunItTwiceState;
use crate::engine::showdown::evaluate_winners;
use crate::engine::validation::validate_action;

/// Результат одного автоматического шага.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepResult {
    /// Состояние изменилось – сохранить чекпоинт и разослать outbox.
    Advanced,
    /// Ждём внешнего ввода (игрок, таймер, команда стола).
    Waiting,
}

/// Что делать с входящим ходом.
#[derive(Clone, Debug, PartialEq)]
pub enum ActedOutcome {
    /// Ход принят; дальше Game вызывает `step`.
    Accepted,
    /// Повтор или устаревшее сообщение: состояние не менялось, отправителю – ack.
    Acknowledged(Outbound),
}

fn guard(state: &HandState, expected: FlowState) -> Result<(), EngineError> {
    if state.flow_state != expected {
        return Err(EngineError::FlowStateMismatch {
            expected,
            actual: state.flow_state,
        });
    }
    Ok(())
}

/// Сдать раздачу: блайнды, карманные карты, весь борд.
pub fn deal_hand(state: &mut HandState, _now: DateTime<Utc>) -> Result<(), EngineError> {
    guard(state, FlowState::DealHand)?;

    let order = seats_clockwise_from(
        state.max_seats,
        ((state.button_pos as usize + 1) % state.max_seats.max(1) as usize) as SeatIndex,
        |s| state.player_at(s).is_some(),
    );
    let hole = state.game_type.hole_cards();
    let needed = order.len() * hole + 5;
    if state.deck.len() < needed {
        return Err(EngineError::DeckTooShort {
            needed,
            got: state.deck.len(),
        });
    }

    state.log.push(HandEventKind::HandStarted {
        table_code: state.table_code.clone(),
        hand_num: state.hand_num,
        game_type: state.game_type,
    });

    let (sb_pos, bb_pos) = (state.sb_pos, state.bb_pos);
    let (small_blind, big_blind) = (state.small_blind, state.big_blind);
    let sb_paid = post_blind(state, sb_pos, small_blind);
    let bb_paid = post_blind(state, bb_pos, big_blind);
    state.round.current_raise = state.big_blind;
    state.round.raised_from = Chips::ZERO;

    state.log.push(HandEventKind::BlindsPosted {
        button: state.button_pos,
        small_blind: (state.sb_pos, sb_paid),
        big_blind: (state.bb_pos, bb_paid),
    });

    for _ in 0..hole {
        for &seat in &order {
            if let Some(card) = state.deck.draw_one() {
                state.hole_cards[seat as usize].push(card);
            }
        }
    }
    state.board = state.deck.draw_n(5);

    let balances = state.balances();
    state.push_all(Notification::NewHand {
        hand_num: state.hand_num,
        game_type: state.game_type,
        button: state.button_pos,
        small_blind: (state.sb_pos, sb_paid),
        big_blind: (state.bb_pos, bb_paid),
        balances,
    });

    for &seat in &order {
        let cards = state.hole_cards[seat as usize].clone();
        state.log.push(HandEventKind::HoleCardsDealt {
            seat,
            cards: cards.clone(),
        });
        if let Some(player_id) = state.player_at(seat) {
            state.push_to(
                player_id,
                Notification::CardsDealt {
                    hand_num: state.hand_num,
                    seat,
                    cards,
                },
            );
        }
    }

    state.flow_state = decide_next_flow(state);
    Ok(())
}

/// Поставить блайнд. Короткий стек ставит всё, что есть, и уходит в all-in.
fn post_blind(state: &mut HandState, seat: SeatIndex, blind: Chips) -> Chips {
    let idx = seat as usize;
    let paid = state.stacks[idx].min(blind);
    state.stacks[idx] -= paid;
    state.contributed[idx] += paid;
    state.round.bets[idx] += paid;
    if state.stacks[idx].is_zero() {
        state.act_round[idx].state = ActState::AllIn;
    }
    paid
}

/// Входящий ход игрока (или ответ на run-it-twice).
///
/// Проверки по порядку: номер раздачи, повтор, состояние, место, игрок, сумма.
/// Любая ошибка – без изменений. Устаревший повтор получает ack.
pub fn on_player_acted(state: &mut HandState, msg: PlayerActed, _now: DateTime<Utc>) -> Result<ActedOutcome, EngineError> {
    let ack = Outbound::to_player(
        msg.player_id,
        Notification::ActionAck {
            hand_num: msg.hand_num,
            message_id: msg.message_id.clone(),
        },
    );

    if msg.hand_num != state.hand_num {
        let err = EngineError::HandNumberMismatch {
            got: msg.hand_num,
            current: state.hand_num,
        };
        if err.is_stale_retry() {
            return Ok(ActedOutcome::Acknowledged(ack));
        }
        return Err(err);
    }

    let in_progress = state
        .action_msg_in_progress
        .as_ref()
        .map_or(false, |m| m.message_id == msg.message_id);
    if in_progress || state.processed_messages.contains(&msg.message_id) {
        let err = EngineError::DuplicateMessage(msg.message_id);
        debug!(table = %state.table_code, hand = state.hand_num, error = %err, "retry acknowledged");
        return Ok(ActedOutcome::Acknowledged(ack));
    }

    if state.flow_state == FlowState::RunItTwiceUpPrompt {
        return on_run_it_twice_response(state, msg, ack);
    }
    guard(state, FlowState::WaitForNextAction)?;

    let next = state
        .next_seat_action
        .clone()
        .ok_or(EngineError::Internal("нет NextSeatAction в WAIT_FOR_NEXT_ACTION"))?;

    if msg.seat != next.seat {
        return Err(EngineError::NotPlayersTurn(msg.seat));
    }
    if msg.player_id != next.player_id {
        return Err(EngineError::PlayerMismatch {
            seat: msg.seat,
            player_id: msg.player_id,
        });
    }
    if msg.timed_out && msg.message_id != PlayerActed::timeout_message_id(state.hand_num, next.action_id) {
        // Таймер прошлого хода этого же места.
        return Err(EngineError::NotPlayersTurn(msg.seat));
    }

    validate_action(state, &next, &msg)?;

    state.action_msg_in_progress = Some(msg);
    state.flow_state = FlowState::PrepareNextAction;
    state.outbox.push(ack);
    Ok(ActedOutcome::Accepted)
}

fn on_run_it_twice_response(state: &mut HandState, msg: PlayerActed, ack: Outbound) -> Result<ActedOutcome, EngineError> {
    if !msg.timed_out && !msg.action.is_run_it_twice() {
        return Err(EngineError::IllegalAction);
    }
    let confirmed = !msg.timed_out && msg.action == ActionKind::RunItTwiceYes;

    if state.player_at(msg.seat) != Some(msg.player_id) {
        return Err(EngineError::PlayerMismatch {
            seat: msg.seat,
            player_id: msg.player_id,
        });
    }

    let prompt = state
        .run_it_twice
        .as_mut()
        .ok_or(EngineError::Internal("нет активного предложения run-it-twice"))?;
    let entry = prompt.seat_mut(msg.seat).ok_or(EngineError::NotPlayersTurn(msg.seat))?;
    if entry.responded {
        return Ok(ActedOutcome::Acknowledged(ack));
    }
    entry.responded = true;
    entry.confirmed = confirmed;

    state.processed_messages.push(msg.message_id);
    state.outbox.push(ack);

    let decided = state.run_it_twice.as_ref().map_or(false, |p| p.is_decided());
    if decided {
        finish_run_it_twice(state);
    }
    Ok(ActedOutcome::Accepted)
}

/// Время на ответ run-it-twice вышло: кто не ответил – отказался.
pub fn on_run_it_twice_timeout(state: &mut HandState, _now: DateTime<Utc>) -> Result<(), EngineError> {
    guard(state, FlowState::RunItTwiceUpPrompt)?;
    let prompt = state
        .run_it_twice
        .as_mut()
        .ok_or(EngineError::Internal("нет активного предложения run-it-twice"))?;
    for seat in prompt.seats.iter_mut().filter(|s| !s.responded) {
        seat.responded = true;
        seat.confirmed = false;
    }
    finish_run_it_twice(state);
    Ok(())
}

fn finish_run_it_twice(state: &mut HandState) {
    let confirmed = state.run_it_twice.as_ref().map_or(false, |p| p.all_confirmed());
    state.run_it_twice = None;
    state.run_it_twice_decided = true;
    state.run_it_twice_confirmed = confirmed;
    state.log.push(HandEventKind::RunItTwiceDecided { confirmed });
    state.push_all(Notification::RunItTwiceDecision {
        hand_num: state.hand_num,
        confirmed,
    });
    state.flow_state = FlowState::AllPlayersAllIn;
}

/// Выполнить переход для текущего автоматического `FlowState`.
pub fn step(state: &mut HandState, now: DateTime<Utc>) -> Result<StepResult, EngineError> {
    debug!(table = %state.table_code, hand = state.hand_num, flow = %state.flow_state, "step");
    match state.flow_state {
        FlowState::DealHand => deal_hand(state, now).map(|_| StepResult::Advanced),
        FlowState::PrepareNextAction => apply_pending_action(state),
        FlowState::MoveToNextAction => move_to_next_action(state, now),
        FlowState::MoveToNextRound => move_to_next_round(state),
        FlowState::AllPlayersAllIn => all_players_all_in(state),
        FlowState::OnePlayerRemaining | FlowState::Showdown => showdown(state),
        FlowState::RunItTwiceUpPrompt => open_run_it_twice_prompt(state, now),
        FlowState::HandEnded => hand_ended(state),
        FlowState::WaitForNextAction | FlowState::MoveToNextHand | FlowState::WaitForPendingUpdate => {
            Ok(StepResult::Waiting)
        }
    }
}

/// Применить сохранённый `action_msg_in_progress`.
fn apply_pending_action(state: &mut HandState) -> Result<StepResult, EngineError> {
    let msg = state
        .action_msg_in_progress
        .clone()
        .ok_or(EngineError::Internal("PREPARE_NEXT_ACTION без хода"))?;
    let next = state
        .next_seat_action
        .clone()
        .ok_or(EngineError::Internal("PREPARE_NEXT_ACTION без NextSeatAction"))?;

    let resolved = match validate_action(state, &next, &msg) {
        Ok(resolved) => resolved,
        Err(err) => {
            // Сюда попадаем только если чекпоинт не соответствует ходу: ждём ретрай.
            state.action_msg_in_progress = None;
            state.flow_state = FlowState::WaitForNextAction;
            return Err(err);
        }
    };

    let seat = next.seat;
    let idx = seat as usize;
    let pay = resolved.new_bet.saturating_sub(state.round.bets[idx]);
    state.stacks[idx] -= pay;
    state.contributed[idx] += pay;
    state.round.bets[idx] = resolved.new_bet;
    state.round.register_bet(seat, resolved.new_bet, state.big_blind);

    let all_in = state.stacks[idx].is_zero() && resolved.kind != ActionKind::Fold;
    state.act_round[idx].state = match resolved.kind {
        ActionKind::Fold => ActState::Folded,
        _ if all_in => ActState::AllIn,
        ActionKind::Check => ActState::Checked,
        ActionKind::Call => ActState::Called,
        _ => ActState::Raised,
    };
    state.act_round[idx].amount = resolved.new_bet;
    state.act_round[idx].bet_index = state.round.bet_index;

    state.last_actor = Some(seat);
    state.action_seq += 1;
    state.next_seat_action = None;
    state.action_msg_in_progress = None;
    state.processed_messages.push(msg.message_id.clone());

    state.log.push(HandEventKind::PlayerActed {
        player_id: msg.player_id,
        seat,
        action: resolved.kind,
        amount: resolved.new_bet,
        new_stack: state.stacks[idx],
        timed_out: msg.timed_out,
    });

    let pots = state.pots.clone();
    let balances = state.balances();
    state.push_all(Notification::ActionChanged {
        hand_num: state.hand_num,
        seat,
        player_id: msg.player_id,
        action: resolved.kind,
        amount: resolved.new_bet,
        timed_out: msg.timed_out,
        pots,
        balances,
    });

    state.flow_state = decide_next_flow(state);
    Ok(StepResult::Advanced)
}

/// Куда идти после хода (или после сдачи).
fn decide_next_flow(state: &HandState) -> FlowState {
    if state.live_seats().len() <= 1 {
        return FlowState::OnePlayerRemaining;
    }
    if !state.is_round_complete() {
        return FlowState::MoveToNextAction;
    }
    if state.actionable_seats().len() <= 1 {
        if state.street >= Street::River {
            return FlowState::MoveToNextRound;
        }
        if run_it_twice_eligible(state) {
            return FlowState::RunItTwiceUpPrompt;
        }
        return FlowState::AllPlayersAllIn;
    }
    FlowState::MoveToNextRound
}

/// Run-it-twice предлагаем, только если за банк борются ровно два места,
/// оба заранее согласились, оба в all-in, и борд ещё не открыт.
/// Покрывший all-in коллом остаётся со стеком, и ему второй борд не предлагается.
pub fn run_it_twice_eligible(state: &HandState) -> bool {
    if !state.allow_run_it_twice || state.run_it_twice_decided || state.street >= Street::River {
        return false;
    }
    let live = state.live_seats();
    if live.len() != 2 {
        return false;
    }
    let opted_in = live
        .iter()
        .all(|&s| state.run_it_twice_opt_in.get(s as usize).copied().unwrap_or(false));
    let all_in = live.iter().all(|&s| state.is_all_in(s));
    let cards_left = 5 - state.street.board_len();
    opted_in && all_in && state.deck.len() >= cards_left
}

fn open_run_it_twice_prompt(state: &mut HandState, now: DateTime<Utc>) -> Result<StepResult, EngineError> {
    if state.run_it_twice.is_some() {
        return Ok(StepResult::Waiting);
    }
    if state.run_it_twice_decided {
        state.flow_state = FlowState::AllPlayersAllIn;
        return Ok(StepResult::Advanced);
    }

    let seats: Vec<_> = state
        .live_seats()
        .into_iter()
        .filter_map(|s| state.player_at(s).map(|p| (s, p)))
        .collect();
    let expires_at = state.run_it_twice_deadline(now);
    state.run_it_twice = Some(RunItTwiceState::new(&seats, expires_at));
    state.push_all(Notification::RunItTwicePrompt {
        hand_num: state.hand_num,
        seats: seats.iter().map(|(s, _)| *s).collect(),
        expires_at,
    });
    Ok(StepResult::Advanced)
}

fn move_to_next_action(state: &mut HandState, now: DateTime<Utc>) -> Result<StepResult, EngineError> {
    let Some(seat) = state.next_to_act() else {
        state.flow_state = if state.live_seats().len() <= 1 {
            FlowState::OnePlayerRemaining
        } else {
            FlowState::MoveToNextRound
        };
        return Ok(StepResult::Advanced);
    };

    let next = compute_next_seat_action(state, seat, now)?;
    state.push_all(Notification::NextAction {
        hand_num: state.hand_num,
        seat,
        player_id: next.player_id,
        expires_at: next.expires_at,
    });
    state.push_to(next.player_id, Notification::YourAction(next.clone()));
    state.next_seat_action = Some(next);
    state.flow_state = FlowState::WaitForNextAction;
    Ok(StepResult::Advanced)
}

/// Смести ставки раунда в банки и вернуть неуравненный излишек.
fn settle(state: &mut HandState) {
    let returned = settle_round(&mut state.pots, &mut state.round.bets, &state.act_round);
    if let Some(ret) = returned {
        let idx = ret.seat as usize;
        state.stacks[idx] += ret.amount;
        state.contributed[idx] -= ret.amount;
        state.log.push(HandEventKind::UncalledReturned {
            seat: ret.seat,
            amount: ret.amount,
        });
    }
    state.log.push(HandEventKind::PotsSettled {
        street: state.street,
        pots: state.pots.clone(),
    });
}

fn move_to_next_round(state: &mut HandState) -> Result<StepResult, EngineError> {
    settle(state);

    if state.street >= Street::River {
        state.flow_state = FlowState::Showdown;
        return Ok(StepResult::Advanced);
    }

    state.street = state.street.next();
    state.round = BettingRoundState::new(state.street, state.max_seats);
    for act in state.act_round.iter_mut() {
        act.reset_for_round();
    }
    state.last_actor = None;

    let board = state.revealed_board().to_vec();
    let already_open = match state.street {
        Street::Flop => 0,
        _ => board.len().saturating_sub(1),
    };
    let new_cards = board[already_open..].to_vec();
    state.log.push(HandEventKind::BoardDealt {
        street: state.street,
        cards: new_cards,
    });

    let pots = state.pots.clone();
    let balances = state.balances();
    state.push_all(Notification::BoardRevealed {
        hand_num: state.hand_num,
        street: state.street,
        board,
        pots,
        balances,
    });

    state.flow_state = decide_next_flow(state);
    Ok(StepResult::Advanced)
}

/// Ходов больше нет: открываем карты и докладываем борд (или два).
fn all_players_all_in(state: &mut HandState) -> Result<StepResult, EngineError> {
    settle(state);

    let pots = state.pots.clone();
    let hands = state.shown_hands();
    state.hands_shown = true;
    state.push_all(Notification::NoMoreActions {
        hand_num: state.hand_num,
        hands,
        pots,
    });

    let revealed = state.street.board_len().min(state.board.len());
    if state.run_it_twice_confirmed {
        let mut second: Vec<_> = state.board[..revealed].to_vec();
        second.extend(state.deck.draw_n(5 - revealed));
        state.log.push(HandEventKind::SecondBoardDealt { cards: second.clone() });
        state.push_all(Notification::RunItTwiceBoards {
            hand_num: state.hand_num,
            board1: state.board.clone(),
            board2: second.clone(),
        });
        state.board2 = Some(second);
    } else {
        state.log.push(HandEventKind::BoardDealt {
            street: Street::River,
            cards: state.board[revealed..].to_vec(),
        });
        let balances = state.balances();
        state.push_all(Notification::BoardRevealed {
            hand_num: state.hand_num,
            street: Street::River,
            board: state.board.clone(),
            pots: state.pots.clone(),
            balances,
        });
    }

    state.street = Street::River;
    state.flow_state = FlowState::Showdown;
    Ok(StepResult::Advanced)
}

/// Шоудаун (или единственный оставшийся игрок): победители, рейк, выплата.
fn showdown(state: &mut HandState) -> Result<StepResult, EngineError> {
    settle(state);

    let result = evaluate_winners(state)?;

    if !result.won_by_fold {
        state.hands_shown = true;
        for hand in state.shown_hands() {
            state.log.push(HandEventKind::ShowdownReveal {
                seat: hand.seat,
                player_id: hand.player_id,
                hole_cards: hand.cards,
            });
        }
    }

    for pot in &result.pot_winners {
        for board in &pot.boards {
            let hi = board.hi_winners.iter().map(|w| (w, false));
            let lo = board.lo_winners.iter().map(|w| (w, true));
            for (winner, low) in hi.chain(lo) {
                state.stacks[winner.seat as usize] += winner.amount;
                state.log.push(HandEventKind::PotAwarded {
                    pot_no: pot.pot_no,
                    board_no: board.board_no,
                    seat: winner.seat,
                    player_id: winner.player_id,
                    amount: winner.amount,
                    low,
                });
            }
        }
    }
    if !result.rake_collected.is_zero() {
        state.log.push(HandEventKind::RakeCollected {
            amount: result.rake_collected,
        });
    }

    state.push_all(Notification::HandResult(result.clone()));
    state.result = Some(result);
    state.flow_state = FlowState::HandEnded;
    Ok(StepResult::Advanced)
}

fn hand_ended(state: &mut HandState) -> Result<StepResult, EngineError> {
    state.log.push(HandEventKind::HandFinished { hand_num: state.hand_num });
    state.push_all(Notification::HandEnded { hand_num: state.hand_num });
    state.flow_state = FlowState::MoveToNextHand;
    Ok(StepResult::Advanced)
}

/// Вход после рестарта без входящего сообщения.
///
/// В `WAIT_FOR_NEXT_ACTION` ход потерян вместе с процессом: перезапускаем
/// часы места и ждём ретрая от клиента. Предложение run-it-twice
/// повторяем с прежним абсолютным дедлайном.
pub fn resume(state: &mut HandState, now: DateTime<Utc>) -> Result<(), EngineError> {
    match state.flow_state {
        FlowState::WaitForNextAction => {
            let expires_at = state.action_deadline(now);
            let next = state
                .next_seat_action
                .as_mut()
                .ok_or(EngineError::Internal("нет NextSeatAction в WAIT_FOR_NEXT_ACTION"))?;
            next.expires_at = expires_at;
            let next = next.clone();
            state.push_all(Notification::NextAction {
                hand_num: state.hand_num,
                seat: next.seat,
                player_id: next.player_id,
                expires_at,
            });
            state.push_to(next.player_id, Notification::YourAction(next));
        }
        FlowState::RunItTwiceUpPrompt => {
            if let Some(prompt) = state.run_it_twice.clone() {
                state.push_all(Notification::RunItTwicePrompt {
                    hand_num: state.hand_num,
                    seats: prompt.seats.iter().map(|s| s.seat).collect(),
                    expires_at: prompt.expires_at,
                });
            }
        }
        _ => {}
    }
    Ok(())
}
