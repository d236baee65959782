//! Определение победителей по банкам и бордам, рейк.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::card::Card;
use crate::domain::chips::Chips;
use crate::domain::hand::Street;
use crate::domain::{HandNum, PlayerId, SeatIndex};
use crate::engine::errors::EngineError;
use crate::engine::hand_state::HandState;
use crate::engine::notifications::SeatBalance;
use crate::engine::positions::seats_clockwise_from;
use crate::eval::{evaluator_for, ScoredHand};

/// Доля одного победителя.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WinnerShare {
    pub seat: SeatIndex,
    pub player_id: PlayerId,
    /// Чистый выигрыш (после рейка).
    pub amount: Chips,
    /// HandRank для хай, LowRank для лоу. 0 – выиграл без вскрытия.
    pub rank: u32,
    pub cards: Vec<Card>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardWinners {
    /// 1 или 2.
    pub board_no: u8,
    pub amount: Chips,
    pub hi_winners: Vec<WinnerShare>,
    pub lo_winners: Vec<WinnerShare>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PotWinners {
    pub pot_no: usize,
    pub amount: Chips,
    pub boards: Vec<BoardWinners>,
}

/// Итог раздачи.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandResult {
    pub hand_num: HandNum,
    pub run_it_twice: bool,
    pub boards: Vec<Vec<Card>>,
    pub pot_winners: Vec<PotWinners>,
    pub rake_collected: Chips,
    /// Сколько рейка удержано с каждого места.
    pub rake_paid: BTreeMap<SeatIndex, Chips>,
    /// Один игрок забрал всё (хай и лоу на всех бордах).
    pub scoop: bool,
    pub won_by_fold: bool,
    /// Балансы после выплаты.
    pub balances: Vec<SeatBalance>,
}

impl HandResult {
    /// Сколько всего выиграло место (чистыми).
    pub fn won_by(&self, seat: SeatIndex) -> Chips {
        self.shares().filter(|s| s.seat == seat).map(|s| s.amount).sum()
    }

    pub fn shares(&self) -> impl Iterator<Item = &WinnerShare> {
        self.pot_winners
            .iter()
            .flat_map(|p| p.boards.iter())
            .flat_map(|b| b.hi_winners.iter().chain(b.lo_winners.iter()))
    }

    fn shares_mut(&mut self) -> impl Iterator<Item = &mut WinnerShare> {
        self.pot_winners
            .iter_mut()
            .flat_map(|p| p.boards.iter_mut())
            .flat_map(|b| b.hi_winners.iter_mut().chain(b.lo_winners.iter_mut()))
    }
}

/// Рейк: floor(total * pct / 100), не больше `cap` (0 – без ограничения),
/// минимум 1, если рейк вообще положен.
pub fn compute_rake(total: Chips, percentage: f64, cap: Chips) -> Chips {
    if total.is_zero() || percentage <= 0.0 {
        return Chips::ZERO;
    }
    let raw = (total.0 as f64 * percentage / 100.0).floor() as u64;
    let mut rake = Chips(raw.max(1));
    if !cap.is_zero() {
        rake = rake.min(cap);
    }
    rake.min(total)
}

/// Порядок раздачи лишних фишек: по часовой от места после кнопки.
fn clockwise_order(state: &HandState, seats: &[SeatIndex]) -> Vec<SeatIndex> {
    let start = ((state.button_pos as usize + 1) % state.max_seats.max(1) as usize) as SeatIndex;
    seats_clockwise_from(state.max_seats, start, |s| seats.contains(&s))
}

/// Разделить сумму поровну; остаток – по одной фишке в порядке `order`.
fn split_among(amount: Chips, order: &[SeatIndex]) -> Vec<(SeatIndex, Chips)> {
    let (share, remainder) = amount.split(order.len());
    order
        .iter()
        .enumerate()
        .map(|(i, &seat)| {
            let extra = if (i as u64) < remainder.0 { Chips(1) } else { Chips::ZERO };
            (seat, share + extra)
        })
        .collect()
}

/// Посчитать победителей всех банков. HandState не меняется.
///
/// Банк делится поровну между бордами (лишние фишки – ранним бордам),
/// на борде – 50/50 между хай и лоу, если есть квалифицированный лоу
/// (нечётная фишка – хай). Рейк удерживается по кругу с долей победителей.
pub fn evaluate_winners(state: &HandState) -> Result<HandResult, EngineError> {
    let live = state.live_seats();
    let won_by_fold = live.len() == 1;

    let mut boards: Vec<Vec<Card>> = vec![state.board.clone()];
    if let Some(second) = &state.board2 {
        boards.push(second.clone());
    }

    let evaluator = evaluator_for(state.game_type);
    let has_low = state.game_type.has_low();

    // Оценка рук считается один раз на (место, борд).
    let mut scored: BTreeMap<(SeatIndex, usize), ScoredHand> = BTreeMap::new();
    if !won_by_fold {
        for &seat in &live {
            for (b, board) in boards.iter().enumerate() {
                let hand = evaluator.evaluate(&state.hole_cards[seat as usize], board);
                scored.insert((seat, b), hand);
            }
        }
    }

    let mut pot_winners = Vec::new();
    for (pot_no, pot) in state.pots.iter().enumerate() {
        if pot.amount.is_zero() {
            continue;
        }
        if pot.seats.is_empty() {
            return Err(EngineError::Internal("банк без претендентов"));
        }

        let board_amounts = split_among_boards(pot.amount, boards.len());
        let mut pot_boards = Vec::new();

        for (b, &board_amount) in board_amounts.iter().enumerate() {
            let share = |seat: SeatIndex, amount: Chips, low: bool| -> Result<WinnerShare, EngineError> {
                let player_id = state.player_at(seat).ok_or(EngineError::Internal("победитель на пустом месте"))?;
                let (rank, cards) = match scored.get(&(seat, b)) {
                    Some(h) if low => (h.lo_rank.map_or(0, |r| r.0), h.lo_cards.clone()),
                    Some(h) => (h.hi_rank.0, h.hi_cards.clone()),
                    None => (0, Vec::new()),
                };
                Ok(WinnerShare {
                    seat,
                    player_id,
                    amount,
                    rank,
                    cards,
                })
            };

            if pot.seats.len() == 1 || scored.is_empty() {
                let seat = pot.seats[0];
                pot_boards.push(BoardWinners {
                    board_no: b as u8 + 1,
                    amount: board_amount,
                    hi_winners: vec![share(seat, board_amount, false)?],
                    lo_winners: Vec::new(),
                });
                continue;
            }

            let contenders: Vec<(SeatIndex, &ScoredHand)> = pot
                .seats
                .iter()
                .filter_map(|&s| scored.get(&(s, b)).map(|h| (s, h)))
                .collect();

            let best_hi = contenders.iter().map(|(_, h)| h.hi_rank).max();
            let hi_seats: Vec<SeatIndex> = contenders
                .iter()
                .filter(|(_, h)| Some(h.hi_rank) == best_hi)
                .map(|(s, _)| *s)
                .collect();

            let lo_seats: Vec<SeatIndex> = if has_low {
                let best_lo = contenders.iter().filter_map(|(_, h)| h.lo_rank).min();
                match best_lo {
                    Some(best) => contenders
                        .iter()
                        .filter(|(_, h)| h.lo_rank == Some(best))
                        .map(|(s, _)| *s)
                        .collect(),
                    None => Vec::new(),
                }
            } else {
                Vec::new()
            };

            let (hi_amount, lo_amount) = if lo_seats.is_empty() {
                (board_amount, Chips::ZERO)
            } else {
                let lo = Chips(board_amount.0 / 2);
                (board_amount - lo, lo)
            };

            let mut hi_winners = Vec::new();
            for (seat, amount) in split_among(hi_amount, &clockwise_order(state, &hi_seats)) {
                hi_winners.push(share(seat, amount, false)?);
            }
            let mut lo_winners = Vec::new();
            if !lo_seats.is_empty() {
                for (seat, amount) in split_among(lo_amount, &clockwise_order(state, &lo_seats)) {
                    lo_winners.push(share(seat, amount, true)?);
                }
            }

            pot_boards.push(BoardWinners {
                board_no: b as u8 + 1,
                amount: board_amount,
                hi_winners,
                lo_winners,
            });
        }

        pot_winners.push(PotWinners {
            pot_no,
            amount: pot.amount,
            boards: pot_boards,
        });
    }

    let total = state.pots_total();
    let rake_applies = !(state.no_flop_no_drop && won_by_fold && state.street == Street::Preflop);
    let rake = if rake_applies {
        compute_rake(total, state.rake_percentage, state.rake_cap)
    } else {
        Chips::ZERO
    };

    let mut result = HandResult {
        hand_num: state.hand_num,
        run_it_twice: state.board2.is_some(),
        boards,
        pot_winners,
        rake_collected: Chips::ZERO,
        rake_paid: BTreeMap::new(),
        scoop: false,
        won_by_fold,
        balances: Vec::new(),
    };

    if has_low {
        let seats: Vec<SeatIndex> = result.shares().map(|s| s.seat).collect();
        if let Some(&first) = seats.first() {
            result.scoop = seats.iter().all(|&s| s == first);
        }
    }

    result.rake_collected = deduct_rake(&mut result, rake);

    let mut balances = state.balances();
    for b in balances.iter_mut() {
        b.stack += result.won_by(b.seat);
        b.bet = Chips::ZERO;
    }
    result.balances = balances;

    Ok(result)
}

fn split_among_boards(amount: Chips, boards: usize) -> Vec<Chips> {
    let (share, remainder) = amount.split(boards);
    (0..boards)
        .map(|i| if (i as u64) < remainder.0 { share + Chips(1) } else { share })
        .collect()
}

/// Удержать рейк с долей победителей по кругу, пока он не исчерпан.
fn deduct_rake(result: &mut HandResult, rake: Chips) -> Chips {
    let mut remaining = rake.0;
    let mut paid: BTreeMap<SeatIndex, Chips> = BTreeMap::new();

    while remaining > 0 {
        let positive = result.shares().filter(|s| !s.amount.is_zero()).count() as u64;
        if positive == 0 {
            break;
        }
        let per_share = remaining / positive;
        let mut ones = if per_share == 0 { remaining } else { 0 };

        for share in result.shares_mut() {
            if remaining == 0 {
                break;
            }
            if share.amount.is_zero() {
                continue;
            }
            let take = if per_share > 0 {
                per_share.min(share.amount.0)
            } else if ones > 0 {
                ones -= 1;
                1
            } else {
                0
            };
            share.amount -= Chips(take);
            remaining -= take;
            *paid.entry(share.seat).or_insert(Chips::ZERO) += Chips(take);
        }
    }

    paid.retain(|_, v| !v.is_zero());
    let collected = rake.0 - remaining;
    result.rake_paid = paid;
    Chips(collected)
}
