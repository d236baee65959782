use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;
use crate::domain::SeatIndex;
use crate::engine::betting::{ActState, PlayerActRound};

/// Банк: сумма + места, которые могут его выиграть.
///
/// Список мест только сужается (фолды), новые места в банк не добавляются.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pot {
    pub amount: Chips,
    /// Отсортированы по возрастанию.
    pub seats: Vec<SeatIndex>,
}

impl Pot {
    pub fn new(seats: Vec<SeatIndex>) -> Self {
        Self {
            amount: Chips::ZERO,
            seats,
        }
    }

    pub fn add(&mut self, amount: Chips) {
        self.amount += amount;
    }

    pub fn is_eligible(&self, seat: SeatIndex) -> bool {
        self.seats.contains(&seat)
    }
}

/// Сумма всех банков.
pub fn pots_total(pots: &[Pot]) -> Chips {
    pots.iter().map(|p| p.amount).sum()
}

/// Возврат неуравненной части ставки.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UncalledReturn {
    pub seat: SeatIndex,
    pub amount: Chips,
}

fn state_of(acts: &[PlayerActRound], seat: usize) -> ActState {
    acts.get(seat).map(|a| a.state).unwrap_or(ActState::Empty)
}

fn is_live(acts: &[PlayerActRound], seat: usize) -> bool {
    !matches!(state_of(acts, seat), ActState::Folded | ActState::Empty)
}

/// Смести ставки раунда в банки (алгоритм сайд-потов).
///
/// 1. Неуравненный излишек единственной максимальной ставки возвращается владельцу.
/// 2. Сфолдившие места убираются из всех банков.
/// 3. Если в последнем банке есть all-in место без ставки в этом раунде,
///    его банк закрыт – открываем новый.
/// 4. Пока самая маленькая ставка среди живых мест принадлежит all-in месту
///    и есть ставки больше, снимаем этот уровень со всех (и со сфолдивших)
///    в текущий банк и открываем новый для остатка. Иначе всё в текущий банк.
///
/// После вызова все `bets` равны нулю. Вызывающий обязан вернуть
/// `UncalledReturn` в стек и вычесть из вклада места.
pub fn settle_round(pots: &mut Vec<Pot>, bets: &mut [Chips], acts: &[PlayerActRound]) -> Option<UncalledReturn> {
    let returned = return_uncalled(bets, acts);

    let live_seats: Vec<SeatIndex> = (0..bets.len())
        .filter(|&s| is_live(acts, s))
        .map(|s| s as SeatIndex)
        .collect();

    if pots.is_empty() {
        pots.push(Pot::new(live_seats.clone()));
    }

    for pot in pots.iter_mut() {
        pot.seats.retain(|&s| is_live(acts, s as usize));
    }

    let any_bets = bets.iter().any(|b| !b.is_zero());
    if !any_bets {
        return returned;
    }

    let last_closed = pots.last().map_or(false, |pot| {
        pot.seats
            .iter()
            .any(|&s| state_of(acts, s as usize) == ActState::AllIn && bets[s as usize].is_zero())
    });
    if last_closed {
        let bettors: Vec<SeatIndex> = live_seats.iter().copied().filter(|&s| !bets[s as usize].is_zero()).collect();
        pots.push(Pot::new(bettors));
    }

    loop {
        let contenders: Vec<SeatIndex> = live_seats.iter().copied().filter(|&s| !bets[s as usize].is_zero()).collect();

        let Some(level) = contenders.iter().map(|&s| bets[s as usize]).min() else {
            sweep_all(pots, bets);
            break;
        };

        let capped_all_in = contenders
            .iter()
            .any(|&s| bets[s as usize] == level && state_of(acts, s as usize) == ActState::AllIn);
        let has_larger = contenders.iter().any(|&s| bets[s as usize] > level);

        if !(capped_all_in && has_larger) {
            sweep_all(pots, bets);
            break;
        }

        let mut peeled = Chips::ZERO;
        for bet in bets.iter_mut() {
            let take = (*bet).min(level);
            peeled += take;
            *bet -= take;
        }
        if let Some(pot) = pots.last_mut() {
            pot.add(peeled);
        }

        let rest: Vec<SeatIndex> = contenders.into_iter().filter(|&s| !bets[s as usize].is_zero()).collect();
        pots.push(Pot::new(rest));
    }

    while pots.len() > 1 && pots.last().map_or(false, |p| p.amount.is_zero()) {
        pots.pop();
    }

    returned
}

/// Вернуть излишек единственной максимальной ставки живого места.
fn return_uncalled(bets: &mut [Chips], acts: &[PlayerActRound]) -> Option<UncalledReturn> {
    let max = bets.iter().copied().max()?;
    if max.is_zero() {
        return None;
    }

    let mut at_max = (0..bets.len()).filter(|&s| bets[s] == max);
    let owner = at_max.next()?;
    if at_max.next().is_some() || !is_live(acts, owner) {
        return None;
    }

    let second = (0..bets.len())
        .filter(|&s| s != owner)
        .map(|s| bets[s])
        .max()
        .unwrap_or(Chips::ZERO);
    let excess = max - second;
    bets[owner] = second;

    Some(UncalledReturn {
        seat: owner as SeatIndex,
        amount: excess,
    })
}

fn sweep_all(pots: &mut [Pot], bets: &mut [Chips]) {
    let total: Chips = bets.iter().sum();
    if let Some(pot) = pots.last_mut() {
        pot.add(total);
    }
    for bet in bets.iter_mut() {
        *bet = Chips::ZERO;
    }
}
