use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{PlayerId, SeatIndex};

/// Ответ одного места на предложение run-it-twice.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunItTwiceSeat {
    pub seat: SeatIndex,
    pub player_id: PlayerId,
    pub responded: bool,
    pub confirmed: bool,
}

/// Активное предложение run-it-twice. Живёт, пока оба не ответили
/// или не вышло время.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunItTwiceState {
    pub seats: Vec<RunItTwiceSeat>,
    pub expires_at: DateTime<Utc>,
}

impl RunItTwiceState {
    pub fn new(seats: &[(SeatIndex, PlayerId)], expires_at: DateTime<Utc>) -> Self {
        Self {
            seats: seats
                .iter()
                .map(|&(seat, player_id)| RunItTwiceSeat {
                    seat,
                    player_id,
                    responded: false,
                    confirmed: false,
                })
                .collect(),
            expires_at,
        }
    }

    pub fn seat_mut(&mut self, seat: SeatIndex) -> Option<&mut RunItTwiceSeat> {
        self.seats.iter_mut().find(|s| s.seat == seat)
    }

    /// Кто-то отказался – дальше ждать нет смысла.
    pub fn any_declined(&self) -> bool {
        self.seats.iter().any(|s| s.responded && !s.confirmed)
    }

    pub fn all_responded(&self) -> bool {
        self.seats.iter().all(|s| s.responded)
    }

    /// Решение принято: все ответили или уже есть отказ.
    pub fn is_decided(&self) -> bool {
        self.all_responded() || self.any_declined()
    }

    pub fn all_confirmed(&self) -> bool {
        self.seats.iter().all(|s| s.responded && s.confirmed)
    }
}
