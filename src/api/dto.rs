use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::card::Card;
use crate::domain::chips::Chips;
use crate::domain::hand::{GameType, Street};
use crate::domain::{HandNum, PlayerId, SeatIndex};
use crate::engine::betting::ActState;
use crate::engine::flow::FlowState;
use crate::engine::hand_state::HandState;
use crate::engine::next_action::NextSeatAction;
use crate::engine::pot::Pot;
use crate::engine::showdown::HandResult;

/// DTO места в раздаче.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatView {
    pub seat: SeatIndex,
    pub player_id: PlayerId,
    pub stack: Chips,
    pub bet: Chips,
    pub state: ActState,
    /// Карманные карты – только для "героя" или после шоудауна.
    pub hole_cards: Option<Vec<Card>>,
}

/// Текущая раздача глазами одного зрителя.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HandView {
    pub table_code: String,
    pub hand_num: HandNum,
    pub game_type: GameType,
    pub flow_state: FlowState,
    pub street: Street,
    pub button: SeatIndex,
    /// Только открытая часть борда.
    pub board: Vec<Card>,
    pub board2: Option<Vec<Card>>,
    pub pots: Vec<Pot>,
    pub seats: Vec<SeatView>,
    pub acting_seat: Option<SeatIndex>,
    pub action_expires_at: Option<DateTime<Utc>>,
    /// Полный `NextSeatAction`, если сейчас ход самого зрителя.
    pub your_action: Option<NextSeatAction>,
    pub result: Option<HandResult>,
}

/// Собрать представление раздачи для `viewer` (None – наблюдатель).
///
/// Чужие карманные карты скрыты, пока их не открыли всем (all-in или шоудаун).
pub fn hand_view_for(state: &HandState, viewer: Option<PlayerId>) -> HandView {

    let seats = state
        .players_in_seats
        .iter()
        .enumerate()
        .filter_map(|(idx, p)| {
            let player_id = (*p)?;
            let seat = idx as SeatIndex;
            let act = state.act(seat);
            let own = viewer == Some(player_id);
            let visible = own || (state.hands_shown && act.is_live());
            Some(SeatView {
                seat,
                player_id,
                stack: state.stacks[idx],
                bet: state.round.bet_of(seat),
                state: act.state,
                hole_cards: visible.then(|| state.hole_cards[idx].clone()),
            })
        })
        .collect();

    let next = state.next_seat_action.as_ref();
    let your_action = next.filter(|n| viewer == Some(n.player_id)).cloned();

    HandView {
        table_code: state.table_code.clone(),
        hand_num: state.hand_num,
        game_type: state.game_type,
        flow_state: state.flow_state,
        street: state.street,
        button: state.button_pos,
        board: state.revealed_board().to_vec(),
        board2: state.board2.clone(),
        pots: state.pots.clone(),
        seats,
        acting_seat: next.map(|n| n.seat),
        action_expires_at: next.map(|n| n.expires_at),
        your_action,
        result: state.result.clone(),
    }
}
