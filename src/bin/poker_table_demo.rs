// src/bin/poker_table_demo.rs

//! Демо: один стол, три бота, несколько раздач через актор стола.
//!
//! Боты отвечают на `YourAction` call/check, иногда молчат, и тогда ход
//! делает таймер. Уровень логов: `RUST_LOG=debug cargo run --bin poker_table_demo`.

use std::sync::Arc;

use poker_table_engine::domain::chips::Chips;
use poker_table_engine::domain::hand::GameType;
use poker_table_engine::domain::player::SeatPlayer;
use poker_table_engine::domain::table::TableConfig;
use poker_table_engine::engine::{ActionKind, Notification, PlayerActed, Recipient};
use poker_table_engine::game::GameManager;
use poker_table_engine::infra::{init_logging, ChannelSink, DeterministicRng, EngineConfig, InMemoryHandStateStore};
use poker_table_engine::time_ctrl::TimeRules;

const HANDS_TO_PLAY: u32 = 5;

#[tokio::main]
async fn main() {
    init_logging();
    println!("poker_table_demo: стартуем один стол…");

    let mut config = EngineConfig::default();
    config.time_rules = TimeRules::new(2, 2);
    config.pause_between_hands_ms = 300;
    config.idle_poll_ms = 50;

    let store = Arc::new(InMemoryHandStateStore::new());
    let (sink, mut outbound_rx) = ChannelSink::new();
    let manager = GameManager::new(config, store, Arc::new(sink));

    let table = TableConfig::new("DEMO-1", GameType::Holdem, Chips::new(50), Chips::new(100))
        .with_max_seats(6)
        .with_rake(5.0, Chips::new(300));
    let seats = vec![
        Some(SeatPlayer::new(1, "alice", Chips::new(10_000)).with_run_it_twice(true)),
        Some(SeatPlayer::new(2, "bob", Chips::new(10_000)).with_run_it_twice(true)),
        None,
        Some(SeatPlayer::new(3, "carol", Chips::new(10_000))),
    ];

    let handle = match manager.create_game_with_rng(table, seats, Box::new(DeterministicRng::from_seed(7))) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("не удалось создать стол: {err}");
            return;
        }
    };

    let mut finished = 0u32;
    while let Some((table_code, outbound)) = outbound_rx.recv().await {
        match outbound.message {
            Notification::NewHand { hand_num, button, .. } => {
                println!();
                println!("[{table_code}] ===== раздача #{hand_num}, кнопка на месте {button} =====");
            }
            Notification::YourAction(next) => {
                // Каждый седьмой ход бот "засыпает": пусть сработает таймер.
                if next.action_id % 7 == 6 {
                    println!("[{table_code}] игрок {} думает слишком долго…", next.player_id);
                    continue;
                }
                let action = if next.allows(ActionKind::Check) {
                    ActionKind::Check
                } else if next.allows(ActionKind::Call) {
                    ActionKind::Call
                } else {
                    next.default_action()
                };
                let amount = if action == ActionKind::Call { next.call_amount } else { Chips::ZERO };
                let acted = PlayerActed {
                    message_id: format!("bot-{}-{}", next.hand_num, next.action_id),
                    hand_num: next.hand_num,
                    seat: next.seat,
                    player_id: next.player_id,
                    action,
                    amount,
                    timed_out: false,
                };
                if let Err(err) = handle.player_acted(acted).await {
                    eprintln!("ход не отправлен: {err}");
                    break;
                }
            }
            Notification::ActionChanged {
                seat, action, amount, timed_out, ..
            } => {
                let suffix = if timed_out { " (таймаут)" } else { "" };
                println!("[{table_code}] место {seat}: {action} {}{suffix}", amount.0);
            }
            Notification::BoardRevealed { street, board, .. } => {
                let cards: Vec<String> = board.iter().map(|c| c.to_string()).collect();
                println!("[{table_code}] {street}: {}", cards.join(" "));
            }
            Notification::HandResult(result) => {
                for share in result.shares() {
                    println!(
                        "[{table_code}] место {} (игрок {}) забирает {}",
                        share.seat, share.player_id, share.amount.0
                    );
                }
                println!("[{table_code}] рейк: {}", result.rake_collected.0);
            }
            Notification::HandEnded { hand_num } => {
                finished += 1;
                println!("[{table_code}] раздача #{hand_num} закончена");
                if finished >= HANDS_TO_PLAY {
                    break;
                }
            }
            _ => {
                if let Recipient::Player(pid) = outbound.to {
                    tracing::debug!(player = pid, "private message");
                }
            }
        }
    }

    if let Err(err) = manager.end_game("DEMO-1").await {
        eprintln!("стол не закрылся: {err}");
    }
    println!();
    println!("poker_table_demo: сыграно раздач: {finished}");
}
