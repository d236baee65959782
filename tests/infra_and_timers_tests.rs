// tests/infra_and_timers_tests.rs

//! Конфиг, RNG, часы хода и проверка живости.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::timeout;

use poker_table_engine::engine::{ActionKind, Notification, Recipient};
use poker_table_engine::infra::{
    init_test_logging, shuffled_deck, ChannelSink, DeterministicRng, EngineConfig, MessageSink,
};
use poker_table_engine::time_ctrl::{
    ActionTimer, LivenessEvent, LivenessSettings, NetworkLivenessCheck, TimeRules, TimerMessage,
    TimerPurpose, TimerRequest,
};

#[test]
fn config_defaults_fill_missing_fields() {
    let config = EngineConfig::from_json_str(r#"{ "auto_deal": false, "time_rules": { "action_secs": 7 } }"#).unwrap();
    assert!(!config.auto_deal);
    assert_eq!(config.time_rules.action_secs, 7);
    assert_eq!(config.time_rules.run_it_twice_prompt_secs, 15);
    assert_eq!(config.persist_retry_attempts, 5);
    assert_eq!(config.mailbox_capacity, 256);

    assert!(EngineConfig::from_json_str("{ not json").is_err());
    assert!(EngineConfig::from_file("/definitely/missing/engine.json").is_err());
}

#[test]
fn standard_time_rules() {
    assert_eq!(TimeRules::default(), TimeRules::new(20, 15));
    assert_eq!(TimeRules::standard(), TimeRules::default());
}

#[test]
fn same_seed_same_deck() {
    let a = shuffled_deck(&mut DeterministicRng::from_seed(42));
    let b = shuffled_deck(&mut DeterministicRng::from_seed(42));
    let c = shuffled_deck(&mut DeterministicRng::from_seed(43));
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 52);
}

fn action_request(expires_in_ms: i64, action_id: u32) -> TimerRequest {
    TimerRequest {
        hand_num: 3,
        purpose: TimerPurpose::Action {
            seat: 1,
            player_id: 11,
            action_id,
            default_action: ActionKind::Check,
        },
        expires_at: Utc::now() + chrono::Duration::milliseconds(expires_in_ms),
    }
}

#[tokio::test]
async fn action_timer_fires_default_action() {
    init_test_logging();
    let (tx, mut rx) = mpsc::channel(8);
    let (timer, _task) = ActionTimer::spawn(tx);

    timer.reset(action_request(50, 4));

    let msg = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    match msg {
        TimerMessage::ActionExpired(acted) => {
            assert_eq!(acted.message_id, "timeout-3-4");
            assert_eq!(acted.seat, 1);
            assert_eq!(acted.action, ActionKind::Check);
            assert!(acted.timed_out);
        }
        other => panic!("ожидали ActionExpired, пришло {other:?}"),
    }
    timer.shutdown();
}

// Часы tokio на паузе: полные 30 секунд хода проматываются мгновенно.
#[tokio::test(start_paused = true)]
async fn long_action_clock_fires_on_virtual_time() {
    let (tx, mut rx) = mpsc::channel(8);
    let (timer, _task) = ActionTimer::spawn(tx);

    timer.reset(action_request(30_000, 9));
    assert!(timeout(Duration::from_secs(10), rx.recv()).await.is_err());

    let msg = timeout(Duration::from_secs(60), rx.recv()).await.unwrap().unwrap();
    assert!(matches!(msg, TimerMessage::ActionExpired(acted) if acted.message_id == "timeout-3-9"));
    timer.shutdown();
}

#[tokio::test]
async fn paused_timer_does_not_fire_and_reset_replaces_slot() {
    let (tx, mut rx) = mpsc::channel(8);
    let (timer, _task) = ActionTimer::spawn(tx);

    timer.reset(action_request(50, 1));
    timer.pause();
    assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());

    timer.reset(action_request(5_000, 2));
    timer.reset(TimerRequest {
        hand_num: 3,
        purpose: TimerPurpose::RunItTwice,
        expires_at: Utc::now() + chrono::Duration::milliseconds(30),
    });
    let msg = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(msg, TimerMessage::RunItTwiceExpired { hand_num: 3 });
    timer.shutdown();
}

#[tokio::test]
async fn liveness_pings_and_reports_lost_and_restored() {
    let (sink, mut outbound) = ChannelSink::new();
    let sink: Arc<dyn MessageSink> = Arc::new(sink);
    let (tx, mut events) = mpsc::channel(8);
    let settings = LivenessSettings {
        ping_interval: Duration::from_millis(20),
        pong_timeout: Duration::from_millis(60),
    };
    let (liveness, _task) = NetworkLivenessCheck::spawn("T-L".to_string(), settings, sink, tx);

    liveness.watch(7);

    let (table, ping) = timeout(Duration::from_secs(5), outbound.recv()).await.unwrap().unwrap();
    assert_eq!(table, "T-L");
    assert_eq!(ping.to, Recipient::Player(7));
    assert!(matches!(ping.message, Notification::Ping { .. }));

    let lost = timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap();
    assert_eq!(lost, TimerMessage::Liveness(LivenessEvent::ConnectivityLost { player_id: 7 }));

    liveness.pong(7, 1);
    let restored = timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap();
    assert_eq!(
        restored,
        TimerMessage::Liveness(LivenessEvent::ConnectivityRestored { player_id: 7 })
    );
    liveness.shutdown();
}
