use tracing_subscriber::{fmt, EnvFilter};

/// Инициализация логов для бинарников.
///
/// Уровень берётся из `RUST_LOG`, по умолчанию `info`. Повторный вызов
/// ничего не ломает: уже установленный subscriber остаётся.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).try_init().ok();
}

/// То же для тестов: вывод через test writer, без времени, уровень `warn`.
pub fn init_test_logging() {
    let filter = std::env::var("TEST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_test_writer().without_time().try_init().ok();
}
