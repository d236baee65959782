use tokio::sync::mpsc;

use crate::engine::notifications::Outbound;

/// Транспорт исходящих сообщений (pub/sub, websocket и т.п.).
///
/// Вызывается воркером стола синхронно и не должен блокировать.
pub trait MessageSink: Send + Sync {
    fn deliver(&self, table_code: &str, outbound: &Outbound);
}

/// Всё, что ушло со стола, складывается в канал. Удобно для тестов и демо.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<(String, Outbound)>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, Outbound)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MessageSink for ChannelSink {
    fn deliver(&self, table_code: &str, outbound: &Outbound) {
        // Получатель ушёл – сообщения просто некому читать.
        let _ = self.tx.send((table_code.to_string(), outbound.clone()));
    }
}
