//! mpsc チャネルを使った MatchResultPublisher 実装

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{MatchRecord, MatchResultPublisher, PublishError};

/// 完了した試合を受信側（集計処理）へ流す実装
#[derive(Debug, Clone)]
pub struct ChannelMatchResultPublisher {
    sender: mpsc::UnboundedSender<MatchRecord>,
}

impl ChannelMatchResultPublisher {
    /// publisher と、集計側が読む receiver を作成
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<MatchRecord>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl MatchResultPublisher for ChannelMatchResultPublisher {
    async fn publish(&self, record: MatchRecord) -> Result<(), PublishError> {
        tracing::debug!("Publishing result of match {}", record.room_code);
        self.sender
            .send(record)
            .map_err(|_| PublishError::ConsumerClosed)
    }
}
