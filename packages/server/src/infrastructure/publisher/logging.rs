//! ログ出力による MatchResultPublisher 実装

use async_trait::async_trait;

use crate::domain::{MatchRecord, MatchResultPublisher, PlayerSnapshot, PublishError};

/// 完了した試合をログに記録するだけの実装
#[derive(Debug, Clone, Default)]
pub struct LoggingMatchResultPublisher;

impl LoggingMatchResultPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MatchResultPublisher for LoggingMatchResultPublisher {
    async fn publish(&self, record: MatchRecord) -> Result<(), PublishError> {
        let names = |players: &[PlayerSnapshot]| {
            players
                .iter()
                .map(|player| player.display_name.as_str())
                .collect::<Vec<_>>()
                .join(" & ")
        };
        tracing::info!(
            "Match {} ({}) finished: {} {} - {} {}",
            record.room_code,
            record.game_mode,
            names(&record.team1),
            record.score.team1,
            record.score.team2,
            names(&record.team2),
        );
        Ok(())
    }
}
