//! MatchResultPublisher trait 定義
//!
//! 完了した試合の結果を受け取るスコア・レーティング集計側へのインターフェース。
//! 具体的な実装は Infrastructure 層が提供します。
//!
//! キャンセルされた試合は集計対象外のため、この trait には渡されません。

use async_trait::async_trait;

use super::{entity::MatchRecord, error::PublishError};

/// Consumer of completed matches
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchResultPublisher: Send + Sync {
    async fn publish(&self, record: MatchRecord) -> Result<(), PublishError>;
}
