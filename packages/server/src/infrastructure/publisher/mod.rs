//! 試合結果の通知（MatchResultPublisher）の実装
//!
//! - `logging`: 結果をログに出力するだけの実装（サーバー・CLI の既定）
//! - `channel`: mpsc チャネルに流す実装（集計側を同一プロセスで動かす場合やテスト用）

pub mod channel;
pub mod logging;

pub use channel::ChannelMatchResultPublisher;
pub use logging::LoggingMatchResultPublisher;
