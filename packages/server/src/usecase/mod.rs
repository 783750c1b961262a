//! UseCase 層
//!
//! 各ユースケースは `LobbyCoordinator` を通じて共有ストアを読み書きします。
//! 判断はドメイン層の planner が行い、ユースケースはその結果のコミットと
//! ログ出力を受け持ちます。

mod advance_countdown;
mod cancel_match;
mod complete_match;
mod coordinator;
mod countdown_driver;
mod create_lobby;
mod delete_lobby;
mod join_lobby;
mod leave_lobby;
mod rematch_lobby;
mod start_countdown;
mod swap_slots;
mod watch_lobby;

pub use advance_countdown::{AdvanceCountdownUseCase, AdvanceOutcome};
pub use cancel_match::CancelMatchUseCase;
pub use complete_match::{CompleteMatchUseCase, CompletedMatch};
pub use coordinator::{Committed, CoordinatorConfig, LobbyCoordinator, RetryPolicy};
pub use countdown_driver::CountdownDriver;
pub use create_lobby::{CodeGenerator, CreateLobbyUseCase};
pub use delete_lobby::DeleteLobbyUseCase;
pub use join_lobby::JoinLobbyUseCase;
pub use leave_lobby::LeaveLobbyUseCase;
pub use rematch_lobby::RematchLobbyUseCase;
pub use start_countdown::StartCountdownUseCase;
pub use swap_slots::SwapSlotsUseCase;
pub use watch_lobby::{LobbyUpdate, LobbyWatch, WatchLobbyUseCase};
