//! Domain layer.
//!
//! ロビーの集約、値オブジェクト、純粋な判断ロジック（スロット割り当て、
//! ドラッグ入れ替え、ライフサイクル状態機械）と、外部ストア・結果集計への
//! インターフェースを定義します。

pub mod drag_swap;
pub mod entity;
pub mod error;
pub mod patch;
pub mod planner;
pub mod publisher;
pub mod query;
pub mod slot_assignment;
pub mod state_machine;
pub mod store;
pub mod value_object;

pub use drag_swap::{
    DragGesture, Point, Rect, Size, SlotLayout, SwapRequest, compute_drop_target, resolve_swap,
};
pub use entity::{
    CountdownTick, FinalScore, LifecycleState, Lobby, MatchRecord, PlayerSnapshot, Team,
};
pub use error::{LobbyError, PublishError, StoreError};
pub use patch::{LobbyChange, LobbyGuard, LobbyPatch};
pub use planner::{JoinOutcome, LeaveOutcome, Plan, SwapOutcome, SwapPolicy};
pub use publisher::MatchResultPublisher;
pub use query::pending_games;
pub use slot_assignment::assign_slot;
pub use state_machine::{CountdownTimings, LifecycleEvent, Transition, TransitionContext};
pub use store::{
    Document, DocumentSubscription, Expectation, FieldPath, FieldUpdate, FieldWrite, Precondition,
    SharedLobbyStore, StoreCapabilities,
};
pub use value_object::{
    GameMode, PlayerId, Position, RoomCode, RoomCodeFactory, SlotAddress, TeamSide, Timestamp,
    ValueObjectError,
};
