//! Lobby watch session.
//!
//! 1 回の購読の間、スナップショットを表示し続けます。`auto_join` が有効なら、
//! 自分がいない OPEN のロビーを見たときに自動で参加します。

use std::sync::Arc;

use courtlobby_server::{
    domain::{LifecycleState, PlayerSnapshot, RoomCode},
    usecase::{JoinLobbyUseCase, LobbyCoordinator, LobbyUpdate, WatchLobbyUseCase},
};

use crate::{error::ClientError, formatter::LobbyFormatter};

/// How a watch session ended without an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Deleted,
}

/// Run one watch session over a single subscription
pub async fn run_watch_session(
    coordinator: Arc<LobbyCoordinator>,
    room_code: &RoomCode,
    me: &PlayerSnapshot,
    auto_join: bool,
) -> Result<SessionEnd, ClientError> {
    let mut watch = WatchLobbyUseCase::new(coordinator.clone())
        .execute(room_code)
        .await?;
    let join = JoinLobbyUseCase::new(coordinator);

    tracing::info!("Watching lobby {} as '{}'", room_code, me.player_id);
    let mut update = watch.current()?;

    loop {
        let lobby = match update {
            LobbyUpdate::Deleted => {
                println!("\nLobby {} was deleted", room_code);
                return Ok(SessionEnd::Deleted);
            }
            LobbyUpdate::Changed(lobby) => lobby,
        };
        print!("{}", LobbyFormatter::format_lobby(&lobby, &me.player_id));

        if auto_join && lobby.state == LifecycleState::Open && !lobby.is_participant(&me.player_id)
        {
            match join.execute(room_code, me.clone()).await {
                Ok(committed) => println!("{}", LobbyFormatter::format_join(&committed.outcome)),
                Err(e) if e.is_retryable() => return Err(e.into()),
                // Full, or the countdown began; try again on the next snapshot
                Err(e) => println!("Could not join: {}", e),
            }
        }

        update = watch.next().await.ok_or_else(|| {
            ClientError::Connection(format!("snapshot stream of {} closed", room_code))
        })?;
    }
}
