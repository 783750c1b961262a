//! Client execution logic with reconnection support.

use std::{sync::Arc, time::Duration};

use courtlobby_server::{
    domain::{FinalScore, PlayerSnapshot, RoomCode},
    infrastructure::publisher::LoggingMatchResultPublisher,
    usecase::{
        CancelMatchUseCase, CompleteMatchUseCase, CoordinatorConfig, CountdownDriver,
        CreateLobbyUseCase, DeleteLobbyUseCase, JoinLobbyUseCase, LeaveLobbyUseCase,
        LobbyCoordinator, RematchLobbyUseCase, StartCountdownUseCase, SwapSlotsUseCase,
    },
};
use courtlobby_shared::time::SystemClock;

use crate::{
    command::{Command, parse_game_mode, parse_room_code, parse_swap},
    error::ClientError,
    formatter::LobbyFormatter,
    session::{SessionEnd, run_watch_session},
    store::HttpLobbyStore,
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Connect to the store service and build a coordinator on top of it
pub async fn connect(
    url: &str,
    config: CoordinatorConfig,
) -> Result<Arc<LobbyCoordinator>, ClientError> {
    let store = HttpLobbyStore::connect(url).await?;
    Ok(Arc::new(LobbyCoordinator::new(
        Arc::new(store),
        Arc::new(SystemClock),
        config,
    )))
}

/// Watch a lobby, re-subscribing after transient failures
pub async fn run_watch(
    coordinator: Arc<LobbyCoordinator>,
    room_code: &RoomCode,
    me: &PlayerSnapshot,
    auto_join: bool,
) -> Result<(), ClientError> {
    let mut reconnect_count = 0;

    loop {
        match run_watch_session(coordinator.clone(), room_code, me, auto_join).await {
            Ok(SessionEnd::Deleted) => {
                tracing::info!("Watch session ended: lobby {} deleted", room_code);
                return Ok(());
            }
            Err(e) if e.is_transient() => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if reconnect_count >= MAX_RECONNECT_ATTEMPTS {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        MAX_RECONNECT_ATTEMPTS
                    );
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );
                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Run one subcommand as `me`
pub async fn run_command(
    coordinator: Arc<LobbyCoordinator>,
    me: PlayerSnapshot,
    command: Command,
) -> Result<(), ClientError> {
    match command {
        Command::Create { mode, watch } => {
            let game_mode = parse_game_mode(&mode)?;
            let lobby = CreateLobbyUseCase::new(coordinator.clone())
                .execute(me.clone(), game_mode)
                .await?;
            println!("Room code: {}", lobby.room_code);
            if watch {
                run_watch(coordinator, &lobby.room_code, &me, false).await?;
            } else {
                print!("{}", LobbyFormatter::format_lobby(&lobby, &me.player_id));
            }
        }
        Command::Join { code, auto } => {
            let room_code = parse_room_code(&code)?;
            if auto {
                run_watch(coordinator, &room_code, &me, true).await?;
            } else {
                let committed = JoinLobbyUseCase::new(coordinator)
                    .execute(&room_code, me.clone())
                    .await?;
                println!("{}", LobbyFormatter::format_join(&committed.outcome));
                print!("{}", LobbyFormatter::format_lobby(&committed.lobby, &me.player_id));
            }
        }
        Command::Watch { code } => {
            let room_code = parse_room_code(&code)?;
            run_watch(coordinator, &room_code, &me, false).await?;
        }
        Command::Swap {
            code,
            source,
            target,
        } => {
            let room_code = parse_room_code(&code)?;
            let request = parse_swap(&source, &target)?;
            let committed = SwapSlotsUseCase::new(coordinator)
                .execute(&room_code, &me.player_id, request)
                .await?;
            println!("{}", LobbyFormatter::format_swap(&committed.outcome));
            print!("{}", LobbyFormatter::format_lobby(&committed.lobby, &me.player_id));
        }
        Command::Leave { code } => {
            let room_code = parse_room_code(&code)?;
            let committed = LeaveLobbyUseCase::new(coordinator)
                .execute(&room_code, &me.player_id)
                .await?;
            println!("{}", LobbyFormatter::format_leave(&committed.outcome));
        }
        Command::Start { code } => {
            let room_code = parse_room_code(&code)?;
            StartCountdownUseCase::new(coordinator.clone())
                .execute(&room_code, &me.player_id)
                .await?;
            let lobby = CountdownDriver::new(coordinator)
                .run(&room_code, &me.player_id)
                .await?;
            print!("{}", LobbyFormatter::format_lobby(&lobby, &me.player_id));
        }
        Command::Drive { code } => {
            let room_code = parse_room_code(&code)?;
            let lobby = CountdownDriver::new(coordinator)
                .run(&room_code, &me.player_id)
                .await?;
            print!("{}", LobbyFormatter::format_lobby(&lobby, &me.player_id));
        }
        Command::Cancel { code, reason } => {
            let room_code = parse_room_code(&code)?;
            let committed = CancelMatchUseCase::new(coordinator)
                .execute(&room_code, &me.player_id, reason)
                .await?;
            print!("{}", LobbyFormatter::format_lobby(&committed.lobby, &me.player_id));
        }
        Command::Complete { code, team1, team2 } => {
            let room_code = parse_room_code(&code)?;
            let completed = CompleteMatchUseCase::new(
                coordinator,
                Arc::new(LoggingMatchResultPublisher::new()),
            )
            .execute(&room_code, &me.player_id, FinalScore::new(team1, team2))
            .await?;
            println!("{}", LobbyFormatter::format_completed(&completed));
        }
        Command::Rematch { code } => {
            let room_code = parse_room_code(&code)?;
            let rematch = RematchLobbyUseCase::new(coordinator)
                .execute(&room_code, &me.player_id)
                .await?;
            println!("Rematch room code: {}", rematch.room_code);
            print!("{}", LobbyFormatter::format_lobby(&rematch, &me.player_id));
        }
        Command::Delete { code } => {
            let room_code = parse_room_code(&code)?;
            DeleteLobbyUseCase::new(coordinator)
                .execute(&room_code, &me.player_id)
                .await?;
            println!("Lobby {} deleted", room_code);
        }
    }
    Ok(())
}
