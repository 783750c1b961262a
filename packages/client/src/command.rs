//! Client subcommands.

use clap::Subcommand;

use courtlobby_server::domain::{GameMode, RoomCode, SlotAddress, SwapRequest};

use crate::error::ClientError;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a lobby hosted by you and print its room code
    Create {
        /// Game mode (singles or doubles)
        #[arg(short, long, default_value = "singles")]
        mode: String,

        /// Keep watching the new lobby
        #[arg(short, long)]
        watch: bool,
    },

    /// Join a lobby, or its waiting list when it is full
    Join {
        code: String,

        /// Keep watching and re-join whenever the lobby is open without you
        #[arg(long)]
        auto: bool,
    },

    /// Watch a lobby until it is deleted
    Watch { code: String },

    /// Swap the players in two slots (e.g. team1.slot2 team2.slot1)
    Swap {
        code: String,
        source: String,
        target: String,
    },

    /// Leave your slot or the waiting list
    Leave { code: String },

    /// Start the countdown (host only) and drive it until the match begins
    Start { code: String },

    /// Help a stalled countdown along as a seated player
    Drive { code: String },

    /// Cancel the match (host only)
    Cancel {
        code: String,

        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Record the final score and complete the match (host only)
    Complete {
        code: String,
        team1: u32,
        team2: u32,
    },

    /// Open a rematch lobby with the same players (host only)
    Rematch { code: String },

    /// Delete the lobby (host only)
    Delete { code: String },
}

pub fn parse_room_code(raw: &str) -> Result<RoomCode, ClientError> {
    RoomCode::new(raw.to_string()).map_err(|e| ClientError::InvalidArgument(e.to_string()))
}

pub fn parse_game_mode(raw: &str) -> Result<GameMode, ClientError> {
    raw.parse::<GameMode>()
        .map_err(|e| ClientError::InvalidArgument(e.to_string()))
}

pub fn parse_swap(source: &str, target: &str) -> Result<SwapRequest, ClientError> {
    let parse = |raw: &str| {
        raw.parse::<SlotAddress>()
            .map_err(|e| ClientError::InvalidArgument(e.to_string()))
    };
    Ok(SwapRequest {
        source: parse(source)?,
        target: parse(target)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_swap_accepts_slot_addresses() {
        // テスト項目: "team1.slot2" 形式のスロット指定を解釈できる
        // given (前提条件):
        let (source, target) = ("team1.slot2", "TEAM2.SLOT1");

        // when (操作):
        let request = parse_swap(source, target).unwrap();

        // then (期待する結果):
        assert_eq!(request.source, SlotAddress::TEAM1_SLOT2);
        assert_eq!(request.target, SlotAddress::TEAM2_SLOT1);
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        // テスト項目: 不正なスロット・モード・room code は引数エラーになる
        // given (前提条件):
        let bad_slot = parse_swap("team3.slot1", "team1.slot1");

        // when (操作):
        let bad_mode = parse_game_mode("triples");
        let bad_code = parse_room_code("x");

        // then (期待する結果):
        assert!(matches!(bad_slot, Err(ClientError::InvalidArgument(_))));
        assert!(matches!(bad_mode, Err(ClientError::InvalidArgument(_))));
        assert!(matches!(bad_code, Err(ClientError::InvalidArgument(_))));
    }
}
