//! Lobby formatting utilities for client display.

use courtlobby_server::{
    domain::{
        JoinOutcome, LeaveOutcome, LifecycleState, Lobby, PlayerId, PlayerSnapshot, SlotAddress,
        SwapOutcome, TeamSide,
    },
    usecase::CompletedMatch,
};
use courtlobby_shared::time::timestamp_to_rfc3339;

const RULE: &str = "============================================================";

/// Lobby formatter for client display
pub struct LobbyFormatter;

impl LobbyFormatter {
    /// Format the full lobby view
    ///
    /// # Arguments
    ///
    /// * `lobby` - The lobby snapshot to render
    /// * `me` - The current player (to mark as "me")
    pub fn format_lobby(lobby: &Lobby, me: &PlayerId) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n{}\n", RULE));
        output.push_str(&format!(
            "Lobby {} [{}] {}\n",
            lobby.room_code,
            lobby.game_mode,
            Self::format_state(lobby.state)
        ));
        output.push_str(&format!(
            "created at {}\n",
            timestamp_to_rfc3339(lobby.created_at.value())
        ));

        for (side, label) in [(TeamSide::Team1, "Team 1"), (TeamSide::Team2, "Team 2")] {
            output.push_str(&format!("{}:\n", label));
            for address in lobby
                .game_mode
                .slots()
                .iter()
                .filter(|address| address.team == side)
            {
                output.push_str(&format!(
                    "  {} {}\n",
                    address.slot_key(),
                    Self::format_slot(lobby, *address, me)
                ));
            }
        }

        if !lobby.waiting_players.is_empty() {
            output.push_str("Waiting:\n");
            for (index, player) in lobby.waiting_players.iter().enumerate() {
                output.push_str(&format!(
                    "  {}. {}\n",
                    index + 1,
                    Self::format_player(lobby, player, me)
                ));
            }
        }

        if let Some(score) = lobby.final_score {
            output.push_str(&format!("Final score: {} - {}\n", score.team1, score.team2));
        }
        if let Some(reason) = &lobby.cancel_reason {
            output.push_str(&format!("Cancelled: {}\n", reason));
        }
        if let Some(code) = &lobby.rematch_code {
            output.push_str(&format!("Rematch: {}\n", code));
        }
        output.push_str(&format!("{}\n", RULE));
        output
    }

    pub fn format_state(state: LifecycleState) -> String {
        match state {
            LifecycleState::Countdown(tick) => format!("COUNTDOWN {}", tick),
            other => other.to_string(),
        }
    }

    fn format_slot(lobby: &Lobby, address: SlotAddress, me: &PlayerId) -> String {
        match lobby.slot(address) {
            Some(player) => Self::format_player(lobby, player, me),
            None => "(empty)".to_string(),
        }
    }

    fn format_player(lobby: &Lobby, player: &PlayerSnapshot, me: &PlayerId) -> String {
        let mut label = format!("{} <{}>", player.display_name, player.player_id);
        if lobby.is_host(&player.player_id) {
            label.push_str(" (host)");
        }
        if &player.player_id == me {
            label.push_str(" (me)");
        }
        label
    }

    pub fn format_join(outcome: &JoinOutcome) -> String {
        match outcome {
            JoinOutcome::Seated(address) => format!("Joined at {}", address),
            JoinOutcome::AlreadySeated(address) => format!("Already seated at {}", address),
            JoinOutcome::Waiting { position } => {
                format!("Lobby is full, waiting for a slot (#{})", position)
            }
            JoinOutcome::AlreadyWaiting { position } => {
                format!("Already waiting for a slot (#{})", position)
            }
        }
    }

    pub fn format_leave(outcome: &LeaveOutcome) -> String {
        match outcome {
            LeaveOutcome::LeftSlot {
                address,
                promoted: Some(promoted),
            } => format!("Left {}, '{}' took the slot", address, promoted),
            LeaveOutcome::LeftSlot {
                address,
                promoted: None,
            } => format!("Left {}", address),
            LeaveOutcome::LeftWaitingList => "Left the waiting list".to_string(),
            LeaveOutcome::NotPresent => "Not in this lobby".to_string(),
        }
    }

    pub fn format_swap(outcome: &SwapOutcome) -> String {
        match outcome {
            SwapOutcome::Swapped => "Players swapped".to_string(),
            SwapOutcome::Moved => "Player moved".to_string(),
            SwapOutcome::Unchanged => "Nothing to swap".to_string(),
        }
    }

    pub fn format_completed(completed: &CompletedMatch) -> String {
        let score = completed
            .lobby
            .final_score
            .map(|score| format!("{} - {}", score.team1, score.team2))
            .unwrap_or_default();
        if completed.published {
            format!("Match completed {}, result submitted", score)
        } else {
            format!("Match completed {}, result NOT submitted", score)
        }
    }
}
