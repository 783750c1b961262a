//! Read-side helpers over lobby snapshots

use super::{entity::Lobby, value_object::PlayerId};

/// Lobbies `player` is seated in that still need attention: not completed
/// and not cancelled, most recently active first.
pub fn pending_games<'a>(lobbies: &'a [Lobby], player: &PlayerId) -> Vec<&'a Lobby> {
    let mut pending: Vec<&Lobby> = lobbies
        .iter()
        .filter(|lobby| !lobby.is_completed() && lobby.find_player(player).is_some())
        .collect();
    pending.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
    pending
}
