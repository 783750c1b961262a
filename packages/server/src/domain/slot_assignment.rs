//! Slot assignment.
//!
//! Pure decision of which slot a joining player should take. Every client
//! runs the same scan over the same snapshot, so concurrent joiners aim at
//! the same slot and the store's conditional write picks one winner.

use super::{
    entity::{Lobby, PlayerSnapshot},
    value_object::SlotAddress,
};

/// Slot `candidate` should occupy, or `None` when the lobby is full.
///
/// A candidate who is already seated gets their current slot back.
pub fn assign_slot(lobby: &Lobby, candidate: &PlayerSnapshot) -> Option<SlotAddress> {
    if let Some(current) = lobby.find_player(&candidate.player_id) {
        return Some(current);
    }
    if lobby.is_full() {
        return None;
    }
    lobby
        .game_mode
        .slots()
        .iter()
        .copied()
        .find(|address| lobby.slot(*address).is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{entity::fixtures::*, value_object::GameMode};

    #[test]
    fn test_doubles_fills_in_canonical_order() {
        // テスト項目: DOUBLES では team1.slot1, team1.slot2, team2.slot1 の順に埋まる
        // given (前提条件): team1.slot1 = alice
        let mut lobby = lobby(GameMode::Doubles, "alice");

        // when (操作): bob, carol の順に参加
        let bob_slot = assign_slot(&lobby, &player("bob")).unwrap();
        *lobby.slot_mut(bob_slot) = Some(player("bob"));
        let carol_slot = assign_slot(&lobby, &player("carol")).unwrap();

        // then (期待する結果):
        assert_eq!(bob_slot, SlotAddress::TEAM1_SLOT2);
        assert_eq!(carol_slot, SlotAddress::TEAM2_SLOT1);
    }

    #[test]
    fn test_singles_prefers_team1_then_team2() {
        // テスト項目: SINGLES では team1.slot1 が埋まっていれば team2.slot1 が選ばれる
        // given (前提条件):
        let lobby = lobby(GameMode::Singles, "alice");

        // when (操作):
        let slot = assign_slot(&lobby, &player("bob"));

        // then (期待する結果):
        assert_eq!(slot, Some(SlotAddress::TEAM2_SLOT1));
    }

    #[test]
    fn test_singles_uses_team1_when_host_moved_away() {
        // テスト項目: SINGLES で team1.slot1 が空いていれば team1.slot1 が優先される
        // given (前提条件): ホストが team2.slot1 に移動済み
        let mut lobby = lobby(GameMode::Singles, "alice");
        *lobby.slot_mut(SlotAddress::TEAM1_SLOT1) = None;
        *lobby.slot_mut(SlotAddress::TEAM2_SLOT1) = Some(player("alice"));

        // when (操作):
        let slot = assign_slot(&lobby, &player("bob"));

        // then (期待する結果):
        assert_eq!(slot, Some(SlotAddress::TEAM1_SLOT1));
    }

    #[test]
    fn test_full_lobby_returns_none() {
        // テスト項目: 満員のロビーでは None が返される（待機リストへ回される）
        // given (前提条件):
        let lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);

        // when (操作):
        let slot = assign_slot(&lobby, &player("carol"));

        // then (期待する結果):
        assert_eq!(slot, None);
    }

    #[test]
    fn test_assign_is_idempotent_for_seated_player() {
        // テスト項目: 既に着席しているプレイヤーには同じスロットが返される（冪等性）
        // given (前提条件):
        let lobby = seated_lobby(GameMode::Doubles, &["alice", "bob", "carol", "dave"]);

        // when (操作):
        let first = assign_slot(&lobby, &player("carol"));
        let second = assign_slot(&lobby, &player("carol"));

        // then (期待する結果): 満員でも自分のスロットが返される
        assert_eq!(first, Some(SlotAddress::TEAM2_SLOT1));
        assert_eq!(first, second);
    }
}
