//! Entities
//!
//! `Lobby` is the root aggregate: one shared document per room code.

use std::fmt;

use super::value_object::{
    GameMode, PlayerId, Position, RoomCode, SlotAddress, TeamSide, Timestamp,
};

/// Snapshot of a player's identity taken at join time.
///
/// Later profile changes never update a snapshot already placed in a lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub player_id: PlayerId,
    pub display_name: String,
    pub avatar_ref: Option<String>,
}

impl PlayerSnapshot {
    pub fn new(player_id: PlayerId, display_name: String, avatar_ref: Option<String>) -> Self {
        Self {
            player_id,
            display_name,
            avatar_ref,
        }
    }
}

/// One team with up to two slots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Team {
    pub slot1: Option<PlayerSnapshot>,
    pub slot2: Option<PlayerSnapshot>,
}

/// Countdown value shown between "all slots filled" and "game on"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountdownTick {
    Zero,
    One,
    Start,
}

impl CountdownTick {
    /// Next tick, or `None` when the countdown is over
    pub fn next(&self) -> Option<CountdownTick> {
        match self {
            CountdownTick::Zero => Some(CountdownTick::One),
            CountdownTick::One => Some(CountdownTick::Start),
            CountdownTick::Start => None,
        }
    }
}

impl fmt::Display for CountdownTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountdownTick::Zero => f.write_str("0"),
            CountdownTick::One => f.write_str("1"),
            CountdownTick::Start => f.write_str("START"),
        }
    }
}

/// Lobby lifecycle. The countdown tick lives inside the `Countdown`
/// variant, so a tick can only exist while counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Open,
    Countdown(CountdownTick),
    InProgress,
    Completed,
    Cancelled,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Open => "OPEN",
            LifecycleState::Countdown(_) => "COUNTDOWN",
            LifecycleState::InProgress => "IN_PROGRESS",
            LifecycleState::Completed => "COMPLETED",
            LifecycleState::Cancelled => "CANCELLED",
        }
    }

    /// Terminal states never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Completed | LifecycleState::Cancelled)
    }

    pub fn countdown_tick(&self) -> Option<CountdownTick> {
        match self {
            LifecycleState::Countdown(tick) => Some(*tick),
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final score submitted by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalScore {
    pub team1: u32,
    pub team2: u32,
}

impl FinalScore {
    pub fn new(team1: u32, team2: u32) -> Self {
        Self { team1, team2 }
    }

    /// Winning side, `None` on a draw
    pub fn winner(&self) -> Option<TeamSide> {
        match self.team1.cmp(&self.team2) {
            std::cmp::Ordering::Greater => Some(TeamSide::Team1),
            std::cmp::Ordering::Less => Some(TeamSide::Team2),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Completed match handed to the score/rating consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub room_code: RoomCode,
    pub game_mode: GameMode,
    pub team1: Vec<PlayerSnapshot>,
    pub team2: Vec<PlayerSnapshot>,
    pub score: FinalScore,
    pub started_at: Option<Timestamp>,
    pub completed_at: Timestamp,
}

/// Lobby aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lobby {
    pub room_code: RoomCode,
    pub host_id: PlayerId,
    pub game_mode: GameMode,
    pub team1: Team,
    pub team2: Team,
    /// Players who joined while every slot was taken, in arrival order
    pub waiting_players: Vec<PlayerSnapshot>,
    pub state: LifecycleState,
    pub created_at: Timestamp,
    pub last_activity_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub cancel_reason: Option<String>,
    pub final_score: Option<FinalScore>,
    /// Lobby this one is a rematch of
    pub rematch_of: Option<RoomCode>,
    /// Lobby that superseded this one
    pub rematch_code: Option<RoomCode>,
}

impl Lobby {
    /// Fresh OPEN lobby with the host seated at `team1.slot1`
    pub fn new(
        room_code: RoomCode,
        host: PlayerSnapshot,
        game_mode: GameMode,
        now: Timestamp,
    ) -> Self {
        Self {
            room_code,
            host_id: host.player_id.clone(),
            game_mode,
            team1: Team {
                slot1: Some(host),
                slot2: None,
            },
            team2: Team::default(),
            waiting_players: Vec::new(),
            state: LifecycleState::Open,
            created_at: now,
            last_activity_at: now,
            started_at: None,
            completed_at: None,
            cancel_reason: None,
            final_score: None,
            rematch_of: None,
            rematch_code: None,
        }
    }

    pub fn team(&self, side: TeamSide) -> &Team {
        match side {
            TeamSide::Team1 => &self.team1,
            TeamSide::Team2 => &self.team2,
        }
    }

    pub fn slot(&self, address: SlotAddress) -> Option<&PlayerSnapshot> {
        let team = self.team(address.team);
        match address.position {
            Position::Slot1 => team.slot1.as_ref(),
            Position::Slot2 => team.slot2.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, address: SlotAddress) -> &mut Option<PlayerSnapshot> {
        let team = match address.team {
            TeamSide::Team1 => &mut self.team1,
            TeamSide::Team2 => &mut self.team2,
        };
        match address.position {
            Position::Slot1 => &mut team.slot1,
            Position::Slot2 => &mut team.slot2,
        }
    }

    /// Occupied slots in canonical order
    pub fn seated(&self) -> impl Iterator<Item = (SlotAddress, &PlayerSnapshot)> + '_ {
        SlotAddress::CANONICAL_ORDER
            .into_iter()
            .filter_map(|address| self.slot(address).map(|player| (address, player)))
    }

    pub fn occupancy(&self) -> usize {
        self.seated().count()
    }

    pub fn capacity(&self) -> usize {
        self.game_mode.capacity()
    }

    pub fn is_full(&self) -> bool {
        self.occupancy() >= self.capacity()
    }

    /// Where `player_id` is seated, if anywhere
    pub fn find_player(&self, player_id: &PlayerId) -> Option<SlotAddress> {
        self.seated()
            .find(|(_, player)| &player.player_id == player_id)
            .map(|(address, _)| address)
    }

    pub fn is_waiting(&self, player_id: &PlayerId) -> bool {
        self.waiting_players
            .iter()
            .any(|player| &player.player_id == player_id)
    }

    pub fn is_host(&self, player_id: &PlayerId) -> bool {
        &self.host_id == player_id
    }

    /// Seated, waiting, or hosting
    pub fn is_participant(&self, player_id: &PlayerId) -> bool {
        self.is_host(player_id)
            || self.find_player(player_id).is_some()
            || self.is_waiting(player_id)
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == LifecycleState::Cancelled
    }

    /// Listing flag: completed and cancelled lobbies drop out of "pending games"
    pub fn is_completed(&self) -> bool {
        self.state.is_terminal()
    }

    /// Players of one team in slot order
    pub fn roster(&self, side: TeamSide) -> Vec<PlayerSnapshot> {
        let team = self.team(side);
        [team.slot1.clone(), team.slot2.clone()]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Record for the rating consumer. Only a completed, non-cancelled lobby
    /// whose final score has landed yields one.
    pub fn match_record(&self) -> Option<MatchRecord> {
        if self.state != LifecycleState::Completed {
            return None;
        }
        Some(MatchRecord {
            room_code: self.room_code.clone(),
            game_mode: self.game_mode,
            team1: self.roster(TeamSide::Team1),
            team2: self.roster(TeamSide::Team2),
            score: self.final_score?,
            started_at: self.started_at,
            completed_at: self.completed_at?,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_new_lobby_seats_host_first() {
        // テスト項目: 新規ロビーではホストが team1.slot1 に着席している
        // given (前提条件):
        let lobby = lobby(GameMode::Doubles, "alice");

        // when (操作):
        let host_slot = lobby.find_player(&player_id("alice"));

        // then (期待する結果):
        assert_eq!(host_slot, Some(SlotAddress::TEAM1_SLOT1));
        assert_eq!(lobby.occupancy(), 1);
        assert_eq!(lobby.state, LifecycleState::Open);
        assert!(lobby.is_host(&player_id("alice")));
    }

    #[test]
    fn test_seated_iterates_in_canonical_order() {
        // テスト項目: 着席者は正規の順序で列挙される
        // given (前提条件):
        let mut lobby = lobby(GameMode::Doubles, "alice");
        *lobby.slot_mut(SlotAddress::TEAM2_SLOT2) = Some(player("dave"));
        *lobby.slot_mut(SlotAddress::TEAM1_SLOT2) = Some(player("bob"));

        // when (操作):
        let order: Vec<SlotAddress> = lobby.seated().map(|(address, _)| address).collect();

        // then (期待する結果):
        assert_eq!(
            order,
            vec![
                SlotAddress::TEAM1_SLOT1,
                SlotAddress::TEAM1_SLOT2,
                SlotAddress::TEAM2_SLOT2
            ]
        );
    }

    #[test]
    fn test_match_record_requires_completed_state_and_score() {
        // テスト項目: MatchRecord は COMPLETED かつスコアが揃っている場合のみ作られる
        // given (前提条件):
        let mut lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        lobby.state = LifecycleState::Completed;
        lobby.completed_at = Some(Timestamp::new(9_000));

        // when (操作):
        let without_score = lobby.match_record();
        lobby.final_score = Some(FinalScore::new(21, 17));
        let with_score = lobby.match_record();

        // then (期待する結果):
        assert!(without_score.is_none());
        let record = with_score.unwrap();
        assert_eq!(record.team1, vec![player("alice")]);
        assert_eq!(record.team2, vec![player("bob")]);
        assert_eq!(record.score.winner(), Some(TeamSide::Team1));
    }

    #[test]
    fn test_cancelled_lobby_yields_no_match_record() {
        // テスト項目: キャンセルされたロビーはレーティング対象にならない
        // given (前提条件):
        let mut lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        lobby.state = LifecycleState::Cancelled;
        lobby.final_score = Some(FinalScore::new(3, 0));
        lobby.completed_at = Some(Timestamp::new(9_000));

        // when (操作):
        let record = lobby.match_record();

        // then (期待する結果):
        assert!(record.is_none());
        assert!(lobby.is_completed());
        assert!(lobby.is_cancelled());
    }
}
