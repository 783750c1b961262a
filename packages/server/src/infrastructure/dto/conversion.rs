//! Conversion between the stored lobby document and the domain model.
//!
//! Decoding validates the whole document: a snapshot that violates the
//! schema or the lobby invariants is reported as `CorruptSnapshot` and never
//! reaches the decision logic.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::{
    CountdownTick, Document, FieldPath, FieldUpdate, FieldWrite, FinalScore, GameMode,
    LifecycleState, Lobby, LobbyChange, LobbyError, LobbyGuard, LobbyPatch, PlayerId,
    PlayerSnapshot, Precondition, RoomCode, SlotAddress, Team, Timestamp,
};
use crate::infrastructure::dto::document::{self as dto, LobbyDocument};

// ========================================
// Domain Entity → Document
// ========================================

impl From<&PlayerSnapshot> for dto::PlayerDocument {
    fn from(model: &PlayerSnapshot) -> Self {
        Self {
            player_id: model.player_id.as_str().to_string(),
            display_name: model.display_name.clone(),
            avatar_ref: model.avatar_ref.clone(),
        }
    }
}

impl From<&Team> for dto::TeamDocument {
    fn from(model: &Team) -> Self {
        Self {
            slot1: model.slot1.as_ref().map(Into::into),
            slot2: model.slot2.as_ref().map(Into::into),
        }
    }
}

impl From<&Lobby> for LobbyDocument {
    fn from(model: &Lobby) -> Self {
        Self {
            room_code: model.room_code.as_str().to_string(),
            host_id: model.host_id.as_str().to_string(),
            game_mode: model.game_mode.as_str().to_string(),
            teams: dto::TeamsDocument {
                team1: (&model.team1).into(),
                team2: (&model.team2).into(),
            },
            waiting_players: model.waiting_players.iter().map(Into::into).collect(),
            lifecycle_state: model.state.as_str().to_string(),
            countdown: model.state.countdown_tick().map(|tick| dto::CountdownDocument {
                tick: tick_value(tick),
            }),
            last_activity_at: model.last_activity_at.value(),
            created_at: model.created_at.value(),
            started_at: model.started_at.map(|at| at.value()),
            completed_at: model.completed_at.map(|at| at.value()),
            completed: model.is_completed(),
            cancelled: model.is_cancelled(),
            cancel_reason: model.cancel_reason.clone(),
            final_score: model.final_score.map(|score| dto::FinalScoreDocument {
                team1: score.team1,
                team2: score.team2,
            }),
            rematch_of: model.rematch_of.as_ref().map(|code| code.as_str().to_string()),
            rematch_code: model.rematch_code.as_ref().map(|code| code.as_str().to_string()),
        }
    }
}

/// Full document for a newly created lobby
pub fn encode_lobby(lobby: &Lobby) -> Result<Document, LobbyError> {
    to_value(&LobbyDocument::from(lobby))
}

// ========================================
// Document → Domain Entity
// ========================================

impl TryFrom<dto::PlayerDocument> for PlayerSnapshot {
    type Error = String;

    fn try_from(document: dto::PlayerDocument) -> Result<Self, Self::Error> {
        let player_id = PlayerId::new(document.player_id).map_err(|e| e.to_string())?;
        if document.display_name.trim().is_empty() {
            return Err(format!("player '{}' has an empty display name", player_id));
        }
        Ok(PlayerSnapshot::new(
            player_id,
            document.display_name,
            document.avatar_ref,
        ))
    }
}

impl TryFrom<dto::TeamDocument> for Team {
    type Error = String;

    fn try_from(document: dto::TeamDocument) -> Result<Self, Self::Error> {
        Ok(Team {
            slot1: document.slot1.map(TryInto::try_into).transpose()?,
            slot2: document.slot2.map(TryInto::try_into).transpose()?,
        })
    }
}

impl TryFrom<LobbyDocument> for Lobby {
    type Error = String;

    fn try_from(document: LobbyDocument) -> Result<Self, Self::Error> {
        let room_code = RoomCode::new(document.room_code).map_err(|e| e.to_string())?;
        let host_id = PlayerId::new(document.host_id).map_err(|e| e.to_string())?;
        let game_mode = document
            .game_mode
            .parse::<GameMode>()
            .map_err(|e| e.to_string())?;
        let state = lifecycle_state(&document.lifecycle_state, document.countdown.as_ref())?;

        let lobby = Lobby {
            room_code,
            host_id,
            game_mode,
            team1: document.teams.team1.try_into()?,
            team2: document.teams.team2.try_into()?,
            waiting_players: document
                .waiting_players
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<Vec<_>, _>>()?,
            state,
            created_at: Timestamp::new(document.created_at),
            last_activity_at: Timestamp::new(document.last_activity_at),
            started_at: document.started_at.map(Timestamp::new),
            completed_at: document.completed_at.map(Timestamp::new),
            cancel_reason: document.cancel_reason,
            final_score: document
                .final_score
                .map(|score| FinalScore::new(score.team1, score.team2)),
            rematch_of: document
                .rematch_of
                .map(RoomCode::new)
                .transpose()
                .map_err(|e| e.to_string())?,
            rematch_code: document
                .rematch_code
                .map(RoomCode::new)
                .transpose()
                .map_err(|e| e.to_string())?,
        };

        validate(&lobby)?;
        Ok(lobby)
    }
}

/// Decode and validate the document stored under `room_code`
pub fn decode_lobby(room_code: &RoomCode, document: &Document) -> Result<Lobby, LobbyError> {
    let corrupt =
        |detail: String| LobbyError::CorruptSnapshot(format!("{}: {}", room_code, detail));

    let schema: LobbyDocument =
        serde_json::from_value(document.clone()).map_err(|e| corrupt(e.to_string()))?;
    let lobby = Lobby::try_from(schema).map_err(corrupt)?;
    if &lobby.room_code != room_code {
        return Err(corrupt(format!(
            "document carries room code {}",
            lobby.room_code
        )));
    }
    Ok(lobby)
}

fn validate(lobby: &Lobby) -> Result<(), String> {
    for address in SlotAddress::CANONICAL_ORDER {
        if !lobby.game_mode.uses(address) && lobby.slot(address).is_some() {
            return Err(format!(
                "{} is occupied in a {} lobby",
                address, lobby.game_mode
            ));
        }
    }

    let mut seen = HashSet::new();
    let everyone = lobby
        .seated()
        .map(|(_, player)| player)
        .chain(lobby.waiting_players.iter());
    for player in everyone {
        if !seen.insert(player.player_id.as_str()) {
            return Err(format!("player '{}' appears more than once", player.player_id));
        }
    }
    Ok(())
}

fn lifecycle_state(
    label: &str,
    countdown: Option<&dto::CountdownDocument>,
) -> Result<LifecycleState, String> {
    match label {
        "OPEN" => Ok(LifecycleState::Open),
        // A countdown that has not been written yet reads as the first tick
        "COUNTDOWN" => match countdown {
            Some(countdown) => Ok(LifecycleState::Countdown(countdown_tick(&countdown.tick)?)),
            None => Ok(LifecycleState::Countdown(CountdownTick::Zero)),
        },
        "IN_PROGRESS" => Ok(LifecycleState::InProgress),
        "COMPLETED" => Ok(LifecycleState::Completed),
        "CANCELLED" => Ok(LifecycleState::Cancelled),
        other => Err(format!("unknown lifecycle state '{}'", other)),
    }
}

fn countdown_tick(value: &Value) -> Result<CountdownTick, String> {
    match value {
        Value::Number(number) if number.as_i64() == Some(0) => Ok(CountdownTick::Zero),
        Value::Number(number) if number.as_i64() == Some(1) => Ok(CountdownTick::One),
        Value::String(label) if label.eq_ignore_ascii_case("START") => Ok(CountdownTick::Start),
        other => Err(format!("unknown countdown tick {}", other)),
    }
}

fn tick_value(tick: CountdownTick) -> Value {
    match tick {
        CountdownTick::Zero => json!(0),
        CountdownTick::One => json!(1),
        CountdownTick::Start => json!("START"),
    }
}

// ========================================
// LobbyPatch → FieldUpdate
// ========================================

fn slot_path(address: SlotAddress) -> FieldPath {
    FieldPath::new(format!(
        "{}.{}.{}",
        dto::TEAMS,
        address.team_key(),
        address.slot_key()
    ))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, LobbyError> {
    serde_json::to_value(value).map_err(|e| LobbyError::CorruptSnapshot(e.to_string()))
}

fn occupant_value(occupant: Option<&PlayerSnapshot>) -> Result<Value, LobbyError> {
    to_value(&occupant.map(dto::PlayerDocument::from))
}

fn players_value(players: &[PlayerSnapshot]) -> Result<Value, LobbyError> {
    to_value(&players.iter().map(dto::PlayerDocument::from).collect::<Vec<_>>())
}

fn write(path: &str, value: Value) -> FieldWrite {
    FieldWrite {
        path: FieldPath::new(path),
        value,
    }
}

fn change_writes(change: &LobbyChange) -> Result<Vec<FieldWrite>, LobbyError> {
    let writes = match change {
        LobbyChange::Slot(address, occupant) => vec![FieldWrite {
            path: slot_path(*address),
            value: occupant_value(occupant.as_ref())?,
        }],
        LobbyChange::WaitingPlayers(players) => {
            vec![write(dto::WAITING_PLAYERS, players_value(players)?)]
        }
        LobbyChange::State(state) => vec![
            write(dto::LIFECYCLE_STATE, json!(state.as_str())),
            write(
                dto::COUNTDOWN,
                state
                    .countdown_tick()
                    .map_or(Value::Null, |tick| json!({ "tick": tick_value(tick) })),
            ),
            write(dto::COMPLETED, json!(state.is_terminal())),
            write(dto::CANCELLED, json!(*state == LifecycleState::Cancelled)),
        ],
        LobbyChange::LastActivityAt(at) => vec![write(dto::LAST_ACTIVITY_AT, json!(at.value()))],
        LobbyChange::StartedAt(at) => vec![write(dto::STARTED_AT, json!(at.value()))],
        LobbyChange::CompletedAt(at) => vec![write(dto::COMPLETED_AT, json!(at.value()))],
        LobbyChange::CancelReason(reason) => vec![write(dto::CANCEL_REASON, json!(reason))],
        LobbyChange::FinalScore(score) => vec![write(
            dto::FINAL_SCORE,
            json!({ "team1": score.team1, "team2": score.team2 }),
        )],
        LobbyChange::RematchCode(code) => vec![write(dto::REMATCH_CODE, json!(code.as_str()))],
    };
    Ok(writes)
}

fn guard_preconditions(guard: &LobbyGuard) -> Result<Vec<Precondition>, LobbyError> {
    let preconditions = match guard {
        LobbyGuard::SlotHolds(address, occupant) => vec![Precondition::equals(
            slot_path(*address),
            occupant_value(occupant.as_ref())?,
        )],
        LobbyGuard::SlotOccupied(address) => vec![Precondition::present(slot_path(*address))],
        LobbyGuard::WaitingPlayersAre(players) => vec![Precondition::equals(
            FieldPath::new(dto::WAITING_PLAYERS),
            players_value(players)?,
        )],
        LobbyGuard::StateIs(state) => {
            let mut preconditions = vec![Precondition::equals(
                FieldPath::new(dto::LIFECYCLE_STATE),
                json!(state.as_str()),
            )];
            if let Some(tick) = state.countdown_tick() {
                preconditions.push(Precondition::equals(
                    FieldPath::new(format!("{}.tick", dto::COUNTDOWN)),
                    tick_value(tick),
                ));
            }
            preconditions
        }
    };
    Ok(preconditions)
}

/// Field writes and preconditions that carry out `patch`
pub fn encode_patch(patch: &LobbyPatch) -> Result<FieldUpdate, LobbyError> {
    let mut update = FieldUpdate::default();
    for change in &patch.changes {
        update.writes.extend(change_writes(change)?);
    }
    for guard in &patch.guards {
        update.preconditions.extend(guard_preconditions(guard)?);
    }
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::fixtures::*;

    fn code() -> RoomCode {
        RoomCode::new("TEST42".to_string()).unwrap()
    }

    #[test]
    fn test_lobby_survives_document_encoding() {
        // テスト項目: ロビーを文書に変換して読み戻すと同じロビーになる
        // given (前提条件):
        let mut lobby = seated_lobby(GameMode::Doubles, &["alice", "bob", "carol"]);
        lobby.waiting_players.push(player("dave"));
        lobby.state = LifecycleState::Countdown(CountdownTick::One);

        // when (操作):
        let document = encode_lobby(&lobby).unwrap();
        let decoded = decode_lobby(&code(), &document).unwrap();

        // then (期待する結果):
        assert_eq!(decoded, lobby);
        assert_eq!(document["countdown"]["tick"], json!(1));
        assert_eq!(document["teams"]["team2"]["slot2"], Value::Null);
        assert_eq!(document["completed"], json!(false));
    }

    #[test]
    fn test_decode_countdown_without_tick_reads_first_tick() {
        // テスト項目: COUNTDOWN なのに countdown が未着の文書はティック 0 として読む
        // given (前提条件):
        let lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        let mut document = encode_lobby(&lobby).unwrap();
        document["lifecycleState"] = json!("COUNTDOWN");

        // when (操作):
        let decoded = decode_lobby(&code(), &document).unwrap();

        // then (期待する結果):
        assert_eq!(decoded.state, LifecycleState::Countdown(CountdownTick::Zero));
    }

    #[test]
    fn test_decode_ignores_stale_countdown_outside_countdown_state() {
        // テスト項目: COUNTDOWN 以外の状態では残っている countdown を無視する
        // given (前提条件):
        let lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        let mut document = encode_lobby(&lobby).unwrap();
        document["lifecycleState"] = json!("IN_PROGRESS");
        document["countdown"] = json!({ "tick": "START" });

        // when (操作):
        let decoded = decode_lobby(&code(), &document).unwrap();

        // then (期待する結果):
        assert_eq!(decoded.state, LifecycleState::InProgress);
    }

    #[test]
    fn test_decode_rejects_duplicate_player() {
        // テスト項目: 同じプレイヤーが 2 か所に現れる文書は破損として扱う
        // given (前提条件):
        let lobby = seated_lobby(GameMode::Doubles, &["alice", "bob"]);
        let mut document = encode_lobby(&lobby).unwrap();
        document["teams"]["team2"]["slot1"] = document["teams"]["team1"]["slot2"].clone();

        // when (操作):
        let result = decode_lobby(&code(), &document);

        // then (期待する結果):
        assert!(matches!(result, Err(LobbyError::CorruptSnapshot(_))));
    }

    #[test]
    fn test_decode_rejects_schema_violations() {
        // テスト項目: スキーマ違反（不明な状態、SINGLES での slot2 使用、欠落フィールド）は破損として扱う
        // given (前提条件):
        let lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        let valid = encode_lobby(&lobby).unwrap();

        let mut unknown_state = valid.clone();
        unknown_state["lifecycleState"] = json!("PAUSED");
        let mut singles_slot2 = valid.clone();
        singles_slot2["teams"]["team1"]["slot2"] =
            json!({ "playerId": "zoe", "displayName": "Zoe", "avatarRef": null });
        let mut missing_host = valid.clone();
        missing_host.as_object_mut().unwrap().remove("hostId");

        // when (操作):
        let results = [
            decode_lobby(&code(), &unknown_state),
            decode_lobby(&code(), &singles_slot2),
            decode_lobby(&code(), &missing_host),
            decode_lobby(&code(), &json!("not a lobby")),
        ];

        // then (期待する結果):
        for result in results {
            assert!(matches!(result, Err(LobbyError::CorruptSnapshot(_))));
        }
    }

    #[test]
    fn test_encode_patch_writes_dotted_paths_and_preconditions() {
        // テスト項目: パッチはドット区切りのフィールド書き込みと事前条件に変換される
        // given (前提条件):
        let patch = LobbyPatch::new()
            .change(LobbyChange::Slot(SlotAddress::TEAM2_SLOT1, Some(player("bob"))))
            .guard(LobbyGuard::SlotHolds(SlotAddress::TEAM2_SLOT1, None))
            .guard(LobbyGuard::StateIs(LifecycleState::Countdown(CountdownTick::Start)))
            .touched_at(Timestamp::new(7_000));

        // when (操作):
        let update = encode_patch(&patch).unwrap();

        // then (期待する結果):
        let paths: Vec<&str> = update.writes.iter().map(|w| w.path.as_str()).collect();
        assert_eq!(paths, vec!["teams.team2.slot1", "lastActivityAt"]);
        assert_eq!(update.writes[0].value["playerId"], json!("bob"));
        assert_eq!(
            update.preconditions,
            vec![
                Precondition::equals(FieldPath::new("teams.team2.slot1"), Value::Null),
                Precondition::equals(FieldPath::new("lifecycleState"), json!("COUNTDOWN")),
                Precondition::equals(FieldPath::new("countdown.tick"), json!("START")),
            ]
        );
    }

    #[test]
    fn test_applied_patch_matches_domain_projection() {
        // テスト項目: 文書にパッチを適用した結果はドメイン上の適用結果と一致する
        // given (前提条件):
        let lobby = seated_lobby(GameMode::Singles, &["alice", "bob"]);
        let patch = LobbyPatch::new()
            .change(LobbyChange::State(LifecycleState::Cancelled))
            .change(LobbyChange::CancelReason(Some("rain".to_string())))
            .change(LobbyChange::CompletedAt(Timestamp::new(8_000)))
            .touched_at(Timestamp::new(8_000));
        let mut document = encode_lobby(&lobby).unwrap();

        // when (操作):
        encode_patch(&patch).unwrap().apply_to(&mut document).unwrap();
        let decoded = decode_lobby(&code(), &document).unwrap();

        // then (期待する結果):
        assert_eq!(decoded, patch.apply(&lobby));
        assert_eq!(document["completed"], json!(true));
        assert_eq!(document["cancelled"], json!(true));
        assert_eq!(document["countdown"], Value::Null);
    }
}
