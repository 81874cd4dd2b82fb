//! BSON document shapes. Identifiers are stored as hyphenated strings and
//! timestamps as native BSON dates so the collections stay readable from the
//! mongo shell.

use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::{
    models::{DoublesGameEntity, SessionEntity},
    storage::StorageError,
};

pub const GAME_COLLECTION_NAME: &str = "games";
pub const SESSION_COLLECTION_NAME: &str = "sessions";
pub const SESSION_STAGING_COLLECTION_NAME: &str = "sessions_rebuild";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: String,
    played_at: DateTime,
    winner1: String,
    winner2: String,
    winner_score: i64,
    loser1: String,
    loser2: String,
    loser_score: i64,
}

impl From<DoublesGameEntity> for MongoGameDocument {
    fn from(value: DoublesGameEntity) -> Self {
        Self {
            id: value.id.to_string(),
            played_at: DateTime::from_system_time(value.played_at),
            winner1: value.winner1,
            winner2: value.winner2,
            winner_score: i64::from(value.winner_score),
            loser1: value.loser1,
            loser2: value.loser2,
            loser_score: i64::from(value.loser_score),
        }
    }
}

impl TryFrom<MongoGameDocument> for DoublesGameEntity {
    type Error = StorageError;

    fn try_from(value: MongoGameDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(GAME_COLLECTION_NAME, &value.id)?,
            played_at: value.played_at.to_system_time(),
            winner1: value.winner1,
            winner2: value.winner2,
            winner_score: parse_score(value.winner_score)?,
            loser1: value.loser1,
            loser2: value.loser2,
            loser_score: parse_score(value.loser_score)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSessionDocument {
    #[serde(rename = "_id")]
    session_number: i64,
    start_time: DateTime,
    end_time: DateTime,
    total_games: i64,
    players: Vec<String>,
    game_ids: Vec<String>,
    pattern: String,
    created_at: DateTime,
}

impl From<SessionEntity> for MongoSessionDocument {
    fn from(value: SessionEntity) -> Self {
        Self {
            session_number: i64::from(value.session_number),
            start_time: DateTime::from_system_time(value.start_time),
            end_time: DateTime::from_system_time(value.end_time),
            total_games: i64::from(value.total_games),
            players: value.players,
            game_ids: value.game_ids.iter().map(Uuid::to_string).collect(),
            pattern: value.pattern,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoSessionDocument> for SessionEntity {
    type Error = StorageError;

    fn try_from(value: MongoSessionDocument) -> Result<Self, Self::Error> {
        let session_number = u32::try_from(value.session_number).map_err(|_| {
            StorageError::corrupt(
                SESSION_COLLECTION_NAME,
                format!("invalid session number {}", value.session_number),
            )
        })?;
        let total_games = u32::try_from(value.total_games).map_err(|_| {
            StorageError::corrupt(
                SESSION_COLLECTION_NAME,
                format!("invalid game count {}", value.total_games),
            )
        })?;
        let game_ids = value
            .game_ids
            .iter()
            .map(|id| parse_uuid(SESSION_COLLECTION_NAME, id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            session_number,
            start_time: value.start_time.to_system_time(),
            end_time: value.end_time.to_system_time(),
            total_games,
            players: value.players,
            game_ids,
            pattern: value.pattern,
            created_at: value.created_at.to_system_time(),
        })
    }
}

pub fn game_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

pub fn session_id(session_number: u32) -> Document {
    doc! {"_id": i64::from(session_number)}
}

fn parse_uuid(collection: &'static str, raw: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(raw)
        .map_err(|err| StorageError::corrupt(collection, format!("invalid id `{raw}`: {err}")))
}

fn parse_score(raw: i64) -> Result<u32, StorageError> {
    u32::try_from(raw)
        .map_err(|_| StorageError::corrupt(GAME_COLLECTION_NAME, format!("invalid score {raw}")))
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    #[test]
    fn game_document_keeps_every_column() {
        let entity = DoublesGameEntity {
            id: Uuid::new_v4(),
            played_at: SystemTime::UNIX_EPOCH + Duration::from_millis(1_700_000_000_000),
            winner1: "Ana".into(),
            winner2: "Ben".into(),
            winner_score: 21,
            loser1: "Cai".into(),
            loser2: "Dee".into(),
            loser_score: 19,
        };

        let document = MongoGameDocument::from(entity.clone());
        assert_eq!(document.id, entity.id.to_string());
        assert_eq!(DoublesGameEntity::try_from(document).unwrap(), entity);
    }

    #[test]
    fn malformed_game_id_is_reported_as_corrupt() {
        let document = MongoGameDocument {
            id: "not-a-uuid".into(),
            played_at: DateTime::now(),
            winner1: "a".into(),
            winner2: "b".into(),
            winner_score: 21,
            loser1: "c".into(),
            loser2: "d".into(),
            loser_score: 3,
        };
        assert!(matches!(
            DoublesGameEntity::try_from(document),
            Err(StorageError::Corrupt {
                collection: GAME_COLLECTION_NAME,
                ..
            })
        ));
    }

    #[test]
    fn negative_session_number_is_reported_as_corrupt() {
        let document = MongoSessionDocument {
            session_number: -1,
            start_time: DateTime::now(),
            end_time: DateTime::now(),
            total_games: 3,
            players: Vec::new(),
            game_ids: Vec::new(),
            pattern: "balanced".into(),
            created_at: DateTime::now(),
        };
        assert!(SessionEntity::try_from(document).is_err());
    }
}
