use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::DoublesGameEntity,
    dto::{
        format_system_time, parse_system_time,
        validation::{validate_player_name, validate_timestamp},
    },
    error::ServiceError,
};

/// Result of one doubles game, as submitted by a scorekeeper.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateGameRequest {
    /// When the game was played (RFC 3339).
    #[schema(example = "2024-06-01T10:00:00Z")]
    pub played_at: String,
    pub winner1: String,
    pub winner2: String,
    pub loser1: String,
    pub loser2: String,
    pub winner_score: u32,
    pub loser_score: u32,
}

impl Validate for CreateGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_timestamp(&self.played_at) {
            errors.add("played_at", e);
        }

        let names = [
            ("winner1", &self.winner1),
            ("winner2", &self.winner2),
            ("loser1", &self.loser1),
            ("loser2", &self.loser2),
        ];
        let mut seen = HashSet::new();
        for (field, name) in names {
            if let Err(e) = validate_player_name(name) {
                errors.add(field, e);
            } else if !seen.insert(name.trim()) {
                let mut err = ValidationError::new("player_repeated");
                err.message =
                    Some(format!("Player `{}` appears twice in one game", name.trim()).into());
                errors.add(field, err);
            }
        }

        if self.winner_score <= self.loser_score {
            let mut err = ValidationError::new("score_order");
            err.message = Some("Winning score must be above the losing score".into());
            errors.add("winner_score", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl CreateGameRequest {
    /// Turn the request into a storable game with the given identifier.
    pub fn into_entity(self, id: Uuid) -> Result<DoublesGameEntity, ServiceError> {
        let played_at = parse_system_time(&self.played_at).map_err(|err| {
            ServiceError::InvalidInput(format!("invalid timestamp `{}`: {err}", self.played_at))
        })?;

        Ok(DoublesGameEntity {
            id,
            played_at,
            winner1: self.winner1.trim().to_owned(),
            winner2: self.winner2.trim().to_owned(),
            winner_score: self.winner_score,
            loser1: self.loser1.trim().to_owned(),
            loser2: self.loser2.trim().to_owned(),
            loser_score: self.loser_score,
        })
    }
}

/// A stored doubles game.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameSummary {
    pub id: Uuid,
    pub played_at: String,
    pub winners: Vec<String>,
    pub losers: Vec<String>,
    pub winner_score: u32,
    pub loser_score: u32,
}

impl From<DoublesGameEntity> for GameSummary {
    fn from(game: DoublesGameEntity) -> Self {
        Self {
            id: game.id,
            played_at: format_system_time(game.played_at),
            winners: vec![game.winner1, game.winner2],
            losers: vec![game.loser1, game.loser2],
            winner_score: game.winner_score,
            loser_score: game.loser_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    fn request() -> CreateGameRequest {
        CreateGameRequest {
            played_at: "2024-06-01T10:00:00Z".into(),
            winner1: "Ana".into(),
            winner2: "Ben".into(),
            loser1: "Cai".into(),
            loser2: "Dee".into(),
            winner_score: 21,
            loser_score: 17,
        }
    }

    #[test]
    fn well_formed_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn repeated_player_is_rejected() {
        let mut payload = request();
        payload.loser2 = " Ana ".into();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("loser2"));
    }

    #[test]
    fn blank_name_and_bad_scores_are_reported_together() {
        let mut payload = request();
        payload.winner2 = "  ".into();
        payload.winner_score = 15;
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("winner2"));
        assert!(fields.contains_key("winner_score"));
    }

    #[test]
    fn tied_score_is_rejected() {
        let mut payload = request();
        payload.loser_score = payload.winner_score;
        assert!(payload.validate().is_err());
    }

    #[test]
    fn unparsable_timestamp_is_rejected() {
        let mut payload = request();
        payload.played_at = "June 1st".into();
        assert!(payload.validate().unwrap_err().field_errors().contains_key("played_at"));
        assert!(matches!(
            payload.into_entity(Uuid::new_v4()),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn entity_trims_names_and_keeps_instant() {
        let mut payload = request();
        payload.winner1 = " Ana ".into();
        payload.played_at = "2024-06-01T12:00:00+02:00".into();
        let id = Uuid::new_v4();
        let entity = payload.into_entity(id).unwrap();

        assert_eq!(entity.id, id);
        assert_eq!(entity.winner1, "Ana");
        assert_eq!(
            entity.played_at,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_717_236_000)
        );
        assert_eq!(GameSummary::from(entity).played_at, "2024-06-01T10:00:00Z");
    }
}
