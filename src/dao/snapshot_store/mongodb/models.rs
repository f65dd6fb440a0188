use indexmap::IndexMap;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::{
    dao::models::{GameStateEntity, PlayerEntity, RiichiStakeEntity, RoundEntity, ScoreDiffEntity},
    scoring::Seat,
};

/// BSON shape of one persisted room snapshot. Timestamps are converted to
/// native BSON datetimes so they stay queryable from database tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoStateDocument {
    #[serde(rename = "_id")]
    pub room_id: String,
    players: Vec<PlayerEntity>,
    round: RoundEntity,
    riichi_stakes: Vec<RiichiStakeEntity>,
    dora_indicators: Vec<String>,
    match_title: Option<String>,
    last_diffs: IndexMap<Seat, Vec<ScoreDiffEntity>>,
    last_diff_at: Option<DateTime>,
    is_active: bool,
    updated_at: DateTime,
}

impl From<(String, GameStateEntity)> for MongoStateDocument {
    fn from((room_id, state): (String, GameStateEntity)) -> Self {
        Self {
            room_id,
            players: state.players,
            round: state.round,
            riichi_stakes: state.riichi_stakes,
            dora_indicators: state.dora_indicators,
            match_title: state.match_title,
            last_diffs: state.last_diffs,
            last_diff_at: state.last_diff_at.map(DateTime::from_system_time),
            is_active: state.is_active,
            updated_at: DateTime::from_system_time(state.updated_at),
        }
    }
}

impl From<MongoStateDocument> for GameStateEntity {
    fn from(document: MongoStateDocument) -> Self {
        Self {
            players: document.players,
            round: document.round,
            riichi_stakes: document.riichi_stakes,
            dora_indicators: document.dora_indicators,
            match_title: document.match_title,
            last_diffs: document.last_diffs,
            last_diff_at: document.last_diff_at.map(DateTime::to_system_time),
            is_active: document.is_active,
            updated_at: document.updated_at.to_system_time(),
        }
    }
}
