use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::game::GameStateDto,
    scoring::{HandOutcome, Seat},
};

/// How a connection participates in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionRole {
    /// Authenticated operator; the only role allowed to mutate state.
    Control,
    /// Anonymous read-only subscriber (overlay, spectator page).
    Display,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from WebSocket clients.
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Subscribe to a room. A token makes this a control connection once it
    /// passes authorization; without one the connection is display-only.
    Join {
        /// Target room code.
        game_id: String,
        /// Control credential, absent for display clients.
        #[serde(default)]
        token: Option<String>,
    },
    /// Drop the current room subscription. Game state is unaffected.
    Leave {
        /// Room code being left.
        game_id: String,
    },
    /// Submit a mutation. Rejected for display connections.
    Command {
        /// Target room code.
        game_id: String,
        /// The mutation to apply.
        command: GameCommand,
    },
}

impl ClientMessage {
    /// Parse a text frame into a client message.
    pub fn from_json_str(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Control-side mutations. The first accepted command for a room creates the
/// default match state implicitly.
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GameCommand {
    /// Record a riichi declaration for a seat.
    DeclareRiichi {
        /// Declaring seat.
        seat: Seat,
    },
    /// Withdraw a declaration whose discard is not committed yet.
    CancelRiichi {
        /// Declaring seat.
        seat: Seat,
    },
    /// Commit a declaration, making the stake irrevocable.
    ConfirmRiichi {
        /// Declaring seat.
        seat: Seat,
    },
    /// Settle a won hand.
    ApplyWin {
        /// Ron or tsumo details.
        outcome: WinOutcomeDto,
    },
    /// Settle an exhaustive draw.
    ApplyDraw {
        /// Seats that were tenpai.
        tenpai_seats: BTreeSet<Seat>,
    },
    /// Replace the dora indicator tiles.
    SetDora {
        /// Indicator tiles, operator-entered strings.
        tiles: Vec<String>,
    },
    /// Manual score correction, bypassing settlement.
    SetScore {
        /// Seat to correct.
        seat: Seat,
        /// New absolute score.
        score: i32,
    },
    /// Manual navigation to the next hand.
    AdvanceRound,
    /// Manual navigation back one hand.
    RetreatRound,
    /// Rename a seat's player.
    SetPlayerName {
        /// Seat to rename.
        seat: Seat,
        /// New display name.
        name: String,
    },
    /// Set or clear the scoreboard title.
    SetMatchTitle {
        /// New title, `null` to clear.
        #[serde(default)]
        title: Option<String>,
    },
    /// Replace the whole state (last-write-wins across control panels).
    SetState {
        /// Full snapshot to install.
        state: GameStateDto,
    },
    /// Restore the previous snapshot from the room history.
    Undo,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// A winning hand as submitted by the operator. Han and fu are entered or
/// picked from the scoring table; tiles are never interpreted here.
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WinOutcomeDto {
    /// Win off a discard.
    Ron {
        /// Winning seat.
        winner: Seat,
        /// Discarding seat.
        loser: Seat,
        /// Hand value in han.
        han: u8,
        /// Hand value in fu.
        fu: u8,
    },
    /// Self-drawn win.
    Tsumo {
        /// Winning seat.
        winner: Seat,
        /// Hand value in han.
        han: u8,
        /// Hand value in fu.
        fu: u8,
    },
}

impl From<WinOutcomeDto> for HandOutcome {
    fn from(dto: WinOutcomeDto) -> Self {
        match dto {
            WinOutcomeDto::Ron {
                winner,
                loser,
                han,
                fu,
            } => HandOutcome::Ron {
                winner,
                loser,
                han,
                fu,
            },
            WinOutcomeDto::Tsumo { winner, han, fu } => HandOutcome::Tsumo { winner, han, fu },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Messages pushed to WebSocket clients.
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Acknowledges a join and tells the client which role it got.
    Joined {
        /// Room that was joined.
        game_id: String,
        /// Granted role.
        role: ConnectionRole,
    },
    /// Full snapshot, sent on join and on every (debounced) broadcast.
    State {
        /// Room the snapshot belongs to.
        game_id: String,
        /// The snapshot, `null` while the room is uninitialized.
        state: Option<GameStateDto>,
    },
    /// An error visible to this connection only.
    Error {
        /// Human-readable description.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_message_parses_with_and_without_token() {
        let control: ClientMessage =
            serde_json::from_str(r#"{"type":"join","gameId":"123456","token":"secret"}"#).unwrap();
        assert!(matches!(
            control,
            ClientMessage::Join { token: Some(_), .. }
        ));

        let display: ClientMessage =
            serde_json::from_str(r#"{"type":"join","gameId":"123456"}"#).unwrap();
        assert!(matches!(display, ClientMessage::Join { token: None, .. }));
    }

    #[test]
    fn commands_use_camel_case_tags() {
        let message: ClientMessage = serde_json::from_str(
            r#"{
                "type":"command",
                "gameId":"123456",
                "command":{"op":"applyWin","outcome":{"kind":"ron","winner":"east","loser":"south","han":3,"fu":30}}
            }"#,
        )
        .unwrap();

        let ClientMessage::Command { command, .. } = message else {
            panic!("expected command message");
        };
        let GameCommand::ApplyWin { outcome } = command else {
            panic!("expected applyWin");
        };
        assert!(matches!(
            HandOutcome::from(outcome),
            HandOutcome::Ron {
                winner: Seat::East,
                loser: Seat::South,
                han: 3,
                fu: 30,
            }
        ));
    }

    #[test]
    fn draw_command_deduplicates_seats() {
        let message: ClientMessage = serde_json::from_str(
            r#"{
                "type":"command",
                "gameId":"000001",
                "command":{"op":"applyDraw","tenpaiSeats":["east","east","west"]}
            }"#,
        )
        .unwrap();
        let ClientMessage::Command {
            command: GameCommand::ApplyDraw { tenpai_seats },
            ..
        } = message
        else {
            panic!("expected applyDraw");
        };
        assert_eq!(tenpai_seats.len(), 2);
    }
}
