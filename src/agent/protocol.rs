use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::cards::Color;
use crate::game::view::GameView;

/// Engine -> agent envelopes, one JSON object per line on the agent's
/// standard input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineMessage {
    RequestAction {
        state: GameView,
    },
    Notification {
        message: String,
    },
    Error {
        message: String,
    },
    GameEnd {
        winner: Option<String>,
        scores: HashMap<String, u32>,
    },
}

/// Agent -> engine reply to a `request_action`, one JSON object per line
/// on the agent's standard output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AgentReply {
    Play {
        card: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        wild_color: Option<Color>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        double_play: bool,
    },
    Draw,
    Pass,
}
