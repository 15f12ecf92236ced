use std::time::Duration;

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use tracing::debug;

use super::process::{AgentConnection, AgentError};
use super::protocol::{AgentReply, EngineMessage};
use crate::game::cards::{Card, Color};
use crate::game::view::{AvailableAction, GameView};

/// Built-in opponents for filling seats without an external process. They
/// work from the serialized view exactly like a child-process agent would;
/// the engine stays out of reach.

fn preferred_wild_color(view: &GameView) -> Color {
    let mut counts = [0usize; 4];
    for notation in &view.hand {
        match notation.chars().next() {
            Some('r') => counts[0] += 1,
            Some('g') => counts[1] += 1,
            Some('b') => counts[2] += 1,
            Some('y') => counts[3] += 1,
            _ => {}
        }
    }
    let best = counts
        .iter()
        .enumerate()
        .max_by_key(|(_, n)| **n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    [Color::Red, Color::Green, Color::Blue, Color::Yellow][best]
}

fn play_reply(view: &GameView, notation: &str) -> AgentReply {
    let wild = notation.starts_with('w');
    AgentReply::Play {
        card: notation.to_string(),
        wild_color: wild.then(|| preferred_wild_color(view)),
        double_play: false,
    }
}

fn fallback_reply(view: &GameView) -> AgentReply {
    if view.available_actions.contains(&AvailableAction::Draw) {
        AgentReply::Draw
    } else {
        AgentReply::Pass
    }
}

/// Plays the cheapest playable card, holding high-value cards for later
/// matches; draws when stuck.
pub struct GreedyAgent {
    id: String,
}

impl GreedyAgent {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl AgentConnection for GreedyAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn request_action(
        &mut self,
        view: &GameView,
        _turn_timeout: Duration,
    ) -> Result<AgentReply, AgentError> {
        let cheapest = view
            .playable_cards
            .iter()
            .filter_map(|notation| {
                notation
                    .parse::<Card>()
                    .ok()
                    .map(|card| (card.value(), notation))
            })
            .min_by_key(|(value, _)| *value);

        let reply = match cheapest {
            Some((_, notation)) => play_reply(view, notation),
            None => fallback_reply(view),
        };
        debug!(agent = %self.id, ?reply, "greedy choice");
        Ok(reply)
    }

    async fn notify(&mut self, _message: &EngineMessage) {}

    async fn stop(&mut self) {}
}

/// Picks uniformly among the playable cards, drawing or passing when the
/// hand offers nothing.
pub struct RandomAgent {
    id: String,
}

impl RandomAgent {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl AgentConnection for RandomAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn request_action(
        &mut self,
        view: &GameView,
        _turn_timeout: Duration,
    ) -> Result<AgentReply, AgentError> {
        let reply = match view.playable_cards.choose(&mut rand::rng()) {
            Some(notation) => play_reply(view, notation),
            None => fallback_reply(view),
        };
        debug!(agent = %self.id, ?reply, "random choice");
        Ok(reply)
    }

    async fn notify(&mut self, _message: &EngineMessage) {}

    async fn stop(&mut self) {}
}
