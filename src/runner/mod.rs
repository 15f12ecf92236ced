use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::agent::process::{AgentConnection, AgentProcess};
use crate::agent::protocol::{AgentReply, EngineMessage};
use crate::game::cards::Color;
use crate::game::engine::{Game, GameError, Notice, PlayOutcome};
use crate::game::player::PlayerId;
use crate::game::view::GameView;

/// Harness configuration. A zero duration means "no limit".
#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    pub turn_timeout: Duration,
    pub game_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            turn_timeout: Duration::from_secs(10),
            game_timeout: Duration::ZERO,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("at least two agents are required")]
    NotEnoughAgents,
    #[error("failed to start an agent: {0}")]
    Resource(#[from] crate::agent::process::AgentError),
    #[error("failed to set up the game: {0}")]
    Setup(GameError),
    #[error("engine refused a safe-default move: {0}")]
    Invariant(GameError),
}

/// Outcome of one finished game. `scores` holds each player's remaining
/// hand value; `winner_score` is the floored award for the winner, absent
/// on a draw.
#[derive(Debug, Clone, PartialEq)]
pub struct GameReport {
    pub game_id: String,
    pub winner: Option<String>,
    pub winner_score: Option<u32>,
    pub scores: HashMap<String, u32>,
    pub turns: u64,
}

/// Drives one game: serializes the engine for the acting agent, relays the
/// agent's choice back into the engine, and keeps the game progressing no
/// matter how the agents misbehave.
pub struct GameRunner {
    config: RunnerConfig,
}

/// Consecutive protocol failures before an agent is cut off.
const FORFEIT_THRESHOLD: u32 = 2;

impl GameRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Spawn one child process per `(player id, command line)` pair and
    /// run a game between them. If any spawn fails the game is aborted and
    /// the agents already running are torn down.
    pub async fn run_commands(
        &self,
        commands: &[(String, String)],
    ) -> Result<GameReport, RunnerError> {
        let mut agents: Vec<Box<dyn AgentConnection>> = Vec::new();
        for (id, command) in commands {
            match AgentProcess::spawn_command_line(id, command) {
                Ok(agent) => agents.push(Box::new(agent)),
                Err(err) => {
                    warn!(agent = %id, error = %err, "spawn failed; aborting game");
                    teardown(&mut agents, None).await;
                    return Err(RunnerError::Resource(err));
                }
            }
        }
        self.run(agents).await
    }

    pub async fn run(
        &self,
        mut agents: Vec<Box<dyn AgentConnection>>,
    ) -> Result<GameReport, RunnerError> {
        if agents.len() < 2 {
            return Err(RunnerError::NotEnoughAgents);
        }

        let game_id = uuid::Uuid::new_v4().to_string();
        let mut game = Game::new(game_id.clone());
        for agent in &agents {
            if let Err(err) = game.add_player(PlayerId::from(agent.id())) {
                teardown(&mut agents, None).await;
                return Err(RunnerError::Setup(err));
            }
        }
        let start_notices = match game.start_game() {
            Ok(notices) => notices,
            Err(err) => {
                teardown(&mut agents, None).await;
                return Err(RunnerError::Setup(err));
            }
        };
        info!(game_id = %game_id, agents = agents.len(), "game started");
        broadcast_notices(&mut agents, &start_notices).await;

        let deadline = if self.config.game_timeout.is_zero() {
            None
        } else {
            Some(Instant::now() + self.config.game_timeout)
        };

        let mut streaks: HashMap<String, u32> = HashMap::new();
        let mut forfeited: HashSet<String> = HashSet::new();
        let mut turns: u64 = 0;

        while game.is_in_progress() {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    info!(game_id = %game_id, "game timeout; declaring a draw");
                    break;
                }
            }
            if forfeited.len() == agents.len() {
                info!(game_id = %game_id, "all agents forfeited; declaring a draw");
                break;
            }

            let acting = match game.acting_player() {
                Some(player) => player.id().clone(),
                None => break,
            };
            turns += 1;

            let outcome = if forfeited.contains(acting.as_str()) {
                self.safe_default(&mut game, &acting)?
            } else {
                match self.one_turn(&mut game, &mut agents, &acting).await {
                    TurnResult::Applied(outcome) => {
                        streaks.insert(acting.to_string(), 0);
                        outcome
                    }
                    TurnResult::ProtocolError => {
                        let streak =
                            streaks.entry(acting.to_string()).or_insert(0);
                        *streak += 1;
                        if *streak >= FORFEIT_THRESHOLD {
                            warn!(
                                game_id = %game_id,
                                agent = %acting,
                                "agent forfeited after repeated protocol errors"
                            );
                            forfeited.insert(acting.to_string());
                        }
                        self.safe_default(&mut game, &acting)?
                    }
                    TurnResult::EngineError => {
                        self.safe_default(&mut game, &acting)?
                    }
                }
            };

            broadcast_notices(&mut agents, &outcome.notices).await;
            if outcome.result.is_some() {
                break;
            }
        }

        let report = match game.result() {
            Some(result) => GameReport {
                game_id: game_id.clone(),
                winner: Some(result.winner.to_string()),
                winner_score: Some(result.score),
                scores: result
                    .hands
                    .iter()
                    .map(|(id, value)| (id.to_string(), *value))
                    .collect(),
                turns,
            },
            None => GameReport {
                game_id: game_id.clone(),
                winner: None,
                winner_score: None,
                scores: game
                    .players()
                    .iter()
                    .map(|p| (p.id().to_string(), p.hand().total_value()))
                    .collect(),
                turns,
            },
        };

        let farewell = EngineMessage::GameEnd {
            winner: report.winner.clone(),
            scores: report.scores.clone(),
        };
        teardown(&mut agents, Some(&farewell)).await;
        info!(
            game_id = %game_id,
            winner = report.winner.as_deref().unwrap_or("none"),
            turns,
            "game finished"
        );
        Ok(report)
    }

    /// Ask the acting agent for a move and apply it. A `draw` gets an
    /// immediate follow-up request so the agent can play or keep the
    /// picked card.
    async fn one_turn(
        &self,
        game: &mut Game,
        agents: &mut [Box<dyn AgentConnection>],
        acting: &PlayerId,
    ) -> TurnResult {
        let view = match GameView::for_acting_player(game) {
            Some(view) => view,
            None => return TurnResult::EngineError,
        };
        let agent = match agents.iter_mut().find(|a| a.id() == acting.as_str())
        {
            Some(agent) => agent,
            None => return TurnResult::EngineError,
        };

        let reply = match agent
            .request_action(&view, self.config.turn_timeout)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                warn!(agent = %acting, error = %err, "protocol error");
                return TurnResult::ProtocolError;
            }
        };

        match reply {
            AgentReply::Draw => {
                if let Err(err) = game.draw_one(acting) {
                    notify_error(agent, &err).await;
                    return TurnResult::EngineError;
                }
                // The drawn card may have opened a play; ask again.
                let view = match GameView::for_acting_player(game) {
                    Some(view) => view,
                    None => return TurnResult::EngineError,
                };
                let follow_up = match agent
                    .request_action(&view, self.config.turn_timeout)
                    .await
                {
                    Ok(reply) => reply,
                    Err(err) => {
                        warn!(agent = %acting, error = %err, "protocol error");
                        return TurnResult::ProtocolError;
                    }
                };
                match follow_up {
                    AgentReply::Play {
                        card,
                        wild_color,
                        double_play,
                    } => {
                        apply_play(game, agent, acting, &card, wild_color, double_play)
                            .await
                    }
                    AgentReply::Pass => apply_pass(game, agent, acting).await,
                    AgentReply::Draw => {
                        // Only one draw per turn; treat like any illegal move.
                        notify_error(agent, &GameError::IllegalInState).await;
                        TurnResult::EngineError
                    }
                }
            }
            AgentReply::Pass => apply_pass(game, agent, acting).await,
            AgentReply::Play {
                card,
                wild_color,
                double_play,
            } => {
                apply_play(game, agent, acting, &card, wild_color, double_play)
                    .await
            }
        }
    }

    /// The guaranteed-progress move: surrender the war, or conclude the
    /// turn after drawing, or draw and conclude. Failure here means the
    /// engine broke its own rules.
    fn safe_default(
        &self,
        game: &mut Game,
        acting: &PlayerId,
    ) -> Result<PlayOutcome, RunnerError> {
        debug!(agent = %acting, "applying safe default");
        if game.stacked_cards() == 0 && !game.already_picked() {
            game.draw_one(acting).map_err(RunnerError::Invariant)?;
        }
        game.pass(acting).map_err(RunnerError::Invariant)
    }
}

enum TurnResult {
    Applied(PlayOutcome),
    ProtocolError,
    EngineError,
}

async fn apply_play(
    game: &mut Game,
    agent: &mut Box<dyn AgentConnection>,
    acting: &PlayerId,
    notation: &str,
    wild_color: Option<Color>,
    double_play: bool,
) -> TurnResult {
    let held = match game.find_card(notation) {
        Some(card) => card,
        None => {
            notify_error(agent, &GameError::CardNotInHand).await;
            return TurnResult::EngineError;
        }
    };
    // A color may ride on the notation itself (`wr`) or in `wild_color`;
    // the explicit field wins.
    let chosen = wild_color.or_else(|| {
        notation
            .parse::<crate::game::cards::Card>()
            .ok()
            .and_then(|c| c.chosen_color())
    });

    match game.play(acting, held, chosen, double_play) {
        Ok(outcome) => TurnResult::Applied(outcome),
        Err(err) => {
            notify_error(agent, &err).await;
            TurnResult::EngineError
        }
    }
}

async fn apply_pass(
    game: &mut Game,
    agent: &mut Box<dyn AgentConnection>,
    acting: &PlayerId,
) -> TurnResult {
    match game.pass(acting) {
        Ok(outcome) => TurnResult::Applied(outcome),
        Err(err) => {
            notify_error(agent, &err).await;
            TurnResult::EngineError
        }
    }
}

async fn notify_error(agent: &mut Box<dyn AgentConnection>, err: &GameError) {
    agent
        .notify(&EngineMessage::Error {
            message: err.to_string(),
        })
        .await;
}

async fn broadcast_notices(
    agents: &mut [Box<dyn AgentConnection>],
    notices: &[Notice],
) {
    for notice in notices {
        let message = EngineMessage::Notification {
            message: notice_text(notice),
        };
        for agent in agents.iter_mut() {
            agent.notify(&message).await;
        }
    }
}

fn notice_text(notice: &Notice) -> String {
    match notice {
        Notice::Skipped { player } => format!("{player} was skipped"),
        Notice::DirectionReversed { direction } => match direction {
            crate::game::engine::Direction::Clockwise => {
                "play direction is now clockwise".to_string()
            }
            crate::game::engine::Direction::Counterclockwise => {
                "play direction is now counterclockwise".to_string()
            }
        },
        Notice::WarStarted { stacked } => {
            format!("a draw war started, penalty at {stacked}")
        }
        Notice::WarRaised { stacked } => {
            format!("the war escalated, penalty at {stacked}")
        }
        Notice::WarResolved { player, drawn } => {
            format!("{player} drew {drawn} cards and the war ended")
        }
        Notice::Uno { player } => format!("{player} has one card left"),
        Notice::GameOver { winner, score } => {
            format!("{winner} wins the game with {score} points")
        }
    }
}

async fn teardown(
    agents: &mut [Box<dyn AgentConnection>],
    farewell: Option<&EngineMessage>,
) {
    for agent in agents.iter_mut() {
        if let Some(message) = farewell {
            agent.notify(message).await;
        }
        agent.stop().await;
    }
}
