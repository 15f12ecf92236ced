// Library crate for the Jedna rules engine and agent tournament harness.
// Exposes the engine, the per-agent process harness and the game runner.

pub mod agent;
pub mod game;
pub mod runner;

pub use agent::{
    AgentConnection, AgentError, AgentProcess, AgentReply, EngineMessage,
    GreedyAgent, RandomAgent,
};
pub use game::{
    Card, CardError, Color, Figure, Game, GameError, GameResult, GameState,
    GameView, PlayerId,
};
pub use runner::{GameReport, GameRunner, RunnerConfig, RunnerError};
