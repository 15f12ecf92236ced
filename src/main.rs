use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jedna::agent::{GreedyAgent, RandomAgent};
use jedna::{AgentConnection, AgentProcess, GameRunner, RunnerConfig};

/// Read a millisecond duration from the environment; `0` means no limit.
fn duration_from_env(name: &str, default_ms: u64) -> Duration {
    let millis = std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(millis)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jedna=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let commands: Vec<String> = std::env::args().skip(1).collect();
    if commands.len() < 2 {
        eprintln!("usage: jedna <agent-command> <agent-command> [more...]");
        eprintln!("example: jedna ./my_agent \"python3 agent.py\"");
        eprintln!("built-in seats: builtin:greedy, builtin:random");
        std::process::exit(2);
    }

    let config = RunnerConfig {
        turn_timeout: duration_from_env("JEDNA_TURN_TIMEOUT_MS", 10_000),
        game_timeout: duration_from_env("JEDNA_GAME_TIMEOUT_MS", 0),
    };
    info!(
        turn_timeout_ms = config.turn_timeout.as_millis() as u64,
        game_timeout_ms = config.game_timeout.as_millis() as u64,
        "starting a single game"
    );

    let mut agents: Vec<Box<dyn AgentConnection>> = Vec::new();
    for (index, command) in commands.iter().enumerate() {
        let id = format!("player-{}", index + 1);
        let agent: Box<dyn AgentConnection> = match command.as_str() {
            "builtin:greedy" => Box::new(GreedyAgent::new(id.as_str())),
            "builtin:random" => Box::new(RandomAgent::new(id.as_str())),
            _ => match AgentProcess::spawn_command_line(&id, command) {
                Ok(agent) => Box::new(agent),
                Err(err) => {
                    error!(agent = %id, command = %command, error = %err, "failed to spawn agent");
                    std::process::exit(1);
                }
            },
        };
        agents.push(agent);
    }

    match GameRunner::new(config).run(agents).await {
        Ok(report) => {
            match &report.winner {
                Some(winner) => info!(
                    winner = %winner,
                    score = report.winner_score.unwrap_or(0),
                    turns = report.turns,
                    "game over"
                ),
                None => info!(turns = report.turns, "game drawn"),
            }
            for (player, value) in &report.scores {
                info!(player = %player, remaining_hand_value = value, "final standing");
            }
        }
        Err(err) => {
            error!(error = %err, "game aborted");
            std::process::exit(1);
        }
    }
}
