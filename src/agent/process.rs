use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::protocol::{AgentReply, EngineMessage};
use crate::game::view::GameView;

/// How long a stopped agent gets to exit on its own before being killed.
pub const STOP_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("failed to spawn agent process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("agent did not answer within the turn timeout")]
    Timeout,
    #[error("agent closed its output")]
    ClosedOutput,
    #[error("agent sent invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("i/o error talking to agent: {0}")]
    Io(#[from] std::io::Error),
}

/// The seam between the runner and a decision-maker. Production agents are
/// child processes; tests drive the runner with scripted implementations.
#[async_trait]
pub trait AgentConnection: Send {
    fn id(&self) -> &str;

    /// Deliver an action request and wait for one reply line. A zero
    /// timeout means no limit.
    async fn request_action(
        &mut self,
        view: &GameView,
        turn_timeout: Duration,
    ) -> Result<AgentReply, AgentError>;

    /// Best-effort delivery of an informational envelope. Failures are
    /// swallowed: a dead agent loses its notifications, nothing else.
    async fn notify(&mut self, message: &EngineMessage);

    /// Release the agent's resources. Must be safe to call on every exit
    /// path, including after errors.
    async fn stop(&mut self);
}

/// An external decision-maker running as a child process. Speaks
/// line-delimited JSON on stdin/stdout; stderr is inherited for agent
/// debugging and never parsed.
#[derive(Debug)]
pub struct AgentProcess {
    id: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl AgentProcess {
    pub fn spawn(
        id: impl Into<String>,
        program: &str,
        args: &[String],
    ) -> Result<Self, AgentError> {
        let id = id.into();
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(AgentError::Spawn)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_error("missing stdin pipe"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_error("missing stdout pipe"))?;

        debug!(agent = %id, program, "agent process spawned");
        Ok(Self {
            id,
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout).lines(),
        })
    }

    /// Spawn from a whitespace-separated command line.
    pub fn spawn_command_line(
        id: impl Into<String>,
        command: &str,
    ) -> Result<Self, AgentError> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| spawn_error("empty agent command"))?;
        let args: Vec<String> = parts.map(str::to_string).collect();
        Self::spawn(id, program, &args)
    }

    async fn write_line(&mut self, message: &EngineMessage) -> Result<(), AgentError> {
        let stdin = self.stdin.as_mut().ok_or(AgentError::ClosedOutput)?;
        let mut line = serde_json::to_vec(message)
            .map_err(AgentError::InvalidJson)?;
        line.push(b'\n');
        stdin.write_all(&line).await?;
        stdin.flush().await?;
        Ok(())
    }
}

fn spawn_error(reason: &str) -> AgentError {
    AgentError::Spawn(std::io::Error::other(reason.to_string()))
}

#[async_trait]
impl AgentConnection for AgentProcess {
    fn id(&self) -> &str {
        &self.id
    }

    async fn request_action(
        &mut self,
        view: &GameView,
        turn_timeout: Duration,
    ) -> Result<AgentReply, AgentError> {
        self.write_line(&EngineMessage::RequestAction {
            state: view.clone(),
        })
        .await?;

        let line = if turn_timeout.is_zero() {
            self.stdout.next_line().await?
        } else {
            timeout(turn_timeout, self.stdout.next_line())
                .await
                .map_err(|_| AgentError::Timeout)??
        };
        let line = line.ok_or(AgentError::ClosedOutput)?;

        let reply = serde_json::from_str(&line)
            .map_err(AgentError::InvalidJson)?;
        debug!(agent = %self.id, ?reply, "agent replied");
        Ok(reply)
    }

    async fn notify(&mut self, message: &EngineMessage) {
        if let Err(err) = self.write_line(message).await {
            debug!(agent = %self.id, error = %err, "notification dropped");
        }
    }

    async fn stop(&mut self) {
        // Closing stdin is the shutdown signal after the final envelope.
        self.stdin.take();
        match timeout(STOP_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => {
                debug!(agent = %self.id, code = ?status.code(), "agent exited");
            }
            Ok(Err(err)) => {
                warn!(agent = %self.id, error = %err, "failed to reap agent");
            }
            Err(_) => {
                warn!(agent = %self.id, "agent ignored shutdown; killing");
                if let Err(err) = self.child.kill().await {
                    warn!(agent = %self.id, error = %err, "failed to kill agent");
                }
            }
        }
    }
}
