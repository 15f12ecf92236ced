use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use jedna::game::{AvailableAction, GameView};
use jedna::{AgentConnection, AgentError, AgentReply, EngineMessage};

/// Everything the runner did to an agent, for post-game assertions.
#[derive(Debug, Default)]
pub struct AgentLog {
    pub requests: Vec<GameView>,
    pub notifications: Vec<EngineMessage>,
    pub stopped: bool,
}

/// One scripted response to an action request.
pub enum Step {
    Reply(AgentReply),
    Timeout,
    Garbage,
}

/// What to do once the script runs out.
pub enum Fallback {
    /// Play the first playable card, otherwise draw, otherwise pass.
    Greedy,
    /// Keep passing the turn away (drawing first when required).
    Meek,
}

/// In-process stand-in for a child-process agent: replays a script, then
/// falls back to a simple policy. Mirrors the production `AgentProcess`
/// from the runner's point of view.
pub struct ScriptedAgent {
    id: String,
    script: VecDeque<Step>,
    fallback: Fallback,
    log: Arc<Mutex<AgentLog>>,
}

impl ScriptedAgent {
    pub fn new(
        id: &str,
        script: Vec<Step>,
        fallback: Fallback,
    ) -> (Self, Arc<Mutex<AgentLog>>) {
        let log = Arc::new(Mutex::new(AgentLog::default()));
        (
            Self {
                id: id.to_string(),
                script: script.into(),
                fallback,
                log: log.clone(),
            },
            log,
        )
    }

    pub fn greedy(id: &str) -> (Self, Arc<Mutex<AgentLog>>) {
        Self::new(id, Vec::new(), Fallback::Greedy)
    }

    fn fallback_reply(&self, view: &GameView) -> AgentReply {
        match self.fallback {
            Fallback::Greedy => {
                if let Some(card) = view.playable_cards.first() {
                    let wild_color = if card.starts_with('w') {
                        Some(jedna::Color::Red)
                    } else {
                        None
                    };
                    AgentReply::Play {
                        card: card.clone(),
                        wild_color,
                        double_play: false,
                    }
                } else if view
                    .available_actions
                    .contains(&AvailableAction::Draw)
                {
                    AgentReply::Draw
                } else {
                    AgentReply::Pass
                }
            }
            Fallback::Meek => {
                if view.available_actions.contains(&AvailableAction::Draw) {
                    AgentReply::Draw
                } else {
                    AgentReply::Pass
                }
            }
        }
    }
}

#[async_trait]
impl AgentConnection for ScriptedAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn request_action(
        &mut self,
        view: &GameView,
        _turn_timeout: Duration,
    ) -> Result<AgentReply, AgentError> {
        self.log.lock().unwrap().requests.push(view.clone());
        match self.script.pop_front() {
            Some(Step::Reply(reply)) => Ok(reply),
            Some(Step::Timeout) => Err(AgentError::Timeout),
            Some(Step::Garbage) => {
                let bad = serde_json::from_str::<AgentReply>("not json")
                    .expect_err("garbage never parses");
                Err(AgentError::InvalidJson(bad))
            }
            None => Ok(self.fallback_reply(view)),
        }
    }

    async fn notify(&mut self, message: &EngineMessage) {
        self.log.lock().unwrap().notifications.push(message.clone());
    }

    async fn stop(&mut self) {
        self.log.lock().unwrap().stopped = true;
    }
}
