pub mod builtin;
pub mod process;
pub mod protocol;

pub use builtin::{GreedyAgent, RandomAgent};
pub use process::{AgentConnection, AgentError, AgentProcess, STOP_GRACE};
pub use protocol::{AgentReply, EngineMessage};
