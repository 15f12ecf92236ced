mod utils;

use std::time::Duration;

use jedna::game::GameView;
use jedna::{
    AgentConnection, AgentError, AgentProcess, AgentReply, EngineMessage,
    GameRunner, GreedyAgent, RandomAgent, RunnerConfig, RunnerError,
};
use utils::mocks::{Fallback, ScriptedAgent, Step};

fn quick_config() -> RunnerConfig {
    RunnerConfig {
        turn_timeout: Duration::ZERO,
        game_timeout: Duration::from_secs(30),
    }
}

#[tokio::test]
async fn runner_requires_two_agents() {
    let (agent, _) = ScriptedAgent::greedy("p1");
    let err = GameRunner::new(RunnerConfig::default())
        .run(vec![Box::new(agent)])
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::NotEnoughAgents));
}

#[tokio::test]
async fn full_game_between_greedy_agents() {
    let (a1, log1) = ScriptedAgent::greedy("p1");
    let (a2, log2) = ScriptedAgent::greedy("p2");

    let report = GameRunner::new(quick_config())
        .run(vec![Box::new(a1), Box::new(a2)])
        .await
        .unwrap();

    assert_eq!(report.scores.len(), 2);
    assert!(report.turns > 0);
    if let Some(winner) = &report.winner {
        assert!(["p1", "p2"].contains(&winner.as_str()));
        assert!(report.winner_score.unwrap() >= 30);
        assert_eq!(report.scores[winner], 0);
    }

    for log in [&log1, &log2] {
        let log = log.lock().unwrap();
        assert!(log.stopped, "every agent is torn down");
        assert!(
            log.notifications
                .iter()
                .any(|m| matches!(m, EngineMessage::GameEnd { .. })),
            "every agent hears the game end"
        );
    }
}

#[tokio::test]
async fn repeated_protocol_errors_forfeit_the_agent() {
    let (deaf, deaf_log) =
        ScriptedAgent::new("p1", vec![Step::Timeout, Step::Garbage], Fallback::Meek);
    let (greedy, _) = ScriptedAgent::greedy("p2");

    let report = GameRunner::new(quick_config())
        .run(vec![Box::new(deaf), Box::new(greedy)])
        .await
        .unwrap();

    // Exactly two requests reached the broken agent before it was cut off.
    let log = deaf_log.lock().unwrap();
    assert_eq!(log.requests.len(), 2);
    assert!(log.stopped);
    assert!(log
        .notifications
        .iter()
        .any(|m| matches!(m, EngineMessage::GameEnd { .. })));
    drop(log);

    // The well-behaved agent is the only one ever playing cards.
    if let Some(winner) = &report.winner {
        assert_eq!(winner.as_str(), "p2");
    }
}

#[tokio::test]
async fn a_single_protocol_error_is_forgiven() {
    let (flaky, flaky_log) =
        ScriptedAgent::new("p1", vec![Step::Timeout], Fallback::Greedy);
    let (greedy, _) = ScriptedAgent::greedy("p2");

    GameRunner::new(quick_config())
        .run(vec![Box::new(flaky), Box::new(greedy)])
        .await
        .unwrap();

    // The agent kept being consulted after its one bad turn.
    let log = flaky_log.lock().unwrap();
    assert!(log.requests.len() > 1);
}

#[tokio::test]
async fn illegal_move_gets_an_error_and_the_game_moves_on() {
    // Asking to play a card the agent does not hold (or a wild without a
    // color) is answered with an error envelope and a substituted move.
    let (cheat, cheat_log) = ScriptedAgent::new(
        "p1",
        vec![Step::Reply(AgentReply::Play {
            card: "wd4".to_string(),
            wild_color: None,
            double_play: false,
        })],
        Fallback::Greedy,
    );
    let (greedy, _) = ScriptedAgent::greedy("p2");

    let report = GameRunner::new(quick_config())
        .run(vec![Box::new(cheat), Box::new(greedy)])
        .await
        .unwrap();

    let log = cheat_log.lock().unwrap();
    assert!(log
        .notifications
        .iter()
        .any(|m| matches!(m, EngineMessage::Error { .. })));
    assert!(report.turns > 1);
}

#[tokio::test]
async fn draw_triggers_an_immediate_follow_up_request() {
    let (drawer, drawer_log) = ScriptedAgent::new(
        "p1",
        vec![Step::Reply(AgentReply::Draw), Step::Reply(AgentReply::Pass)],
        Fallback::Greedy,
    );
    let (greedy, _) = ScriptedAgent::greedy("p2");

    GameRunner::new(quick_config())
        .run(vec![Box::new(drawer), Box::new(greedy)])
        .await
        .unwrap();

    let log = drawer_log.lock().unwrap();
    assert!(log.requests.len() >= 2);
    assert!(log.requests[1].already_picked);
    assert!(!log.requests[1]
        .available_actions
        .contains(&jedna::game::AvailableAction::Draw));
}

#[tokio::test]
async fn builtin_agents_finish_a_game() {
    let agents: Vec<Box<dyn AgentConnection>> = vec![
        Box::new(GreedyAgent::new("p1")),
        Box::new(RandomAgent::new("p2")),
    ];

    let report = GameRunner::new(quick_config()).run(agents).await.unwrap();
    assert_eq!(report.scores.len(), 2);
    assert!(report.turns > 0);
}

// --- child-process agent lifecycle ---------------------------------------

fn sample_view() -> GameView {
    let game = utils::game_with(&[("p1", &["r7"]), ("p2", &["b2"])], "r5");
    GameView::for_acting_player(&game).unwrap()
}

fn shell_agent(script: &str) -> AgentProcess {
    AgentProcess::spawn("p1", "sh", &["-c".to_string(), script.to_string()])
        .expect("sh is available")
}

#[tokio::test]
async fn agent_process_round_trip() {
    let mut agent = shell_agent(
        r#"while read line; do echo '{"action":"pass"}'; done"#,
    );

    let reply = agent
        .request_action(&sample_view(), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(reply, AgentReply::Pass);

    agent
        .notify(&EngineMessage::Notification {
            message: "hello".to_string(),
        })
        .await;
    agent.stop().await;
}

#[tokio::test]
async fn agent_process_timeout() {
    let mut agent = shell_agent("sleep 30");

    let err = agent
        .request_action(&sample_view(), Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Timeout));

    agent.stop().await;
}

#[tokio::test]
async fn agent_process_closed_output() {
    let mut agent = shell_agent("read line; exit 0");

    let err = agent
        .request_action(&sample_view(), Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AgentError::ClosedOutput | AgentError::Io(_)
    ));

    agent.stop().await;
}

#[tokio::test]
async fn agent_process_invalid_json() {
    let mut agent = shell_agent("read line; echo not-json; cat >/dev/null");

    let err = agent
        .request_action(&sample_view(), Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::InvalidJson(_)));

    agent.stop().await;
}

#[tokio::test]
async fn agent_process_spawn_failure() {
    let err = AgentProcess::spawn("p1", "/nonexistent/agent/binary", &[])
        .unwrap_err();
    assert!(matches!(err, AgentError::Spawn(_)));
}

#[tokio::test]
async fn unspawnable_agent_aborts_the_game() {
    let seats = vec![
        ("p1".to_string(), "cat".to_string()),
        ("p2".to_string(), "/nonexistent/agent/binary".to_string()),
    ];
    let err = GameRunner::new(quick_config())
        .run_commands(&seats)
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::Resource(_)));
}
