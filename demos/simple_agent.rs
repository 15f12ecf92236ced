// Reference agent: plays the first playable card, draws when it can,
// passes otherwise. Useful for exercising the harness end to end:
//
//   jedna target/debug/simple_agent target/debug/simple_agent

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use jedna::game::{AvailableAction, GameView};
use jedna::{AgentReply, Color, EngineMessage};

fn most_common_color(view: &GameView) -> Color {
    let mut counts: HashMap<char, usize> = HashMap::new();
    for card in &view.hand {
        match card.chars().next() {
            Some(letter @ ('r' | 'g' | 'b' | 'y')) => {
                *counts.entry(letter).or_default() += 1;
            }
            _ => {}
        }
    }
    match counts.into_iter().max_by_key(|(_, n)| *n) {
        Some(('g', _)) => Color::Green,
        Some(('b', _)) => Color::Blue,
        Some(('y', _)) => Color::Yellow,
        _ => Color::Red,
    }
}

fn decide(view: &GameView) -> AgentReply {
    if let Some(card) = view.playable_cards.first() {
        let wild_color = if card == "w" || card.starts_with("wd") {
            Some(most_common_color(view))
        } else {
            None
        };
        return AgentReply::Play {
            card: card.clone(),
            wild_color,
            double_play: false,
        };
    }
    if view.available_actions.contains(&AvailableAction::Draw) {
        AgentReply::Draw
    } else {
        AgentReply::Pass
    }
}

fn main() -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let message: EngineMessage = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(_) => continue,
        };
        match message {
            EngineMessage::RequestAction { state } => {
                let reply = decide(&state);
                serde_json::to_writer(&mut stdout, &reply)?;
                stdout.write_all(b"\n")?;
                stdout.flush()?;
            }
            EngineMessage::GameEnd { .. } => break,
            _ => {}
        }
    }
    Ok(())
}
