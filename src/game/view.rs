use serde::{Deserialize, Serialize};

use super::engine::{Game, GameState};

/// Wire spelling of the engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireGameState {
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "war_+2")]
    WarDrawTwo,
    #[serde(rename = "war_wd4")]
    WarWildDrawFour,
}

impl From<GameState> for WireGameState {
    fn from(state: GameState) -> Self {
        match state {
            GameState::Off => WireGameState::Off,
            GameState::Normal => WireGameState::Normal,
            GameState::WarDrawTwo => WireGameState::WarDrawTwo,
            GameState::WarWildDrawFour => WireGameState::WarWildDrawFour,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailableAction {
    Play,
    Draw,
    Pass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherPlayer {
    pub id: String,
    pub card_count: usize,
}

/// The acting agent's complete picture of the game, in public card
/// notation. Building a view never mutates the engine; two views built
/// between the same two mutations are identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub your_id: String,
    pub hand: Vec<String>,
    pub top_card: String,
    pub game_state: WireGameState,
    pub stacked_cards: u32,
    pub already_picked: bool,
    pub picked_card: Option<String>,
    pub other_players: Vec<OtherPlayer>,
    pub available_actions: Vec<AvailableAction>,
    pub playable_cards: Vec<String>,
}

impl GameView {
    /// Serialize the engine's observable state for the acting player.
    /// Returns `None` before the game has started.
    pub fn for_acting_player(game: &Game) -> Option<Self> {
        let acting = game.acting_player()?;
        let top = game.top_card()?;

        // After a draw the picked card is the only candidate; otherwise
        // every legal hand card is offered.
        let playable_cards: Vec<String> = if game.already_picked() {
            match game.picked_card() {
                Some(picked) if game.can_play(picked) => {
                    vec![picked.to_string()]
                }
                _ => Vec::new(),
            }
        } else {
            acting
                .hand()
                .cards()
                .iter()
                .filter(|card| game.can_play(card))
                .map(|card| card.to_string())
                .collect()
        };

        let mut available_actions = Vec::new();
        if game.is_in_progress() {
            if !playable_cards.is_empty() {
                available_actions.push(AvailableAction::Play);
            }
            if game.already_picked() || game.stacked_cards() > 0 {
                available_actions.push(AvailableAction::Pass);
            } else {
                available_actions.push(AvailableAction::Draw);
            }
        }

        let other_players = game
            .players_in_turn_order()
            .into_iter()
            .skip(1)
            .map(|player| OtherPlayer {
                id: player.id().to_string(),
                card_count: player.hand().len(),
            })
            .collect();

        Some(Self {
            your_id: acting.id().to_string(),
            hand: acting
                .hand()
                .cards()
                .iter()
                .map(|card| card.to_string())
                .collect(),
            top_card: top.to_string(),
            game_state: game.state().into(),
            stacked_cards: game.stacked_cards(),
            already_picked: game.already_picked(),
            picked_card: game.picked_card().map(|card| card.to_string()),
            other_players,
            available_actions,
            playable_cards,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::engine::Game;
    use crate::game::player::PlayerId;

    fn setup(hand1: &[&str], hand2: &[&str], top: &str) -> Game {
        Game::from_setup(
            "view-test",
            vec![
                (
                    PlayerId::from("p1"),
                    hand1.iter().map(|s| s.parse().unwrap()).collect(),
                ),
                (
                    PlayerId::from("p2"),
                    hand2.iter().map(|s| s.parse().unwrap()).collect(),
                ),
            ],
            top.parse().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_normal_view() {
        let game = setup(&["r7", "b5", "g3"], &["b2"], "r5");
        let view = GameView::for_acting_player(&game).unwrap();

        assert_eq!(view.your_id, "p1");
        assert_eq!(view.hand, vec!["r7", "b5", "g3"]);
        assert_eq!(view.top_card, "r5");
        assert_eq!(view.game_state, WireGameState::Normal);
        assert_eq!(view.stacked_cards, 0);
        assert!(!view.already_picked);
        assert_eq!(view.picked_card, None);
        assert_eq!(view.playable_cards, vec!["r7", "b5"]);
        assert_eq!(
            view.available_actions,
            vec![AvailableAction::Play, AvailableAction::Draw]
        );
        assert_eq!(view.other_players.len(), 1);
        assert_eq!(view.other_players[0].id, "p2");
        assert_eq!(view.other_players[0].card_count, 1);
    }

    #[test]
    fn test_no_playable_card_offers_draw_only() {
        let game = setup(&["b2", "g3"], &["r7"], "r5");
        let view = GameView::for_acting_player(&game).unwrap();

        assert!(view.playable_cards.is_empty());
        assert_eq!(view.available_actions, vec![AvailableAction::Draw]);
    }

    #[test]
    fn test_after_draw_only_picked_card_is_offered() {
        let mut game = setup(&["r2", "w"], &["b2"], "g7");
        let p1 = PlayerId::from("p1");
        let drawn = game.draw_one(&p1).unwrap().unwrap();
        let view = GameView::for_acting_player(&game).unwrap();

        assert!(view.already_picked);
        assert_eq!(view.picked_card, Some(drawn.to_string()));
        if drawn.matches(&"g7".parse().unwrap()) {
            assert_eq!(view.playable_cards, vec![drawn.to_string()]);
            assert_eq!(
                view.available_actions,
                vec![AvailableAction::Play, AvailableAction::Pass]
            );
        } else {
            assert!(view.playable_cards.is_empty());
            assert_eq!(view.available_actions, vec![AvailableAction::Pass]);
        }
    }

    #[test]
    fn test_war_view() {
        let mut game = setup(&["r+2", "r5"], &["b+2", "b9"], "r3");
        let p1 = PlayerId::from("p1");
        game.play(&p1, "r+2".parse().unwrap(), None, false).unwrap();
        let view = GameView::for_acting_player(&game).unwrap();

        assert_eq!(view.your_id, "p2");
        assert_eq!(view.game_state, WireGameState::WarDrawTwo);
        assert_eq!(view.stacked_cards, 2);
        assert_eq!(view.playable_cards, vec!["b+2"]);
        assert_eq!(
            view.available_actions,
            vec![AvailableAction::Play, AvailableAction::Pass]
        );
    }

    #[test]
    fn test_view_is_pure() {
        let game = setup(&["r7", "b5"], &["b2"], "r5");
        let first = GameView::for_acting_player(&game).unwrap();
        let second = GameView::for_acting_player(&game).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_wire_state_spellings() {
        assert_eq!(
            serde_json::to_string(&WireGameState::WarDrawTwo).unwrap(),
            "\"war_+2\""
        );
        assert_eq!(
            serde_json::to_string(&WireGameState::WarWildDrawFour).unwrap(),
            "\"war_wd4\""
        );
        assert_eq!(
            serde_json::to_string(&WireGameState::Normal).unwrap(),
            "\"normal\""
        );
    }
}
