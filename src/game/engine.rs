use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cards::{Card, Color, Figure};
use super::deck::Deck;
use super::player::{Player, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Off,
    Normal,
    WarDrawTwo,
    WarWildDrawFour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Clockwise,
    Counterclockwise,
}

impl Direction {
    fn flipped(self) -> Self {
        match self {
            Direction::Clockwise => Direction::Counterclockwise,
            Direction::Counterclockwise => Direction::Clockwise,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GameError {
    #[error("not this player's turn")]
    NotYourTurn,
    #[error("card is not in the player's hand")]
    CardNotInHand,
    #[error("that action is not legal in the current game state")]
    IllegalInState,
    #[error("a wild card needs a chosen color")]
    MissingWildColor,
    #[error("must draw a card before passing")]
    MustDrawFirst,
    #[error("the game has not been started")]
    GameNotStarted,
    #[error("the game is already over")]
    GameAlreadyOver,
    #[error("invalid double play")]
    BadDoublePlay,
    #[error("player is already seated: {0}")]
    DuplicatePlayer(PlayerId),
    #[error("at least two players are required")]
    NotEnoughPlayers,
}

/// Observable side effects of an operation, relayed to agents by the
/// runner. The engine never talks to agents itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notice {
    Skipped { player: PlayerId },
    DirectionReversed { direction: Direction },
    WarStarted { stacked: u32 },
    WarRaised { stacked: u32 },
    WarResolved { player: PlayerId, drawn: usize },
    Uno { player: PlayerId },
    GameOver { winner: PlayerId, score: u32 },
}

/// Final standing of a finished game. `hands` maps every player to the
/// value of the cards still held (the winner's entry is zero); `score` is
/// the winner's award, the sum of all other hands floored at 30.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: PlayerId,
    pub score: u32,
    pub hands: HashMap<PlayerId, u32>,
}

pub const MINIMUM_AWARD: u32 = 30;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayOutcome {
    pub notices: Vec<Notice>,
    pub result: Option<GameResult>,
}

/// The Jedna rules state machine. The acting player is always at index 0
/// of `players`; turn changes rotate the roster in the current direction.
/// Operations validate fully before touching any state, so a returned
/// error implies nothing changed.
#[derive(Debug, Clone)]
pub struct Game {
    id: String,
    players: Vec<Player>,
    deck: Deck,
    discard: Vec<Card>,
    direction: Direction,
    state: GameState,
    stacked_cards: u32,
    already_picked: bool,
    picked_card: Option<Card>,
    result: Option<GameResult>,
}

impl Game {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            players: Vec::new(),
            deck: Deck::build_standard(),
            discard: Vec::new(),
            direction: Direction::Clockwise,
            state: GameState::Off,
            stacked_cards: 0,
            already_picked: false,
            picked_card: None,
            result: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn stacked_cards(&self) -> u32 {
        self.stacked_cards
    }

    pub fn already_picked(&self) -> bool {
        self.already_picked
    }

    pub fn picked_card(&self) -> Option<&Card> {
        self.picked_card.as_ref()
    }

    pub fn top_card(&self) -> Option<&Card> {
        self.discard.last()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn acting_player(&self) -> Option<&Player> {
        self.players.first()
    }

    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }

    pub fn is_in_progress(&self) -> bool {
        self.state != GameState::Off
    }

    /// Every card the game owns, across draw pile, discard and hands, with
    /// chosen colors stripped. Diagnostic surface: the multiset must always
    /// equal the standard composition.
    pub fn card_census(&self) -> Vec<Card> {
        let mut cards = Vec::new();
        for player in &self.players {
            cards.extend(player.hand().cards().iter().copied());
        }
        cards.extend(self.discard.iter().copied());
        cards.extend(self.deck_cards());
        for card in &mut cards {
            card.clear_chosen();
        }
        cards
    }

    fn deck_cards(&self) -> Vec<Card> {
        // Cheap full clone; census is a test/diagnostic path.
        let mut probe = self.deck.clone();
        let mut out = Vec::with_capacity(probe.len());
        while let Some(card) = probe.draw_top() {
            out.push(card);
        }
        out
    }

    /// Seat a player. Only possible before the game starts.
    pub fn add_player(&mut self, id: PlayerId) -> Result<(), GameError> {
        if self.result.is_some() {
            return Err(GameError::GameAlreadyOver);
        }
        if self.state != GameState::Off {
            return Err(GameError::IllegalInState);
        }
        if self.players.iter().any(|p| p.id() == &id) {
            return Err(GameError::DuplicatePlayer(id));
        }
        self.players.push(Player::new(id));
        Ok(())
    }

    /// Shuffle, deal seven cards to every seat, flip a non-wild initial top
    /// card and apply its opening effect. Flipped wilds go back under the
    /// draw pile.
    pub fn start_game(&mut self) -> Result<Vec<Notice>, GameError> {
        if self.result.is_some() {
            return Err(GameError::GameAlreadyOver);
        }
        if self.state != GameState::Off {
            return Err(GameError::IllegalInState);
        }
        if self.players.len() < 2 {
            return Err(GameError::NotEnoughPlayers);
        }

        self.deck.shuffle();
        for i in 0..self.players.len() {
            let dealt = self.deck.draw(7, &mut self.discard);
            self.players[i].hand_mut().add_all(dealt);
        }

        let mut rejected = Vec::new();
        let top = loop {
            match self.deck.draw_top() {
                Some(card) if card.is_wild() => rejected.push(card),
                Some(card) => break card,
                // Only an oversized roster can leave nothing but wilds here.
                None => {
                    for card in rejected {
                        self.deck.put_under(card);
                    }
                    return Err(GameError::IllegalInState);
                }
            }
        };
        for card in rejected {
            self.deck.put_under(card);
        }
        self.discard.push(top);
        self.state = GameState::Normal;

        let mut notices = Vec::new();
        match top.figure() {
            Figure::Skip => {
                let skipped = self.players[0].id().clone();
                self.rotate(1);
                notices.push(Notice::Skipped { player: skipped });
            }
            Figure::Reverse => {
                self.direction = self.direction.flipped();
                notices.push(Notice::DirectionReversed {
                    direction: self.direction,
                });
            }
            Figure::DrawTwo => {
                self.state = GameState::WarDrawTwo;
                self.stacked_cards = 2;
                notices.push(Notice::WarStarted { stacked: 2 });
            }
            _ => {}
        }

        debug!(
            game_id = %self.id,
            top_card = %top,
            players = self.players.len(),
            "game started"
        );
        Ok(notices)
    }

    /// Build a running game from explicit hands and an explicit top card,
    /// for deterministic replays and tests. Every named card is pulled out
    /// of the standard composition; whatever remains becomes the shuffled
    /// draw pile, so card conservation holds by construction.
    pub fn from_setup(
        id: impl Into<String>,
        hands: Vec<(PlayerId, Vec<Card>)>,
        top_card: Card,
    ) -> Result<Self, GameError> {
        if hands.len() < 2 {
            return Err(GameError::NotEnoughPlayers);
        }

        let mut pool = Vec::new();
        let mut source = Deck::build_standard();
        while let Some(card) = source.draw_top() {
            pool.push(card);
        }

        let mut take = |wanted: &Card| -> Result<Card, GameError> {
            let pos = pool
                .iter()
                .position(|c| c.same_identity(wanted))
                .ok_or(GameError::CardNotInHand)?;
            Ok(pool.remove(pos))
        };

        let mut game = Self::new(id);
        for (player_id, cards) in hands {
            game.add_player(player_id)?;
            let seat = game.players.len() - 1;
            for card in &cards {
                let held = take(card)?;
                game.players[seat].hand_mut().add(held);
            }
        }

        let mut top = take(&top_card)?;
        if let Some(color) = top_card.chosen_color() {
            top = top
                .with_chosen(color)
                .map_err(|_| GameError::MissingWildColor)?;
        }
        game.discard.push(top);

        let mut remaining = Deck::default();
        for card in pool {
            remaining.put_under(card);
        }
        remaining.shuffle();
        game.deck = remaining;
        game.state = GameState::Normal;
        Ok(game)
    }

    /// Parse a notation string and locate the held card it refers to.
    /// Wilds are looked up by figure, so `wr` finds a bare wild in hand.
    pub fn find_card(&self, notation: &str) -> Option<Card> {
        let wanted: Card = notation.parse().ok()?;
        let acting = self.acting_player()?;
        acting
            .hand()
            .cards()
            .iter()
            .find(|c| c.same_identity(&wanted))
            .copied()
    }

    /// Play one card (or, with `double`, two identical copies) from the
    /// acting player's hand.
    pub fn play(
        &mut self,
        player: &PlayerId,
        card: Card,
        chosen_color: Option<Color>,
        double: bool,
    ) -> Result<PlayOutcome, GameError> {
        self.check_running(player)?;
        let acting = &self.players[0];

        if !acting.hand().contains(&card) {
            return Err(GameError::CardNotInHand);
        }
        if double {
            if card.figure() == Figure::WildDrawFour
                || self.already_picked
                || acting.hand().count(&card) < 2
            {
                return Err(GameError::BadDoublePlay);
            }
        }

        self.check_play_legality(&card)?;

        let chosen = if card.is_wild() {
            match chosen_color {
                Some(color) if !color.is_wild() => Some(color),
                _ => return Err(GameError::MissingWildColor),
            }
        } else {
            None
        };

        // All checks passed; from here on the play takes full effect.
        let copies = if double { 2 } else { 1 };
        let mut notices = Vec::new();
        let entered_war = self.stacked_cards == 0;

        for _ in 0..copies {
            let mut placed = self.players[0]
                .hand_mut()
                .remove(&card)
                .ok_or(GameError::CardNotInHand)?;
            if let Some(color) = chosen {
                placed = placed
                    .with_chosen(color)
                    .map_err(|_| GameError::MissingWildColor)?;
            }
            self.discard.push(placed);
        }

        debug!(
            game_id = %self.id,
            player = %player,
            card = %card,
            copies,
            "card played"
        );

        if self.players[0].hand().is_empty() {
            let result = self.finish();
            notices.push(Notice::GameOver {
                winner: result.winner.clone(),
                score: result.score,
            });
            return Ok(PlayOutcome {
                notices,
                result: Some(result),
            });
        }

        // Figure effects, one application per copy. Each play action
        // advances the turn once; Skip copies add extra seats on top.
        let mut advance = 1usize;
        for _ in 0..copies {
            match card.figure() {
                Figure::Skip => advance += 1,
                Figure::Reverse => {
                    self.direction = self.direction.flipped();
                    notices.push(Notice::DirectionReversed {
                        direction: self.direction,
                    });
                }
                Figure::DrawTwo => {
                    self.state = GameState::WarDrawTwo;
                    self.stacked_cards += 2;
                }
                Figure::WildDrawFour => {
                    self.state = GameState::WarWildDrawFour;
                    self.stacked_cards += 4;
                }
                Figure::Number(_) | Figure::Wild => {}
            }
        }
        if card.is_offensive() {
            if entered_war {
                notices.push(Notice::WarStarted {
                    stacked: self.stacked_cards,
                });
            } else {
                notices.push(Notice::WarRaised {
                    stacked: self.stacked_cards,
                });
            }
        }

        if self.players[0].hand().len() == 1 {
            notices.push(Notice::Uno {
                player: self.players[0].id().clone(),
            });
        }

        for offset in 1..advance {
            let idx = self.seat_at(offset);
            notices.push(Notice::Skipped {
                player: self.players[idx].id().clone(),
            });
        }

        self.rotate(advance);
        self.already_picked = false;
        self.picked_card = None;

        Ok(PlayOutcome {
            notices,
            result: None,
        })
    }

    /// Draw a single card. Legal once per turn, outside wars only. Returns
    /// `None` when the combined supply is exhausted; the turn still counts
    /// as having drawn.
    pub fn draw_one(
        &mut self,
        player: &PlayerId,
    ) -> Result<Option<Card>, GameError> {
        self.check_running(player)?;
        if self.state != GameState::Normal || self.already_picked {
            return Err(GameError::IllegalInState);
        }

        let drawn = self.deck.draw(1, &mut self.discard).pop();
        if let Some(card) = drawn {
            self.players[0].hand_mut().add(card);
        }
        self.already_picked = true;
        self.picked_card = drawn;

        let drew = drawn
            .map(|c| c.to_string())
            .unwrap_or_else(|| "nothing".to_string());
        debug!(game_id = %self.id, player = %player, drew = %drew, "card drawn");
        Ok(drawn)
    }

    /// Conclude the current turn. In a war this is the surrender move: the
    /// acting player draws the whole stacked penalty and play returns to
    /// normal. In the normal state it is legal only after drawing.
    pub fn pass(&mut self, player: &PlayerId) -> Result<PlayOutcome, GameError> {
        self.check_running(player)?;

        let mut notices = Vec::new();
        if self.stacked_cards > 0 {
            let penalty = self.stacked_cards as usize;
            let drawn = self.deck.draw(penalty, &mut self.discard);
            let drawn_count = drawn.len();
            self.players[0].hand_mut().add_all(drawn);
            self.stacked_cards = 0;
            self.state = GameState::Normal;
            notices.push(Notice::WarResolved {
                player: self.players[0].id().clone(),
                drawn: drawn_count,
            });
            debug!(
                game_id = %self.id,
                player = %player,
                drawn = drawn_count,
                "war resolved by pass"
            );
        } else if !self.already_picked {
            return Err(GameError::MustDrawFirst);
        }

        self.rotate(1);
        self.already_picked = false;
        self.picked_card = None;
        Ok(PlayOutcome {
            notices,
            result: None,
        })
    }

    /// Whether the acting player could legally play this card right now,
    /// ignoring hand membership and wild-color selection.
    pub fn can_play(&self, card: &Card) -> bool {
        self.result.is_none()
            && self.state != GameState::Off
            && self.check_play_legality(card).is_ok()
    }

    /// Players in the order the turn will reach them, acting player first.
    /// Accounts for the current direction.
    pub fn players_in_turn_order(&self) -> Vec<&Player> {
        (0..self.players.len())
            .map(|offset| &self.players[self.seat_at(offset)])
            .collect()
    }

    fn check_running(&self, player: &PlayerId) -> Result<(), GameError> {
        if self.result.is_some() {
            return Err(GameError::GameAlreadyOver);
        }
        if self.state == GameState::Off {
            return Err(GameError::GameNotStarted);
        }
        if self.players[0].id() != player {
            return Err(GameError::NotYourTurn);
        }
        Ok(())
    }

    fn check_play_legality(&self, card: &Card) -> Result<(), GameError> {
        let top = self.top_card().ok_or(GameError::GameNotStarted)?;
        match self.state {
            GameState::Off => Err(GameError::GameNotStarted),
            GameState::Normal => {
                if self.already_picked {
                    let picked =
                        self.picked_card.ok_or(GameError::IllegalInState)?;
                    if !card.same_identity(&picked) {
                        return Err(GameError::IllegalInState);
                    }
                }
                if !card.matches(top) {
                    return Err(GameError::IllegalInState);
                }
                Ok(())
            }
            GameState::WarDrawTwo => match card.figure() {
                Figure::DrawTwo | Figure::WildDrawFour => Ok(()),
                Figure::Reverse if card.color() == top.effective_color() => {
                    Ok(())
                }
                _ => Err(GameError::IllegalInState),
            },
            GameState::WarWildDrawFour => match card.figure() {
                Figure::WildDrawFour => Ok(()),
                _ => Err(GameError::IllegalInState),
            },
        }
    }

    /// Roster index of the seat `offset` places away in the current
    /// direction.
    fn seat_at(&self, offset: usize) -> usize {
        let n = self.players.len();
        match self.direction {
            Direction::Clockwise => offset % n,
            Direction::Counterclockwise => (n - offset % n) % n,
        }
    }

    fn rotate(&mut self, k: usize) {
        let n = self.players.len();
        match self.direction {
            Direction::Clockwise => self.players.rotate_left(k % n),
            Direction::Counterclockwise => self.players.rotate_right(k % n),
        }
    }

    fn finish(&mut self) -> GameResult {
        let winner = self.players[0].id().clone();
        let hands: HashMap<PlayerId, u32> = self
            .players
            .iter()
            .map(|p| (p.id().clone(), p.hand().total_value()))
            .collect();
        let raw: u32 = hands.values().sum();
        let result = GameResult {
            winner: winner.clone(),
            score: raw.max(MINIMUM_AWARD),
            hands,
        };
        self.state = GameState::Off;
        self.stacked_cards = 0;
        self.already_picked = false;
        self.picked_card = None;
        self.result = Some(result.clone());
        debug!(
            game_id = %self.id,
            winner = %winner,
            score = result.score,
            "game over"
        );
        result
    }
}
