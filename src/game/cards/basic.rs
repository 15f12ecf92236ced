use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardError {
    #[error("unknown card notation: {0}")]
    UnknownNotation(String),
    #[error("invalid color/figure combination")]
    InvalidCombination,
    #[error("chosen color must be red, green, blue or yellow")]
    BadChosenColor,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
    Wild,
}

impl Color {
    pub fn is_wild(&self) -> bool {
        matches!(self, Color::Wild)
    }

    /// Single-letter notation code. Wild has no code of its own: wild cards
    /// print through their figure.
    fn code(&self) -> &'static str {
        match self {
            Color::Red => "r",
            Color::Green => "g",
            Color::Blue => "b",
            Color::Yellow => "y",
            Color::Wild => "",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl TryFrom<char> for Color {
    type Error = CardError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'r' => Ok(Color::Red),
            'g' => Ok(Color::Green),
            'b' => Ok(Color::Blue),
            'y' => Ok(Color::Yellow),
            _ => Err(CardError::UnknownNotation(c.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Figure {
    Number(u8),
    DrawTwo,
    Skip,
    Reverse,
    Wild,
    WildDrawFour,
}

impl Figure {
    pub fn is_wild(&self) -> bool {
        matches!(self, Figure::Wild | Figure::WildDrawFour)
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Figure::Number(n) => write!(f, "{}", n),
            Figure::DrawTwo => write!(f, "+2"),
            Figure::Skip => write!(f, "s"),
            Figure::Reverse => write!(f, "r"),
            Figure::Wild => write!(f, "w"),
            Figure::WildDrawFour => write!(f, "wd4"),
        }
    }
}

/// A single card. Wild figures always carry `Color::Wild`; the color the
/// holder picks at play time lives in `chosen` and is cleared whenever the
/// card returns to the draw pile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    color: Color,
    figure: Figure,
    chosen: Option<Color>,
}

impl Card {
    pub fn new(color: Color, figure: Figure) -> Result<Self, CardError> {
        match figure {
            Figure::Wild | Figure::WildDrawFour => {
                if !color.is_wild() {
                    return Err(CardError::InvalidCombination);
                }
            }
            Figure::Number(n) => {
                if color.is_wild() || n > 9 {
                    return Err(CardError::InvalidCombination);
                }
            }
            _ => {
                if color.is_wild() {
                    return Err(CardError::InvalidCombination);
                }
            }
        }
        Ok(Self {
            color,
            figure,
            chosen: None,
        })
    }

    pub fn wild() -> Self {
        Self {
            color: Color::Wild,
            figure: Figure::Wild,
            chosen: None,
        }
    }

    pub fn wild_draw_four() -> Self {
        Self {
            color: Color::Wild,
            figure: Figure::WildDrawFour,
            chosen: None,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn figure(&self) -> Figure {
        self.figure
    }

    pub fn chosen_color(&self) -> Option<Color> {
        self.chosen
    }

    /// The color this card counts as for matching: the chosen color on a
    /// played wild, the printed color otherwise.
    pub fn effective_color(&self) -> Color {
        self.chosen.unwrap_or(self.color)
    }

    pub fn with_chosen(mut self, color: Color) -> Result<Self, CardError> {
        if !self.figure.is_wild() {
            return Err(CardError::InvalidCombination);
        }
        if color.is_wild() {
            return Err(CardError::BadChosenColor);
        }
        self.chosen = Some(color);
        Ok(self)
    }

    pub fn clear_chosen(&mut self) {
        self.chosen = None;
    }

    /// Scoring value: face value for numerics, 20 for action cards, 50 for
    /// wilds.
    pub fn value(&self) -> u32 {
        match self.figure {
            Figure::Number(n) => n as u32,
            Figure::DrawTwo | Figure::Skip | Figure::Reverse => 20,
            Figure::Wild | Figure::WildDrawFour => 50,
        }
    }

    pub fn is_wild(&self) -> bool {
        self.figure.is_wild()
    }

    pub fn is_offensive(&self) -> bool {
        matches!(self.figure, Figure::DrawTwo | Figure::WildDrawFour)
    }

    pub fn is_war_playable(&self) -> bool {
        matches!(
            self.figure,
            Figure::DrawTwo | Figure::Reverse | Figure::WildDrawFour
        )
    }

    /// Whether this card may be placed on `top` under normal matching: a
    /// wild always matches, otherwise color or figure must line up.
    pub fn matches(&self, top: &Card) -> bool {
        self.is_wild()
            || self.color == top.effective_color()
            || self.figure == top.figure
    }

    /// Identity comparison ignoring any chosen color, used to locate cards
    /// in a hand.
    pub fn same_identity(&self, other: &Card) -> bool {
        self.color == other.color && self.figure == other.figure
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.figure.is_wild() {
            match self.chosen {
                Some(color) => write!(f, "{}{}", self.figure, color),
                None => write!(f, "{}", self.figure),
            }
        } else {
            write!(f, "{}{}", self.color, self.figure)
        }
    }
}

impl FromStr for Card {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        let unknown = || CardError::UnknownNotation(s.to_string());

        if let Some(rest) = text.strip_prefix("wd4") {
            let card = Card::wild_draw_four();
            return match rest {
                "" => Ok(card),
                _ => {
                    let mut chars = rest.chars();
                    let color = chars
                        .next()
                        .and_then(|c| Color::try_from(c).ok())
                        .ok_or_else(unknown)?;
                    if chars.next().is_some() {
                        return Err(unknown());
                    }
                    card.with_chosen(color).map_err(|_| unknown())
                }
            };
        }

        if let Some(rest) = text.strip_prefix('w') {
            let card = Card::wild();
            return match rest {
                // "ww" is the historical spelling of a bare wild
                "" | "w" => Ok(card),
                _ => {
                    let mut chars = rest.chars();
                    let color = chars
                        .next()
                        .and_then(|c| Color::try_from(c).ok())
                        .ok_or_else(unknown)?;
                    if chars.next().is_some() {
                        return Err(unknown());
                    }
                    card.with_chosen(color).map_err(|_| unknown())
                }
            };
        }

        let mut chars = text.chars();
        let color = chars
            .next()
            .and_then(|c| Color::try_from(c).ok())
            .ok_or_else(unknown)?;
        let figure = match chars.as_str() {
            "s" => Figure::Skip,
            "r" => Figure::Reverse,
            "+2" => Figure::DrawTwo,
            rest => {
                if rest.len() != 1 {
                    return Err(unknown());
                }
                let digit = rest
                    .chars()
                    .next()
                    .and_then(|c| c.to_digit(10))
                    .ok_or_else(unknown)?;
                Figure::Number(digit as u8)
            }
        };
        Card::new(color, figure).map_err(|_| unknown())
    }
}
