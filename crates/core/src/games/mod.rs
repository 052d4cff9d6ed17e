//! The mini-game roster. Every game is a self-contained state machine behind
//! the [`Session`] trait; this module maps identifiers to them.

pub mod arcade;
pub mod puzzle;
pub mod reflex;
pub mod timed;
pub mod trivia;
pub mod versus;

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{session::Session, trivia::TriviaSource, ArcadeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Duel,
    Sumo,
    TapWar,
    Soccer,
    Racer,
    Ninja,
    #[serde(rename = "gol_pooch")]
    GolYaPooch,
    Yalda,
    Maze,
    Memory,
    Simon,
    Flags,
    Capitals,
    Snake,
    Whack,
    Math,
    Trivia,
    Reflex,
    ColorMatch,
    Clicker,
    Breathing,
    #[serde(rename = "tictactoe")]
    TicTacToe,
    Rps,
    Typing,
    Guess,
    OddOne,
}

impl GameKind {
    /// Menu order.
    pub const ALL: [GameKind; 26] = [
        GameKind::Duel,
        GameKind::Sumo,
        GameKind::TapWar,
        GameKind::Soccer,
        GameKind::Racer,
        GameKind::Ninja,
        GameKind::GolYaPooch,
        GameKind::Yalda,
        GameKind::Maze,
        GameKind::Memory,
        GameKind::Simon,
        GameKind::Flags,
        GameKind::Capitals,
        GameKind::Snake,
        GameKind::Whack,
        GameKind::Math,
        GameKind::Trivia,
        GameKind::Reflex,
        GameKind::ColorMatch,
        GameKind::Clicker,
        GameKind::Breathing,
        GameKind::TicTacToe,
        GameKind::Rps,
        GameKind::Typing,
        GameKind::Guess,
        GameKind::OddOne,
    ];

    /// Stable identifier, also used as the score-book key.
    pub fn id(self) -> &'static str {
        match self {
            GameKind::Duel => "duel",
            GameKind::Sumo => "sumo",
            GameKind::TapWar => "tap_war",
            GameKind::Soccer => "soccer",
            GameKind::Ninja => "ninja",
            GameKind::GolYaPooch => "gol_pooch",
            GameKind::Yalda => "yalda",
            GameKind::Maze => "maze",
            GameKind::Flags => "flags",
            GameKind::Capitals => "capitals",
            GameKind::Racer => "racer",
            GameKind::Snake => "snake",
            GameKind::Memory => "memory",
            GameKind::Simon => "simon",
            GameKind::Whack => "whack",
            GameKind::Math => "math",
            GameKind::Trivia => "trivia",
            GameKind::Reflex => "reflex",
            GameKind::ColorMatch => "color_match",
            GameKind::Clicker => "clicker",
            GameKind::Breathing => "breathing",
            GameKind::TicTacToe => "tictactoe",
            GameKind::Rps => "rps",
            GameKind::Typing => "typing",
            GameKind::Guess => "guess",
            GameKind::OddOne => "odd_one",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GameKind::Duel => "Wild Duel",
            GameKind::Sumo => "Finger Sumo",
            GameKind::TapWar => "Tap War 4P",
            GameKind::Soccer => "Soccer Pro",
            GameKind::Ninja => "Ninja Blade",
            GameKind::GolYaPooch => "Gol Ya Pooch",
            GameKind::Yalda => "Yalda Catch",
            GameKind::Maze => "Labyrinth",
            GameKind::Flags => "Flag Quiz",
            GameKind::Capitals => "Capitals",
            GameKind::Racer => "Turbo Racer",
            GameKind::Snake => "Neon Snake",
            GameKind::Memory => "Memory",
            GameKind::Simon => "Echo",
            GameKind::Whack => "Emoji Pop",
            GameKind::Math => "Math Sprint",
            GameKind::Trivia => "AI Trivia",
            GameKind::Reflex => "Reflex",
            GameKind::ColorMatch => "Chroma",
            GameKind::Clicker => "Speed Tap",
            GameKind::Breathing => "Zen",
            GameKind::TicTacToe => "Tic Tac Toe",
            GameKind::Rps => "R.P.S",
            GameKind::Typing => "Typing",
            GameKind::Guess => "Guess #",
            GameKind::OddOne => "Odd One",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GameKind::Duel => "Two-player quick draw",
            GameKind::Sumo => "Two-player tug of taps",
            GameKind::TapWar => "Four-player territory battle",
            GameKind::Soccer => "First to five against the keeper bot",
            GameKind::Ninja => "Slice the fruit, spare the bombs",
            GameKind::GolYaPooch => "Which hand hides the flower?",
            GameKind::Yalda => "Catch pomegranates on Yalda night",
            GameKind::Maze => "Find the way out of the labyrinth",
            GameKind::Flags => "Name the country behind the flag",
            GameKind::Capitals => "Match each country to its capital",
            GameKind::Racer => "Dodge traffic across three lanes",
            GameKind::Snake => "Eat, grow, avoid the walls",
            GameKind::Memory => "Find all the matching pairs",
            GameKind::Simon => "Repeat the growing color sequence",
            GameKind::Whack => "Pop the emojis before they hide",
            GameKind::Math => "Solve as many sums as you can",
            GameKind::Trivia => "Multiple-choice quiz questions",
            GameKind::Reflex => "Click the moment it turns green",
            GameKind::ColorMatch => "Does the word match its ink?",
            GameKind::Clicker => "Tap as fast as you can",
            GameKind::Breathing => "Breathe in, hold, breathe out",
            GameKind::TicTacToe => "Three in a row against the computer",
            GameKind::Rps => "Rock, paper, scissors in five rounds",
            GameKind::Typing => "Type the words before time runs out",
            GameKind::Guess => "Find the number between 1 and 100",
            GameKind::OddOne => "Spot the different emoji",
        }
    }

    pub fn difficulty(self) -> Difficulty {
        match self {
            GameKind::Duel | GameKind::Sumo => Difficulty::TwoPlayer,
            GameKind::TapWar => Difficulty::FourPlayer,
            GameKind::GolYaPooch
            | GameKind::Whack
            | GameKind::Clicker
            | GameKind::Breathing
            | GameKind::Rps
            | GameKind::OddOne => Difficulty::Easy,
            GameKind::Soccer
            | GameKind::Yalda
            | GameKind::Maze
            | GameKind::Flags
            | GameKind::Snake
            | GameKind::Memory
            | GameKind::Simon
            | GameKind::ColorMatch
            | GameKind::TicTacToe
            | GameKind::Guess => Difficulty::Medium,
            GameKind::Racer
            | GameKind::Ninja
            | GameKind::Capitals
            | GameKind::Math
            | GameKind::Trivia
            | GameKind::Reflex
            | GameKind::Typing => Difficulty::Hard,
        }
    }

    pub fn players(self) -> usize {
        match self.difficulty() {
            Difficulty::TwoPlayer => 2,
            Difficulty::FourPlayer => 4,
            _ => 1,
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for GameKind {
    type Err = ArcadeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        GameKind::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ArcadeError::msg(format!("unknown game `{value}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    TwoPlayer,
    FourPlayer,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::TwoPlayer => "2-Player",
            Difficulty::FourPlayer => "4-Player",
        };
        f.write_str(label)
    }
}

/// A menu tile: either a playable game or a locked slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameSelection {
    Playable(GameKind),
    Locked,
}

impl GameSelection {
    /// Unknown identifiers resolve to [`GameSelection::Locked`].
    pub fn parse(id: &str) -> Self {
        match id.parse::<GameKind>() {
            Ok(kind) => GameSelection::Playable(kind),
            Err(_) => {
                tracing::debug!(id, "no game registered under id, treating as locked");
                GameSelection::Locked
            }
        }
    }
}

impl From<GameKind> for GameSelection {
    fn from(kind: GameKind) -> Self {
        GameSelection::Playable(kind)
    }
}

pub struct GameDescriptor {
    pub kind: GameKind,
    pub name: &'static str,
    pub description: &'static str,
    pub difficulty: Difficulty,
}

pub fn registry() -> Vec<GameDescriptor> {
    GameKind::ALL
        .into_iter()
        .map(|kind| GameDescriptor {
            kind,
            name: kind.name(),
            description: kind.description(),
            difficulty: kind.difficulty(),
        })
        .collect()
}

pub(crate) fn create(
    kind: GameKind,
    trivia: &Arc<dyn TriviaSource>,
    topic: &str,
) -> Box<dyn Session> {
    match kind {
        GameKind::Duel => Box::new(versus::Duel::new()),
        GameKind::Sumo => Box::new(versus::Sumo::new()),
        GameKind::TapWar => Box::new(versus::TapWar::new()),
        GameKind::Soccer => Box::new(arcade::Soccer::new()),
        GameKind::Racer => Box::new(arcade::Racer::new()),
        GameKind::Ninja => Box::new(arcade::Ninja::new()),
        GameKind::GolYaPooch => Box::new(puzzle::GolYaPooch::new()),
        GameKind::Yalda => Box::new(arcade::YaldaCatch::new()),
        GameKind::Maze => Box::new(puzzle::Maze::new()),
        GameKind::Memory => Box::new(puzzle::Memory::new()),
        GameKind::Simon => Box::new(puzzle::Simon::new()),
        GameKind::Flags => Box::new(trivia::TableQuiz::flags()),
        GameKind::Capitals => Box::new(trivia::TableQuiz::capitals()),
        GameKind::Snake => Box::new(arcade::Snake::new()),
        GameKind::Whack => Box::new(timed::Whack::new()),
        GameKind::Math => Box::new(timed::MathSprint::new()),
        GameKind::Trivia => Box::new(trivia::Trivia::new(trivia.clone(), topic)),
        GameKind::Reflex => Box::new(reflex::Reflex::new()),
        GameKind::ColorMatch => Box::new(timed::ColorMatch::new()),
        GameKind::Clicker => Box::new(timed::Clicker::new()),
        GameKind::Breathing => Box::new(timed::Breathing::new()),
        GameKind::TicTacToe => Box::new(puzzle::TicTacToe::new()),
        GameKind::Rps => Box::new(puzzle::RockPaperScissors::new()),
        GameKind::Typing => Box::new(timed::Typing::new()),
        GameKind::Guess => Box::new(puzzle::GuessNumber::new()),
        GameKind::OddOne => Box::new(timed::OddOneOut::new()),
    }
}

/// Whole-second countdown shared by the timed games. The game ends on the
/// tick that finds one second or less left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Countdown {
    left: u32,
}

impl Countdown {
    pub(crate) fn new(seconds: u32) -> Self {
        Self { left: seconds }
    }

    pub(crate) fn left(&self) -> u32 {
        self.left
    }

    /// Returns true once time is up.
    pub(crate) fn tick(&mut self) -> bool {
        if self.left <= 1 {
            self.left = 0;
            true
        } else {
            self.left -= 1;
            false
        }
    }

    pub(crate) fn add(&mut self, seconds: u32, cap: u32) {
        self.left = (self.left + seconds).min(cap);
    }

    pub(crate) fn subtract(&mut self, seconds: u32) {
        self.left = self.left.saturating_sub(seconds);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_parse() {
        for kind in GameKind::ALL {
            assert_eq!(kind.id().parse::<GameKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_string(&kind).unwrap(),
                format!("\"{}\"", kind.id())
            );
        }
    }

    #[test]
    fn unknown_and_locked_ids_are_locked() {
        assert_eq!(GameSelection::parse("locked"), GameSelection::Locked);
        assert_eq!(GameSelection::parse("hopscotch"), GameSelection::Locked);
        assert_eq!(
            GameSelection::parse("soccer"),
            GameSelection::Playable(GameKind::Soccer)
        );
        assert_eq!(
            GameSelection::parse("tap_war"),
            GameSelection::Playable(GameKind::TapWar)
        );
    }

    #[test]
    fn registry_lists_every_game_once() {
        let registry = registry();
        assert_eq!(registry.len(), GameKind::ALL.len());
        assert_eq!(registry[0].kind, GameKind::Duel);
        assert_eq!(registry[6].kind, GameKind::GolYaPooch);
        assert_eq!(GameKind::GolYaPooch.difficulty(), Difficulty::Easy);
        assert_eq!(GameKind::Capitals.difficulty(), Difficulty::Hard);
        assert_eq!(GameKind::TapWar.players(), 4);
        assert_eq!(GameKind::Math.players(), 1);
        assert_eq!(Difficulty::TwoPlayer.to_string(), "2-Player");
    }

    #[test]
    fn countdown_ends_on_last_second() {
        let mut countdown = Countdown::new(3);
        assert!(!countdown.tick());
        assert!(!countdown.tick());
        assert!(countdown.tick());
        assert_eq!(countdown.left(), 0);

        let mut countdown = Countdown::new(29);
        countdown.add(5, 30);
        assert_eq!(countdown.left(), 30);
        countdown.subtract(40);
        assert_eq!(countdown.left(), 0);
        assert!(countdown.tick());
    }
}
