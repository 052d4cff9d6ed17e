//! Turn-based single-player games.

use std::{fmt, time::Duration};

use rand::{seq::SliceRandom, Rng};

use crate::{
    audio::tone::Waveform,
    session::{next_due, Direction, GameInput, Session, SessionContext},
    timeline::TimerQueue,
};

use super::GameKind;

/// A score held back until a closing animation has played.
#[derive(Debug, Clone, Copy)]
struct Report(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    X,
    O,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardOutcome {
    Won(Mark),
    Draw,
}

#[derive(Debug, Clone, Copy)]
enum TicTacToeEvent {
    ComputerMove,
    Report(u32),
}

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// The player is X; the computer answers with a random free cell.
#[derive(Debug)]
pub struct TicTacToe {
    board: [Option<Mark>; 9],
    x_next: bool,
    outcome: Option<BoardOutcome>,
    timers: TimerQueue<TicTacToeEvent>,
}

impl TicTacToe {
    pub fn new() -> Self {
        Self {
            board: [None; 9],
            x_next: true,
            outcome: None,
            timers: TimerQueue::new(),
        }
    }

    pub fn board(&self) -> &[Option<Mark>; 9] {
        &self.board
    }

    pub fn outcome(&self) -> Option<BoardOutcome> {
        self.outcome
    }

    fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|&[a, b, c]| {
            let mark = self.board[a]?;
            (self.board[b] == Some(mark) && self.board[c] == Some(mark)).then_some(mark)
        })
    }

    fn place(&mut self, ctx: &mut SessionContext<'_>, cell: usize) {
        let mark = if self.x_next { Mark::X } else { Mark::O };
        self.board[cell] = Some(mark);

        let report = Duration::from_millis(1_000);
        if let Some(winner) = self.winner() {
            self.outcome = Some(BoardOutcome::Won(winner));
            ctx.audio.play_success();
            let score = if winner == Mark::X { 100 } else { 50 };
            self.timers
                .schedule_once(ctx.now(), report, TicTacToeEvent::Report(score));
        } else if self.board.iter().all(Option::is_some) {
            self.outcome = Some(BoardOutcome::Draw);
            self.timers
                .schedule_once(ctx.now(), report, TicTacToeEvent::Report(20));
        } else {
            self.x_next = !self.x_next;
            ctx.audio.play_click();
            if !self.x_next {
                self.timers.schedule_once(
                    ctx.now(),
                    Duration::from_millis(500),
                    TicTacToeEvent::ComputerMove,
                );
            }
        }
    }

    fn computer_move(&mut self, ctx: &mut SessionContext<'_>) {
        if self.x_next || self.outcome.is_some() {
            return;
        }
        let free: Vec<usize> = (0..9).filter(|&i| self.board[i].is_none()).collect();
        if let Some(&cell) = free.choose(ctx.rng) {
            self.place(ctx, cell);
        }
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for TicTacToe {
    fn kind(&self) -> GameKind {
        GameKind::TicTacToe
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while let Some(event) = next_due(&mut self.timers, ctx) {
            match event {
                TicTacToeEvent::ComputerMove => self.computer_move(ctx),
                TicTacToeEvent::Report(score) => ctx.finish(score),
            }
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        let GameInput::Choose(cell) = input else {
            return;
        };
        if cell < 9 && self.x_next && self.outcome.is_none() && self.board[cell].is_none() {
            self.place(ctx, cell);
        }
    }

    fn status(&self) -> String {
        let rows: Vec<String> = self
            .board
            .chunks(3)
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Some(Mark::X) => 'X',
                        Some(Mark::O) => 'O',
                        None => '.',
                    })
                    .collect()
            })
            .collect();
        let turn = match self.outcome {
            Some(BoardOutcome::Won(Mark::X)) => "you win",
            Some(BoardOutcome::Won(Mark::O)) => "computer wins",
            Some(BoardOutcome::Draw) => "draw",
            None if self.x_next => "your turn (X)",
            None => "computer (O)",
        };
        format!("{} | {turn}", rows.join("/"))
    }
}

pub const MEMORY_FACES: [&str; 8] = ["🚀", "🌟", "🎮", "🎲", "🎨", "🎸", "🍕", "🐱"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub face: &'static str,
    pub flipped: bool,
    pub matched: bool,
}

#[derive(Debug, Clone, Copy)]
enum MemoryEvent {
    Matched(usize, usize),
    Missed(usize, usize),
    Report(u32),
}

/// Pairs on a 4x4 board. At most two cards are open at once.
#[derive(Debug)]
pub struct Memory {
    cards: Vec<Card>,
    open: Vec<usize>,
    score: u32,
    complete: bool,
    timers: TimerQueue<MemoryEvent>,
}

impl Memory {
    pub fn new() -> Self {
        let cards = MEMORY_FACES
            .iter()
            .chain(MEMORY_FACES.iter())
            .map(|&face| Card {
                face,
                flipped: false,
                matched: false,
            })
            .collect();
        Self {
            cards,
            open: Vec::with_capacity(2),
            score: 0,
            complete: false,
            timers: TimerQueue::new(),
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    fn flip(&mut self, ctx: &mut SessionContext<'_>, index: usize) {
        if self.open.len() >= 2 || self.complete {
            return;
        }
        let Some(card) = self.cards.get_mut(index) else {
            return;
        };
        if card.flipped || card.matched {
            return;
        }

        ctx.audio.play_click();
        card.flipped = true;
        self.open.push(index);

        if let [first, second] = self.open[..] {
            if self.cards[first].face == self.cards[second].face {
                ctx.audio.play_success();
                self.timers.schedule_once(
                    ctx.now(),
                    Duration::from_millis(500),
                    MemoryEvent::Matched(first, second),
                );
            } else {
                self.timers.schedule_once(
                    ctx.now(),
                    Duration::from_millis(1_000),
                    MemoryEvent::Missed(first, second),
                );
            }
        }
    }

    fn fire(&mut self, ctx: &mut SessionContext<'_>, event: MemoryEvent) {
        match event {
            MemoryEvent::Matched(a, b) => {
                self.cards[a].matched = true;
                self.cards[b].matched = true;
                self.open.clear();
                self.score += 100;
                if self.cards.iter().all(|card| card.matched) {
                    self.complete = true;
                    self.timers.schedule_once(
                        ctx.now(),
                        Duration::from_millis(1_000),
                        MemoryEvent::Report(self.score + 500),
                    );
                }
            }
            MemoryEvent::Missed(a, b) => {
                self.cards[a].flipped = false;
                self.cards[b].flipped = false;
                self.open.clear();
                self.score = self.score.saturating_sub(10);
            }
            MemoryEvent::Report(score) => ctx.finish(score),
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for Memory {
    fn kind(&self) -> GameKind {
        GameKind::Memory
    }

    fn mount(&mut self, ctx: &mut SessionContext<'_>) -> crate::Result<()> {
        self.cards.shuffle(ctx.rng);
        Ok(())
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while let Some(event) = next_due(&mut self.timers, ctx) {
            self.fire(ctx, event);
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        if let GameInput::Choose(index) = input {
            self.flip(ctx, index);
        }
    }

    fn status(&self) -> String {
        let board: String = self
            .cards
            .chunks(4)
            .map(|row| {
                row.iter()
                    .map(|card| if card.flipped || card.matched { card.face } else { "▢" })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(" ");
        format!("score {} | {board}", self.score)
    }
}

pub const SIMON_TONES: [f32; 4] = [300.0, 400.0, 500.0, 600.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimonPhase {
    /// The sequence is being played back; input is ignored.
    Listening,
    Repeating,
    /// The round was completed and the next, longer one is about to start.
    Advancing,
}

#[derive(Debug, Clone, Copy)]
enum SimonEvent {
    Light(usize),
    Dark(usize),
    Extend,
}

/// Repeat the growing sequence of four colored pads.
#[derive(Debug)]
pub struct Simon {
    sequence: Vec<usize>,
    entered: usize,
    phase: SimonPhase,
    lit: Option<usize>,
    score: u32,
    timers: TimerQueue<SimonEvent>,
}

impl Simon {
    pub fn new() -> Self {
        Self {
            sequence: Vec::new(),
            entered: 0,
            phase: SimonPhase::Listening,
            lit: None,
            score: 0,
            timers: TimerQueue::new(),
        }
    }

    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    pub fn phase(&self) -> SimonPhase {
        self.phase
    }

    pub fn lit(&self) -> Option<usize> {
        self.lit
    }

    fn extend_and_play(&mut self, ctx: &mut SessionContext<'_>) {
        self.sequence.push(ctx.rng.gen_range(0..SIMON_TONES.len()));
        self.phase = SimonPhase::Listening;
        self.entered = 0;
        self.timers
            .schedule_once(ctx.now(), Duration::from_millis(800), SimonEvent::Light(0));
    }

    fn fire(&mut self, ctx: &mut SessionContext<'_>, event: SimonEvent) {
        match event {
            SimonEvent::Light(index) => match self.sequence.get(index) {
                Some(&pad) => {
                    self.lit = Some(pad);
                    ctx.audio
                        .play_tone(SIMON_TONES[pad], Waveform::Sine, 0.3, 0.1);
                    self.timers.schedule_once(
                        ctx.now(),
                        Duration::from_millis(400),
                        SimonEvent::Dark(index),
                    );
                }
                None => self.phase = SimonPhase::Repeating,
            },
            SimonEvent::Dark(index) => {
                self.lit = None;
                self.timers.schedule_once(
                    ctx.now(),
                    Duration::from_millis(150),
                    SimonEvent::Light(index + 1),
                );
            }
            SimonEvent::Extend => self.extend_and_play(ctx),
        }
    }

    fn press(&mut self, ctx: &mut SessionContext<'_>, pad: usize) {
        if self.phase != SimonPhase::Repeating || pad >= SIMON_TONES.len() {
            return;
        }
        ctx.audio.play_tone(SIMON_TONES[pad], Waveform::Sine, 0.2, 0.1);

        if self.sequence.get(self.entered) != Some(&pad) {
            ctx.audio.play_failure();
            ctx.finish(self.score);
            return;
        }

        self.entered += 1;
        if self.entered == self.sequence.len() {
            self.score += 100;
            ctx.audio.play_success();
            self.phase = SimonPhase::Advancing;
            self.timers
                .schedule_once(ctx.now(), Duration::from_millis(800), SimonEvent::Extend);
        }
    }
}

impl Default for Simon {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for Simon {
    fn kind(&self) -> GameKind {
        GameKind::Simon
    }

    fn mount(&mut self, ctx: &mut SessionContext<'_>) -> crate::Result<()> {
        self.extend_and_play(ctx);
        Ok(())
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while let Some(event) = next_due(&mut self.timers, ctx) {
            self.fire(ctx, event);
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        if let GameInput::Choose(pad) = input {
            self.press(ctx, pad);
        }
    }

    fn status(&self) -> String {
        let prompt = match self.phase {
            SimonPhase::Listening => "listen...",
            SimonPhase::Repeating => "repeat",
            SimonPhase::Advancing => "well done",
        };
        let pad = match self.lit {
            Some(pad) => format!(" | pad {}", pad + 1),
            None => String::new(),
        };
        format!(
            "round {} | score {} | {prompt}{pad}",
            self.sequence.len(),
            self.score
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Throw {
    Rock,
    Paper,
    Scissors,
}

impl Throw {
    pub const ALL: [Throw; 3] = [Throw::Rock, Throw::Paper, Throw::Scissors];

    pub fn beats(self, other: Throw) -> bool {
        matches!(
            (self, other),
            (Throw::Rock, Throw::Scissors) | (Throw::Paper, Throw::Rock) | (Throw::Scissors, Throw::Paper)
        )
    }

    fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'r' => Some(Throw::Rock),
            'p' => Some(Throw::Paper),
            's' => Some(Throw::Scissors),
            _ => None,
        }
    }
}

impl fmt::Display for Throw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Throw::Rock => "rock",
            Throw::Paper => "paper",
            Throw::Scissors => "scissors",
        };
        f.write_str(name)
    }
}

/// Five rounds against a random opponent. A draw is worth 10, a win 50.
#[derive(Debug)]
pub struct RockPaperScissors {
    score: u32,
    rounds: u32,
    last: Option<(Throw, Throw)>,
    timers: TimerQueue<Report>,
}

impl RockPaperScissors {
    pub const ROUNDS: u32 = 5;

    pub fn new() -> Self {
        Self {
            score: 0,
            rounds: 0,
            last: None,
            timers: TimerQueue::new(),
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    fn throw(&mut self, ctx: &mut SessionContext<'_>, player: Throw) {
        if self.rounds >= Self::ROUNDS {
            return;
        }
        let Some(&opponent) = Throw::ALL.choose(ctx.rng) else {
            return;
        };

        if player == opponent {
            self.score += 10;
        } else if player.beats(opponent) {
            self.score += 50;
            ctx.audio.play_success();
        } else {
            ctx.audio.play_failure();
        }
        self.last = Some((player, opponent));
        self.rounds += 1;

        if self.rounds == Self::ROUNDS {
            self.timers.schedule_once(
                ctx.now(),
                Duration::from_millis(1_500),
                Report(self.score),
            );
        }
    }
}

impl Default for RockPaperScissors {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for RockPaperScissors {
    fn kind(&self) -> GameKind {
        GameKind::Rps
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        if let Some(Report(score)) = next_due(&mut self.timers, ctx) {
            ctx.finish(score);
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        let throw = match input {
            GameInput::Choose(index) => Throw::ALL.get(index).copied(),
            GameInput::Char(key) => Throw::from_key(key),
            _ => None,
        };
        if let Some(throw) = throw {
            self.throw(ctx, throw);
        }
    }

    fn status(&self) -> String {
        let round = (self.rounds + 1).min(Self::ROUNDS);
        let last = match self.last {
            Some((player, opponent)) if player == opponent => format!(" | {opponent}: draw"),
            Some((player, opponent)) if player.beats(opponent) => format!(" | {opponent}: you win"),
            Some((_, opponent)) => format!(" | {opponent}: you lose"),
            None => String::new(),
        };
        format!(
            "round {round}/{} | score {}{last}",
            Self::ROUNDS,
            self.score
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Start,
    Higher,
    Lower,
    Correct,
}

/// Guess a number in 1..=100. Every miss costs ten of the starting hundred.
#[derive(Debug)]
pub struct GuessNumber {
    target: u32,
    entry: String,
    score: u32,
    attempts: u32,
    hint: Hint,
    timers: TimerQueue<Report>,
}

impl GuessNumber {
    pub fn new() -> Self {
        Self {
            target: 0,
            entry: String::new(),
            score: 100,
            attempts: 0,
            hint: Hint::Start,
            timers: TimerQueue::new(),
        }
    }

    pub fn hint(&self) -> Hint {
        self.hint
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn submit(&mut self, ctx: &mut SessionContext<'_>) {
        if self.hint == Hint::Correct {
            return;
        }
        let entry = std::mem::take(&mut self.entry);
        let Ok(guess) = entry.parse::<u32>() else {
            return;
        };
        self.attempts += 1;

        if guess == self.target {
            ctx.audio.play_success();
            self.hint = Hint::Correct;
            self.timers.schedule_once(
                ctx.now(),
                Duration::from_millis(1_000),
                Report(self.score),
            );
        } else {
            ctx.audio.play_failure();
            self.score = self.score.saturating_sub(10);
            self.hint = if guess < self.target {
                Hint::Higher
            } else {
                Hint::Lower
            };
        }
    }
}

impl Default for GuessNumber {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for GuessNumber {
    fn kind(&self) -> GameKind {
        GameKind::Guess
    }

    fn mount(&mut self, ctx: &mut SessionContext<'_>) -> crate::Result<()> {
        self.target = ctx.rng.gen_range(1..=100);
        Ok(())
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        if let Some(Report(score)) = next_due(&mut self.timers, ctx) {
            ctx.finish(score);
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        match input {
            GameInput::Char(digit) if digit.is_ascii_digit() && self.entry.len() < 3 => {
                self.entry.push(digit)
            }
            GameInput::Backspace => {
                self.entry.pop();
            }
            GameInput::Submit => self.submit(ctx),
            _ => {}
        }
    }

    fn status(&self) -> String {
        let hint = match self.hint {
            Hint::Start => "a number between 1 and 100",
            Hint::Higher => "higher!",
            Hint::Lower => "lower!",
            Hint::Correct => "correct!",
        };
        format!(
            "{hint} | guess: {} | attempts {} | score {}",
            self.entry, self.attempts, self.score
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum PoochEvent {
    NextRound,
    Report(u32),
}

/// Which hand hides the flower? A wrong guess ends the game, five right
/// ones in a row win it.
#[derive(Debug)]
pub struct GolYaPooch {
    flower: usize,
    round: u32,
    score: u32,
    revealed: Option<usize>,
    timers: TimerQueue<PoochEvent>,
}

impl GolYaPooch {
    pub const ROUNDS: u32 = 5;
    pub const POINTS: u32 = 50;
    const REVEAL: Duration = Duration::from_millis(1_500);

    pub fn new() -> Self {
        Self {
            flower: 0,
            round: 1,
            score: 0,
            revealed: None,
            timers: TimerQueue::new(),
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// The hand holding the flower, only known once a guess is on the table.
    pub fn revealed_flower(&self) -> Option<usize> {
        self.revealed.map(|_| self.flower)
    }

    fn hide(&mut self, ctx: &mut SessionContext<'_>) {
        self.flower = ctx.rng.gen_range(0..2);
        self.revealed = None;
    }

    fn guess(&mut self, ctx: &mut SessionContext<'_>, hand: usize) {
        if self.revealed.is_some() || hand > 1 {
            return;
        }
        self.revealed = Some(hand);

        let event = if hand == self.flower {
            ctx.audio.play_success();
            self.score += Self::POINTS;
            if self.round >= Self::ROUNDS {
                PoochEvent::Report(self.score)
            } else {
                PoochEvent::NextRound
            }
        } else {
            ctx.audio.play_failure();
            PoochEvent::Report(self.score)
        };
        self.timers.schedule_once(ctx.now(), Self::REVEAL, event);
    }
}

impl Default for GolYaPooch {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for GolYaPooch {
    fn kind(&self) -> GameKind {
        GameKind::GolYaPooch
    }

    fn mount(&mut self, ctx: &mut SessionContext<'_>) -> crate::Result<()> {
        self.hide(ctx);
        Ok(())
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while let Some(event) = next_due(&mut self.timers, ctx) {
            match event {
                PoochEvent::NextRound => {
                    self.round += 1;
                    self.hide(ctx);
                }
                PoochEvent::Report(score) => ctx.finish(score),
            }
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        let hand = match input {
            GameInput::Choose(hand) => hand,
            GameInput::Steer(Direction::Left) => 0,
            GameInput::Steer(Direction::Right) => 1,
            _ => return,
        };
        self.guess(ctx, hand);
    }

    fn status(&self) -> String {
        let hands = match self.revealed {
            Some(guess) if guess == self.flower => "you found the flower!",
            Some(_) => "empty hand",
            None => "left or right?",
        };
        format!(
            "round {}/{} | score {} | {hands}",
            self.round,
            Self::ROUNDS,
            self.score
        )
    }
}

const MAZE: [[u8; 10]; 10] = [
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    [1, 0, 0, 0, 1, 0, 0, 0, 0, 1],
    [1, 0, 1, 0, 1, 0, 1, 1, 0, 1],
    [1, 0, 1, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 1, 1, 1, 1, 1, 1, 0, 1],
    [1, 0, 0, 0, 0, 0, 1, 0, 0, 1],
    [1, 1, 1, 1, 1, 0, 1, 0, 1, 1],
    [1, 0, 0, 0, 0, 0, 1, 0, 0, 1],
    [1, 0, 1, 1, 1, 1, 1, 1, 0, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
];

/// Walk from the top-left corner to the exit. Every bump into a wall costs
/// five of the starting hundred.
#[derive(Debug)]
pub struct Maze {
    /// Column, row.
    position: (usize, usize),
    score: u32,
    escaped: bool,
    timers: TimerQueue<Report>,
}

impl Maze {
    pub const START: (usize, usize) = (1, 1);
    pub const EXIT: (usize, usize) = (8, 7);
    const WALL_PENALTY: u32 = 5;

    pub fn new() -> Self {
        Self {
            position: Self::START,
            score: 100,
            escaped: false,
            timers: TimerQueue::new(),
        }
    }

    pub fn position(&self) -> (usize, usize) {
        self.position
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_wall(x: usize, y: usize) -> bool {
        MAZE.get(y).and_then(|row| row.get(x)).map_or(true, |&cell| cell == 1)
    }

    fn step(&mut self, ctx: &mut SessionContext<'_>, direction: Direction) {
        if self.escaped {
            return;
        }
        let (x, y) = self.position;
        let target = match direction {
            Direction::Up => y.checked_sub(1).map(|y| (x, y)),
            Direction::Down => Some((x, y + 1)),
            Direction::Left => x.checked_sub(1).map(|x| (x, y)),
            Direction::Right => Some((x + 1, y)),
        };

        match target {
            Some((x, y)) if !Self::is_wall(x, y) => {
                self.position = (x, y);
                if self.position == Self::EXIT {
                    self.escaped = true;
                    ctx.audio.play_success();
                    self.timers.schedule_once(
                        ctx.now(),
                        Duration::from_millis(500),
                        Report(self.score),
                    );
                }
            }
            _ => {
                ctx.audio.play_tone(100.0, Waveform::Sawtooth, 0.1, 0.1);
                self.score = self.score.saturating_sub(Self::WALL_PENALTY);
            }
        }
    }
}

impl Default for Maze {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for Maze {
    fn kind(&self) -> GameKind {
        GameKind::Maze
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        if let Some(Report(score)) = next_due(&mut self.timers, ctx) {
            ctx.finish(score);
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        if let GameInput::Steer(direction) = input {
            self.step(ctx, direction);
        }
    }

    fn status(&self) -> String {
        let rows: Vec<String> = MAZE
            .iter()
            .enumerate()
            .map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(|(x, &cell)| match (x, y) {
                        pos if pos == self.position => '@',
                        pos if pos == Self::EXIT => 'E',
                        _ if cell == 1 => '#',
                        _ => ' ',
                    })
                    .collect()
            })
            .collect();
        format!("score {} | {}", self.score, rows.join("/"))
    }
}
