//! Single-player games played against a whole-second countdown.

use std::{fmt, time::Duration};

use rand::{seq::SliceRandom, Rng};

use crate::{
    audio::tone::Waveform,
    session::{next_due, GameInput, Session, SessionContext},
    timeline::TimerQueue,
    Result,
};

use super::{Countdown, GameKind};

const SECOND: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tick {
    Second,
    Shuffle,
}

fn start_clock(timers: &mut TimerQueue<Tick>, ctx: &SessionContext<'_>) -> Result<()> {
    timers.schedule_repeating(ctx.now(), SECOND, Tick::Second)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Problem {
    pub a: i32,
    pub op: Operator,
    pub b: i32,
}

impl Problem {
    fn random(rng: &mut impl Rng) -> Self {
        let op = match rng.gen_range(0..3) {
            0 => Operator::Add,
            1 => Operator::Subtract,
            _ => Operator::Multiply,
        };
        Self {
            a: rng.gen_range(1..=10),
            op,
            b: rng.gen_range(1..=10),
        }
    }

    pub fn answer(&self) -> i32 {
        match self.op {
            Operator::Add => self.a + self.b,
            Operator::Subtract => self.a - self.b,
            Operator::Multiply => self.a * self.b,
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
        };
        write!(f, "{} {op} {}", self.a, self.b)
    }
}

/// Mental arithmetic against a 30 second clock. Right answers earn points
/// plus the seconds left and buy two more seconds; wrong ones cost five.
#[derive(Debug)]
pub struct MathSprint {
    problem: Problem,
    entry: String,
    score: u32,
    countdown: Countdown,
    timers: TimerQueue<Tick>,
}

impl MathSprint {
    const SECONDS: u32 = 30;

    pub fn new() -> Self {
        Self {
            problem: Problem {
                a: 1,
                op: Operator::Add,
                b: 1,
            },
            entry: String::new(),
            score: 0,
            countdown: Countdown::new(Self::SECONDS),
            timers: TimerQueue::new(),
        }
    }

    pub fn problem(&self) -> Problem {
        self.problem
    }

    pub fn time_left(&self) -> u32 {
        self.countdown.left()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    fn submit(&mut self, ctx: &mut SessionContext<'_>) {
        let entry = std::mem::take(&mut self.entry);
        if entry.parse::<i32>().ok() == Some(self.problem.answer()) {
            self.score += 50 + self.countdown.left();
            ctx.audio.play_success();
            self.countdown.add(2, Self::SECONDS);
            self.problem = Problem::random(ctx.rng);
        } else {
            ctx.audio.play_failure();
            self.countdown.subtract(5);
        }
    }
}

impl Default for MathSprint {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for MathSprint {
    fn kind(&self) -> GameKind {
        GameKind::Math
    }

    fn mount(&mut self, ctx: &mut SessionContext<'_>) -> Result<()> {
        self.problem = Problem::random(ctx.rng);
        start_clock(&mut self.timers, ctx)
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while next_due(&mut self.timers, ctx).is_some() {
            if self.countdown.tick() {
                ctx.finish(self.score);
            }
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        match input {
            GameInput::Char(ch) if ch.is_ascii_digit() || ch == '-' => self.entry.push(ch),
            GameInput::Backspace => {
                self.entry.pop();
            }
            GameInput::Submit => self.submit(ctx),
            _ => {}
        }
    }

    fn status(&self) -> String {
        format!(
            "{}s | score {} | {} = {}",
            self.countdown.left(),
            self.score,
            self.problem,
            if self.entry.is_empty() { "?" } else { self.entry.as_str() }
        )
    }
}

/// Pop the moles before they move. Holes reshuffle every 700 ms.
#[derive(Debug)]
pub struct Whack {
    holes: [bool; 9],
    score: u32,
    countdown: Countdown,
    timers: TimerQueue<Tick>,
}

impl Whack {
    const SECONDS: u32 = 20;
    const SHUFFLE: Duration = Duration::from_millis(700);

    pub fn new() -> Self {
        Self {
            holes: [false; 9],
            score: 0,
            countdown: Countdown::new(Self::SECONDS),
            timers: TimerQueue::new(),
        }
    }

    pub fn holes(&self) -> &[bool; 9] {
        &self.holes
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    fn shuffle(&mut self, rng: &mut impl Rng) {
        self.holes = [false; 9];
        let moles = if rng.gen::<f64>() > 0.7 { 2 } else { 1 };
        for _ in 0..moles {
            self.holes[rng.gen_range(0..9)] = true;
        }
    }
}

impl Default for Whack {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for Whack {
    fn kind(&self) -> GameKind {
        GameKind::Whack
    }

    fn mount(&mut self, ctx: &mut SessionContext<'_>) -> Result<()> {
        self.timers
            .schedule_repeating(ctx.now(), Self::SHUFFLE, Tick::Shuffle)?;
        start_clock(&mut self.timers, ctx)
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while let Some(tick) = next_due(&mut self.timers, ctx) {
            match tick {
                Tick::Shuffle => self.shuffle(ctx.rng),
                Tick::Second => {
                    if self.countdown.tick() {
                        ctx.finish(self.score);
                    }
                }
            }
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        let GameInput::Choose(index) = input else {
            return;
        };
        let Some(hole) = self.holes.get_mut(index) else {
            return;
        };
        if *hole {
            *hole = false;
            ctx.audio.play_click();
            self.score += 50;
        } else {
            self.score = self.score.saturating_sub(20);
        }
    }

    fn status(&self) -> String {
        let board: String = self
            .holes
            .chunks(3)
            .map(|row| row.iter().map(|&up| if up { '@' } else { 'o' }).collect::<String>())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}s | score {} | {board}", self.countdown.left(), self.score)
    }
}

/// Ten seconds of tapping; every tap is worth ten points.
#[derive(Debug)]
pub struct Clicker {
    count: u32,
    countdown: Countdown,
    timers: TimerQueue<Tick>,
}

impl Clicker {
    pub fn new() -> Self {
        Self {
            count: 0,
            countdown: Countdown::new(10),
            timers: TimerQueue::new(),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Default for Clicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for Clicker {
    fn kind(&self) -> GameKind {
        GameKind::Clicker
    }

    fn mount(&mut self, ctx: &mut SessionContext<'_>) -> Result<()> {
        start_clock(&mut self.timers, ctx)
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while next_due(&mut self.timers, ctx).is_some() {
            if self.countdown.tick() {
                ctx.finish(self.count * 10);
            }
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        if input.is_press() || input == GameInput::Char(' ') {
            let frequency = 200.0 + self.count as f32 * 10.0;
            self.count += 1;
            ctx.audio.play_tone(frequency, Waveform::Triangle, 0.05, 0.05);
        }
    }

    fn status(&self) -> String {
        format!("{}s | taps {}", self.countdown.left(), self.count)
    }
}

pub const COLOR_NAMES: [&str; 4] = ["red", "blue", "green", "yellow"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorCard {
    /// Index of the color named by the word.
    pub word: usize,
    /// Index of the ink it is printed in.
    pub ink: usize,
}

impl ColorCard {
    fn random(rng: &mut impl Rng) -> Self {
        let word = rng.gen_range(0..COLOR_NAMES.len());
        let ink = if rng.gen::<f64>() > 0.5 {
            word
        } else {
            (word + rng.gen_range(1..COLOR_NAMES.len())) % COLOR_NAMES.len()
        };
        Self { word, ink }
    }

    pub fn matches(&self) -> bool {
        self.word == self.ink
    }
}

/// Does the word match its ink? One wrong vote ends the game.
#[derive(Debug)]
pub struct ColorMatch {
    card: ColorCard,
    score: u32,
    countdown: Countdown,
    timers: TimerQueue<Tick>,
}

impl ColorMatch {
    pub fn new() -> Self {
        Self {
            card: ColorCard { word: 0, ink: 0 },
            score: 0,
            countdown: Countdown::new(20),
            timers: TimerQueue::new(),
        }
    }

    pub fn card(&self) -> ColorCard {
        self.card
    }

    fn vote(&mut self, ctx: &mut SessionContext<'_>, says_match: bool) {
        if says_match == self.card.matches() {
            self.score += 50;
            ctx.audio.play_click();
            self.card = ColorCard::random(ctx.rng);
        } else {
            ctx.audio.play_failure();
            ctx.finish(self.score);
        }
    }
}

impl Default for ColorMatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for ColorMatch {
    fn kind(&self) -> GameKind {
        GameKind::ColorMatch
    }

    fn mount(&mut self, ctx: &mut SessionContext<'_>) -> Result<()> {
        self.card = ColorCard::random(ctx.rng);
        start_clock(&mut self.timers, ctx)
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while next_due(&mut self.timers, ctx).is_some() {
            if self.countdown.tick() {
                ctx.finish(self.score);
            }
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        let vote = match input {
            GameInput::Choose(0) | GameInput::Char('n') => false,
            GameInput::Choose(1) | GameInput::Char('y') => true,
            _ => return,
        };
        self.vote(ctx, vote);
    }

    fn status(&self) -> String {
        format!(
            "{}s | score {} | \"{}\" in {} ink",
            self.countdown.left(),
            self.score,
            COLOR_NAMES[self.card.word].to_uppercase(),
            COLOR_NAMES[self.card.ink]
        )
    }
}

pub const TYPING_WORDS: [&str; 21] = [
    "apple",
    "banana",
    "cherry",
    "date",
    "elderberry",
    "fig",
    "grape",
    "honeydew",
    "kiwi",
    "lemon",
    "mango",
    "nectarine",
    "orange",
    "papaya",
    "quince",
    "raspberry",
    "strawberry",
    "tangerine",
    "ugli",
    "vanilla",
    "watermelon",
];

/// Type the shown word; it is accepted as soon as the entry matches.
#[derive(Debug)]
pub struct Typing {
    target: &'static str,
    entry: String,
    score: u32,
    countdown: Countdown,
    timers: TimerQueue<Tick>,
}

impl Typing {
    pub fn new() -> Self {
        Self {
            target: TYPING_WORDS[0],
            entry: String::new(),
            score: 0,
            countdown: Countdown::new(30),
            timers: TimerQueue::new(),
        }
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    fn next_word(&mut self, rng: &mut impl Rng) {
        if let Some(word) = TYPING_WORDS.choose(rng) {
            self.target = word;
        }
    }
}

impl Default for Typing {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for Typing {
    fn kind(&self) -> GameKind {
        GameKind::Typing
    }

    fn mount(&mut self, ctx: &mut SessionContext<'_>) -> Result<()> {
        self.next_word(ctx.rng);
        start_clock(&mut self.timers, ctx)
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while next_due(&mut self.timers, ctx).is_some() {
            if self.countdown.tick() {
                ctx.finish(self.score);
            }
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        match input {
            GameInput::Char(ch) => self.entry.push(ch),
            GameInput::Backspace => {
                self.entry.pop();
                return;
            }
            _ => return,
        }
        if self.entry.to_lowercase() == self.target {
            ctx.audio.play_success();
            self.score += self.target.len() as u32 * 10;
            self.entry.clear();
            self.next_word(ctx.rng);
        }
    }

    fn status(&self) -> String {
        format!(
            "{}s | score {} | {} > {}",
            self.countdown.left(),
            self.score,
            self.target,
            self.entry
        )
    }
}

const ODD_PAIRS: [(&str, &str); 4] = [("😀", "😃"), ("🐶", "🐕"), ("🍎", "🍅"), ("🌑", "🌒")];

/// Find the one different emoji in a grid that grows with the level.
#[derive(Debug)]
pub struct OddOneOut {
    level: u32,
    score: u32,
    odd_index: usize,
    pair: (&'static str, &'static str),
    countdown: Countdown,
    timers: TimerQueue<Tick>,
}

impl OddOneOut {
    const SECONDS: u32 = 15;
    const MAX_SECONDS: u32 = 20;

    pub fn new() -> Self {
        Self {
            level: 1,
            score: 0,
            odd_index: 0,
            pair: ODD_PAIRS[0],
            countdown: Countdown::new(Self::SECONDS),
            timers: TimerQueue::new(),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Side length of the square grid.
    pub fn grid_size(&self) -> usize {
        (self.level as usize / 2 + 2).min(6)
    }

    pub fn odd_index(&self) -> usize {
        self.odd_index
    }

    fn generate(&mut self, rng: &mut impl Rng) {
        let cells = self.grid_size() * self.grid_size();
        self.odd_index = rng.gen_range(0..cells);
        if let Some(&pair) = ODD_PAIRS.choose(rng) {
            self.pair = pair;
        }
    }
}

impl Default for OddOneOut {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for OddOneOut {
    fn kind(&self) -> GameKind {
        GameKind::OddOne
    }

    fn mount(&mut self, ctx: &mut SessionContext<'_>) -> Result<()> {
        self.generate(ctx.rng);
        start_clock(&mut self.timers, ctx)
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while next_due(&mut self.timers, ctx).is_some() {
            if self.countdown.tick() {
                ctx.finish(self.score);
            }
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        let GameInput::Choose(index) = input else {
            return;
        };
        if index >= self.grid_size() * self.grid_size() {
            return;
        }
        if index == self.odd_index {
            ctx.audio.play_success();
            self.score += 50;
            self.level += 1;
            self.countdown.add(2, Self::MAX_SECONDS);
            self.generate(ctx.rng);
        } else {
            ctx.audio.play_failure();
            ctx.finish(self.score);
        }
    }

    fn status(&self) -> String {
        let size = self.grid_size();
        let rows: Vec<String> = (0..size)
            .map(|row| {
                (0..size)
                    .map(|col| {
                        if row * size + col == self.odd_index {
                            self.pair.1
                        } else {
                            self.pair.0
                        }
                    })
                    .collect()
            })
            .collect();
        format!(
            "{}s | score {} | {}",
            self.countdown.left(),
            self.score,
            rows.join(" ")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
}

impl BreathPhase {
    fn next(self) -> Self {
        match self {
            BreathPhase::Inhale => BreathPhase::Hold,
            BreathPhase::Hold => BreathPhase::Exhale,
            BreathPhase::Exhale => BreathPhase::Inhale,
        }
    }
}

/// Guided breathing with no end of its own: four seconds per phase, ten
/// points for each completed phase, scored when the player leaves.
#[derive(Debug)]
pub struct Breathing {
    phase: BreathPhase,
    score: u32,
    timers: TimerQueue<Tick>,
}

impl Breathing {
    const PHASE: Duration = Duration::from_secs(4);

    pub fn new() -> Self {
        Self {
            phase: BreathPhase::Inhale,
            score: 0,
            timers: TimerQueue::new(),
        }
    }

    pub fn phase(&self) -> BreathPhase {
        self.phase
    }
}

impl Default for Breathing {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for Breathing {
    fn kind(&self) -> GameKind {
        GameKind::Breathing
    }

    fn mount(&mut self, ctx: &mut SessionContext<'_>) -> Result<()> {
        self.timers
            .schedule_repeating(ctx.now(), Self::PHASE, Tick::Second)?;
        Ok(())
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while next_due(&mut self.timers, ctx).is_some() {
            self.score += 10;
            self.phase = self.phase.next();
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        if matches!(input, GameInput::Exit | GameInput::Submit) {
            ctx.finish(self.score);
        }
    }

    fn status(&self) -> String {
        let phase = match self.phase {
            BreathPhase::Inhale => "breathe in",
            BreathPhase::Hold => "hold",
            BreathPhase::Exhale => "breathe out",
        };
        format!("{phase} | score {}", self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::{Driver, Harness};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn math_right_answer_scores_and_extends_time() {
        let mut d = Driver::new(MathSprint::new(), 3);
        d.run_ms(5_000);
        assert_eq!(d.game.time_left(), 25);

        let answer = d.game.problem().answer();
        d.type_text(&answer.to_string());
        d.press(GameInput::Submit);
        assert_eq!(d.game.score(), 75);
        assert_eq!(d.game.time_left(), 27);

        d.type_text("999");
        d.press(GameInput::Submit);
        assert_eq!(d.game.time_left(), 22);
        assert_eq!(d.game.score(), 75);
    }

    #[test]
    fn math_ends_when_clock_runs_out() {
        let mut h = Harness::new(MathSprint::new(), 3);
        h.run_ms(29_990);
        assert!(h.reports.is_empty());
        h.run_ms(10);
        assert_eq!(h.score(), 0);
    }

    #[test]
    fn math_penalty_can_empty_the_clock() {
        let mut d = Driver::new(MathSprint::new(), 3);
        d.run_ms(27_000);
        d.press(GameInput::Submit);
        assert_eq!(d.game.time_left(), 0);
        d.run_ms(1_000);
        assert_eq!(d.score(), Some(0));
    }

    #[test]
    fn problems_evaluate() {
        let p = Problem {
            a: 3,
            op: Operator::Subtract,
            b: 7,
        };
        assert_eq!(p.answer(), -4);
        assert_eq!(p.to_string(), "3 - 7");
    }

    #[test]
    fn whack_hits_and_misses() {
        let mut d = Driver::new(Whack::new(), 10);
        assert!(d.game.holes().iter().all(|up| !up));
        d.run_ms(700);
        let mole = d.game.holes().iter().position(|&up| up).unwrap();
        d.press(GameInput::Choose(mole));
        assert_eq!(d.game.score(), 50);
        assert!(!d.game.holes()[mole]);

        d.press(GameInput::Choose(mole));
        assert_eq!(d.game.score(), 30);
        d.press(GameInput::Choose(mole));
        d.press(GameInput::Choose(mole));
        assert_eq!(d.game.score(), 0);

        d.run_ms(20_000);
        assert_eq!(d.score(), Some(0));
    }

    #[test]
    fn clicker_scores_ten_per_tap() {
        let mut h = Harness::new(Clicker::new(), 1);
        for _ in 0..12 {
            h.press(GameInput::Tap { player: 0 });
        }
        h.press(GameInput::Char(' '));
        h.press(GameInput::Char('x'));
        h.run_ms(10_000);
        assert_eq!(h.score(), 130);
        h.press(GameInput::Tap { player: 0 });
        assert_eq!(h.reports.len(), 1);
    }

    #[test]
    fn color_match_wrong_vote_ends_the_game() {
        let mut d = Driver::new(ColorMatch::new(), 5);
        for _ in 0..3 {
            let right = d.game.card().matches();
            d.press(GameInput::Choose(usize::from(right)));
        }
        assert_eq!(d.score(), None);
        let wrong = !d.game.card().matches();
        d.press(GameInput::Char(if wrong { 'y' } else { 'n' }));
        assert_eq!(d.score(), Some(150));
    }

    #[test]
    fn color_cards_cover_both_answers() {
        let mut rng = StdRng::seed_from_u64(0);
        let cards: Vec<ColorCard> = (0..200).map(|_| ColorCard::random(&mut rng)).collect();
        assert!(cards.iter().all(|card| card.word < 4 && card.ink < 4));
        assert!(cards.iter().any(ColorCard::matches));
        assert!(cards.iter().any(|card| !card.matches()));
    }

    #[test]
    fn typing_accepts_completed_words() {
        let mut d = Driver::new(Typing::new(), 2);
        let word = d.game.target();
        d.type_text(&word.to_uppercase());
        assert_eq!(d.game.score(), word.len() as u32 * 10);

        d.type_text("zz");
        d.press(GameInput::Backspace);
        d.press(GameInput::Backspace);
        let next = d.game.target();
        d.type_text(next);
        assert_eq!(d.game.score(), (word.len() + next.len()) as u32 * 10);
    }

    #[test]
    fn odd_one_grid_grows_with_level() {
        let mut d = Driver::new(OddOneOut::new(), 6);
        assert_eq!(d.game.grid_size(), 2);
        for _ in 0..3 {
            d.press(GameInput::Choose(d.game.odd_index()));
        }
        assert_eq!(d.game.level(), 4);
        assert_eq!(d.game.grid_size(), 4);
        assert_eq!(d.score(), None);

        let wrong = (d.game.odd_index() + 1) % 16;
        d.press(GameInput::Choose(wrong));
        assert_eq!(d.score(), Some(150));
    }

    #[test]
    fn odd_one_time_bonus_is_capped() {
        let mut d = Driver::new(OddOneOut::new(), 6);
        for _ in 0..5 {
            d.press(GameInput::Choose(d.game.odd_index()));
        }
        d.run_ms(19_990);
        assert_eq!(d.score(), None);
        d.run_ms(10);
        assert_eq!(d.score(), Some(250));
    }

    #[test]
    fn breathing_scores_completed_phases_on_exit() {
        let mut h = Harness::new(Breathing::new(), 1);
        h.run_ms(12_000);
        assert!(h.session.status().starts_with("breathe in | score 30"));
        h.run_ms(4_000);
        h.press(GameInput::Exit);
        assert_eq!(h.score(), 40);
    }
}
