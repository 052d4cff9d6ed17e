use std::{sync::Arc, time::Duration};

use rand::{seq::SliceRandom, Rng};

use crate::{
    session::{next_due, GameInput, Session, SessionContext},
    timeline::TimerQueue,
    trivia::{spawn_load, PendingQuestions, TriviaQuestion, TriviaSource},
    Result,
};

use super::GameKind;

#[derive(Debug, Clone, Copy)]
struct NextQuestion;

/// A round of multiple-choice questions fetched in the background. Each
/// right answer is worth 200; the answer stays on screen for 1.5 s.
pub struct Trivia {
    source: Arc<dyn TriviaSource>,
    topic: String,
    pending: Option<PendingQuestions>,
    questions: Vec<TriviaQuestion>,
    index: usize,
    selected: Option<usize>,
    score: u32,
    timers: TimerQueue<NextQuestion>,
}

impl Trivia {
    pub const POINTS: u32 = 200;

    pub fn new(source: Arc<dyn TriviaSource>, topic: &str) -> Self {
        Self {
            source,
            topic: topic.to_string(),
            pending: None,
            questions: Vec::new(),
            index: 0,
            selected: None,
            score: 0,
            timers: TimerQueue::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn current(&self) -> Option<&TriviaQuestion> {
        self.questions.get(self.index)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    fn answer(&mut self, ctx: &mut SessionContext<'_>, choice: usize) {
        if self.selected.is_some() || choice >= 4 {
            return;
        }
        let Some(question) = self.current() else {
            return;
        };
        let correct = question.correct_answer_index == choice;

        self.selected = Some(choice);
        if correct {
            ctx.audio.play_success();
            self.score += Self::POINTS;
        } else {
            ctx.audio.play_failure();
        }
        self.timers
            .schedule_once(ctx.now(), Duration::from_millis(1_500), NextQuestion);
    }
}

impl Session for Trivia {
    fn kind(&self) -> GameKind {
        GameKind::Trivia
    }

    fn mount(&mut self, _ctx: &mut SessionContext<'_>) -> Result<()> {
        self.pending = Some(spawn_load(self.source.clone(), self.topic.clone()));
        Ok(())
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        if let Some(pending) = self.pending.as_mut() {
            if let Some(questions) = pending.poll() {
                self.questions = questions.to_vec();
                self.pending = None;
                tracing::debug!(count = self.questions.len(), "trivia round ready");
            }
        }

        while next_due(&mut self.timers, ctx).is_some() {
            if self.index + 1 < self.questions.len() {
                self.index += 1;
                self.selected = None;
            } else {
                ctx.finish(self.score);
            }
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        match input {
            GameInput::Choose(choice) => self.answer(ctx, choice),
            GameInput::Char(key @ '1'..='4') => self.answer(ctx, key as usize - '1' as usize),
            _ => {}
        }
    }

    fn status(&self) -> String {
        let Some(question) = self.current() else {
            return "loading questions...".to_string();
        };
        let options: Vec<String> = question
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                let marker = match self.selected {
                    Some(_) if i == question.correct_answer_index => "+",
                    Some(selected) if i == selected => "x",
                    _ => "",
                };
                format!("{}) {option}{marker}", i + 1)
            })
            .collect();
        format!(
            "Q{}/{} score {} | {} | {}",
            self.index + 1,
            self.questions.len(),
            self.score,
            question.question,
            options.join("  ")
        )
    }
}

/// Flag country codes and the country names offered as answers.
const FLAGS: [(&str, &str); 10] = [
    ("ir", "Iran"),
    ("de", "Germany"),
    ("fr", "France"),
    ("jp", "Japan"),
    ("br", "Brazil"),
    ("us", "USA"),
    ("gb", "UK"),
    ("it", "Italy"),
    ("ca", "Canada"),
    ("au", "Australia"),
];

const CAPITALS: [(&str, &str); 8] = [
    ("Iran", "Tehran"),
    ("France", "Paris"),
    ("Germany", "Berlin"),
    ("Japan", "Tokyo"),
    ("Italy", "Rome"),
    ("Spain", "Madrid"),
    ("Russia", "Moscow"),
    ("China", "Beijing"),
];

/// Two-letter country code to its flag emoji.
pub fn flag_emoji(code: &str) -> String {
    code.chars()
        .filter(char::is_ascii_lowercase)
        .filter_map(|c| char::from_u32(0x1F1E6 + (c as u32 - 'a' as u32)))
        .collect()
}

/// Five questions drawn from a fixed (prompt, answer) table, four options
/// each. Input is locked for half a second after every answer.
#[derive(Debug)]
pub struct TableQuiz {
    kind: GameKind,
    table: &'static [(&'static str, &'static str)],
    target: usize,
    options: Vec<&'static str>,
    round: u32,
    score: u32,
    answered: Option<usize>,
    timers: TimerQueue<NextQuestion>,
}

impl TableQuiz {
    pub const ROUNDS: u32 = 5;
    pub const POINTS: u32 = 100;
    const OPTIONS: usize = 4;

    pub fn flags() -> Self {
        Self::new(GameKind::Flags, &FLAGS)
    }

    pub fn capitals() -> Self {
        Self::new(GameKind::Capitals, &CAPITALS)
    }

    fn new(kind: GameKind, table: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            kind,
            table,
            target: 0,
            options: Vec::new(),
            round: 0,
            score: 0,
            answered: None,
            timers: TimerQueue::new(),
        }
    }

    pub fn prompt(&self) -> String {
        let key = self.table[self.target].0;
        match self.kind {
            GameKind::Flags => flag_emoji(key),
            _ => format!("capital of {key}?"),
        }
    }

    pub fn options(&self) -> &[&'static str] {
        &self.options
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    fn answer_text(&self) -> &'static str {
        self.table[self.target].1
    }

    fn next_round(&mut self, ctx: &mut SessionContext<'_>) {
        if self.round >= Self::ROUNDS {
            ctx.finish(self.score);
            return;
        }
        self.target = ctx.rng.gen_range(0..self.table.len());
        let mut others: Vec<usize> = (0..self.table.len())
            .filter(|&i| i != self.target)
            .collect();
        others.shuffle(ctx.rng);

        self.options = std::iter::once(self.target)
            .chain(others.into_iter().take(Self::OPTIONS - 1))
            .map(|i| self.table[i].1)
            .collect();
        self.options.shuffle(ctx.rng);
        self.round += 1;
        self.answered = None;
    }

    fn answer(&mut self, ctx: &mut SessionContext<'_>, choice: usize) {
        if self.answered.is_some() {
            return;
        }
        let Some(&picked) = self.options.get(choice) else {
            return;
        };
        self.answered = Some(choice);
        if picked == self.answer_text() {
            ctx.audio.play_success();
            self.score += Self::POINTS;
        } else {
            ctx.audio.play_failure();
        }
        self.timers
            .schedule_once(ctx.now(), Duration::from_millis(500), NextQuestion);
    }
}

impl Session for TableQuiz {
    fn kind(&self) -> GameKind {
        self.kind
    }

    fn mount(&mut self, ctx: &mut SessionContext<'_>) -> Result<()> {
        self.next_round(ctx);
        Ok(())
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while next_due(&mut self.timers, ctx).is_some() {
            self.next_round(ctx);
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        match input {
            GameInput::Choose(choice) => self.answer(ctx, choice),
            GameInput::Char(key @ '1'..='4') => self.answer(ctx, key as usize - '1' as usize),
            _ => {}
        }
    }

    fn status(&self) -> String {
        let options: Vec<String> = self
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| format!("{}) {option}", i + 1))
            .collect();
        format!(
            "round {}/{} | score {} | {} | {}",
            self.round,
            Self::ROUNDS,
            self.score,
            self.prompt(),
            options.join("  ")
        )
    }
}
