//! Hosting for mini-games. A game is mounted, driven with fixed simulation
//! steps and player input, reports one score and is then dropped together
//! with every timer it owns.

use std::{sync::Arc, time::Duration};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    audio::AudioEngine,
    config::{AppConfig, SessionConfig},
    games::{self, GameKind, GameSelection},
    timeline::{PlaybackClock, TimerQueue},
    trivia::{self, TriviaSource},
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Player actions routed to the mounted game. Each game picks the ones it
/// understands and ignores the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameInput {
    /// A press in a player's zone. Single-player games treat any tap as a
    /// press of their main button.
    Tap { player: usize },
    /// Picks a numbered cell, card, lane or answer (zero based).
    Choose(usize),
    Steer(Direction),
    Char(char),
    Backspace,
    Submit,
    /// The game's own exit button, for games that score on leaving.
    Exit,
}

impl GameInput {
    /// True for inputs that count as pressing the game's main button.
    pub fn is_press(self) -> bool {
        matches!(
            self,
            GameInput::Tap { .. } | GameInput::Choose(_) | GameInput::Submit
        )
    }
}

/// Single-fire score slot shared between a game and its host.
#[derive(Debug, Default)]
pub struct ScoreSignal {
    score: Option<u32>,
    delivered: bool,
}

impl ScoreSignal {
    /// Records the final score.
    ///
    /// # Panics
    ///
    /// A game that reports twice has broken its lifecycle; the second call
    /// panics.
    pub fn resolve(&mut self, score: u32) {
        assert!(
            self.score.is_none(),
            "game session reported a second score ({score}) after {:?}",
            self.score
        );
        self.score = Some(score);
    }

    pub fn is_resolved(&self) -> bool {
        self.score.is_some()
    }

    pub fn score(&self) -> Option<u32> {
        self.score
    }

    /// Hands the score over once. Later calls return `None`.
    pub fn take(&mut self) -> Option<u32> {
        if self.delivered {
            return None;
        }
        let score = self.score?;
        self.delivered = true;
        Some(score)
    }
}

/// What a game sees on every callback.
pub struct SessionContext<'a> {
    pub audio: &'a mut AudioEngine,
    pub rng: &'a mut StdRng,
    now: Duration,
    signal: &'a mut ScoreSignal,
}

impl<'a> SessionContext<'a> {
    pub fn new(
        audio: &'a mut AudioEngine,
        rng: &'a mut StdRng,
        now: Duration,
        signal: &'a mut ScoreSignal,
    ) -> Self {
        Self {
            audio,
            rng,
            now,
            signal,
        }
    }

    /// Session time: zero at mount, advanced in fixed steps.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Reports the final score. Must be called exactly once per session.
    pub fn finish(&mut self, score: u32) {
        self.signal.resolve(score);
    }

    pub fn is_finished(&self) -> bool {
        self.signal.is_resolved()
    }
}

/// Pops the next timer due at the current session time, or nothing once the
/// game has reported.
pub fn next_due<E: Clone>(timers: &mut TimerQueue<E>, ctx: &SessionContext<'_>) -> Option<E> {
    if ctx.is_finished() {
        return None;
    }
    timers.pop_due(ctx.now()).map(|fired| fired.event)
}

/// The capability every mini-game implements.
pub trait Session {
    fn kind(&self) -> GameKind;

    /// Called once before the first update. Games start their timers here.
    fn mount(&mut self, _ctx: &mut SessionContext<'_>) -> Result<()> {
        Ok(())
    }

    /// One fixed simulation step of length `dt`; `ctx.now()` is already the
    /// time at the end of the step.
    fn update(&mut self, ctx: &mut SessionContext<'_>, dt: Duration);

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput);

    /// One-line human readable state for text front ends.
    fn status(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Mounted,
    Running,
    Reported,
    TornDown,
}

/// A mounted game plus the bookkeeping the host needs to enforce the
/// single-report lifecycle.
pub struct GameSession {
    kind: GameKind,
    game: Option<Box<dyn Session>>,
    signal: ScoreSignal,
    phase: SessionPhase,
    clock: PlaybackClock,
    accumulator: Duration,
    step: Duration,
    rng: StdRng,
    final_status: String,
}

impl GameSession {
    pub fn new(game: Box<dyn Session>, step: Duration, rng: StdRng) -> Self {
        Self {
            kind: game.kind(),
            game: Some(game),
            signal: ScoreSignal::default(),
            phase: SessionPhase::Mounted,
            clock: PlaybackClock::start(),
            accumulator: Duration::ZERO,
            step: step.max(Duration::from_millis(1)),
            rng,
            final_status: String::new(),
        }
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.now()
    }

    /// The reported score, once there is one.
    pub fn final_score(&self) -> Option<u32> {
        self.signal.score()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::TornDown
    }

    pub fn status(&self) -> String {
        match &self.game {
            Some(game) => game.status(),
            None => self.final_status.clone(),
        }
    }

    /// Runs the game's mount hook and moves it to `Running`.
    pub fn start(&mut self, audio: &mut AudioEngine) -> Result<Option<u32>> {
        if self.phase != SessionPhase::Mounted {
            return Ok(None);
        }
        if let Some(game) = self.game.as_mut() {
            let mut ctx =
                SessionContext::new(audio, &mut self.rng, self.clock.now(), &mut self.signal);
            game.mount(&mut ctx)?;
        }
        self.phase = SessionPhase::Running;
        tracing::info!(game = self.kind.id(), "game session running");
        Ok(self.settle())
    }

    /// Advances session time by `elapsed`, in fixed steps. Returns the score
    /// on the call during which the game reported.
    pub fn advance(&mut self, audio: &mut AudioEngine, elapsed: Duration) -> Option<u32> {
        if self.phase != SessionPhase::Running {
            return None;
        }

        self.accumulator += elapsed;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            self.clock.advance(self.step);

            let Some(game) = self.game.as_mut() else {
                break;
            };
            let mut ctx =
                SessionContext::new(audio, &mut self.rng, self.clock.now(), &mut self.signal);
            game.update(&mut ctx, self.step);

            if self.signal.is_resolved() {
                return self.settle();
            }
        }
        None
    }

    pub fn input(&mut self, audio: &mut AudioEngine, input: GameInput) -> Option<u32> {
        if self.phase != SessionPhase::Running {
            return None;
        }
        if let Some(game) = self.game.as_mut() {
            let mut ctx =
                SessionContext::new(audio, &mut self.rng, self.clock.now(), &mut self.signal);
            game.handle_input(&mut ctx, input);
        }
        self.settle()
    }

    /// Leaves without a report, e.g. through the hub's back button.
    pub fn abandon(&mut self) {
        if self.game.is_some() {
            tracing::info!(game = self.kind.id(), "game session abandoned");
            self.tear_down();
        }
    }

    fn settle(&mut self) -> Option<u32> {
        let score = self.signal.take()?;
        self.phase = SessionPhase::Reported;
        tracing::info!(game = self.kind.id(), score, "game reported score");
        self.tear_down();
        Some(score)
    }

    fn tear_down(&mut self) {
        if let Some(game) = self.game.take() {
            self.final_status = game.status();
        }
        self.phase = SessionPhase::TornDown;
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("kind", &self.kind)
            .field("phase", &self.phase)
            .field("elapsed", &self.clock.now())
            .field("score", &self.signal.score())
            .finish()
    }
}

/// Result of [`SessionHost::load_game`].
#[derive(Debug)]
pub enum Loaded {
    /// A running game, plus its score when it already reported while
    /// mounting. Such a session is torn down on arrival.
    Session(GameSession, Option<u32>),
    /// Locked or unknown entry; nothing runs and nothing will be reported.
    Placeholder,
}

impl Loaded {
    pub fn into_session(self) -> Option<GameSession> {
        match self {
            Loaded::Session(session, _) => Some(session),
            Loaded::Placeholder => None,
        }
    }
}
/// Turns a menu selection into a running game. It owns no game state.
pub struct SessionHost {
    step: Duration,
    rng: StdRng,
    trivia: Arc<dyn TriviaSource>,
    topic: String,
}

impl SessionHost {
    pub fn new(config: &SessionConfig, trivia: Arc<dyn TriviaSource>, topic: impl Into<String>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            step: Duration::from_millis(config.step_ms.max(1)),
            rng,
            trivia,
            topic: topic.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.session,
            trivia::source_from_config(&config.trivia),
            config.trivia.topic.clone(),
        )
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Builds and mounts the selected game.
    pub fn load_game(&mut self, selection: GameSelection, audio: &mut AudioEngine) -> Result<Loaded> {
        let kind = match selection {
            GameSelection::Playable(kind) => kind,
            GameSelection::Locked => {
                tracing::debug!("locked game selected, showing placeholder");
                return Ok(Loaded::Placeholder);
            }
        };

        self.mount(games::create(kind, &self.trivia, &self.topic), audio)
    }

    /// Wraps `game` in a session with its own seeded rng and starts it.
    pub fn mount(&mut self, game: Box<dyn Session>, audio: &mut AudioEngine) -> Result<Loaded> {
        let rng = StdRng::seed_from_u64(self.rng.gen());
        let mut session = GameSession::new(game, self.step, rng);
        let reported = session.start(audio)?;
        Ok(Loaded::Session(session, reported))
    }
}

impl std::fmt::Debug for SessionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHost")
            .field("step", &self.step)
            .field("topic", &self.topic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trivia::StaticTriviaSource;

    /// Finishes after a fixed delay, or right away on Submit.
    struct Countdown {
        timers: TimerQueue<()>,
        updates: u32,
    }

    impl Session for Countdown {
        fn kind(&self) -> GameKind {
            GameKind::Clicker
        }

        fn mount(&mut self, ctx: &mut SessionContext<'_>) -> Result<()> {
            self.timers
                .schedule_once(ctx.now(), Duration::from_millis(50), ());
            Ok(())
        }

        fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
            self.updates += 1;
            while next_due(&mut self.timers, ctx).is_some() {
                ctx.finish(self.updates);
            }
        }

        fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
            if input == GameInput::Submit {
                ctx.finish(999);
            }
        }

        fn status(&self) -> String {
            format!("updates {}", self.updates)
        }
    }

    fn session() -> GameSession {
        let game = Countdown {
            timers: TimerQueue::new(),
            updates: 0,
        };
        GameSession::new(
            Box::new(game),
            Duration::from_millis(10),
            StdRng::seed_from_u64(1),
        )
    }

    #[test]
    fn reports_once_at_terminal_condition() {
        let mut audio = AudioEngine::disabled();
        let mut session = session();
        session.start(&mut audio).unwrap();

        assert_eq!(session.advance(&mut audio, Duration::from_millis(40)), None);
        assert_eq!(session.phase(), SessionPhase::Running);
        assert_eq!(session.advance(&mut audio, Duration::from_millis(100)), Some(5));
        assert_eq!(session.phase(), SessionPhase::TornDown);
        assert_eq!(session.final_score(), Some(5));

        assert_eq!(session.advance(&mut audio, Duration::from_secs(1)), None);
        assert_eq!(session.input(&mut audio, GameInput::Submit), None);
        assert_eq!(session.status(), "updates 5");
    }

    #[test]
    fn partial_steps_accumulate() {
        let mut audio = AudioEngine::disabled();
        let mut session = session();
        session.start(&mut audio).unwrap();
        for _ in 0..9 {
            session.advance(&mut audio, Duration::from_millis(3));
        }
        assert_eq!(session.elapsed(), Duration::from_millis(20));
    }

    #[test]
    fn input_can_end_the_game() {
        let mut audio = AudioEngine::disabled();
        let mut session = session();
        session.start(&mut audio).unwrap();
        assert_eq!(session.input(&mut audio, GameInput::Submit), Some(999));
        assert!(session.is_finished());
    }

    #[test]
    fn abandoning_tears_down_without_score() {
        let mut audio = AudioEngine::disabled();
        let mut session = session();
        session.start(&mut audio).unwrap();
        session.abandon();

        assert!(session.is_finished());
        assert_eq!(session.final_score(), None);
        assert_eq!(session.advance(&mut audio, Duration::from_secs(1)), None);
    }

    #[test]
    #[should_panic(expected = "second score")]
    fn double_report_is_a_programming_error() {
        let mut signal = ScoreSignal::default();
        signal.resolve(10);
        signal.resolve(20);
    }

    #[test]
    fn signal_is_taken_once() {
        let mut signal = ScoreSignal::default();
        assert_eq!(signal.take(), None);
        signal.resolve(7);
        assert_eq!(signal.take(), Some(7));
        assert_eq!(signal.take(), None);
        assert_eq!(signal.score(), Some(7));
    }

    #[test]
    fn locked_selection_yields_placeholder() {
        let mut host = SessionHost::new(
            &SessionConfig::default(),
            Arc::new(StaticTriviaSource::new(Vec::new())),
            "General Knowledge",
        );
        let mut audio = AudioEngine::disabled();

        let loaded = host.load_game(GameSelection::Locked, &mut audio).unwrap();
        assert!(loaded.into_session().is_none());

        let loaded = host
            .load_game(GameSelection::Playable(GameKind::Whack), &mut audio)
            .unwrap();
        assert!(matches!(loaded, Loaded::Session(_, None)));
        let session = loaded.into_session().unwrap();
        assert_eq!(session.kind(), GameKind::Whack);
        assert_eq!(session.phase(), SessionPhase::Running);
    }

    /// Reports from its mount hook.
    struct ReportsOnMount;

    impl Session for ReportsOnMount {
        fn kind(&self) -> GameKind {
            GameKind::Breathing
        }

        fn mount(&mut self, ctx: &mut SessionContext<'_>) -> Result<()> {
            ctx.finish(15);
            Ok(())
        }

        fn update(&mut self, _ctx: &mut SessionContext<'_>, _dt: Duration) {}

        fn handle_input(&mut self, _ctx: &mut SessionContext<'_>, _input: GameInput) {}

        fn status(&self) -> String {
            "calm".to_string()
        }
    }

    #[test]
    fn score_reported_while_mounting_is_handed_back() {
        let mut host = SessionHost::new(
            &SessionConfig::default(),
            Arc::new(StaticTriviaSource::new(Vec::new())),
            "General Knowledge",
        );
        let mut audio = AudioEngine::disabled();

        let Loaded::Session(mut session, reported) =
            host.mount(Box::new(ReportsOnMount), &mut audio).unwrap()
        else {
            panic!("expected a session");
        };
        assert_eq!(reported, Some(15));
        assert!(session.is_finished());
        assert_eq!(session.status(), "calm");
        assert_eq!(session.input(&mut audio, GameInput::Submit), None);
    }

    enum Move {
        Press(GameInput),
        Wait(u64),
        /// Polls until background questions have arrived.
        AwaitQuestions,
        /// Flips two memory cards if both are face down, then lets them settle.
        FlipPair(usize, usize),
    }

    /// Inputs that play each game until its own rules end it.
    fn finishing_moves(kind: GameKind) -> Vec<Move> {
        use Move::{AwaitQuestions, FlipPair, Press, Wait};

        let repeat = |times: usize, round: fn() -> Vec<Move>| -> Vec<Move> {
            (0..times).flat_map(|_| round()).collect()
        };
        match kind {
            GameKind::Duel => vec![Wait(3_000), Press(GameInput::Exit)],
            GameKind::Sumo => repeat(20, || vec![Press(GameInput::Tap { player: 0 })])
                .into_iter()
                .chain([Wait(1_500)])
                .collect(),
            GameKind::TapWar => repeat(30, || vec![Press(GameInput::Tap { player: 0 })])
                .into_iter()
                .chain([Wait(1_500)])
                .collect(),
            GameKind::Soccer => vec![Press(GameInput::Submit), Wait(600_000)],
            GameKind::Racer => vec![Wait(600_000)],
            GameKind::Snake => vec![Press(GameInput::Steer(Direction::Left)), Wait(2_000)],
            GameKind::Maze => {
                use Direction::*;
                [
                    Right, Right, Down, Down, Right, Right, Right, Right, Right, Down, Down, Left,
                    Down, Down, Right,
                ]
                .into_iter()
                .map(|d| Press(GameInput::Steer(d)))
                .chain([Wait(500)])
                .collect()
            }
            GameKind::Memory => (0..16)
                .flat_map(|a| (a + 1..16).map(move |b| FlipPair(a, b)))
                .chain([Wait(2_000)])
                .collect(),
            GameKind::Simon => repeat(300, || vec![Wait(1_000), Press(GameInput::Choose(0))]),
            GameKind::GolYaPooch => repeat(6, || vec![Press(GameInput::Choose(0)), Wait(1_500)]),
            GameKind::Flags | GameKind::Capitals => {
                repeat(6, || vec![Press(GameInput::Choose(0)), Wait(500)])
            }
            GameKind::Trivia => std::iter::once(AwaitQuestions)
                .chain(repeat(5, || vec![Press(GameInput::Choose(0)), Wait(1_500)]))
                .collect(),
            GameKind::Reflex => repeat(5, || {
                vec![
                    Press(GameInput::Tap { player: 0 }),
                    Wait(5_000),
                    Press(GameInput::Tap { player: 0 }),
                ]
            })
            .into_iter()
            .chain([Wait(2_000)])
            .collect(),
            GameKind::TicTacToe => repeat(10, || {
                (0..9)
                    .map(|cell| Press(GameInput::Choose(cell)))
                    .chain([Wait(1_100)])
                    .collect()
            }),
            GameKind::Rps => repeat(5, || vec![Press(GameInput::Choose(0))])
                .into_iter()
                .chain([Wait(1_500)])
                .collect(),
            GameKind::Guess => (1..=100)
                .flat_map(|n: u32| {
                    n.to_string()
                        .chars()
                        .map(|c| Press(GameInput::Char(c)))
                        .chain([Press(GameInput::Submit)])
                        .collect::<Vec<_>>()
                })
                .chain([Wait(1_000)])
                .collect(),
            GameKind::Breathing => vec![Wait(8_000), Press(GameInput::Submit)],
            GameKind::Ninja
            | GameKind::Yalda
            | GameKind::Whack
            | GameKind::Math
            | GameKind::ColorMatch
            | GameKind::Clicker
            | GameKind::Typing
            | GameKind::OddOne => vec![Press(GameInput::Tap { player: 0 }), Wait(35_000)],
        }
    }

    fn play(session: &mut GameSession, audio: &mut AudioEngine, moves: Vec<Move>) -> Vec<u32> {
        let mut reports = Vec::new();
        for step in moves {
            match step {
                Move::Press(input) => reports.extend(session.input(audio, input)),
                Move::Wait(ms) => reports.extend(session.advance(audio, Duration::from_millis(ms))),
                Move::AwaitQuestions => {
                    for _ in 0..5_000 {
                        if !session.status().starts_with("loading") {
                            break;
                        }
                        std::thread::sleep(Duration::from_millis(1));
                        reports.extend(session.advance(audio, Duration::from_millis(10)));
                    }
                }
                Move::FlipPair(a, b) => {
                    let status = session.status();
                    let board: Vec<char> = status
                        .rsplit(" | ")
                        .next()
                        .unwrap_or_default()
                        .chars()
                        .filter(|c| !c.is_whitespace())
                        .collect();
                    if board.get(a) == Some(&'▢') && board.get(b) == Some(&'▢') {
                        reports.extend(session.input(audio, GameInput::Choose(a)));
                        reports.extend(session.input(audio, GameInput::Choose(b)));
                    }
                    reports.extend(session.advance(audio, Duration::from_millis(1_000)));
                }
            }
        }
        reports
    }

    #[test]
    fn every_game_reports_exactly_once() {
        let config = SessionConfig {
            seed: Some(21),
            ..SessionConfig::default()
        };
        let mut host = SessionHost::new(
            &config,
            Arc::new(crate::trivia::UnconfiguredSource),
            "General Knowledge",
        );
        let mut audio = AudioEngine::disabled();

        for kind in GameKind::ALL {
            let loaded = host
                .load_game(GameSelection::Playable(kind), &mut audio)
                .unwrap();
            let Loaded::Session(mut session, None) = loaded else {
                panic!("{kind} did not start cleanly");
            };
            assert_eq!(session.kind(), kind);

            let reports = play(&mut session, &mut audio, finishing_moves(kind));
            assert_eq!(reports.len(), 1, "{kind}: {reports:?}");
            assert!(session.is_finished(), "{kind}");
            assert_eq!(session.final_score(), Some(reports[0]));

            assert_eq!(session.advance(&mut audio, Duration::from_secs(5)), None);
            assert_eq!(session.input(&mut audio, GameInput::Exit), None);
        }
    }
}
