use std::time::Duration;

use rand::Rng;

use crate::{
    session::{next_due, GameInput, Session, SessionContext},
    timeline::{TimerId, TimerQueue},
};

use super::GameKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflexState {
    /// Press to arm the next round.
    Ready,
    /// Armed; pressing now is a false start.
    Waiting,
    Go { since: Duration },
    /// All rounds are in and the score is about to be reported.
    Finishing,
}

#[derive(Debug, Clone, Copy)]
enum ReflexEvent {
    Go,
    Report(u32),
}

/// Five timed reactions. The score is inversely proportional to the mean
/// reaction time: 100 000 / mean milliseconds.
#[derive(Debug)]
pub struct Reflex {
    state: ReflexState,
    attempts: u32,
    average_ms: f64,
    last_ms: Option<f64>,
    pending_go: Option<TimerId>,
    timers: TimerQueue<ReflexEvent>,
}

impl Reflex {
    pub const ROUNDS: u32 = 5;

    pub fn new() -> Self {
        Self {
            state: ReflexState::Ready,
            attempts: 0,
            average_ms: 0.0,
            last_ms: None,
            pending_go: None,
            timers: TimerQueue::new(),
        }
    }

    pub fn state(&self) -> ReflexState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn average_ms(&self) -> f64 {
        self.average_ms
    }

    fn press(&mut self, ctx: &mut SessionContext<'_>) {
        match self.state {
            ReflexState::Ready => {
                self.state = ReflexState::Waiting;
                let delay = Duration::from_millis(1_000 + ctx.rng.gen_range(0..3_000));
                self.pending_go = Some(self.timers.schedule_once(ctx.now(), delay, ReflexEvent::Go));
            }
            ReflexState::Waiting => {
                if let Some(timer) = self.pending_go.take() {
                    self.timers.cancel(timer);
                }
                ctx.audio.play_failure();
                self.state = ReflexState::Ready;
            }
            ReflexState::Go { since } => {
                let reaction = ctx.now().saturating_sub(since).as_secs_f64() * 1_000.0;
                ctx.audio.play_click();

                let total = self.average_ms * f64::from(self.attempts) + reaction;
                self.attempts += 1;
                self.average_ms = total / f64::from(self.attempts);
                self.last_ms = Some(reaction);

                if self.attempts >= Self::ROUNDS {
                    self.state = ReflexState::Finishing;
                    let score = (100_000.0 / self.average_ms.max(1.0)).round() as u32;
                    self.timers.schedule_once(
                        ctx.now(),
                        Duration::from_millis(1_500),
                        ReflexEvent::Report(score),
                    );
                } else {
                    self.state = ReflexState::Ready;
                }
            }
            ReflexState::Finishing => {}
        }
    }
}

impl Default for Reflex {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for Reflex {
    fn kind(&self) -> GameKind {
        GameKind::Reflex
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while let Some(event) = next_due(&mut self.timers, ctx) {
            match event {
                ReflexEvent::Go => {
                    self.pending_go = None;
                    self.state = ReflexState::Go { since: ctx.now() };
                }
                ReflexEvent::Report(score) => ctx.finish(score),
            }
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        if input.is_press() {
            self.press(ctx);
        }
    }

    fn status(&self) -> String {
        let prompt = match self.state {
            ReflexState::Ready => match self.last_ms {
                Some(ms) => format!("{}ms, press to go again", ms.round()),
                None => "press to start".to_string(),
            },
            ReflexState::Waiting => "wait for it...".to_string(),
            ReflexState::Go { .. } => "NOW!".to_string(),
            ReflexState::Finishing => "done".to_string(),
        };
        if self.attempts == 0 {
            return prompt;
        }
        format!(
            "{prompt} | average {}ms ({}/{})",
            self.average_ms.round(),
            self.attempts,
            Self::ROUNDS
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::{Driver, Harness};

    fn react(d: &mut Driver<Reflex>, after_ms: u64) {
        d.press(GameInput::Submit);
        while d.game.state() == ReflexState::Waiting {
            d.run_ms(10);
        }
        d.run_ms(after_ms);
        d.press(GameInput::Submit);
    }

    #[test]
    fn five_reactions_score_by_average() {
        let mut d = Driver::new(Reflex::new(), 4);
        for _ in 0..5 {
            react(&mut d, 250);
        }
        assert_eq!(d.game.state(), ReflexState::Finishing);
        assert!((d.game.average_ms() - 250.0).abs() < 1e-6);

        d.press(GameInput::Submit);
        d.run_ms(1_400);
        assert_eq!(d.score(), None);
        d.run_ms(100);
        assert_eq!(d.score(), Some(400));
    }

    #[test]
    fn false_start_cancels_the_round() {
        let mut d = Driver::new(Reflex::new(), 4);
        d.press(GameInput::Tap { player: 0 });
        assert_eq!(d.game.state(), ReflexState::Waiting);
        d.press(GameInput::Tap { player: 0 });
        assert_eq!(d.game.state(), ReflexState::Ready);

        d.run_ms(5_000);
        assert_eq!(d.game.state(), ReflexState::Ready);
        assert_eq!(d.game.attempts(), 0);
    }

    #[test]
    fn full_run_reports_once_through_a_session() {
        let mut h = Harness::new(Reflex::new(), 4);
        for _ in 0..5 {
            h.press(GameInput::Choose(0));
            h.run_ms(4_000);
            h.press(GameInput::Choose(0));
        }
        h.run_ms(1_500);
        assert!(h.score() > 0);
    }
}
