//! Shared-screen multiplayer games. Players are numbered from zero.

use std::time::Duration;

use rand::Rng;

use crate::{
    audio::tone::Waveform,
    session::{next_due, GameInput, Session, SessionContext},
    timeline::TimerQueue,
};

use super::GameKind;

/// Pause on the winner banner before the score is reported.
const CELEBRATION: Duration = Duration::from_millis(1_500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelState {
    Waiting,
    Ready,
    Go,
    Ended { winner: usize },
}

#[derive(Debug, Clone, Copy)]
enum DuelEvent {
    Ready,
    Go,
    NextRound,
}

/// Quick draw: the first player to tap after the signal wins the round.
/// Rounds repeat until a player exits; the best player's wins are scored.
#[derive(Debug)]
pub struct Duel {
    state: DuelState,
    scores: [u32; 2],
    timers: TimerQueue<DuelEvent>,
}

impl Duel {
    pub fn new() -> Self {
        Self {
            state: DuelState::Waiting,
            scores: [0; 2],
            timers: TimerQueue::new(),
        }
    }

    pub fn state(&self) -> DuelState {
        self.state
    }

    pub fn scores(&self) -> [u32; 2] {
        self.scores
    }

    fn start_round(&mut self, ctx: &SessionContext<'_>) {
        self.state = DuelState::Waiting;
        self.timers
            .schedule_once(ctx.now(), Duration::from_millis(1_000), DuelEvent::Ready);
    }

    fn fire(&mut self, ctx: &mut SessionContext<'_>, event: DuelEvent) {
        match event {
            DuelEvent::Ready => {
                self.state = DuelState::Ready;
                let delay = 1_000 + ctx.rng.gen_range(0..3_000);
                self.timers
                    .schedule_once(ctx.now(), Duration::from_millis(delay), DuelEvent::Go);
            }
            DuelEvent::Go => {
                self.state = DuelState::Go;
                ctx.audio.play_tone(600.0, Waveform::Square, 0.2, 0.1);
            }
            DuelEvent::NextRound => self.start_round(ctx),
        }
    }
}

impl Default for Duel {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for Duel {
    fn kind(&self) -> GameKind {
        GameKind::Duel
    }

    fn mount(&mut self, ctx: &mut SessionContext<'_>) -> crate::Result<()> {
        self.start_round(ctx);
        Ok(())
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        while let Some(event) = next_due(&mut self.timers, ctx) {
            self.fire(ctx, event);
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        match input {
            GameInput::Tap { player } if player < 2 => {
                // Early taps are ignored.
                if self.state != DuelState::Go {
                    return;
                }
                self.state = DuelState::Ended { winner: player };
                self.scores[player] += 1;
                ctx.audio.play_success();
                self.timers.schedule_once(
                    ctx.now(),
                    Duration::from_millis(2_000),
                    DuelEvent::NextRound,
                );
            }
            GameInput::Exit => {
                let best = self.scores.into_iter().max().unwrap_or(0);
                ctx.finish(best * 100);
            }
            _ => {}
        }
    }

    fn status(&self) -> String {
        let signal = match self.state {
            DuelState::Waiting => "...".to_string(),
            DuelState::Ready => "ready".to_string(),
            DuelState::Go => "FIRE!".to_string(),
            DuelState::Ended { winner } => format!("player {} wins the round", winner + 1),
        };
        format!(
            "P1 {} | {} | P2 {}",
            self.scores[0], signal, self.scores[1]
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Celebrated;

/// Tug of taps. Player 0 pushes the marker toward 0, player 1 toward 100.
#[derive(Debug)]
pub struct Sumo {
    position: i32,
    winner: Option<usize>,
    timers: TimerQueue<Celebrated>,
}

impl Sumo {
    const PUSH: i32 = 4;

    pub fn new() -> Self {
        Self {
            position: 50,
            winner: None,
            timers: TimerQueue::new(),
        }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn winner(&self) -> Option<usize> {
        self.winner
    }
}

impl Default for Sumo {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for Sumo {
    fn kind(&self) -> GameKind {
        GameKind::Sumo
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        if next_due(&mut self.timers, ctx).is_some() {
            ctx.finish(100);
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        match input {
            GameInput::Tap { player } if player < 2 => {
                if self.winner.is_some() {
                    return;
                }
                let frequency = 100.0 + self.position as f32 * 2.0;
                let moved = if player == 0 {
                    self.position - Self::PUSH
                } else {
                    self.position + Self::PUSH
                };
                if moved <= 0 {
                    self.winner = Some(0);
                } else if moved >= 100 {
                    self.winner = Some(1);
                }
                self.position = moved.clamp(0, 100);
                ctx.audio.play_tone(frequency, Waveform::Sawtooth, 0.05, 0.1);

                if self.winner.is_some() {
                    self.timers.schedule_once(ctx.now(), CELEBRATION, Celebrated);
                }
            }
            GameInput::Exit => ctx.finish(100),
            _ => {}
        }
    }

    fn status(&self) -> String {
        match self.winner {
            Some(winner) => format!("player {} pushed through!", winner + 1),
            None => format!("ring position {}/100", self.position),
        }
    }
}

/// Four players fight for share: a tap gains three points and costs every
/// other player one. Passing 90 wins.
#[derive(Debug)]
pub struct TapWar {
    shares: [i32; 4],
    winner: Option<usize>,
    timers: TimerQueue<Celebrated>,
}

impl TapWar {
    pub fn new() -> Self {
        Self {
            shares: [25; 4],
            winner: None,
            timers: TimerQueue::new(),
        }
    }

    pub fn shares(&self) -> [i32; 4] {
        self.shares
    }

    pub fn winner(&self) -> Option<usize> {
        self.winner
    }
}

impl Default for TapWar {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for TapWar {
    fn kind(&self) -> GameKind {
        GameKind::TapWar
    }

    fn update(&mut self, ctx: &mut SessionContext<'_>, _dt: Duration) {
        if next_due(&mut self.timers, ctx).is_some() {
            ctx.finish(100);
        }
    }

    fn handle_input(&mut self, ctx: &mut SessionContext<'_>, input: GameInput) {
        match input {
            GameInput::Tap { player } if player < 4 => {
                if self.winner.is_some() {
                    return;
                }
                for (index, share) in self.shares.iter_mut().enumerate() {
                    if index == player {
                        *share += 3;
                    } else {
                        *share -= 1;
                    }
                }
                if self.shares[player] > 90 {
                    self.winner = Some(player);
                    self.timers.schedule_once(ctx.now(), CELEBRATION, Celebrated);
                }
                ctx.audio
                    .play_tone(200.0 + player as f32 * 100.0, Waveform::Sine, 0.05, 0.1);
            }
            GameInput::Exit => {
                let score = if self.winner.is_some() { 100 } else { 0 };
                ctx.finish(score);
            }
            _ => {}
        }
    }

    fn status(&self) -> String {
        const LABELS: [&str; 4] = ["red", "blue", "green", "yellow"];
        if let Some(winner) = self.winner {
            return format!("{} wins!", LABELS[winner]);
        }
        LABELS
            .iter()
            .zip(self.shares)
            .map(|(label, share)| format!("{label} {}%", share.max(0)))
            .collect::<Vec<_>>()
            .join("  ")
    }
}
