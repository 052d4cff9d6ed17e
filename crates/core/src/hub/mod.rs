//! Screen routing for the arcade: character select, the game menu, the
//! running game and the result card. The hub owns the audio engine, the
//! score book and at most one game session.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{
    audio::AudioEngine,
    config::AppConfig,
    games::{GameKind, GameSelection},
    scores::ScoreBook,
    session::{GameInput, GameSession, Loaded, SessionHost},
    timeline::{PlaybackClock, TimerId, TimerQueue},
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Character {
    pub id: &'static str,
    pub name: &'static str,
    pub avatar: &'static str,
}

pub const CHARACTERS: [Character; 8] = [
    Character { id: "c1", name: "Cyber Fox", avatar: "🦊" },
    Character { id: "c2", name: "Neon Cat", avatar: "🐱" },
    Character { id: "c3", name: "Space Dog", avatar: "🐶" },
    Character { id: "c4", name: "Robo Bear", avatar: "🐻" },
    Character { id: "c5", name: "Dragon King", avatar: "🐲" },
    Character { id: "c6", name: "Ninja Panda", avatar: "🐼" },
    Character { id: "c7", name: "Magic Unicorn", avatar: "🦄" },
    Character { id: "c8", name: "Cool Tiger", avatar: "🐯" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    CharacterSelect,
    Menu,
    Game,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultSummary {
    pub game: GameKind,
    pub score: u32,
    /// The score matched or beat the previous best.
    pub is_best: bool,
}

#[derive(Debug, Clone, Copy)]
enum HubEvent {
    StartMusic,
}

/// Delay before the menu loop starts after entering the menu.
const MUSIC_START_DELAY: Duration = Duration::from_millis(100);

pub struct Hub {
    screen: Screen,
    character: Option<Character>,
    sound_enabled: bool,
    audio: AudioEngine,
    host: SessionHost,
    scores: ScoreBook,
    selected: Option<GameKind>,
    session: Option<GameSession>,
    result: Option<ResultSummary>,
    clock: PlaybackClock,
    timers: TimerQueue<HubEvent>,
    pending_music: Option<TimerId>,
}

impl Hub {
    pub fn new(audio: AudioEngine, host: SessionHost, scores: ScoreBook, sound_enabled: bool) -> Self {
        let mut hub = Self {
            screen: Screen::CharacterSelect,
            character: None,
            sound_enabled,
            audio,
            host,
            scores,
            selected: None,
            session: None,
            result: None,
            clock: PlaybackClock::start(),
            timers: TimerQueue::new(),
            pending_music: None,
        };
        hub.apply_music_policy();
        hub
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            AudioEngine::init(&config.audio),
            SessionHost::from_config(config),
            ScoreBook::from_config(&config.scores)?,
            !config.audio.muted,
        ))
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn character(&self) -> Option<&Character> {
        self.character.as_ref()
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn audio(&self) -> &AudioEngine {
        &self.audio
    }

    pub fn scores(&self) -> &ScoreBook {
        &self.scores
    }

    pub fn selected_game(&self) -> Option<GameKind> {
        self.selected
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// The last reported game, while the result card is showing.
    pub fn result(&self) -> Option<ResultSummary> {
        match self.screen {
            Screen::Result => self.result,
            _ => None,
        }
    }

    pub fn is_music_start_pending(&self) -> bool {
        self.pending_music.is_some()
    }

    /// Picks an avatar and opens the menu. Out-of-range indices are ignored.
    pub fn select_character(&mut self, index: usize) -> bool {
        let Some(character) = CHARACTERS.get(index).copied() else {
            return false;
        };
        self.character = Some(character);
        self.audio.play_click();
        self.set_screen(Screen::Menu);
        true
    }

    /// Back to the avatar picker.
    pub fn change_character(&mut self) {
        self.end_session();
        self.set_screen(Screen::CharacterSelect);
    }

    /// Starts the selected game. Locked tiles do nothing.
    pub fn select_game(&mut self, selection: GameSelection) -> Result<()> {
        let GameSelection::Playable(kind) = selection else {
            tracing::debug!("locked tile selected");
            return Ok(());
        };

        self.end_session();
        self.selected = Some(kind);
        self.result = None;
        self.audio.play_click();
        self.set_screen(Screen::Game);

        match self.host.load_game(selection, &mut self.audio) {
            Ok(loaded) => {
                self.install(loaded);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, game = kind.id(), "game failed to start");
                self.set_screen(Screen::Menu);
                Err(err)
            }
        }
    }

    /// Leaves the current screen for the menu, abandoning a running game
    /// without a score.
    pub fn back_to_menu(&mut self) {
        self.end_session();
        self.set_screen(Screen::Menu);
    }

    /// Plays the last game again from the result card.
    pub fn replay(&mut self) -> Result<()> {
        match (self.screen, self.selected) {
            (Screen::Result, Some(kind)) => self.select_game(GameSelection::Playable(kind)),
            _ => Ok(()),
        }
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
        self.apply_music_policy();
    }

    pub fn toggle_sound(&mut self) {
        self.set_sound_enabled(!self.sound_enabled);
    }

    /// Routes player input to the running game.
    pub fn input(&mut self, input: GameInput) {
        if self.screen != Screen::Game {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(score) = session.input(&mut self.audio, input) {
            self.on_report(score);
        }
    }

    /// Moves hub, game and audio time forward together.
    pub fn advance(&mut self, elapsed: Duration) {
        let target = self.clock.now() + elapsed;
        while let Some(fired) = self.timers.pop_due(target) {
            self.advance_world(fired.due.saturating_sub(self.clock.now()));
            self.clock.advance_to(fired.due);
            match fired.event {
                HubEvent::StartMusic => {
                    self.pending_music = None;
                    self.audio.play_bg_music_start();
                }
            }
        }
        self.advance_world(target.saturating_sub(self.clock.now()));
        self.clock.advance_to(target);
    }

    /// Drops any running game and closes the audio output.
    pub fn shutdown(&mut self) -> Result<()> {
        self.end_session();
        self.cancel_pending_music();
        self.audio.shutdown()
    }

    fn advance_world(&mut self, step: Duration) {
        if step.is_zero() {
            return;
        }
        let reported = match self.session.as_mut() {
            Some(session) => session.advance(&mut self.audio, step),
            None => None,
        };
        self.audio.advance(step);
        if let Some(score) = reported {
            self.on_report(score);
        }
    }

    fn install(&mut self, loaded: Loaded) {
        match loaded {
            Loaded::Session(session, Some(score)) => {
                self.session = Some(session);
                self.on_report(score);
            }
            loaded => self.session = loaded.into_session(),
        }
    }

    fn on_report(&mut self, score: u32) {
        self.session = None;
        let Some(game) = self.selected else {
            return;
        };

        let is_best = self.scores.best(game).unwrap_or(0) <= score;
        if let Err(err) = self.scores.submit(game, score, unix_millis()) {
            tracing::warn!(%err, game = game.id(), "could not save score");
        }
        self.result = Some(ResultSummary {
            game,
            score,
            is_best,
        });
        self.audio.play_win();
        self.set_screen(Screen::Result);
    }

    fn end_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.abandon();
        }
    }

    fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            tracing::debug!(from = ?self.screen, to = ?screen, "screen change");
        }
        self.screen = screen;
        self.apply_music_policy();
    }

    /// Mute follows the sound toggle, any playing loop stops, and the loop is
    /// queued again only on the menu with sound on.
    fn apply_music_policy(&mut self) {
        self.cancel_pending_music();
        self.audio.toggle_mute(!self.sound_enabled);
        self.audio.stop_music();

        if self.sound_enabled && self.screen == Screen::Menu {
            self.pending_music = Some(self.timers.schedule_once(
                self.clock.now(),
                MUSIC_START_DELAY,
                HubEvent::StartMusic,
            ));
        }
    }

    fn cancel_pending_music(&mut self) {
        if let Some(timer) = self.pending_music.take() {
            self.timers.cancel(timer);
        }
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("screen", &self.screen)
            .field("character", &self.character.map(|c| c.id))
            .field("sound_enabled", &self.sound_enabled)
            .field("selected", &self.selected)
            .field("session", &self.session)
            .finish()
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
