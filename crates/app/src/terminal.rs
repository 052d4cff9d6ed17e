use std::{
    io::{self, Stdout, Write},
    time::{Duration, Instant},
};

use arcade_verse_core::{Direction, GameInput, GameKind, Hub, Screen};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

const FRAME: Duration = Duration::from_millis(16);

struct TerminalGuard {
    stdout: Stdout,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, Hide)?;
        Ok(Self { stdout })
    }

    fn stdout(&mut self) -> &mut Stdout {
        &mut self.stdout
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

enum Command {
    Game(GameInput),
    Replay,
    ToggleSound,
    Leave,
}

/// Runs the hub's current game in the terminal until the player leaves.
/// Esc leaves, Enter on the result card plays again.
pub fn run(hub: &mut Hub) -> io::Result<()> {
    let mut guard = TerminalGuard::enter()?;
    let mut last = Instant::now();

    loop {
        if event::poll(FRAME)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Release {
                    match command_for(hub, key) {
                        Some(Command::Game(input)) => hub.input(input),
                        Some(Command::Replay) => {
                            if let Err(err) = hub.replay() {
                                tracing::warn!(%err, "replay failed");
                            }
                        }
                        Some(Command::ToggleSound) => hub.toggle_sound(),
                        Some(Command::Leave) => break,
                        None => {}
                    }
                }
            }
        }

        let now = Instant::now();
        hub.advance(now.duration_since(last));
        last = now;

        draw(guard.stdout(), hub)?;
        if matches!(hub.screen(), Screen::Menu | Screen::CharacterSelect) {
            break;
        }
    }

    hub.back_to_menu();
    Ok(())
}

fn command_for(hub: &Hub, key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Esc => return Some(Command::Leave),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(Command::Leave)
        }
        KeyCode::F(2) => return Some(Command::ToggleSound),
        _ => {}
    }

    match hub.screen() {
        Screen::Result => match key.code {
            KeyCode::Enter => Some(Command::Replay),
            _ => None,
        },
        Screen::Game => hub
            .selected_game()
            .and_then(|kind| map_key(kind, key.code))
            .map(Command::Game),
        Screen::Menu | Screen::CharacterSelect => None,
    }
}

/// Keyboard layout per game. Versus games split the keyboard into player
/// zones, board games number their cells, text games receive characters.
fn map_key(kind: GameKind, code: KeyCode) -> Option<GameInput> {
    let shared = match code {
        KeyCode::Left => Some(GameInput::Steer(Direction::Left)),
        KeyCode::Right => Some(GameInput::Steer(Direction::Right)),
        KeyCode::Up => Some(GameInput::Steer(Direction::Up)),
        KeyCode::Down => Some(GameInput::Steer(Direction::Down)),
        KeyCode::Enter => Some(GameInput::Submit),
        KeyCode::Backspace => Some(GameInput::Backspace),
        KeyCode::Tab => Some(GameInput::Exit),
        _ => None,
    };
    if shared.is_some() {
        return shared;
    }
    let KeyCode::Char(ch) = code else {
        return None;
    };

    match kind {
        GameKind::Duel | GameKind::Sumo | GameKind::TapWar => {
            let player = match ch {
                'z' | ' ' => 0,
                'm' => 1,
                'q' => 2,
                'p' => 3,
                _ => return None,
            };
            Some(GameInput::Tap { player })
        }
        GameKind::TicTacToe
        | GameKind::Whack
        | GameKind::Simon
        | GameKind::Racer
        | GameKind::Reflex
        | GameKind::Clicker
        | GameKind::Soccer
        | GameKind::GolYaPooch
        | GameKind::Yalda
        | GameKind::Flags
        | GameKind::Capitals => match ch.to_digit(10) {
            Some(digit) if digit > 0 => Some(GameInput::Choose(digit as usize - 1)),
            _ if ch == ' ' => Some(GameInput::Tap { player: 0 }),
            _ => None,
        },
        GameKind::Memory | GameKind::OddOne | GameKind::Ninja => ch
            .is_ascii_lowercase()
            .then(|| GameInput::Choose((ch as u8 - b'a') as usize)),
        GameKind::Maze => None,
        _ => Some(GameInput::Char(ch)),
    }
}

fn draw(stdout: &mut Stdout, hub: &Hub) -> io::Result<()> {
    let title = match (hub.character(), hub.selected_game()) {
        (Some(character), Some(kind)) => {
            format!("{} {}  playing {}", character.avatar, character.name, kind.name())
        }
        _ => "Arcade Verse".to_string(),
    };
    let body = match (hub.screen(), hub.session(), hub.result()) {
        (Screen::Result, _, Some(result)) => format!(
            "score {}{}  best {}",
            result.score,
            if result.is_best { "  NEW BEST!" } else { "" },
            hub.scores().best(result.game).unwrap_or(0),
        ),
        (_, Some(session), _) => session.status(),
        _ => String::new(),
    };
    let footer = match hub.screen() {
        Screen::Result => "Enter play again | Esc quit",
        _ => "Esc quit | Tab exit game | F2 sound",
    };

    queue!(
        stdout,
        MoveTo(0, 0),
        Clear(ClearType::All),
        Print(title),
        MoveTo(0, 2),
        Print(body),
        MoveTo(0, 4),
        Print(footer)
    )?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versus_keys_map_to_player_zones() {
        assert_eq!(
            map_key(GameKind::TapWar, KeyCode::Char('p')),
            Some(GameInput::Tap { player: 3 })
        );
        assert_eq!(map_key(GameKind::Duel, KeyCode::Char('x')), None);
    }

    #[test]
    fn board_games_number_cells_from_one() {
        assert_eq!(
            map_key(GameKind::TicTacToe, KeyCode::Char('1')),
            Some(GameInput::Choose(0))
        );
        assert_eq!(map_key(GameKind::TicTacToe, KeyCode::Char('0')), None);
        assert_eq!(
            map_key(GameKind::Memory, KeyCode::Char('p')),
            Some(GameInput::Choose(15))
        );
    }

    #[test]
    fn text_games_receive_characters() {
        assert_eq!(
            map_key(GameKind::Typing, KeyCode::Char('x')),
            Some(GameInput::Char('x'))
        );
        assert_eq!(map_key(GameKind::Guess, KeyCode::Enter), Some(GameInput::Submit));
        assert_eq!(map_key(GameKind::Duel, KeyCode::Tab), Some(GameInput::Exit));
    }

    #[test]
    fn geography_and_catch_games_take_numbers_and_arrows() {
        assert_eq!(
            map_key(GameKind::Capitals, KeyCode::Char('4')),
            Some(GameInput::Choose(3))
        );
        assert_eq!(
            map_key(GameKind::Soccer, KeyCode::Char(' ')),
            Some(GameInput::Tap { player: 0 })
        );
        assert_eq!(
            map_key(GameKind::Maze, KeyCode::Up),
            Some(GameInput::Steer(Direction::Up))
        );
        assert_eq!(map_key(GameKind::Maze, KeyCode::Char('w')), None);
        assert_eq!(
            map_key(GameKind::Ninja, KeyCode::Char('b')),
            Some(GameInput::Choose(1))
        );
    }
}
