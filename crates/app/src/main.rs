mod terminal;

use std::{path::PathBuf, time::Duration};

use arcade_verse_core::{
    audio::{
        device::{AudioSink, MemorySink, WavSink},
        sequencer::tick_interval,
    },
    games::registry,
    AppConfig, ArcadeError, AudioEngine, GameSelection, Hub, ScoreBook, SpectralProbe, CHARACTERS,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Sequencer steps in one bar of the background loop.
const STEPS_PER_BAR: u32 = 16;

fn main() -> arcade_verse_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::List => run_list(&config),
        Commands::Play {
            game,
            character,
            seed,
        } => {
            if seed.is_some() {
                config.session.seed = seed;
            }
            run_play(&config, &game, character)
        }
        Commands::Music { seconds, out } => run_music(&config, seconds, &out),
        Commands::Scores => run_scores(&config),
        Commands::Characters => {
            for (index, character) in CHARACTERS.iter().enumerate() {
                println!("{:>2}  {} {}", index + 1, character.avatar, character.name);
            }
            Ok(())
        }
    }
}

fn run_list(config: &AppConfig) -> arcade_verse_core::Result<()> {
    let scores = ScoreBook::from_config(&config.scores)?;
    for game in registry() {
        let best = scores
            .best(game.kind)
            .map(|score| score.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:<14} {:<9} best {:>6}  {}",
            game.kind.id(),
            game.name,
            game.difficulty.to_string(),
            best,
            game.description
        );
    }
    Ok(())
}

fn run_play(config: &AppConfig, game: &str, character: usize) -> arcade_verse_core::Result<()> {
    let mut hub = Hub::from_config(config)?;
    if !hub.select_character(character.saturating_sub(1)) {
        return Err(ArcadeError::InvalidInput("character must be between 1 and 8"));
    }

    let selection = GameSelection::parse(game);
    if selection == GameSelection::Locked {
        println!("{game} is locked. Coming soon!");
        return hub.shutdown();
    }
    hub.select_game(selection)?;
    tracing::info!(game, "starting game");

    terminal::run(&mut hub)?;

    if let Some(path) = hub.scores().path() {
        tracing::info!(path = %path.display(), total = hub.scores().total(), "scores saved");
    }
    hub.shutdown()
}

/// Renders the background loop offline and logs a spectral summary per bar.
fn run_music(config: &AppConfig, seconds: f32, out: &PathBuf) -> arcade_verse_core::Result<()> {
    let length = render_length(seconds)?;
    tracing::info!(seconds, ?out, bpm = config.audio.bpm, "rendering background music");

    let (sink, capture) = MemorySink::new();
    let mut engine = AudioEngine::with_sink(&config.audio, Box::new(sink));
    engine.toggle_mute(false);
    engine.play_bg_music_start();
    engine.advance(length);
    engine.shutdown()?;

    let samples = capture.samples()?;
    let mut wav = WavSink::create(out, config.audio.sample_rate)?;
    wav.write(&samples)?;
    wav.finish()?;

    let bar = tick_interval(config.audio.bpm) * STEPS_PER_BAR;
    let bar_len = ((bar.as_secs_f64() * config.audio.sample_rate as f64) as usize).max(2);
    let mut probe = SpectralProbe::new(config.audio.sample_rate);
    for (index, chunk) in samples.chunks(bar_len).enumerate() {
        if chunk.len() < 2 {
            continue;
        }
        let summary = probe.summarize(chunk)?;
        tracing::info!(
            bar = index + 1,
            rms = summary.rms,
            peak = summary.peak,
            dominant_hz = summary.dominant_hz,
            centroid_hz = summary.centroid_hz,
            "bar summary"
        );
    }
    println!("wrote {} samples to {}", samples.len(), out.display());
    Ok(())
}

fn render_length(seconds: f32) -> arcade_verse_core::Result<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(ArcadeError::InvalidInput("seconds must be positive"));
    }
    Duration::try_from_secs_f32(seconds)
        .map_err(|_| ArcadeError::InvalidInput("seconds out of range"))
}

fn run_scores(config: &AppConfig) -> arcade_verse_core::Result<()> {
    let scores = ScoreBook::from_config(&config.scores)?;
    for record in scores.records() {
        println!("{:<12} {:>6}  {}", record.game_id, record.score, record.timestamp_millis);
    }
    println!("total {}", scores.total());
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Arcade hub with synthesized sound", long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show every game with its best score.
    List,
    /// Play one game in the terminal.
    Play {
        /// Game id as printed by `list`.
        game: String,
        /// Avatar number from `characters`.
        #[arg(long, default_value_t = 1)]
        character: usize,
        /// Seed for repeatable games.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Render the background loop into a WAV file.
    Music {
        #[arg(long, default_value_t = 8.0)]
        seconds: f32,
        #[arg(long, default_value = "music.wav")]
        out: PathBuf,
    },
    /// Print the stored best scores.
    Scores,
    /// List the selectable avatars.
    Characters,
}
