mod synth;

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use video_noise_core::{
    theme::PALETTES, EngineConfig, EngineSession, FrameRecorder, NullSink, QueuedFrameHost,
    RasterSurface, RecordingSettings, SourceHandle, SourceId, ThemeId, TickOutcome,
};

use crate::synth::TestSignal;

fn main() -> video_noise_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => run_render(args),
        Commands::Themes => {
            list_themes();
            Ok(())
        }
    }
}

fn run_render(args: RenderArgs) -> video_noise_core::Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let theme = args.theme.unwrap_or(config.theme);
    let sample_rate = config.audio.sample_rate;
    tracing::info!(%theme, frames = args.frames, fps = args.fps, out = ?args.out, "rendering");

    let mut session = EngineSession::new(
        config,
        RasterSurface::new(),
        QueuedFrameHost::new(),
        Box::new(NullSink),
    )?;
    session.resize_surface(args.width, args.height, args.density)?;
    session.select_theme(theme);
    if let Some(palette) = &args.palette {
        session.select_palette(palette);
    }
    session.attach_source(SourceHandle::new(SourceId::new(1), 2, sample_rate))?;

    let mut recorder = FrameRecorder::new(RecordingSettings {
        output_dir: args.out.clone(),
        fps: args.fps,
        ..RecordingSettings::default()
    })?;
    let mut signal = TestSignal::new(sample_rate, args.seed);
    let quantum = (sample_rate / args.fps).max(1) as usize;

    session.start();
    for frame in 0..args.frames {
        session.process_audio(&signal.next_block(quantum))?;

        let now = Duration::from_secs_f64(f64::from(frame) / f64::from(args.fps));
        match session.refresh(now)? {
            Some(TickOutcome::Drawn) => {
                recorder.capture(session.surface())?;
            }
            outcome => {
                tracing::warn!(frame, ?outcome, "frame loop ended early");
                break;
            }
        }
    }
    session.stop();

    tracing::info!(
        frames = recorder.frames_written(),
        dir = %recorder.output_dir().display(),
        "render complete"
    );
    Ok(())
}

fn list_themes() {
    println!("themes:");
    for id in ThemeId::ALL {
        println!("  {:<16} {}", id.as_str(), id.display_name());
    }
    println!("palettes:");
    for palette in PALETTES {
        println!("  {:<16} {}", palette.id, palette.name);
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

fn parse_theme(value: &str) -> Result<ThemeId, String> {
    value.parse().map_err(|err: video_noise_core::VideoNoiseError| err.to_string())
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-reactive visualiser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a synthetic test signal to a PNG frame sequence.
    Render(RenderArgs),
    /// List available themes and palettes.
    Themes,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Theme to draw; defaults to the config's theme.
    #[arg(short, long, value_parser = parse_theme)]
    theme: Option<ThemeId>,
    #[arg(short, long)]
    palette: Option<String>,
    #[arg(long, default_value_t = 120)]
    frames: u32,
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=240))]
    fps: u32,
    #[arg(long, default_value_t = 1280.0)]
    width: f32,
    #[arg(long, default_value_t = 720.0)]
    height: f32,
    /// Device pixel ratio of the output.
    #[arg(long, default_value_t = 1.0)]
    density: f32,
    /// Engine config JSON file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory the frames are written to.
    #[arg(short, long, default_value = "frames")]
    out: PathBuf,
    /// Seed for the hi-hat noise.
    #[arg(long, default_value_t = 1)]
    seed: u64,
}
