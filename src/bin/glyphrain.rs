use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use sha2::Digest as _;

#[derive(Parser, Debug)]
#[command(name = "glyphrain", version, about = "Render the digital-rain glyph animation")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the state after N ticks as a PNG.
    Frame(FrameArgs),
    /// Render every tick as a numbered PNG sequence.
    Frames(FramesArgs),
    /// Render an MP4 video (requires `ffmpeg` on PATH). Resized rain is letterboxed.
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Rain config JSON. Every field is optional.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the surface width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Override the surface height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Override the random seed (replays a previous run).
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to run (defaults to the config's `duration_ticks`).
    #[arg(long)]
    ticks: Option<u64>,

    /// Print diagnostics about glyph font resolution (family name + SHA-256 of font bytes).
    #[arg(long)]
    dump_fonts: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FramesArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output directory for `frame_NNNNNN.png` files.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Pace ticks at the configured period instead of rendering as fast as possible.
    #[arg(long)]
    realtime: bool,

    /// Overwrite the output file if it exists.
    #[arg(long)]
    overwrite: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Frames(args) => cmd_frames(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(common: &CommonArgs) -> anyhow::Result<(glyphrain::RainConfig, u64)> {
    let mut config = match &common.config {
        Some(path) => glyphrain::RainConfig::from_path(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => glyphrain::RainConfig::default(),
    };
    if let Some(w) = common.width {
        config.viewport.width = w;
    }
    if let Some(h) = common.height {
        config.viewport.height = h;
    }
    if common.seed.is_some() {
        config.seed = common.seed;
    }
    config.validate().context("invalid rain config")?;

    let ticks = common.ticks.unwrap_or(config.duration_ticks);
    Ok((config, ticks))
}

fn open_session(
    config: &glyphrain::RainConfig,
    dump_fonts: bool,
) -> anyhow::Result<glyphrain::RainSession> {
    let session = glyphrain::RainSession::new(config).context("create rain session")?;
    if dump_fonts {
        dump_font_diagnostics(config, session.font());
    }
    eprintln!("seed {}", session.seed());
    Ok(session)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (config, ticks) = load_config(&args.common)?;
    let mut session = open_session(&config, args.common.dump_fonts)?;

    let frame = session.advance(ticks).context("advance rain session")?;
    glyphrain::write_png(&args.out, frame, config.background)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let (config, ticks) = load_config(&args.common)?;
    let mut session = open_session(&config, args.common.dump_fonts)?;

    let mut sink = glyphrain::PngSequenceSink::new(glyphrain::PngSequenceOpts {
        dir: args.out_dir.clone(),
        bg: config.background,
    });
    let stats = session
        .run(&mut glyphrain::SteppedScheduler::new(ticks), &mut sink)
        .context("render png sequence")?;

    eprintln!(
        "wrote {} frames to {}",
        stats.ticks,
        args.out_dir.display()
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (config, ticks) = load_config(&args.common)?;
    let mut session = open_session(&config, args.common.dump_fonts)?;

    let mut sink = glyphrain::FfmpegSink::new(glyphrain::FfmpegSinkOpts {
        out_path: args.out.clone(),
        overwrite: args.overwrite,
        bg: config.background,
    });
    let mut scheduler: Box<dyn glyphrain::Scheduler> = if args.realtime {
        Box::new(glyphrain::IntervalScheduler::new(Some(ticks)))
    } else {
        Box::new(glyphrain::SteppedScheduler::new(ticks))
    };
    session
        .run(scheduler.as_mut(), &mut sink)
        .with_context(|| format!("render mp4 '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn dump_font_diagnostics(config: &glyphrain::RainConfig, font: Option<&glyphrain::MonospaceFont>) {
    eprintln!("glyph font diagnostics:");
    eprintln!("  font_source: {}", config.font);
    match font {
        Some(font) => {
            eprintln!("  family:      {}", font.family());
            eprintln!("  face_index:  {}", font.index());
            eprintln!("  sha256:      {}", sha256_hex(font.bytes()));
        }
        None => eprintln!("  family:      <none; glyphs disabled>"),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
