//! # Vision Canvas CLI
//!
//! Usage:
//!   vision-canvas render "hello world" --width 4 --height 2 -o out/
//!   echo "long text" | vision-canvas check --width 2 --font-size 12
//!   vision-canvas render --from vision-canvas-4x2-1714564800000.png --font-size 10
//!   vision-canvas inspect vision-canvas-4x2-1714564800000.png

use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;
use vision_canvas::config::{EditorConfig, OverflowPolicy};
use vision_canvas::font::FontContext;
use vision_canvas::layout;
use vision_canvas::model::{CanvasSettings, SettingsUpdate};
use vision_canvas::png::embed;
use vision_canvas::session::{EditorSession, Export, Outcome};
use vision_canvas::Result;

#[derive(Parser)]
#[command(name = "vision-canvas", version, about = "Token-sized text canvases for vision models")]
struct Cli {
    /// Editor configuration (JSON)
    #[arg(long, global = true, env = "VISION_CANVAS_CONFIG")]
    config: Option<PathBuf>,

    /// Log layout and export details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render text to a PNG
    Render {
        #[command(flatten)]
        canvas: CanvasArgs,
        /// Leave the editing state out of the PNG
        #[arg(long)]
        no_metadata: bool,
        /// Output file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report how text lays out on a canvas
    Check {
        #[command(flatten)]
        canvas: CanvasArgs,
    },
    /// Print the editing state embedded in a PNG
    Inspect { png: PathBuf },
    /// Write the editing state as JSON
    ExportData {
        #[command(flatten)]
        canvas: CanvasArgs,
        /// Output file or directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CanvasArgs {
    /// Text to place on the canvas ("-" reads stdin)
    text: Option<String>,
    /// Start from an exported PNG or data JSON
    #[arg(long)]
    from: Option<PathBuf>,
    /// Canvas width in tokens (1-32)
    #[arg(long, allow_negative_numbers = true)]
    width: Option<i64>,
    /// Canvas height in tokens (1-32)
    #[arg(long, allow_negative_numbers = true)]
    height: Option<i64>,
    /// Font size in px (1-72)
    #[arg(long)]
    font_size: Option<f64>,
    /// Break anywhere instead of at spaces
    #[arg(long)]
    char_wrap: bool,
    /// Break at spaces (the default)
    #[arg(long, conflicts_with = "char_wrap")]
    word_wrap: bool,
    /// TrueType/OpenType face to measure and draw with
    #[arg(long)]
    font: Option<PathBuf>,
    /// Apply changes that overflow instead of rejecting them
    #[arg(long)]
    allow_overflow: bool,
}

impl CanvasArgs {
    fn update(&self) -> SettingsUpdate {
        let char_wrap = match (self.char_wrap, self.word_wrap) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        SettingsUpdate {
            width_tokens: self.width,
            height_tokens: self.height,
            font_size: self.font_size,
            char_wrap,
        }
    }

    fn text(&self) -> Result<Option<String>> {
        match self.text.as_deref() {
            Some("-") => read_stdin().map(Some),
            Some(text) => Ok(Some(text.to_string())),
            None if self.from.is_none() && !io::stdin().is_terminal() => read_stdin().map(Some),
            None => Ok(None),
        }
    }

    fn configure(&self, config: &mut EditorConfig) {
        if let Some(font) = &self.font {
            config.font_path = Some(font.clone());
        }
        if self.allow_overflow {
            config.overflow_policy = OverflowPolicy::Warn;
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("✗ {}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let from_env = std::env::var_os("RUST_LOG").is_some();
    if !verbose && !from_env {
        return;
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vision_canvas=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => EditorConfig::from_json_file(path)?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Command::Render {
            canvas,
            no_metadata,
            output,
        } => {
            canvas.configure(&mut config);
            if no_metadata {
                config.embed_metadata = false;
            }
            let glyphs = config.load_fonts()?;
            let (session, outcome) = build_session(&canvas, config, &glyphs)?;
            report(&session, outcome);
            let export = session.export_png(&glyphs, OffsetDateTime::now_utc())?;
            write_export(&export, output.as_deref())
        }
        Command::Check { canvas } => {
            canvas.configure(&mut config);
            let glyphs = config.load_fonts()?;
            check(&canvas, config, &glyphs)
        }
        Command::Inspect { png } => {
            let bytes = fs::read(&png)?;
            match embed::extract(&bytes)? {
                Some(document) => {
                    println!("{}", serde_json::to_string_pretty(&document)?);
                    Ok(())
                }
                None => {
                    eprintln!("✗ {} carries no canvas data", png.display());
                    process::exit(1);
                }
            }
        }
        Command::ExportData { canvas, output } => {
            canvas.configure(&mut config);
            let glyphs = config.load_fonts()?;
            let (session, outcome) = build_session(&canvas, config, &glyphs)?;
            report(&session, outcome);
            let export = session.export_data(OffsetDateTime::now_utc())?;
            write_export(&export, output.as_deref())
        }
    }
}

fn load_session(canvas: &CanvasArgs, config: EditorConfig) -> Result<EditorSession> {
    let Some(path) = &canvas.from else {
        return Ok(EditorSession::new(config));
    };
    let bytes = fs::read(path)?;
    if bytes.starts_with(&vision_canvas::png::PNG_SIGNATURE) {
        EditorSession::from_png(&bytes, config)
    } else {
        EditorSession::from_json(&String::from_utf8_lossy(&bytes), config)
    }
}

/// Apply the requested settings and text. When both are given the loaded
/// text is replaced, so only the final state is checked.
fn build_session(
    canvas: &CanvasArgs,
    config: EditorConfig,
    glyphs: &FontContext,
) -> Result<(EditorSession, Outcome)> {
    let mut session = load_session(canvas, config)?;
    let update = canvas.update();

    let Some(text) = canvas.text()? else {
        let outcome = if update.is_empty() {
            Outcome::Applied
        } else {
            session.update_settings(update, glyphs)
        };
        return Ok((session, outcome));
    };

    let settings = session.settings().merged(&update);
    let mut session = EditorSession::with_settings(settings, session.config().clone());
    let outcome = session.set_text(text, glyphs);
    Ok((session, outcome))
}

fn report(session: &EditorSession, outcome: Outcome) {
    match outcome {
        Outcome::Applied => {}
        Outcome::AppliedWithWarning => {
            if let Some(warning) = session.warning() {
                eprintln!("! {}", warning);
            }
        }
        Outcome::Rejected => {
            if let Some(warning) = session.warning() {
                eprintln!("✗ {}", warning);
            }
            process::exit(1);
        }
    }
}

fn check(canvas: &CanvasArgs, config: EditorConfig, glyphs: &FontContext) -> Result<()> {
    let session = load_session(canvas, config)?;
    let settings: CanvasSettings = session.settings().merged(&canvas.update());
    let text = match canvas.text()? {
        Some(text) => text,
        None => session.current_text().to_string(),
    };

    println!(
        "canvas:    {}×{} tokens ({}×{} px), {}px font, {} wrap",
        settings.width_tokens,
        settings.height_tokens,
        settings.canvas_width_px(),
        settings.canvas_height_px(),
        settings.font_size,
        if settings.char_wrap { "character" } else { "word" },
    );
    println!(
        "preview:   {}×{} px",
        settings.display_width_px(),
        settings.display_height_px()
    );

    let block = layout::measure_block(
        &text,
        settings.width_tokens,
        settings.height_tokens,
        settings.font_size,
        settings.char_wrap,
        glyphs,
    );
    let Some(block) = block else {
        eprintln!("✓ Nothing to measure, text fits");
        return Ok(());
    };

    println!("lines:     {}", block.line_count);
    println!("line:      {:.1} px", block.line_height);
    println!("height:    {:.1} / {:.1} px", block.total_height, block.available_height);

    if block.overflows() {
        eprintln!("✗ Text overflows by {:.1} px", block.overflow_px());
        process::exit(1);
    }
    eprintln!("✓ Text fits");
    Ok(())
}

fn write_export(export: &Export, output: Option<&Path>) -> Result<()> {
    let path = match output {
        Some(path) if path.is_dir() => path.join(&export.filename),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(&export.filename),
    };
    fs::write(&path, &export.bytes)?;
    eprintln!("✓ Written {} bytes to {}", export.bytes.len(), path.display());
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
