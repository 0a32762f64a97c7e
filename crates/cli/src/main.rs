//! `waypoint`: render, replay and export agent answers from the terminal.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};
use waypoint_core::{
    RenderOptions, RevealController, RevealOptions, RevealPhase, RewriteOptions, TextExport,
};

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(version)]
#[command(about = "Render and replay travel-agent answers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the HTML of a markdown answer
    Render {
        /// Markdown file (default: stdin)
        file: Option<PathBuf>,

        /// Use the itinerary flavour (paragraph wrapping)
        #[arg(long)]
        itinerary: bool,

        /// Escape raw HTML instead of passing it through
        #[arg(long)]
        escape_html: bool,

        /// Add rel="noopener noreferrer" to links and drop <script> elements
        #[arg(long)]
        harden: bool,
    },
    /// Replay the line-by-line reveal of an answer
    Reveal {
        /// Markdown file (default: stdin)
        file: Option<PathBuf>,

        /// Milliseconds between lines (default: 20 for chat, 7 for itineraries)
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,

        #[arg(long)]
        itinerary: bool,

        /// Print every intermediate frame instead of only the last one
        #[arg(long)]
        frames: bool,
    },
    /// Write the plain-text download of an answer
    Export {
        file: PathBuf,

        #[arg(long)]
        itinerary: bool,

        /// Output path (default: message.txt or itinerary.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render {
            file,
            itinerary,
            escape_html,
            harden,
        } => {
            let source = read_source(file.as_deref())?;
            let options = RenderOptions {
                escape_html,
                ..render_options(itinerary)
            };
            let html = if harden {
                let rewrite = RewriteOptions {
                    harden_links: true,
                    strip_scripts: true,
                };
                waypoint_core::render_rewritten(&source, &options, rewrite)
                    .context("post-processing rendered HTML")?
            } else {
                waypoint_core::render(&source, &options)
            };
            println!("{html}");
        }
        Commands::Reveal {
            file,
            interval_ms,
            itinerary,
            frames,
        } => {
            let source = read_source(file.as_deref())?;
            let defaults = if itinerary {
                RevealOptions::itinerary()
            } else {
                RevealOptions::chat()
            };
            let options = match interval_ms {
                Some(ms) => RevealOptions::new(ms, defaults.render)?,
                None => defaults,
            };
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .context("starting the reveal runtime")?;
            runtime.block_on(replay(source, options, frames))?;
        }
        Commands::Export {
            file,
            itinerary,
            output,
        } => {
            let source = read_source(Some(&file))?;
            let export = if itinerary {
                TextExport::itinerary(&source)
            } else {
                TextExport::message(&source)
            };
            let path = output.unwrap_or_else(|| PathBuf::from(export.file_name));
            let out = fs::File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            export
                .write_to(io::BufWriter::new(out))
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "export written");
        }
    }

    Ok(())
}

async fn replay(source: String, options: RevealOptions, show_frames: bool) -> Result<()> {
    let controller = RevealController::start(source, options)?;
    let mut frames = controller.subscribe();
    let mut stdout = io::stdout().lock();

    loop {
        let frame = frames.borrow_and_update().clone();
        debug!(
            lines = frame.lines_revealed,
            total = frame.total_lines,
            phase = ?frame.phase,
            "frame"
        );
        if show_frames && frame.lines_revealed > 0 {
            writeln!(stdout, "--- {}/{}", frame.lines_revealed, frame.total_lines)?;
            writeln!(stdout, "{}", frame.html)?;
        }
        if frame.phase != RevealPhase::Streaming {
            if !show_frames {
                writeln!(stdout, "{}", frame.html)?;
            }
            return Ok(());
        }
        if frames.changed().await.is_err() {
            bail!("reveal stopped before completing");
        }
    }
}

fn render_options(itinerary: bool) -> RenderOptions {
    if itinerary {
        RenderOptions::itinerary()
    } else {
        RenderOptions::chat()
    }
}

fn read_source(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("reading stdin")?;
            Ok(source)
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn reveal_flags_parse() {
        let cli = Cli::try_parse_from(["waypoint", "reveal", "--itinerary", "--interval-ms", "5"])
            .unwrap();
        match cli.command {
            Commands::Reveal {
                interval_ms,
                itinerary,
                frames,
                file,
            } => {
                assert_eq!(interval_ms, Some(5));
                assert!(itinerary);
                assert!(!frames);
                assert!(file.is_none());
            }
            _ => panic!("expected reveal"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn replay_finishes_for_empty_and_multiline_sources() {
        replay(String::new(), RevealOptions::chat(), false).await.unwrap();
        replay("a\nb".into(), RevealOptions::chat(), true).await.unwrap();
    }
}
