use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use media_sorter_core::events::{Event, EventSink, JsonLinesSink, Tee};
use media_sorter_core::{LayoutOptions, OrganizeOptions};

#[derive(Parser)]
#[command(
    name = "media-sorter",
    version,
    about = "Copy photos and videos into dated folders, grouped by the app that made them"
)]
struct Cli {
    /// Directory to read media from (recursively)
    input: PathBuf,

    /// Root for all outputs: <output>/{year}/{month}/{day}, UnknownDate, Duplicates, NotSupported
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Template for dated files; placeholders {year}, {month} and {day}
    #[arg(long)]
    dated: Option<String>,

    /// Directory for media without a usable date
    #[arg(long)]
    unknown_date: Option<PathBuf>,

    /// Directory for files whose name was already taken at the destination
    #[arg(long)]
    duplicates: Option<PathBuf>,

    /// Directory for files no metadata reader understands
    #[arg(long)]
    not_supported: Option<PathBuf>,

    /// Append every event as one JSON object per line to this file
    #[arg(long)]
    event_log: Option<PathBuf>,
}

impl Cli {
    fn layout(&self) -> anyhow::Result<LayoutOptions> {
        let mut layout = match &self.output {
            Some(root) => LayoutOptions::under(root),
            None => match (&self.dated, &self.unknown_date, &self.duplicates, &self.not_supported) {
                (Some(dated), Some(unknown_date), Some(duplicates), Some(not_supported)) => {
                    LayoutOptions {
                        dated: dated.clone(),
                        unknown_date: unknown_date.clone(),
                        duplicates: duplicates.clone(),
                        not_supported: not_supported.clone(),
                    }
                }
                _ => anyhow::bail!(
                    "without --output, all of --dated, --unknown-date, --duplicates and --not-supported are required"
                ),
            },
        };

        if let Some(dated) = &self.dated {
            layout.dated = dated.clone();
        }
        if let Some(dir) = &self.unknown_date {
            layout.unknown_date = dir.clone();
        }
        if let Some(dir) = &self.duplicates {
            layout.duplicates = dir.clone();
        }
        if let Some(dir) = &self.not_supported {
            layout.not_supported = dir.clone();
        }
        Ok(layout)
    }
}

/// Drives the progress bar and prints everything else through `log`
/// without tearing the bar.
struct ConsoleSink {
    bar: ProgressBar,
}

/// Progress is drawn by the bar, so its log line is only shown at debug.
fn console_level(event: &Event) -> log::Level {
    match event {
        Event::Progress { .. } => log::Level::Debug,
        _ => event.level(),
    }
}

impl ConsoleSink {
    fn log(&self, event: &Event) {
        let level = console_level(event);
        if log::log_enabled!(target: "media_sorter", level) {
            self.bar
                .suspend(|| log::log!(target: "media_sorter", level, "{}", event));
        }
    }
}

impl EventSink for ConsoleSink {
    fn record(&self, event: &Event) {
        match event {
            Event::BatchStarted { files, .. } => self.bar.set_length(*files as u64),
            Event::Progress { processed, .. } => self.bar.set_position(*processed as u64),
            Event::BatchFinished { .. } => self.bar.finish_and_clear(),
            _ => {}
        }
        self.log(event);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let t_total = std::time::Instant::now();

    let options = OrganizeOptions {
        input: cli.input.clone(),
        layout: cli.layout()?,
    };

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} organizing files")
            .unwrap(),
    );
    let console = ConsoleSink { bar: bar.clone() };

    let sink: Box<dyn EventSink> = match &cli.event_log {
        Some(path) => {
            let log = JsonLinesSink::append(path)
                .with_context(|| format!("cannot open event log {}", path.display()))?;
            Box::new(Tee(console, log))
        }
        None => Box::new(console),
    };

    let result = media_sorter_core::organize(&options, sink.as_ref());
    bar.finish_and_clear();
    let summary = result?;

    eprintln!(
        "Done! {} files: {} dated, {} unknown date, {} duplicates, {} not supported, {} failed ({:.2}s)",
        summary.total,
        summary.dated,
        summary.unknown_date,
        summary.duplicates,
        summary.not_supported,
        summary.failed,
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}
