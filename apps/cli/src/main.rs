use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;
use workreport_core::{
    Config, FfmpegDecoder, GeminiClient, PipelineSettings, ReportError, ReportPipeline,
    load_config, summarize, timelapse,
};

use crate::progress::{CliProgress, create_spinner, format_duration};

mod progress;

#[derive(Parser)]
#[command(name = "workreport")]
#[command(about = "Turn screen recordings into illustrated work reports with a vision-language model")]
struct Cli {
    /// Config file (defaults to ./config.yml, then the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a sectioned report with screenshots from a recording
    Report {
        /// Screen recording to analyze
        video: PathBuf,

        /// Output directory (overrides report.output_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Skip screenshot extraction
        #[arg(long)]
        no_screenshots: bool,
    },

    /// Print a detailed summary of a recording
    Summarize {
        /// Screen recording to summarize
        video: PathBuf,
    },

    /// Convert every recording in a directory into a compact timelapse
    Timelapse {
        #[arg(short, long, default_value = "input")]
        input_dir: PathBuf,

        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), err);
    std::process::exit(1);
}

fn client_or_exit(config: &Config) -> GeminiClient {
    GeminiClient::from_env(config.request_timeout())
        .unwrap_or_else(|e| fail(ReportError::from(e)))
}

fn require_video(path: &Path) {
    if !path.exists() {
        fail(ReportError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
}

fn banner(subtitle: &str) {
    println!(
        "\n{}  {}\n",
        style("workreport").cyan().bold(),
        style(subtitle).dim()
    );
}

async fn run_report(
    mut config: Config,
    video: PathBuf,
    output_dir: Option<PathBuf>,
    no_screenshots: bool,
) -> Result<()> {
    if let Some(dir) = output_dir {
        config.report.output_dir = dir;
    }
    if no_screenshots {
        config.report.include_screenshots = false;
    }

    let client = client_or_exit(&config);
    require_video(&video);

    banner("Work Report");
    println!(
        "{} Models: {}",
        style("✓").green().bold(),
        style(config.models().join(" → ")).dim()
    );
    println!("{}", style("─".repeat(60)).dim());

    let total_start = Instant::now();
    let pipeline = ReportPipeline::new(client, FfmpegDecoder, PipelineSettings::from(&config));
    let mut progress = CliProgress::new();
    let summary = match pipeline.run(&video, &mut progress).await {
        Ok(summary) => summary,
        Err(e) => {
            progress.abandon();
            fail(e);
        }
    };

    println!("{}", style("─".repeat(60)).dim());
    if !summary.failed_sections.is_empty() {
        println!(
            "{} {} of {} sections failed: {:?}",
            style("!").yellow().bold(),
            summary.failed_sections.len(),
            summary.sections,
            summary.failed_sections
        );
    }
    println!(
        "\n{} {}",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!(
        "{} {}\n",
        style("Saved:").dim(),
        style(summary.report_path.display()).cyan()
    );
    Ok(())
}

async fn run_summarize(config: Config, video: PathBuf) -> Result<()> {
    let client = client_or_exit(&config);
    require_video(&video);

    banner("Video Summary");
    let spinner = create_spinner("Uploading and summarizing...");
    let step_start = Instant::now();
    let summary = match summarize(
        &client,
        &video,
        &config.models(),
        &config.report.language,
        config.poll_interval(),
    )
    .await
    {
        Ok(summary) => summary,
        Err(e) => {
            spinner.finish_and_clear();
            fail(e);
        }
    };
    spinner.finish_with_message(format!(
        "{} Summary generated {}",
        style("✓").green().bold(),
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    ));

    println!("{}", style("─".repeat(60)).dim());
    println!("{}", summary.trim());
    Ok(())
}

async fn run_timelapse(input_dir: PathBuf, output_dir: PathBuf) -> Result<()> {
    banner("Timelapse");
    let spinner = create_spinner(&format!("Converting videos in {}...", input_dir.display()));
    let (converted, failures) = timelapse::convert_dir(&input_dir, &output_dir).await?;
    spinner.finish_and_clear();

    if converted.is_empty() && failures.is_empty() {
        println!(
            "{} No input files found in {}",
            style("!").yellow().bold(),
            input_dir.display()
        );
        return Ok(());
    }
    for path in &converted {
        println!("{} {}", style("✓").green().bold(), path.display());
    }
    for err in &failures {
        println!("{} {}", style("✗").red().bold(), err);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref()).unwrap_or_else(|e| fail(e));

    match cli.command {
        Command::Report {
            video,
            output_dir,
            no_screenshots,
        } => run_report(config, video, output_dir, no_screenshots).await,
        Command::Summarize { video } => run_summarize(config, video).await,
        Command::Timelapse {
            input_dir,
            output_dir,
        } => run_timelapse(input_dir, output_dir).await,
    }
}
