use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use parikshak_core::{
    ActivityEntry, ActivityLevel, ActivityLog, AnalysisRequest, AnalysisSession, AnalyzerConfig,
    FileReportStore, Reviewer, Role, format_report_readable, get_data_dir, provider::API_KEY_ENV,
};
use tokio::fs;
use tracing_subscriber::EnvFilter;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for Role (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliRole {
    Admin,
    Teacher,
    #[default]
    Student,
}

impl From<CliRole> for Role {
    fn from(cli: CliRole) -> Self {
        match cli {
            CliRole::Admin => Role::Admin,
            CliRole::Teacher => Role::Teacher,
            CliRole::Student => Role::Student,
        }
    }
}

#[derive(Parser)]
#[command(name = "parikshak")]
#[command(about = "Analyze a classroom recording and generate a pedagogical report")]
struct Cli {
    /// Audio or video recording of the class
    file: PathBuf,

    /// Reference syllabus text to compare the lecture against
    #[arg(long, conflicts_with = "reference_file")]
    reference: Option<String>,

    /// Read the reference syllabus from a text file
    #[arg(long)]
    reference_file: Option<PathBuf>,

    /// Attach a syllabus PDF as reference material
    #[arg(long)]
    reference_pdf: Option<PathBuf>,

    /// Teacher id; the report is saved and their rating updated when set
    #[arg(short, long)]
    teacher: Option<String>,

    /// Name recorded as the reviewer of this analysis
    #[arg(long)]
    reviewer: Option<String>,

    /// Role of the reviewer
    #[arg(long, default_value = "student")]
    role: CliRole,

    /// Emotion analysis server
    #[arg(long, env = "PARIKSHAK_SERVER_URL")]
    server_url: Option<String>,

    /// NDJSON landmark track used for video analysis
    #[arg(long)]
    landmarks: Option<PathBuf>,

    /// Print the report as JSON instead of markdown
    #[arg(long)]
    json: bool,

    /// Show debug logs from the pipeline
    #[arg(short, long)]
    verbose: bool,
}

fn create_spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")?,
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

fn print_entry(pb: &ProgressBar, entry: &ActivityEntry) {
    match entry.level {
        ActivityLevel::Info => pb.set_message(entry.message.clone()),
        ActivityLevel::Success => {
            pb.println(format!("{} {}", style("✓").green().bold(), entry.message))
        }
        ActivityLevel::Warning => {
            pb.println(format!("{} {}", style("!").yellow().bold(), entry.message))
        }
        ActivityLevel::Error => {
            pb.println(format!("{} {}", style("✗").red().bold(), entry.message))
        }
    }
}

async fn build_request(cli: &Cli) -> Result<AnalysisRequest> {
    let reference = match (&cli.reference, &cli.reference_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(
            fs::read_to_string(path)
                .await
                .with_context(|| format!("reading reference file {}", path.display()))?,
        ),
        (None, None) => None,
    };

    let reference_pdf = match &cli.reference_pdf {
        Some(path) => Some(
            fs::read(path)
                .await
                .with_context(|| format!("reading reference PDF {}", path.display()))?,
        ),
        None => None,
    };

    Ok(AnalysisRequest {
        media_path: cli.file.clone(),
        reference,
        reference_pdf,
        landmarks: cli.landmarks.clone(),
        teacher: cli.teacher.clone(),
        reviewer: Reviewer {
            name: cli.reviewer.clone(),
            role: cli.role.into(),
        },
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "warn,parikshak_core=debug"
    } else {
        "error"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AnalyzerConfig::from_env().with_server_url(cli.server_url.clone());
    let request = build_request(&cli).await?;

    println!(
        "\n{}  {}\n",
        style("parikshak").cyan().bold(),
        style("Classroom Analyzer").dim()
    );
    if config.provider.is_none() {
        println!(
            "{} {} is not set, the model evaluation will be skipped",
            style("!").yellow().bold(),
            API_KEY_ENV
        );
    }
    println!("{}", style("─".repeat(60)).dim());

    let total_start = Instant::now();
    let spinner = create_spinner("Preparing analysis...")?;
    let listener = spinner.clone();
    let log = ActivityLog::new().with_listener(move |entry| print_entry(&listener, entry));

    let session = AnalysisSession::new(config, log)
        .with_store(Arc::new(FileReportStore::new(get_data_dir())));
    let result = session.run(&request).await;
    spinner.finish_and_clear();

    let report = result?;
    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!("{}", style("─".repeat(60)).dim());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_report_readable(&report));
    }

    Ok(())
}
