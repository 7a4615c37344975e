use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::application::{AppError, HealthStatus, Landing, MeetingService, SummaryReport};
use crate::domain::{format_amount, parse_rate, AttendeeEntry, CostTicker};
use crate::logging::init_logging;

/// Exit code for "go back to setup" style outcomes that are not failures of the tool.
const EXIT_REDIRECT: u8 = 2;

/// Tallymeet - Meeting Cost Ticker
#[derive(Parser)]
#[command(name = "tallymeet")]
#[command(about = "Track what a meeting costs while it runs")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "TALLYMEET_DB", default_value = "tallymeet.db")]
    pub database: String,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long, env = "TALLYMEET_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Enable verbose output (same as --log-level info)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Show where to go next: the running meeting or setup
    Open,

    /// Start a meeting
    Start {
        /// Attendees as NAME=RATE (e.g. "Alice=85" "Bob=62.5")
        attendees: Vec<String>,

        /// Attendee name (pairs with --rate in order)
        #[arg(long = "name")]
        names: Vec<String>,

        /// Hourly rate (pairs with --name in order)
        #[arg(long = "rate")]
        rates: Vec<String>,
    },

    /// Show the running cost of the active meeting
    Dashboard {
        /// Keep ticking until interrupted
        #[arg(short, long)]
        follow: bool,

        /// Seconds between ticks when following
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },

    /// Stop the active meeting and print its summary
    Stop {
        /// Only stop this meeting (repeating the call is harmless)
        #[arg(short, long)]
        meeting: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show duration and cost of a meeting
    Summary {
        /// Meeting ID
        id: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Liveness probe
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        let level = if self.verbose { "info" } else { self.log_level.as_str() };
        init_logging(level)?;

        let outcome = match self.command {
            Commands::Init => {
                MeetingService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
                Ok(())
            }
            Commands::Open => {
                let service = MeetingService::init(&self.database).await?;
                run_open_command(&service).await
            }
            Commands::Start {
                attendees,
                names,
                rates,
            } => {
                let service = MeetingService::init(&self.database).await?;
                run_start_command(&service, attendees, names, rates).await
            }
            Commands::Dashboard { follow, interval } => {
                let service = MeetingService::init(&self.database).await?;
                run_dashboard_command(&service, follow, interval).await
            }
            Commands::Stop { meeting, format } => {
                let service = MeetingService::init(&self.database).await?;
                run_stop_command(&service, meeting, format).await
            }
            Commands::Summary { id, format } => {
                let service = MeetingService::init(&self.database).await?;
                let meeting_id =
                    Uuid::parse_str(&id).context("Invalid meeting ID format (expected UUID)")?;
                let report = service.summary(meeting_id, Utc::now()).await?;
                print_summary(&report, format)
            }
            // No storage involved
            Commands::Health => {
                println!("{}", serde_json::to_string(&HealthStatus::ok())?);
                Ok(())
            }
        };

        redirect_or_fail(outcome)
    }
}

/// Turn recoverable ledger errors into a hint and a non-zero exit code;
/// everything else is a real failure.
fn redirect_or_fail(outcome: Result<()>) -> Result<ExitCode> {
    let err = match outcome {
        Ok(()) => return Ok(ExitCode::SUCCESS),
        Err(err) => err,
    };

    match err.downcast_ref::<AppError>() {
        Some(AppError::NoValidAttendees) => {
            eprintln!("{}", err);
            eprintln!("Nothing started. Run `tallymeet start NAME=RATE ...` with at least one named attendee.");
        }
        Some(AppError::NoActiveMeeting) => {
            eprintln!("No meeting is running. Start one with `tallymeet start NAME=RATE ...`.");
        }
        Some(AppError::MeetingAlreadyActive(id)) => {
            eprintln!("A meeting is already running ({}). See `tallymeet dashboard`.", id);
        }
        _ => return Err(err),
    }
    Ok(ExitCode::from(EXIT_REDIRECT))
}

/// Parse one `NAME=RATE` argument. The last `=` splits, so names may contain `=`.
pub fn parse_attendee_arg(arg: &str) -> Result<AttendeeEntry, AppError> {
    let (name, rate) = arg
        .rsplit_once('=')
        .ok_or_else(|| AppError::InvalidRate(format!("'{}' is not NAME=RATE", arg)))?;
    let hourly_rate =
        parse_rate(rate).map_err(|e| AppError::InvalidRate(format!("'{}': {}", arg, e)))?;
    Ok(AttendeeEntry::new(name, hourly_rate))
}

/// Zip parallel name and rate lists. Surplus items on either side are ignored.
pub fn zip_name_rate_lists(
    names: &[String],
    rates: &[String],
) -> Result<Vec<AttendeeEntry>, AppError> {
    names
        .iter()
        .zip(rates)
        .map(|(name, rate)| {
            let hourly_rate = parse_rate(rate)
                .map_err(|e| AppError::InvalidRate(format!("'{}' for {}: {}", rate, name, e)))?;
            Ok(AttendeeEntry::new(name.clone(), hourly_rate))
        })
        .collect()
}

async fn run_open_command(service: &MeetingService) -> Result<()> {
    match service.resolve_landing().await? {
        Landing::Dashboard { meeting_id } => println!("dashboard {}", meeting_id),
        Landing::Setup => println!("setup"),
    }
    Ok(())
}

async fn run_start_command(
    service: &MeetingService,
    attendees: Vec<String>,
    names: Vec<String>,
    rates: Vec<String>,
) -> Result<()> {
    let mut entries = attendees
        .iter()
        .map(|arg| parse_attendee_arg(arg))
        .collect::<Result<Vec<_>, _>>()?;
    entries.extend(zip_name_rate_lists(&names, &rates)?);

    let meeting = service.start_meeting(entries, Utc::now()).await?;

    println!("Started meeting {}", meeting.id);
    println!(
        "{} attendees, burning {}/h",
        meeting.attendee_count(),
        format_amount(meeting.total_hourly_rate())
    );
    Ok(())
}

async fn run_dashboard_command(service: &MeetingService, follow: bool, interval: u64) -> Result<()> {
    let view = service.live_cost(Utc::now()).await?;

    println!("Meeting {}", view.meeting.id);
    println!(
        "Started {}",
        view.live.start_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{:<24} {:>12}", "ATTENDEE", "RATE/H");
    println!("{}", "-".repeat(37));
    for attendee in &view.meeting.attendees {
        println!(
            "{:<24} {:>12}",
            truncate(&attendee.name, 24),
            format_amount(attendee.hourly_rate)
        );
    }
    println!("{}", "-".repeat(37));
    println!(
        "{:<24} {:>12}",
        "TOTAL",
        format_amount(view.live.total_hourly_rate)
    );
    println!();

    if !follow {
        println!(
            "Elapsed {}  Cost {}",
            view.live.elapsed_display(),
            format_amount(view.live.accrued_cost)
        );
        return Ok(());
    }

    // From here on the display is driven by the seed alone; storage is not read again.
    let ticker = CostTicker {
        start_time: view.live.start_time,
        total_hourly_rate: view.live.total_hourly_rate,
    };
    let mut ticks = tokio::time::interval(Duration::from_secs(interval));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            _ = ticks.tick() => {
                let live = ticker.at(Utc::now());
                write!(
                    stdout,
                    "\rElapsed {}  Cost {}",
                    live.elapsed_display(),
                    format_amount(live.accrued_cost)
                )?;
                stdout.flush()?;
            }
            _ = &mut ctrl_c => {
                writeln!(stdout)?;
                break;
            }
        }
    }
    Ok(())
}

async fn run_stop_command(
    service: &MeetingService,
    meeting: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let now = Utc::now();
    let meeting_id = match meeting {
        Some(id) => {
            let id = Uuid::parse_str(&id).context("Invalid meeting ID format (expected UUID)")?;
            service.stop_meeting_by_id(id, now).await?
        }
        None => service.stop_meeting(now).await?,
    };

    let report = service.summary(meeting_id, now).await?;
    print_summary(&report, format)
}

fn print_summary(report: &SummaryReport, format: OutputFormat) -> Result<()> {
    let summary = &report.summary;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record([
                "meeting_id",
                "start_time",
                "end_time",
                "duration",
                "duration_seconds",
                "attendee_count",
                "total_hourly_rate",
                "total_cost",
            ])?;
            writer.write_record([
                report.meeting.id.to_string(),
                report.meeting.start_time.to_rfc3339(),
                summary.ended_at.to_rfc3339(),
                summary.duration.clone(),
                summary.duration_seconds.to_string(),
                summary.attendee_count.to_string(),
                summary.total_hourly_rate.to_string(),
                format_amount(summary.total_cost),
            ])?;
            writer.flush()?;
        }
        OutputFormat::Table => {
            println!("Meeting Summary");
            println!("Meeting:   {}", report.meeting.id);
            println!(
                "Started:   {}",
                report.meeting.start_time.format("%Y-%m-%d %H:%M:%S UTC")
            );
            if summary.provisional {
                println!("Ended:     (still running)");
            } else {
                println!(
                    "Ended:     {}",
                    summary.ended_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
            println!();
            println!("Duration:  {:>15}", summary.duration);
            println!("Attendees: {:>15}", summary.attendee_count);
            println!("Rate/h:    {:>15}", format_amount(summary.total_hourly_rate));
            println!("{}", "-".repeat(26));
            println!("Cost:      {:>15}", format_amount(summary.total_cost));
        }
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
