use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dw_config::{
    JsonFileStore, ResolvedSecrets, Settings, StateStore, DEFAULT_STATE_PATH, ENV_STATE_PATH,
};
use dw_core::{parse_date, DateType, Record, WorkWeek};
use dw_runtime::{
    cycle_and_save, Clock, HttpProviders, ReconcileContext, SystemClock, TracingReporter,
};

#[derive(Parser)]
#[command(name = "dw")]
#[command(about = "daywatch: holidays, events and working days", long_about = None)]
struct Cli {
    /// State file
    #[arg(long, global = true, env = ENV_STATE_PATH, default_value = DEFAULT_STATE_PATH)]
    state: PathBuf,

    /// Print JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Evaluate as if today were this date (YYYY-MM-DD)
    #[arg(long, global = true, value_parser = parse_day, hide = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print today's facts
    Today,

    /// Print the special-days list in canonical order
    List,

    /// Add a special day
    Add {
        #[arg(long, value_parser = parse_day)]
        date: NaiveDate,

        /// holiday | working | event | event-annual
        #[arg(long = "type", value_parser = parse_type)]
        date_type: DateType,

        #[arg(long)]
        reason: Option<String>,

        #[arg(long)]
        tag: Option<String>,
    },

    /// Remove special days on a date
    Remove {
        #[arg(long, value_parser = parse_day)]
        date: NaiveDate,

        /// Only remove records of this type
        #[arg(long = "type", value_parser = parse_type)]
        date_type: Option<DateType>,
    },

    /// Rewrite the stored list in canonical form
    Normalize,

    /// Run one reconciliation cycle, fetching from the provider if due
    Sync {
        /// Fetch even if the provider was already queried today
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Show or set the working days
    WorkWeek {
        /// Comma separated day names, e.g. mon,tue,wed,thu,fri
        #[arg(long)]
        days: Option<String>,
    },

    /// Show or change the holiday provider settings
    Provider {
        /// date.nager.at | calendarific.com | holidays.abstractapi.com | none
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        country: Option<String>,

        #[arg(long)]
        region: Option<String>,

        /// Stored in the state file; prefer DW_PROVIDER_KEY
        #[arg(long)]
        key: Option<String>,
    },
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

fn parse_type(s: &str) -> Result<DateType, String> {
    s.parse::<DateType>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();
    let today = match cli.today {
        Some(d) => d,
        None => SystemClock.today(),
    };

    let store = JsonFileStore::new(&cli.state);
    let loaded = store
        .load()
        .with_context(|| format!("failed to load {}", store.describe()))?;
    let upgraded = loaded.is_dirty() && !loaded.created;
    let mut ctx = ReconcileContext::new(loaded.snapshot);

    let changed = match cli.cmd {
        Commands::Today => {
            let facts = ctx.facts(today);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&facts)?);
            } else {
                println!("date={today}");
                println!("is_holiday={}", facts.is_holiday);
                println!("is_working_day={}", facts.is_working_day);
                println!("reason={}", facts.reason);
                println!("tag={}", facts.tag);
                println!("source={}", facts.source);
            }
            false
        }

        Commands::List => {
            let mut view = ctx.clone();
            view.normalize(today);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(view.records())?);
            } else {
                for r in view.records() {
                    println!("{r}");
                }
            }
            false
        }

        Commands::Add {
            date,
            date_type,
            reason,
            tag,
        } => {
            let mut record = Record::new(date, date_type);
            if let Some(reason) = reason {
                record = record.with_reason(reason);
            }
            if let Some(tag) = tag {
                record = record.with_tag(tag);
            }
            if date < today && date_type != DateType::EventAnnual {
                eprintln!("warning: {date} is in the past and will be dropped");
            }
            let changed = ctx.add_record(record, today);
            println!("added={changed}");
            changed
        }

        Commands::Remove { date, date_type } => {
            let removed = ctx.remove_records(date, date_type);
            println!("removed={removed}");
            removed > 0
        }

        Commands::Normalize => {
            let changed = ctx.normalize(today);
            println!("changed={changed} len={}", ctx.records().len());
            changed
        }

        Commands::Sync { force } => {
            let settings = Settings::from_env()?;
            ctx = ctx
                .with_secrets(ResolvedSecrets::from_env())
                .with_fetch_timeout(settings.fetch_timeout);
            if force {
                ctx.force_fetch();
            }
            let report = cycle_and_save(
                &mut ctx,
                today,
                &HttpProviders::default(),
                &TracingReporter,
                &store,
            )
            .await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "fetched={} dirty={} status={}",
                    report.fetched,
                    report.dirty,
                    report.status.as_deref().unwrap_or("-")
                );
                if let Some(m) = &report.merge {
                    println!(
                        "inserted={} updated={} deleted={} skipped_manual={}",
                        m.inserted, m.updated, m.deleted, m.skipped_manual
                    );
                }
                if let Some(fault) = &report.fault {
                    println!("fault={fault}");
                }
                println!(
                    "today: is_holiday={} is_working_day={} reason={}",
                    report.facts.is_holiday, report.facts.is_working_day, report.facts.reason
                );
            }
            // Already saved.
            false
        }

        Commands::WorkWeek { days } => {
            let changed = match days {
                Some(days) => {
                    let ww = WorkWeek::from_days(&days).map_err(anyhow::Error::msg)?;
                    ctx.set_work_week(ww)
                }
                None => false,
            };
            println!("work_week={}", ctx.work_week().to_days());
            changed
        }

        Commands::Provider {
            name,
            country,
            region,
            key,
        } => {
            let before = ctx.api().clone();
            let api = &mut ctx.snapshot.api;
            if let Some(v) = name {
                api.provider = v;
            }
            if let Some(v) = country {
                api.country = v;
            }
            if let Some(v) = region {
                api.region = v;
            }
            if let Some(v) = key {
                api.key = v;
            }
            let changed = *api != before;
            if changed {
                // New settings: fetch on the next cycle and drop the stale status.
                api.status.clear();
                ctx.force_fetch();
            }
            println!("{:?}", ctx.api());
            changed
        }
    };

    if changed || upgraded {
        store
            .save(&ctx.snapshot)
            .with_context(|| format!("failed to save {}", store.describe()))?;
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
