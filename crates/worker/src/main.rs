use anyhow::Context;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkforge_core::config::Settings;
use linkforge_core::domain::profile::{Address, RiskLevel, UserRiskProfile};
use linkforge_core::engine::{CycleOutcome, Engine};

mod offline;

/// Each node hits both public upstreams, so fan-out is capped.
const MAX_NODES: i64 = 31;

#[derive(Debug, Parser)]
#[command(name = "linkforge_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one recommendation cycle and print the JSON result.
    Simulate {
        /// Profile owner (0x...). Defaults to USER_ADDRESS.
        #[arg(long)]
        user: Option<String>,

        /// Skip the profile read and use this risk level (LOW, MEDIUM, HIGH or 0..=2).
        #[arg(long)]
        risk_level: Option<String>,

        /// Independent fetches to median, as an oracle network would.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=MAX_NODES))]
        nodes: u8,

        /// Print only the 0x-prefixed ABI encoding.
        #[arg(long)]
        encode: bool,

        /// Print the market summary to stderr.
        #[arg(long)]
        explain: bool,
    },

    /// Run a cycle on a fixed interval until interrupted.
    Schedule {
        /// Defaults to SCHEDULE_SECS (300).
        #[arg(long)]
        every_secs: Option<u64>,

        #[arg(long)]
        user: Option<String>,
    },

    /// Score raw readings without touching the network.
    Evaluate {
        /// Fear/greed index, 0..=100.
        #[arg(long)]
        fear_greed: f64,

        /// 24h percentage change of one reference asset; repeatable.
        #[arg(long = "change", allow_negative_numbers = true)]
        changes: Vec<f64>,

        #[arg(long, default_value = "MEDIUM")]
        risk_level: String,

        #[arg(long)]
        encode: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let res = run(args.command, &settings).await;
    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
    }
    res
}

async fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Command::Simulate {
            user,
            risk_level,
            nodes,
            encode,
            explain,
        } => {
            let engine = Engine::from_settings(settings)?;
            let user = resolve_user(user.as_deref(), settings)?;
            let nodes = usize::from(nodes);

            let outcome = match risk_level.as_deref() {
                Some(level) => {
                    let profile = UserRiskProfile::with_risk_level(level.parse::<RiskLevel>()?);
                    if nodes > 1 {
                        engine
                            .run_consensus_cycle_with_profile(&user, profile, nodes)
                            .await?
                    } else {
                        engine.run_cycle_with_profile(&user, profile).await
                    }
                }
                None if nodes > 1 => engine.run_consensus_cycle(&user, nodes).await?,
                None => engine.run_cycle(&user).await?,
            };

            print_outcome(&outcome, encode, explain)
        }
        Command::Schedule { every_secs, user } => {
            let engine = Engine::from_settings(settings)?;
            let user = resolve_user(user.as_deref(), settings)?;
            let every = Duration::from_secs(every_secs.unwrap_or_else(|| settings.schedule_secs()));
            run_schedule(&engine, &user, every).await
        }
        Command::Evaluate {
            fear_greed,
            changes,
            risk_level,
            encode,
        } => {
            let config = settings.engine_config()?;
            let level = risk_level.parse::<RiskLevel>()?;
            let outcome = offline::evaluate_raw(fear_greed, &changes, level, &config);
            print_outcome(&outcome, encode, false)
        }
    }
}

fn resolve_user(arg: Option<&str>, settings: &Settings) -> anyhow::Result<Address> {
    match arg {
        Some(s) => s.parse::<Address>().context("--user is invalid"),
        None => settings.user_address(),
    }
}

fn print_outcome(outcome: &CycleOutcome, encode: bool, explain: bool) -> anyhow::Result<()> {
    if explain {
        eprintln!("{}", outcome.explain());
    }

    if encode {
        println!("{}", outcome.report().encoded);
    } else {
        let json = serde_json::to_string_pretty(&outcome.report())
            .context("failed to serialize recommendation")?;
        println!("{json}");
    }
    Ok(())
}

async fn run_schedule(engine: &Engine, user: &Address, every: Duration) -> anyhow::Result<()> {
    anyhow::ensure!(!every.is_zero(), "schedule interval must be positive");

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::info!(%user, every_secs = every.as_secs(), "scheduler started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match engine.run_cycle(user).await {
                    Ok(outcome) => {
                        tracing::debug!(encoded = %outcome.report().encoded, "cycle result");
                    }
                    Err(err) => {
                        // The next tick retries from scratch.
                        sentry_anyhow::capture_anyhow(&err);
                        tracing::error!(%user, error = %err, "scheduled cycle failed");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("scheduler stopping");
                return Ok(());
            }
        }
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("linkforge_worker").chain(args.iter().copied()))
    }

    #[test]
    fn node_count_is_bounded() {
        assert!(parse(&["simulate", "--nodes", "0"]).is_err());
        assert!(parse(&["simulate", "--nodes", "32"]).is_err());
        assert!(parse(&["simulate", "--nodes", "1000000"]).is_err());

        match parse(&["simulate", "--nodes", "31"]).unwrap().command {
            Command::Simulate { nodes, .. } => assert_eq!(nodes, 31),
            other => panic!("unexpected command: {other:?}"),
        }
        match parse(&["simulate"]).unwrap().command {
            Command::Simulate { nodes, .. } => assert_eq!(nodes, 1),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn evaluate_accepts_negative_changes() {
        let args = parse(&[
            "evaluate", "--fear-greed", "20", "--change", "-3", "--change", "-4",
        ])
        .unwrap();
        match args.command {
            Command::Evaluate { changes, risk_level, .. } => {
                assert_eq!(changes, vec![-3.0, -4.0]);
                assert_eq!(risk_level, "MEDIUM");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
