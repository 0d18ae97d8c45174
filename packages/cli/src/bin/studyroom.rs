//! Terminal client for a simulated study room.
//!
//! Joins the room, prints roster changes and messages as they happen and sends
//! each line typed at the prompt. A failed join is retried (max 5 attempts with
//! 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin studyroom -- --name Alice
//! cargo run --bin studyroom -- -r room-3 -n Bob --seed 42 --churn-interval-secs 3
//! ```

use std::time::Duration;

use clap::Parser;

use studyroom_cli::{ClientOptions, run_client};
use studyroom_session::{SessionConfig, SimulatorConfig};
use studyroom_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "studyroom")]
#[command(about = "Join a simulated Bible study room from the terminal", long_about = None)]
struct Args {
    /// Display name shown to other participants
    #[arg(short = 'n', long)]
    name: String,

    /// Room to join
    #[arg(short = 'r', long, default_value = "room-1")]
    room: String,

    /// Seed for reproducible simulated activity
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds between roster churn ticks
    #[arg(long, default_value_t = 10)]
    churn_interval_secs: u64,

    /// Chance that a churn tick changes the roster (0.0 to 1.0)
    #[arg(long, default_value_t = 0.3)]
    churn_probability: f64,

    /// Seconds to wait for the room to accept the join
    #[arg(long, default_value_t = 10)]
    join_timeout_secs: u64,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn into_options(self) -> ClientOptions {
        ClientOptions {
            room_id: self.room,
            name: self.name,
            session: SessionConfig {
                join_timeout: Duration::from_secs(self.join_timeout_secs),
            },
            simulator: SimulatorConfig {
                seed: self.seed,
                churn_interval: Duration::from_secs(self.churn_interval_secs),
                churn_probability: self.churn_probability,
                ..SimulatorConfig::default()
            },
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    if let Err(e) = run_client(args.into_options()).await {
        tracing::error!("Client error: {}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
