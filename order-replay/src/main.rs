//! Order script replay
//!
//! Feeds a JSON-lines order script through the matching engine and writes the
//! resulting event stream to stdout, one JSON object per line. Logs go to stderr.

mod replay;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use clap::Parser;
use common::error::{Error, ErrorExt, IntoError};
use dotenv::dotenv;
use market_data::TradeTape;
use matching_engine::EngineConfig;
use serde_json::json;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::replay::{parse_line, Replayer};

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Order script to replay; reads stdin when omitted
    #[clap(short, long)]
    script: Option<PathBuf>,

    /// Levels per side in the final book snapshot
    #[clap(short, long, default_value_t = 10)]
    depth: usize,

    /// Verify book invariants after every mutation
    #[clap(long)]
    verify: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize tracing with debug level if DEBUG=1 in .env
    let env_debug = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env_debug == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() && env_debug == "1" {
        debug!("Debug logging enabled");
    }

    let mut config = EngineConfig::from_env()?;
    if args.verify {
        config = config.with_verification(true);
    }

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => {
            info!(script = %path.display(), "Replaying order script");
            let file = File::open(path).map_err(|e| e.into_error(&format!("cannot open {}", path.display())))?;
            Box::new(BufReader::new(file))
        }
        None => {
            info!("Replaying order script from stdin");
            Box::new(BufReader::new(io::stdin()))
        }
    };

    let mut replayer = Replayer::new(config, TradeTape::from_env()?);
    debug!(
        first_order_id = replayer.engine().config().first_order_id,
        verify_invariants = replayer.engine().config().verify_invariants,
        "Engine ready"
    );
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut rejected = 0usize;

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| e.into_error(&format!("line {}", line_no)))?;
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                error!(line = line_no, error = %e, "Malformed script line");
                return Err(Box::new(e));
            }
        };

        let events = match replayer.apply(&command) {
            Ok(events) => events,
            Err(e @ (Error::InvalidOrder(_) | Error::UnknownOrder(_))) => {
                warn!(line = line_no, error = %e, "Command rejected");
                rejected += 1;
                let reject = json!({ "event": "reject", "line": line_no, "reason": e.to_string() });
                writeln!(out, "{}", reject)?;
                continue;
            }
            Err(e) => Err(e).with_context(|| format!("line {}", line_no))?,
        };

        for event in events {
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
        }
    }

    let summary = replayer.summary(args.depth);
    writeln!(out, "{}", serde_json::to_string(&summary)?)?;
    out.flush()?;

    info!(
        orders = replayer.engine().last_sequence(),
        resting = replayer.engine().order_count(),
        trades = summary.trade_count,
        rejected,
        "Replay finished"
    );
    Ok(())
}
