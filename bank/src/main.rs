use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info, warn};
use structopt::StructOpt;
use thiserror::Error;
use tokio::io::AsyncBufReadExt;

use bank::{Generator, Ledger, Operation, Timeline, Transaction};

#[derive(StructOpt)]
#[structopt(name = "bank-node")]
struct Opt {
    /// Identifier of this node in the peer list
    id: String,

    /// Peer list file
    #[structopt(parse(from_os_str))]
    config: PathBuf,

    /// Log verbosity (-v info, -vv debug, -vvv trace)
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,

    /// Delay between full connectivity and the first message (in milliseconds)
    #[structopt(long = "grace-ms", default_value = "5000")]
    grace_ms: u64,

    /// Directory for the transaction timeline written on shutdown
    #[structopt(long = "log-dir", parse(from_os_str), default_value = ".")]
    log_dir: PathBuf,
}

#[derive(Debug, Error)]
enum Fatal {
    #[error("could not install logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error(transparent)]
    Config(#[from] isis::ConfigError),

    #[error(transparent)]
    Node(#[from] isis::Error),

    #[error("could not read standard input: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("could not wait for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),

    #[error("could not write timeline: {0}")]
    Timeline(#[from] csv::Error),
}

fn setup_logging(verbose: u8) -> Result<(), log::SetLoggerError> {
    let level = match verbose {
    | 0 => log::LevelFilter::Warn,
    | 1 => log::LevelFilter::Info,
    | 2 => log::LevelFilter::Debug,
    | _ => log::LevelFilter::Trace,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

async fn run(opt: Opt) -> Result<(), Fatal> {
    setup_logging(opt.verbose)?;

    let config = isis::Config::<Transaction>::load(&opt.id, &opt.config)?
        .with_grace_period(Duration::from_millis(opt.grace_ms));

    let (tx, mut rx) = config.run().await?.split();
    let mut generator = Generator::new(opt.id.clone());
    let mut ledger = Ledger::new();
    let mut timeline = Timeline::new();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut reading = true;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line(), if reading => match line.map_err(Fatal::Stdin)? {
            | None => {
                info!("end of input, still delivering");
                reading = false;
            }
            | Some(line) if line.trim().is_empty() => (),
            | Some(line) => match line.parse::<Operation>() {
            | Ok(operation) => {
                let transaction = generator.next(operation);
                debug!("generated {} from {:?}", transaction.id, line);
                timeline.record(transaction.id.clone());
                tx.send(transaction);
            }
            | Err(error) => warn!("skipping {:?}: {}", line, error),
            },
            },
            delivery = rx.recv() => match delivery {
            | Some(delivery) => {
                let transaction = delivery.transaction;
                if let Err(error) = ledger.apply(&transaction.operation) {
                    warn!("rejecting {}: {}", transaction.id, error);
                }
                timeline.record(transaction.id);
                println!("{}", ledger);
            }
            | None => {
                warn!("multicast stack stopped");
                break
            }
            },
            signal = &mut shutdown => {
                signal.map_err(Fatal::Signal)?;
                break
            }
        }
    }

    let path = Timeline::path(&opt.log_dir, &opt.id);
    info!("writing {} events to {:?}", timeline.len(), path);
    timeline.write(&path)?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let opt = Opt::from_args();
    // Exit explicitly: the runtime would otherwise wait on the blocked stdin reader.
    match run(opt).await {
    | Ok(()) => std::process::exit(0),
    | Err(error) => {
        eprintln!("error: {}", error);
        std::process::exit(1);
    }
    }
}
