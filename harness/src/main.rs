use std::path::PathBuf;

use log::error;
use structopt::StructOpt;
use thiserror::Error;

use harness::{Scenario, Settings};

#[derive(StructOpt)]
#[structopt(name = "harness")]
struct Opt {
    /// Path to the `bank-node` binary
    #[structopt(short = "n", long = "node", parse(from_os_str))]
    node: PathBuf,

    /// Peer list shared by every node
    #[structopt(short = "c", long = "config", parse(from_os_str))]
    config: PathBuf,

    /// JSON scenario to execute
    #[structopt(short = "s", long = "scenario", parse(from_os_str))]
    scenario: PathBuf,

    /// Directory for the nodes' transaction timelines
    #[structopt(long = "log-dir", parse(from_os_str), default_value = ".")]
    log_dir: PathBuf,

    /// Grace period passed on to every node (in milliseconds)
    #[structopt(long = "grace-ms")]
    grace_ms: Option<u64>,

    /// Verbosity for the harness, passed on to every node
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,
}

#[derive(Debug, Error)]
enum Fatal {
    #[error("could not open scenario {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse scenario {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn setup_logging(verbose: u8) -> Result<(), log::SetLoggerError> {
    let level = match verbose {
    | 0 => log::LevelFilter::Info,
    | 1 => log::LevelFilter::Debug,
    | _ => log::LevelFilter::Trace,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[harness {}] {}", record.level(), message))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

fn load(path: PathBuf) -> Result<Scenario, Fatal> {
    let file = std::fs::File::open(&path)
        .map_err(|source| Fatal::Open { path: path.clone(), source })?;
    serde_json::from_reader(file)
        .map_err(|source| Fatal::Parse { path, source })
}

fn main() {
    let opt = Opt::from_args();
    if let Err(error) = setup_logging(opt.verbose) {
        eprintln!("could not install logger: {}", error);
    }

    let scenario = match load(opt.scenario) {
    | Ok(scenario) => scenario,
    | Err(error) => {
        error!("{}", error);
        std::process::exit(1);
    }
    };

    let settings = Settings {
        node: opt.node,
        config: opt.config,
        log_dir: opt.log_dir,
        grace_ms: opt.grace_ms,
        verbose: opt.verbose,
    };
    harness::run(scenario, &settings);
}
