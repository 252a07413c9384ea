//! fj-precache - build JSONL offset caches ahead of time
//!
//! Readers opened later find a ready cache and skip the initial scan.

mod error;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use fast_jsonl::logging::{init_logging, LoggingConfig};
use fast_jsonl::{CacheConfig, NamingStrategy};

use crate::error::CliError;

/// Cache placement selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum DirMethod {
    /// `.fj_cache/` next to each source file
    Local,
    /// One shared directory under the home directory
    User,
}

impl From<DirMethod> for NamingStrategy {
    fn from(method: DirMethod) -> Self {
        match method {
            DirMethod::Local => NamingStrategy::Local,
            DirMethod::User => NamingStrategy::User,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "fj-precache")]
#[command(version = fast_jsonl::VERSION)]
#[command(about = "Pre-cache JSONL files for fast random access", long_about = None)]
pub struct Args {
    /// Comma-separated list of JSONL files to cache
    #[arg(short, long, value_delimiter = ',', required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Number of worker threads
    #[arg(short, long, default_value_t = 1)]
    pub threads: usize,

    /// Print one line per file instead of a progress bar
    #[arg(short, long)]
    pub verbose: bool,

    /// Cache placement; overrides FAST_JSONL_DIR_METHOD
    #[arg(long, value_enum)]
    pub dir_method: Option<DirMethod>,

    /// Also write log events to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Resolve the cache config: the flag wins over the environment.
    pub fn cache_config(&self) -> Result<CacheConfig, CliError> {
        match self.dir_method {
            Some(method) => Ok(CacheConfig::new(method.into())),
            None => Ok(CacheConfig::from_env()?),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let logging = LoggingConfig {
        verbose: args.verbose,
        log_file: args.log_file.clone(),
    };
    let _log_guard = match init_logging(&logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", CliError::Logging(e.to_string()));
            return ExitCode::FAILURE;
        }
    };

    match run::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
