//! retrofit - 旧式标记分类与改写工具
//!
//! 用法：
//!   retrofit fix <PATHS>...                 分类并改写文件或目录
//!   retrofit reset --from <ORIG> --to <DIR>  从原始目录恢复变更日志中的文件

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use retrofit::batch::{self, BatchContext};
use retrofit::classifiers::Concern;
use retrofit::config::EngineConfig;
use retrofit::core::DocumentProcessor;
use retrofit::env::{generate_env_docs, EnvConfig};
use retrofit::error::RetrofitResult;

#[derive(Parser)]
#[command(name = "retrofit", version, about = "Classify and rewrite legacy HTML authoring idioms")]
#[command(after_help = generate_env_docs())]
struct Cli {
    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify documents and apply the rewrites that are certain
    Fix {
        /// Files or directories to process
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// TOML engine configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Only run these concerns (repeatable; default: all)
        #[arg(long = "concern", value_enum)]
        concerns: Vec<Concern>,

        /// Classify and report without writing any file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Review log (JSON lines, appended)
        #[arg(long, default_value = "retrofit.log")]
        review_log: PathBuf,

        /// Append the path of every rewritten file here
        #[arg(long)]
        change_log: Option<PathBuf>,

        /// Worker threads
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// Restore rewritten files from a pristine tree
    Reset {
        /// Pristine tree
        #[arg(long)]
        from: PathBuf,

        /// Working tree
        #[arg(long)]
        to: PathBuf,

        /// Change log listing the files to restore
        #[arg(long)]
        change_log: Option<PathBuf>,

        /// Files to restore (in addition to the change log)
        files: Vec<PathBuf>,
    },
}

fn init_logging(level: &str, no_color: bool) {
    let filter = EnvFilter::try_new(format!("retrofit={}", level)).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands, env: &EnvConfig) -> RetrofitResult<()> {
    match command {
        Commands::Fix {
            paths,
            config,
            concerns,
            dry_run,
            review_log,
            change_log,
            jobs,
        } => {
            let config = EngineConfig::load(config.as_deref())?;
            let processor = DocumentProcessor::new(&config, &concerns)?;
            let files = batch::collect_files(&paths, &config.walk)?;

            let context = BatchContext::open(&review_log, change_log.as_deref())?;
            batch::run_batch(&processor, &files, &context, dry_run || env.dry_run, jobs.or(env.jobs))?;
            let aggregator = context.finish()?;
            println!("{}", aggregator);
            Ok(())
        }
        Commands::Reset {
            from,
            to,
            change_log,
            mut files,
        } => {
            if let Some(change_log) = change_log {
                files.extend(batch::read_change_log(&change_log)?);
            }
            let restored = batch::reset(&from, &to, &files)?;
            println!("{} files restored", restored);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env = match EnvConfig::from_env() {
        Ok(env) => env,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    let level = cli.log_level.clone().unwrap_or_else(|| env.log_level.clone());
    init_logging(&level, env.no_color);

    match run(cli.command, &env) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
