//! region-wcloud: word frequencies and word clouds for regional documents,
//! plus bulk keyword search.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, error, info};
use region_wcloud::{
    config::DEFAULT_CONFIG_FILE,
    search::{self, KeywordWorkbook, SystemBrowser},
    ChineseTokenizer, Config, Pipeline, StopWords,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file, defaults to ./region-wcloud.toml when present
    #[clap(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[clap(short, long)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count word frequencies per document and render word clouds
    Cloud {
        /// Also render the ranked frequency table image
        #[clap(long)]
        table: bool,

        /// Skip word cloud images, only report frequencies
        #[clap(long)]
        no_cloud: bool,
    },
    /// Open a search tab for every keyword in the workbook
    Search {
        /// Workbook to read keywords from
        #[clap(short, long, value_name = "FILE")]
        workbook: Option<PathBuf>,
    },
    /// Write a default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[clap(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        error!("{err:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::InitConfig { force } => init_config(cli.config.as_deref(), force),
        Command::Cloud { table, no_cloud } => {
            let mut config = load_config(cli.config.as_deref())?;
            config.table.enabled |= table;
            config.cloud.enabled &= !no_cloud;
            run_cloud(&config)
        }
        Command::Search { workbook } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(workbook) = workbook {
                config.search.workbook = workbook;
            }
            run_search(&config)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
        None => {
            debug!("no {DEFAULT_CONFIG_FILE}, using defaults");
            return Ok(Config::default());
        }
    };

    let config =
        Config::load(path).with_context(|| format!("failed to load {}", path.display()))?;
    debug!("loaded configuration from {}", path.display());
    Ok(config)
}

fn init_config(path: Option<&Path>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    if path.exists() && !force {
        bail!("{} already exists, pass --force to overwrite it", path.display());
    }

    std::fs::write(path, Config::default_toml()?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

fn run_cloud(config: &Config) -> Result<()> {
    let stop_words = StopWords::load(&config.input.stop_words)?;
    let tokenizer =
        ChineseTokenizer::default().with_words(config.input.user_words.iter().map(String::as_str));

    let pipeline =
        Pipeline::new(config, &tokenizer, &stop_words).context("failed to set up rendering")?;
    let reports = pipeline.run()?;

    if reports.is_empty() {
        info!("no region data found");
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for report in &reports {
        writeln!(out, "{report}")?;
    }
    Ok(())
}

fn run_search(config: &Config) -> Result<()> {
    let settings = &config.search;
    let mut workbook = KeywordWorkbook::open(&settings.workbook)
        .with_context(|| format!("failed to open {}", settings.workbook.display()))?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let searched = search::run(
        settings,
        &mut workbook,
        &mut input,
        &mut output,
        &mut SystemBrowser,
    )?;

    info!("searched {searched} keywords");
    Ok(())
}
