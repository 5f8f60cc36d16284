//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::report_for_path;
use crate::adapters::summary_table::format_summary_table;
use crate::domain::config_validation::validate_screen_config;
use crate::domain::error::ScreenerError;
use crate::domain::indicator::MacdParams;
use crate::domain::ohlcv::parse_date;
use crate::domain::screen::{self, run_screen, ScreenConfig, ScreeningRecord};
use crate::domain::universe::RosterPolicy;
use crate::logging::{init_tracing, LogFormat};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(name = "mtfscreen", about = "Multi-timeframe MACD equity screener")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Screen the roster of a data snapshot
    Screen(ScreenArgs),
    /// Validate a configuration file and print the resolved parameters
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Load a CSV snapshot directory into the configured SQLite database
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        from: PathBuf,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScreenArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// CSV snapshot directory; selects the CSV backend
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Write results here; `.json` selects JSON, anything else CSV
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    #[command(flatten)]
    pub overrides: ScreenOverrides,
}

/// Command-line values that take precedence over the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ScreenOverrides {
    /// YYYY-MM-DD or YYYYMMDD
    #[arg(long)]
    pub start_date: Option<String>,
    /// YYYY-MM-DD or YYYYMMDD
    #[arg(long)]
    pub end_date: Option<String>,
    /// Market-cap ceiling in reporting units
    #[arg(long)]
    pub max_mv: Option<f64>,
    #[arg(long)]
    pub zero_near: Option<f64>,
    #[arg(long)]
    pub recent_q_k: Option<usize>,
    #[arg(long)]
    pub month_trend_n: Option<usize>,
    #[arg(long)]
    pub ma_converge_pct: Option<f64>,
    #[arg(long)]
    pub ma_slope_n: Option<usize>,
    /// Keep the first N records; 0 keeps all
    #[arg(long)]
    pub top_n: Option<usize>,
    /// Attach the latest daily MACD to passing records
    #[arg(long)]
    pub use_daily: bool,
    /// Include Beijing exchange listings
    #[arg(long)]
    pub include_bj: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Screen(args) => run_screen_command(&args),
        Command::Validate { config } => run_validate(&config),
        Command::Import { config, from } => run_import(&config, &from),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ScreenerError> {
    FileConfigAdapter::from_file(path)
}

fn load_optional_config(path: Option<&Path>) -> Result<FileConfigAdapter, ScreenerError> {
    match path {
        Some(p) => load_config(p),
        None => FileConfigAdapter::from_string(""),
    }
}

fn init_logging(adapter: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let level = adapter
        .get_string("logging", "level")
        .unwrap_or_else(|| "info".to_string());
    let format = match adapter.get_string("logging", "format") {
        Some(f) => LogFormat::parse(&f)?,
        None => LogFormat::Text,
    };
    init_tracing(&level, format)
}

fn config_date(
    adapter: &dyn ConfigPort,
    key: &str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, ScreenerError> {
    let Some(raw) = value
        .map(str::to_string)
        .or_else(|| adapter.get_string("screen", key))
    else {
        return Ok(None);
    };
    parse_date(&raw).map(Some).ok_or_else(|| {
        ScreenerError::invalid(
            "screen",
            key,
            format!("invalid date '{}' (expected YYYY-MM-DD or YYYYMMDD)", raw),
        )
    })
}

/// Numeric setting; a present value that does not parse is an error rather
/// than a silent fallback to `default`.
fn config_number<T: FromStr>(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, ScreenerError> {
    let Some(raw) = adapter.get_string(section, key) else {
        return Ok(default);
    };
    raw.parse().map_err(|_| {
        ScreenerError::invalid(section, key, format!("invalid number '{}' for {}", raw, key))
    })
}

fn config_count(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ScreenerError> {
    let value: i64 = config_number(adapter, section, key, default as i64)?;
    usize::try_from(value)
        .map_err(|_| ScreenerError::invalid(section, key, format!("{} must not be negative", key)))
}

/// Resolve the screening parameters: command line, then config file, then
/// defaults. Dates default to the three years ending `today`.
pub fn build_screen_config(
    adapter: &dyn ConfigPort,
    overrides: &ScreenOverrides,
    today: NaiveDate,
) -> Result<ScreenConfig, ScreenerError> {
    let end_date =
        config_date(adapter, "end_date", overrides.end_date.as_deref())?.unwrap_or(today);
    let start_date = config_date(adapter, "start_date", overrides.start_date.as_deref())?
        .unwrap_or_else(|| screen::default_start_date(end_date));

    let macd = MacdParams {
        fast: config_count(adapter, "macd", "fast", MacdParams::default().fast)?,
        slow: config_count(adapter, "macd", "slow", MacdParams::default().slow)?,
        signal: config_count(adapter, "macd", "signal", MacdParams::default().signal)?,
    };

    let from_file = ScreenConfig {
        start_date,
        end_date,
        max_market_cap: config_number(
            adapter,
            "screen",
            "max_market_cap",
            screen::DEFAULT_MAX_MARKET_CAP,
        )?,
        market_cap_unit: config_number(
            adapter,
            "screen",
            "market_cap_unit",
            screen::DEFAULT_MARKET_CAP_UNIT,
        )?,
        zero_near: config_number(adapter, "screen", "zero_near", screen::DEFAULT_ZERO_NEAR)?,
        recent_quarter_k: config_count(
            adapter,
            "screen",
            "recent_quarter_k",
            screen::DEFAULT_RECENT_QUARTER_K,
        )?,
        month_trend_n: config_count(
            adapter,
            "screen",
            "month_trend_n",
            screen::DEFAULT_MONTH_TREND_N,
        )?,
        ma_converge_pct: config_number(
            adapter,
            "screen",
            "ma_converge_pct",
            screen::DEFAULT_MA_CONVERGE_PCT,
        )?,
        ma_slope_n: config_count(adapter, "screen", "ma_slope_n", screen::DEFAULT_MA_SLOPE_N)?,
        top_n: config_count(adapter, "screen", "top_n", screen::DEFAULT_TOP_N)?,
        use_daily: adapter.get_bool("screen", "use_daily", false),
        macd,
    };

    Ok(ScreenConfig {
        max_market_cap: overrides.max_mv.unwrap_or(from_file.max_market_cap),
        zero_near: overrides.zero_near.unwrap_or(from_file.zero_near),
        recent_quarter_k: overrides.recent_q_k.unwrap_or(from_file.recent_quarter_k),
        month_trend_n: overrides.month_trend_n.unwrap_or(from_file.month_trend_n),
        ma_converge_pct: overrides.ma_converge_pct.unwrap_or(from_file.ma_converge_pct),
        ma_slope_n: overrides.ma_slope_n.unwrap_or(from_file.ma_slope_n),
        top_n: overrides.top_n.unwrap_or(from_file.top_n),
        use_daily: overrides.use_daily || from_file.use_daily,
        ..from_file
    })
}

/// Data source named by `[data] backend`, or the CSV directory given on the
/// command line.
pub fn open_data_source(
    adapter: &dyn ConfigPort,
    data_dir: Option<&Path>,
    include_bj: bool,
) -> Result<Box<dyn MarketDataPort>, ScreenerError> {
    let policy = RosterPolicy {
        include_bj: include_bj || adapter.get_bool("data", "include_bj", false),
    };

    if let Some(dir) = data_dir {
        return Ok(Box::new(CsvAdapter::new(dir.to_path_buf(), policy)));
    }

    let backend = adapter
        .get_string("data", "backend")
        .unwrap_or_else(|| "csv".to_string());
    match backend.to_lowercase().as_str() {
        "csv" => {
            let dir = adapter
                .get_string("csv", "dir")
                .ok_or_else(|| ScreenerError::ConfigMissing {
                    section: "csv".into(),
                    key: "dir".into(),
                })?;
            Ok(Box::new(CsvAdapter::new(PathBuf::from(dir), policy)))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let db = crate::adapters::sqlite_adapter::SqliteAdapter::from_config(adapter)?;
            Ok(Box::new(db.with_policy(policy)))
        }
        #[cfg(not(feature = "sqlite"))]
        "sqlite" => Err(ScreenerError::invalid(
            "data",
            "backend",
            "sqlite support is not enabled in this build",
        )),
        other => Err(ScreenerError::invalid(
            "data",
            "backend",
            format!("unknown backend '{}', expected csv or sqlite", other),
        )),
    }
}

/// Resolve, validate and run a screen; writes the output file if requested.
pub fn execute_screen(
    args: &ScreenArgs,
    today: NaiveDate,
) -> Result<Vec<ScreeningRecord>, ScreenerError> {
    let adapter = load_optional_config(args.config.as_deref())?;
    init_logging(&adapter)?;

    let config = build_screen_config(&adapter, &args.overrides, today)?;
    validate_screen_config(&config)?;

    let source = open_data_source(&adapter, args.data_dir.as_deref(), args.overrides.include_bj)?;
    let records = run_screen(source.as_ref(), &config)?;

    if let Some(out) = &args.out {
        let path = out.to_string_lossy();
        report_for_path(&path).write(&records, &path)?;
        info!(path = %path, records = records.len(), "results written");
    }
    Ok(records)
}

fn run_screen_command(args: &ScreenArgs) -> Result<(), ScreenerError> {
    let records = execute_screen(args, Local::now().date_naive())?;
    print!("{}", format_summary_table(&records));
    Ok(())
}

pub fn describe_config(config: &ScreenConfig) -> String {
    let top_n = if config.top_n == 0 {
        "unlimited".to_string()
    } else {
        config.top_n.to_string()
    };
    [
        format!("window:            {} .. {}", config.start_date, config.end_date),
        format!(
            "max_market_cap:    {} (unit {})",
            config.max_market_cap, config.market_cap_unit
        ),
        format!("zero_near:         {}", config.zero_near),
        format!("recent_quarter_k:  {}", config.recent_quarter_k),
        format!("month_trend_n:     {}", config.month_trend_n),
        format!("ma_converge_pct:   {}", config.ma_converge_pct),
        format!("ma_slope_n:        {}", config.ma_slope_n),
        format!("top_n:             {}", top_n),
        format!("use_daily:         {}", config.use_daily),
        format!(
            "macd:              fast={} slow={} signal={}",
            config.macd.fast, config.macd.slow, config.macd.signal
        ),
    ]
    .join("\n")
}

fn run_validate(config_path: &Path) -> Result<(), ScreenerError> {
    let adapter = load_config(config_path)?;
    let config = build_screen_config(
        &adapter,
        &ScreenOverrides::default(),
        Local::now().date_naive(),
    )?;
    validate_screen_config(&config)?;
    if let Some(format) = adapter.get_string("logging", "format") {
        LogFormat::parse(&format)?;
    }
    println!("Configuration valid: {}", config_path.display());
    println!("{}", describe_config(&config));
    Ok(())
}

#[cfg(feature = "sqlite")]
fn run_import(config_path: &Path, from: &Path) -> Result<(), ScreenerError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = load_config(config_path)?;
    init_logging(&adapter)?;

    let source = CsvAdapter::new(from.to_path_buf(), RosterPolicy::default());
    let entries = source.all_entries()?;
    let db = SqliteAdapter::from_config(&adapter)?;
    db.initialize_schema()?;

    let stats = db.import_from(&entries, &source)?;
    info!(
        securities = stats.securities,
        bars = stats.bars,
        market_caps = stats.market_caps,
        eps_reports = stats.eps_reports,
        "snapshot imported"
    );
    println!(
        "Imported {} securities, {} bars, {} market caps, {} eps reports",
        stats.securities, stats.bars, stats.market_caps, stats.eps_reports
    );
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn run_import(_config_path: &Path, _from: &Path) -> Result<(), ScreenerError> {
    Err(ScreenerError::invalid(
        "data",
        "backend",
        "sqlite support is not enabled in this build",
    ))
}
