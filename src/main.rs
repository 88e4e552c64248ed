use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};

use plate_restriction::batch::{collect_inputs, run_batch, BatchSummary};
use plate_restriction::config::AppConfig;
use plate_restriction::ocr::{ensure_tesseract, TesseractRecognizer};
use plate_restriction::paths::{get_default_config_file, get_default_log_file};
use plate_restriction::plate::{FormatPolicy, ScoringMode};
use plate_restriction::report::{
    describe_rules, export_to_json, render_summary, render_table, render_verdict,
};
use plate_restriction::{PlatePipeline, RestrictionEvaluator, TimePolicy};

#[derive(Parser, Debug)]
#[command(name = "plate-restriction")]
#[command(version, about = "License-plate OCR and digit-of-day circulation check", long_about = None)]
struct Cli {
    /// Configuration file (default: <exe_dir>/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log file (default: <exe_dir>/logs/plate_restriction.log)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recognize plates in images and check them against the restriction
    Scan {
        /// Image files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Check time, "YYYY-MM-DD HH:MM[:SS]" (default: now)
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<NaiveDateTime>,

        /// Also write results to this JSON file
        #[arg(long)]
        json: Option<PathBuf>,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Candidate scoring mode
        #[arg(long, value_enum)]
        scoring: Option<ScoringArg>,

        /// Images processed concurrently
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Check a manually entered plate
    Check {
        /// Plate text, e.g. "1234 ABC"
        plate: String,

        /// Check time, "YYYY-MM-DD HH:MM[:SS]" (default: now)
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<NaiveDateTime>,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Show the restriction table and time windows
    Rules {
        /// Restricted hours policy
        #[arg(long, value_enum)]
        time_policy: Option<TimePolicyArg>,
    },

    /// Locate Tesseract and download missing language data
    Setup,

    /// Write the default configuration file
    InitConfig {
        /// Target file (default: the --config path)
        path: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct PolicyArgs {
    /// Accept only the 4 digits + 3 letters layout
    #[arg(long)]
    strict: bool,

    /// Restricted hours policy
    #[arg(long, value_enum)]
    time_policy: Option<TimePolicyArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum TimePolicyArg {
    /// 07:00-20:00
    Continuous,
    /// 07:00-09:00 and 17:00-20:00
    Split,
}

impl From<TimePolicyArg> for TimePolicy {
    fn from(arg: TimePolicyArg) -> Self {
        match arg {
            TimePolicyArg::Continuous => TimePolicy::Continuous,
            TimePolicyArg::Split => TimePolicy::Split,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum ScoringArg {
    Strict,
    Generic,
}

impl From<ScoringArg> for ScoringMode {
    fn from(arg: ScoringArg) -> Self {
        match arg {
            ScoringArg::Strict => ScoringMode::Strict,
            ScoringArg::Generic => ScoringMode::Generic,
        }
    }
}

/// Parses "YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DD HH:MM".
fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M"))
        .map_err(|_| format!("expected \"YYYY-MM-DD HH:MM[:SS]\", got \"{}\"", value))
}

impl PolicyArgs {
    fn apply(&self, config: &mut AppConfig) {
        if self.strict {
            config.engine.format_policy = FormatPolicy::Strict;
        }
        if let Some(policy) = self.time_policy {
            config.restriction.time_policy = policy.into();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    plate_restriction::set_log_file(Some(cli.log_file.clone().unwrap_or_else(get_default_log_file)));

    let config_path = cli.config.clone().unwrap_or_else(get_default_config_file);

    match cli.command {
        Commands::Scan {
            paths,
            at,
            json,
            policy,
            scoring,
            workers,
        } => {
            let mut config = AppConfig::load(&config_path);
            policy.apply(&mut config);
            if let Some(scoring) = scoring {
                config.engine.scoring_mode = scoring.into();
            }
            if let Some(workers) = workers {
                config.batch.workers = workers;
            }
            scan(config, paths, at.unwrap_or_else(now), json)
        }
        Commands::Check { plate, at, policy } => {
            let mut config = AppConfig::load(&config_path);
            policy.apply(&mut config);
            check(&config, &plate, at.unwrap_or_else(now))
        }
        Commands::Rules { time_policy } => {
            let config = AppConfig::load(&config_path);
            let policy = time_policy
                .map(TimePolicy::from)
                .unwrap_or(config.restriction.time_policy);
            print!("{}", describe_rules(policy));
            Ok(())
        }
        Commands::Setup => setup(&AppConfig::load(&config_path)),
        Commands::InitConfig { path } => {
            let target = path.unwrap_or(config_path);
            AppConfig::save_default(&target)?;
            println!("[+] Default configuration written to {}", target.display());
            Ok(())
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn scan(
    config: AppConfig,
    paths: Vec<PathBuf>,
    at: NaiveDateTime,
    json: Option<PathBuf>,
) -> Result<()> {
    let inputs = collect_inputs(&paths)?;
    if inputs.is_empty() {
        anyhow::bail!("No images found (supported: jpg, jpeg, png)");
    }

    let recognizer =
        TesseractRecognizer::new(&config.ocr).context("Failed to initialize Tesseract")?;
    let pipeline = PlatePipeline::new(recognizer, &config)?;

    println!("[*] Images: {}", inputs.len());
    println!("[*] Check time: {}", at.format("%Y-%m-%d %H:%M:%S (%A)"));
    println!(
        "[*] Format: {:?}, scoring: {:?}, hours: {}",
        config.engine.format_policy, config.engine.scoring_mode, config.restriction.time_policy
    );

    let records = run_batch(&pipeline, &inputs, config.batch.workers, at);
    let summary = BatchSummary::from_records(&records);

    println!();
    print!("{}", render_table(&records));
    println!();
    print!("{}", render_summary(&summary));

    if let Some(json_path) = json {
        export_to_json(&records, at, config.restriction.time_policy, &json_path)?;
        println!("[+] Results saved to {}", json_path.display());
    }

    Ok(())
}

fn check(config: &AppConfig, plate: &str, at: NaiveDateTime) -> Result<()> {
    let evaluator =
        RestrictionEvaluator::new(config.engine.format_policy, config.restriction.time_policy)?;
    let verdict = evaluator.evaluate(plate, at);
    print!("{}", render_verdict(plate, &verdict, at));
    Ok(())
}

fn setup(config: &AppConfig) -> Result<()> {
    let paths = ensure_tesseract(&config.ocr)?;
    println!("[+] Tesseract: {}", paths.executable.display());
    println!("[+] Tessdata:  {}", paths.tessdata.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_timestamp() {
        let full = parse_timestamp("2024-01-01 22:15:30").unwrap();
        assert_eq!(full.format("%H:%M:%S").to_string(), "22:15:30");

        let short = parse_timestamp(" 2024-01-01 07:00 ").unwrap();
        assert_eq!(short.format("%H:%M:%S").to_string(), "07:00:00");

        assert!(parse_timestamp("2024-01-01").is_err());
        assert!(parse_timestamp("tomorrow").is_err());
    }

    #[test]
    fn test_scan_flags_override_config() {
        let cli = Cli::try_parse_from([
            "plate-restriction",
            "scan",
            "images",
            "--strict",
            "--time-policy",
            "split",
            "--scoring",
            "generic",
            "-w",
            "4",
        ])
        .unwrap();

        let Commands::Scan { policy, scoring, workers, paths, .. } = cli.command else {
            panic!("expected scan");
        };
        let mut config = AppConfig::default();
        policy.apply(&mut config);

        assert_eq!(paths, vec![PathBuf::from("images")]);
        assert_eq!(config.engine.format_policy, FormatPolicy::Strict);
        assert_eq!(config.restriction.time_policy, TimePolicy::Split);
        assert_eq!(scoring, Some(ScoringArg::Generic));
        assert_eq!(workers, Some(4));
    }
}
