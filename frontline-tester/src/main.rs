mod common;
mod logic;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::{parse_seeds, split_csv};
use logic::policy::Strategy;
use logic::{SUITES, SimulationPlan, SuiteReport, run_campaigns, run_field_manual};

#[derive(Debug, Parser)]
#[command(name = "frontline-tester", version = "0.1.0")]
#[command(about = "Automated QA for the Frontline rules engine - field manual checks and campaign simulation")]
struct Args {
    /// Suites to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    suites: String,

    /// List all available suites and exit
    #[arg(long)]
    list_suites: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Campaign runs per seed and faction
    #[arg(long, default_value_t = 1)]
    iterations: usize,

    /// Auto-play strategy for campaign runs
    #[arg(long, value_enum, default_value_t = Strategy::Greedy)]
    strategy: Strategy,

    /// Scheduler ticks between automated moves
    #[arg(long, default_value_t = 12)]
    reaction_ticks: u32,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_suites(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let suites = expand_suites(&args.suites)?;
    let seeds = parse_seeds(&split_csv(&args.seeds))?;
    let report = run_suites(&args, &suites, &seeds)?;

    write_reports(&args, &report, start_time)?;

    if !report.passed() {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_suites(args: &Args) -> Result<bool> {
    if !args.list_suites {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available suites:")?;
    for (key, description) in SUITES {
        writeln!(output_target.writer(), "  {key:15} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎖️  Frontline Automated Tester".bright_cyan().bold());
    println!("{}", "==============================".cyan());
}

fn expand_suites(suites_arg: &str) -> Result<Vec<String>> {
    let requested = split_csv(suites_arg);
    if requested.iter().any(|s| s == "all") {
        return Ok(SUITES.iter().map(|(key, _)| (*key).to_string()).collect());
    }
    for name in &requested {
        if !SUITES.iter().any(|(key, _)| key == name) {
            bail!("unknown suite `{name}` (see --list-suites)");
        }
    }
    Ok(requested)
}

fn run_suites(args: &Args, suites: &[String], seeds: &[u64]) -> Result<SuiteReport> {
    let mut report = SuiteReport::default();
    for suite in suites {
        match suite.as_str() {
            "field-manual" => {
                println!("{}", "📋 Running Field Manual Checks".bright_yellow().bold());
                println!("{}", "-".repeat(30).yellow());
                let seed = seeds.first().copied().unwrap_or_default();
                report.checks = run_field_manual(seed).context("building diagnostics engine")?;
            }
            "campaign" => {
                println!("{}", "⚔️  Running Campaign Simulation".bright_blue().bold());
                println!("{}", "-".repeat(30).blue());
                let plan = SimulationPlan {
                    strategy: args.strategy,
                    reaction_ticks: args.reaction_ticks,
                    ..SimulationPlan::default()
                };
                report.campaigns = run_campaigns(&plan, seeds, args.iterations, args.verbose)
                    .context("building campaign engine")?;
            }
            other => eprintln!("⚠️  Unknown suite: {}", other.yellow()),
        }
    }
    Ok(report)
}

fn write_reports(args: &Args, report: &SuiteReport, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, report)?,
        "markdown" => {
            if report.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Frontline Test Results\n\n_No suites executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, report)?;
            }
        }
        _ => {
            if report.is_empty() {
                writeln!(&mut output_target, "No suites executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    report,
                    start_time.elapsed(),
                )?;
            }
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            suites: "all".to_string(),
            list_suites: false,
            seeds: "1337".to_string(),
            iterations: 1,
            strategy: Strategy::Greedy,
            reaction_ticks: 12,
            report: "console".to_string(),
            verbose: false,
            output: None,
        }
    }

    fn temp_output(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("frontline-main-{label}-{}", std::process::id()))
    }

    #[test]
    fn expands_all_suites_keyword() {
        let suites = expand_suites("all").unwrap();
        assert_eq!(suites, vec!["field-manual", "campaign"]);
    }

    #[test]
    fn expand_suites_rejects_unknown_names() {
        assert_eq!(expand_suites("campaign").unwrap(), vec!["campaign"]);
        assert!(expand_suites("field-manual,nope").is_err());
    }

    #[test]
    fn maybe_list_suites_writes_output() {
        let temp = temp_output("list");
        let args = Args {
            list_suites: true,
            output: Some(temp.clone()),
            ..base_args()
        };
        assert!(maybe_list_suites(&args).unwrap());
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.contains("field-manual"));
        assert!(!maybe_list_suites(&base_args()).unwrap());
    }

    #[test]
    fn field_manual_suite_reports_json() {
        let temp = temp_output("json");
        let args = Args {
            suites: "field-manual".to_string(),
            report: "json".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        let suites = expand_suites(&args.suites).unwrap();
        let report = run_suites(&args, &suites, &[1337]).unwrap();
        assert!(report.passed());
        write_reports(&args, &report, Instant::now()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&temp).unwrap()).unwrap();
        assert_eq!(value["checks"].as_array().unwrap().len(), 25);
        assert!(value["campaigns"].as_array().unwrap().is_empty());
    }

    #[test]
    fn markdown_report_handles_empty_runs() {
        let temp = temp_output("md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(temp.clone()),
            ..base_args()
        };
        write_reports(&args, &SuiteReport::default(), Instant::now()).unwrap();
        let content = std::fs::read_to_string(&temp).unwrap();
        assert!(content.contains("_No suites executed._"));
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
