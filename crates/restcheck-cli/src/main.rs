//! restcheck CLI - REST API contract checks with aggregated assertions

mod logging;
mod storage;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use restcheck_core::verdict::EXIT_TOOL_ERROR;
use restcheck_core::{
    Config, SchemaRegistry, SuitePlan, SuiteReport, Verdict, VerdictPolicy, VerdictStatus,
};
use restcheck_runner::{Harness, reqres_suite};

const CONFIG_FILE: &str = ".restcheck.toml";
const DEFAULT_DUMP_DIR: &str = ".restcheck/dumps";

#[derive(Parser)]
#[command(name = "restcheck")]
#[command(about = "REST API contract checks with aggregated assertions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in scenario suite
    Run {
        /// Config file (default: .restcheck.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override base_url from the config
        #[arg(long)]
        base_url: Option<String>,

        /// Run only these scenarios (and what they depend on)
        #[arg(long, num_args = 1..)]
        only: Vec<String>,

        /// Skip the remaining scenarios after the first non-pass
        #[arg(long)]
        fail_fast: bool,

        /// Do not fail the run for skipped scenarios
        #[arg(long)]
        allow_skipped: bool,

        /// Dump all request/response pairs to JSONL files
        #[arg(long)]
        dump: bool,

        /// Directory for dump files (default: .restcheck/dumps)
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },

    /// Show the execution plan without sending requests
    Plan {
        /// Config file (default: .restcheck.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override base_url from the config
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Initialize config file
    Init,

    /// Check config and schemas
    Doctor,

    /// Export JSON Schema for the report format
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.output != OutputFormat::Silent || cli.verbose {
        logging::init(cli.verbose);
    }

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_TOOL_ERROR as u8)
        }
    }
}

fn load_config(path: Option<&Path>, base_url: Option<String>) -> Result<Config> {
    let cfg = match path {
        Some(p) => Config::load(p)?,
        None => Config::load_default()?,
    };
    Ok(cfg.with_env_overrides().with_base_url_override(base_url))
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            config,
            base_url,
            only,
            fail_fast,
            allow_skipped,
            dump,
            dump_dir,
        } => {
            let cfg = load_config(config.as_deref(), base_url)?;

            let mut suite = reqres_suite()?;
            if !only.is_empty() {
                suite = suite.select(only.as_slice())?;
            }

            let harness = Harness::from_config(&cfg)?.fail_fast(fail_fast).build();

            if cli.output == OutputFormat::Terminal {
                eprintln!("Config:");
                eprintln!("  base_url: {}", cfg.base_url);
                eprintln!("  schemas:  {}", cfg.schema_dir.display());
                if !cfg.headers.is_empty() {
                    eprintln!("  headers:  {} configured", cfg.headers.len());
                }
                eprintln!("  timeout:  {}s", cfg.timeout_secs);
                eprintln!();
            }

            let report = harness.run_suite(&suite);
            let verdict = VerdictPolicy { allow_skipped }.verdict(&report);

            match cli.output {
                OutputFormat::Terminal => print_terminal(&report, &verdict),
                OutputFormat::Json => {
                    let json_output = serde_json::json!({
                        "verdict": {
                            "status": verdict.status.to_string(),
                            "exit_code": verdict.exit_code,
                            "reason": verdict.reason,
                        },
                        "report": report,
                    });
                    println!("{}", serde_json::to_string_pretty(&json_output)?);
                }
                OutputFormat::Silent => {}
            }

            // Dump all interactions if requested (CLI flag or config)
            if dump || cfg.dump {
                let dump_path = dump_dir
                    .or_else(|| cfg.dump_dir.clone())
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DUMP_DIR));

                match restcheck_core::dump::write_dump(&report, &dump_path, true) {
                    Ok(index) => {
                        if cli.output != OutputFormat::Silent {
                            eprintln!(
                                "Dump: {} interactions → {} ({})",
                                index.total,
                                dump_path.display(),
                                index
                                    .operations
                                    .iter()
                                    .map(|e| e.file.as_str())
                                    .collect::<Vec<_>>()
                                    .join(", "),
                            );
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, dir = %dump_path.display(), "failed to write dump"),
                }
            }

            let report_data = storage::ReportData {
                config: &cfg,
                report: &report,
                verdict: &verdict,
            };
            match storage::save_report(&report_data) {
                Ok(path) => {
                    if cli.output != OutputFormat::Silent {
                        eprintln!("Report saved: {}", path.display());
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to save report"),
            }

            Ok(verdict.exit_code)
        }

        Commands::Plan { config, base_url } => {
            let cfg = load_config(config.as_deref(), base_url)?;
            let suite = reqres_suite()?;
            let registry = SchemaRegistry::from_dir(&cfg.schema_dir);
            let plan = SuitePlan::build(&suite, &cfg, &registry);

            match cli.output {
                OutputFormat::Terminal => println!("{}", plan.to_terminal()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                OutputFormat::Silent => {}
            }
            Ok(if plan.has_errors() { 1 } else { 0 })
        }

        Commands::Init => {
            if Path::new(CONFIG_FILE).exists() {
                eprintln!("{CONFIG_FILE} already exists");
                return Ok(1);
            }

            std::fs::write(CONFIG_FILE, Config::example())
                .with_context(|| format!("writing {CONFIG_FILE}"))?;
            println!("Created {CONFIG_FILE}");
            println!("\nEdit the file to configure:");
            println!("  - base_url: service to check");
            println!("  - schema_dir: directory with users/resources schemas");
            println!("  - headers: API keys sent with every request");
            Ok(0)
        }

        Commands::Doctor => {
            println!("restcheck doctor");
            println!("================\n");

            let config_file = [".restcheck.toml", ".restcheck.json", "restcheck.toml"]
                .into_iter()
                .find(|p| Path::new(p).exists());
            println!(
                "[{}] Config file ({})",
                if config_file.is_some() { "OK" } else { "--" },
                config_file.unwrap_or("defaults")
            );

            let cfg = load_config(None, None)?;
            let mut ready = true;
            match cfg.parsed_base_url() {
                Ok(base) => println!("[OK] Base URL ({base})"),
                Err(e) => {
                    ready = false;
                    println!("[NG] Base URL: {e}");
                }
            }

            let suite = reqres_suite()?;
            let registry = SchemaRegistry::from_dir(&cfg.schema_dir);
            for name in suite.schema_names() {
                match registry.get(name) {
                    Ok(_) => println!("[OK] Schema '{name}'"),
                    Err(e) => {
                        ready = false;
                        println!("[NG] Schema '{name}': {e}");
                    }
                }
            }
            println!("[OK] Built-in suite ({} scenarios)", suite.len());

            if config_file.is_none() {
                println!("\nCreate config file:");
                println!("  restcheck init");
            }

            if ready {
                println!("\nReady to run!");
                Ok(0)
            } else {
                Ok(1)
            }
        }

        Commands::Schema => {
            let schema = restcheck_core::report::generate_schema()?;
            println!("{schema}");
            Ok(0)
        }
    }
}

fn print_terminal(report: &SuiteReport, verdict: &Verdict) {
    for s in &report.scenarios {
        println!("[{}] {} ({:.2}s)", s.status, s.name, s.elapsed);
    }

    let failing: Vec<_> = report.non_passing().collect();
    if !failing.is_empty() {
        println!("\nProblems ({}):", failing.len());
        for s in failing {
            println!("  {} [{}]", s.name, s.status);
            for line in s.failure_text().lines() {
                println!("    {line}");
            }
        }
    }

    let icon = if verdict.status == VerdictStatus::Pass {
        "PASS"
    } else {
        "FAIL"
    };
    println!("\n{icon}: {}", verdict.reason);
    println!("  Scenarios: {}", report.summary_line());
    println!("  Run id: {}", report.run_id);
    println!("  Exit code: {}", verdict.exit_code);
}
