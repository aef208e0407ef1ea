//! Evaluation CLI binary for scoring VQA result files.
//!
//! Usage:
//!   vqa-eval evaluate --questions <q> --annotations <a> --results <r>
//!   vqa-eval batch <dir> --questions <q> --annotations <a>
//!
//! Options:
//!   --precision <N>          # Decimal places in reported accuracies
//!   --ids <ID>...            # Evaluate only these question ids
//!   --output-dir <path>      # Where to write accuracy/evalQA/... files
//!   --no-save                # Print only
//!   --show-low               # Show one poorly answered question

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vqa_tools::config::Config;
use vqa_tools::eval::{EvalReport, VqaEval};
use vqa_tools::persistence::{ResultPaths, find_result_files, save_report};
use vqa_tools::store::{ResultSet, Vqa};

#[derive(Parser)]
#[command(name = "vqa-eval")]
#[command(about = "Score VQA results with the human-agreement accuracy metric", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the question file
    #[arg(short, long, global = true)]
    questions: Option<PathBuf>,

    /// Path to the annotation file
    #[arg(short, long, global = true)]
    annotations: Option<PathBuf>,

    /// Decimal places in reported accuracies (overrides config)
    #[arg(long, global = true)]
    precision: Option<u32>,

    /// Directory for evaluation outputs (default: next to each results file)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Do not write evaluation outputs
    #[arg(long, global = true)]
    no_save: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one result file
    Evaluate {
        /// Path to the result file (JSON array of {question_id, answer})
        #[arg(short, long)]
        results: PathBuf,

        /// Evaluate only these question ids
        #[arg(long, value_delimiter = ',')]
        ids: Vec<u64>,

        /// Show the ground truth of one poorly answered question
        #[arg(long)]
        show_low: bool,
    },

    /// Evaluate every *_results.json file under a directory
    Batch {
        /// Directory to search
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(precision) = cli.precision {
        config.eval.precision = precision;
    }
    config.validate().context("Invalid configuration")?;

    let (Some(questions), Some(annotations)) = (&cli.questions, &cli.annotations) else {
        anyhow::bail!("--questions and --annotations are required");
    };

    let vqa = Vqa::open(questions, annotations).context("Failed to load VQA dataset")?;

    match &cli.command {
        Commands::Evaluate {
            results,
            ids,
            show_low,
        } => cmd_evaluate(&cli, &config, &vqa, results, ids, *show_low),
        Commands::Batch { dir } => cmd_batch(&cli, &config, &vqa, dir),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("vqa_tools=debug,info")
    } else {
        EnvFilter::new("vqa_tools=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_one(
    cli: &Cli,
    config: &Config,
    vqa: &Vqa,
    results: &Path,
    ids: &[u64],
) -> Result<(ResultSet, EvalReport)> {
    let res = vqa
        .load_res(results)
        .with_context(|| format!("Failed to load results from {:?}", results))?;

    let report = {
        let evaluator = VqaEval::with_config(vqa, &res, &config.eval)?;
        if ids.is_empty() {
            evaluator.evaluate()
        } else {
            evaluator.evaluate_ids(ids)
        }
        .context("Evaluation failed")?
    };

    if !cli.no_save {
        let paths = match &cli.output_dir {
            Some(dir) => ResultPaths::for_results_file_in(results, dir),
            None => ResultPaths::for_results_file(results),
        };
        save_report(&report, &paths).context("Failed to save evaluation outputs")?;
    }

    Ok((res, report))
}

fn cmd_evaluate(
    cli: &Cli,
    config: &Config,
    vqa: &Vqa,
    results: &Path,
    ids: &[u64],
    show_low: bool,
) -> Result<()> {
    let (res, report) = run_one(cli, config, vqa, results, ids)?;
    report.print_summary(config.eval.precision);

    let low = report.low_scoring(config.eval.low_score_threshold);
    println!(
        "{} question(s) scored below {:.0}%",
        low.len(),
        config.eval.low_score_threshold * 100.0
    );

    if show_low {
        if let Some(&qid) = low.first() {
            println!("\nground truth answers");
            let anns = vqa.load_qa(&[qid])?;
            print!("{}", vqa.show_qa(&anns)?);

            if let Some(pred) = res.get(qid) {
                println!("\ngenerated answer (accuracy {:.2})", report.eval_qa[&qid] * 100.0);
                println!("Answer:   {}", pred.answer);
            }
        }
    }

    Ok(())
}

fn cmd_batch(cli: &Cli, config: &Config, vqa: &Vqa, dir: &Path) -> Result<()> {
    let files = find_result_files(dir)?;
    if files.is_empty() {
        println!("No *_results.json files found under {:?}", dir);
        return Ok(());
    }

    let p = config.eval.precision as usize;
    println!("{}", "─".repeat(60));
    for file in &files {
        match run_one(cli, config, vqa, file, &[]) {
            Ok((_, report)) => println!("{:>8.p$}  {}", report.accuracy.overall, file.display()),
            Err(e) => println!("{:>8}  {} ({:#})", "failed", file.display(), e),
        }
    }
    println!("{}", "─".repeat(60));
    println!("Evaluated {} result file(s)", files.len());

    Ok(())
}
