//! VQA dataset browser CLI
//!
//! Inspect question and annotation files: dataset info, filtered question and
//! image ids, and the human answers for a question.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vqa_tools::store::{ImageFilter, QuestionFilter, Vqa};

/// VQA Tools - browse VQA questions and annotations
#[derive(Parser)]
#[command(name = "vqa")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct DatasetArgs {
    /// Path to the question file
    #[arg(short, long)]
    questions: PathBuf,

    /// Path to the annotation file (omit for questions-only mode)
    #[arg(short, long)]
    annotations: Option<PathBuf>,
}

#[derive(Args)]
struct TypeFilterArgs {
    /// Keep only these question types (repeatable)
    #[arg(long = "ques-type")]
    ques_types: Vec<String>,

    /// Keep only these answer types (repeatable)
    #[arg(long = "ans-type")]
    ans_types: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dataset info block
    Info {
        #[command(flatten)]
        dataset: DatasetArgs,
    },

    /// List question ids matching the filters
    Ids {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Keep only questions about these images (repeatable)
        #[arg(long = "img-id")]
        img_ids: Vec<u64>,

        #[command(flatten)]
        types: TypeFilterArgs,
    },

    /// List image ids matching the filters
    Images {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Keep only images of these questions (repeatable)
        #[arg(long = "ques-id")]
        ques_ids: Vec<u64>,

        #[command(flatten)]
        types: TypeFilterArgs,
    },

    /// Show questions and their human answers
    Show {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Question ids to show
        #[arg(required = true)]
        ids: Vec<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { dataset } => cmd_info(dataset),
        Commands::Ids {
            dataset,
            img_ids,
            types,
        } => cmd_ids(dataset, img_ids, types),
        Commands::Images {
            dataset,
            ques_ids,
            types,
        } => cmd_images(dataset, ques_ids, types),
        Commands::Show { dataset, ids } => cmd_show(dataset, ids),
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

fn open(dataset: &DatasetArgs) -> Result<Vqa> {
    match &dataset.annotations {
        Some(annotations) => {
            Vqa::open(&dataset.questions, annotations).context("Failed to load VQA dataset")
        }
        None => Vqa::open_questions_only(&dataset.questions)
            .context("Failed to load VQA questions"),
    }
}

fn cmd_info(dataset: DatasetArgs) -> Result<()> {
    let vqa = open(&dataset)?;

    match vqa.info().as_object() {
        Some(info) => {
            for (key, value) in info {
                println!("{}: {}", key, value);
            }
        }
        None => println!("{}", vqa.info()),
    }

    let header = vqa.header();
    println!("{}", "─".repeat(40));
    println!("  Task type:     {}", header.task_type.as_deref().unwrap_or("-"));
    println!("  Data type:     {}", header.data_type.as_deref().unwrap_or("-"));
    println!("  Data subtype:  {}", header.data_subtype.as_deref().unwrap_or("-"));
    println!("  Questions:     {}", vqa.question_count());
    if let Ok(annotations) = vqa.annotations() {
        println!("  Annotations:   {}", annotations.len());
    }

    Ok(())
}

fn cmd_ids(dataset: DatasetArgs, img_ids: Vec<u64>, types: TypeFilterArgs) -> Result<()> {
    let vqa = open(&dataset)?;
    let filter = QuestionFilter {
        img_ids,
        ques_types: types.ques_types,
        ans_types: types.ans_types,
    };

    let ids = vqa.get_ques_ids(&filter)?;
    for id in &ids {
        println!("{}", id);
    }
    eprintln!("{} question(s)", ids.len());

    Ok(())
}

fn cmd_images(dataset: DatasetArgs, ques_ids: Vec<u64>, types: TypeFilterArgs) -> Result<()> {
    let vqa = open(&dataset)?;
    let filter = ImageFilter {
        ques_ids,
        ques_types: types.ques_types,
        ans_types: types.ans_types,
    };

    let ids = vqa.get_img_ids(&filter)?;
    for id in &ids {
        println!("{}", id);
    }
    eprintln!("{} image id(s)", ids.len());

    Ok(())
}

fn cmd_show(dataset: DatasetArgs, ids: Vec<u64>) -> Result<()> {
    let vqa = open(&dataset)?;
    let anns = vqa.load_qa(&ids)?;
    print!("{}", vqa.show_qa(&anns)?);
    Ok(())
}
