use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use lesson_pipeline::{PayloadContext, PayloadKind, Pipeline, PipelineConfig, RawPayload};

const BATCH_CHUNK: usize = 500;

#[derive(Parser)]
#[command(name = "lesson_pipeline", about = "Structure lesson markdown and AI responses into paginated subsections")]
struct Cli {
    /// Paragraphs grouped onto one page
    #[arg(long, global = true, default_value_t = 2)]
    paragraphs_per_page: usize,
    /// Key points kept per subsection
    #[arg(long, global = true, default_value_t = 5)]
    max_key_points: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split module markdown at #### headings into subsections
    Module {
        /// Input file, or - for stdin
        path: PathBuf,
        #[arg(short, long, default_value = "module")]
        module_id: String,
    },
    /// Structure one subsection's generated markdown
    Subsection {
        /// Input file, or - for stdin
        path: PathBuf,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(long)]
        id: Option<String>,
        #[arg(short, long, default_value = "module")]
        module_id: String,
    },
    /// Recover a JSON value from a free-text AI response
    Json {
        /// Input file, or - for stdin
        path: PathBuf,
        /// Print the caller-shaped fallback instead of the {ok, ...} envelope
        #[arg(long)]
        fallback: bool,
    },
    /// Process many files in parallel, one JSON line per file
    Batch {
        paths: Vec<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = Kind::Module)]
        kind: Kind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Module,
    Subsection,
    AiResponse,
}

impl From<Kind> for PayloadKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Module => PayloadKind::ModuleMarkdown,
            Kind::Subsection => PayloadKind::SubsectionMarkdown,
            Kind::AiResponse => PayloadKind::AiResponse,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let config = PipelineConfig::default()
        .with_paragraphs_per_page(cli.paragraphs_per_page)
        .with_max_key_points(cli.max_key_points);
    let pipeline = Pipeline::new(config);

    match cli.command {
        Commands::Module { path, module_id } => {
            let text = read_input(&path)?;
            let payload = RawPayload::new(PayloadKind::ModuleMarkdown, text);
            let subsections = pipeline.process(&payload, &PayloadContext::module(module_id));
            println!("{}", serde_json::to_string_pretty(&subsections)?);
        }
        Commands::Subsection {
            path,
            title,
            id,
            module_id,
        } => {
            let text = read_input(&path)?;
            let payload = RawPayload::new(PayloadKind::SubsectionMarkdown, text);
            let ctx = PayloadContext {
                module_id,
                subsection_id: id,
                title,
                index: 0,
            };
            let subsections = pipeline.process(&payload, &ctx);
            println!("{}", serde_json::to_string_pretty(&subsections)?);
        }
        Commands::Json { path, fallback } => {
            let text = read_input(&path)?;
            let result = pipeline.extract_json(&text);
            let out = if fallback {
                result.fallback_value()
            } else {
                result.to_value()
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Batch { paths, kind } => {
            if paths.is_empty() {
                println!("No input files.");
                return Ok(());
            }
            let lines = process_batch(&pipeline, &paths, kind.into())?;
            for line in lines {
                println!("{}", line);
            }
        }
    }

    info!("done in {:.1}s", t0.elapsed().as_secs_f64());
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn process_batch(pipeline: &Pipeline, paths: &[PathBuf], kind: PayloadKind) -> Result<Vec<String>> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut lines = Vec::with_capacity(paths.len());
    let mut subsection_count = 0usize;

    for chunk in paths.chunks(BATCH_CHUNK) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|path| {
                let text = read_input(path)?;
                let module_id = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "module".to_string());
                let ctx = PayloadContext::module(module_id.clone());
                let subsections = pipeline.process(&RawPayload::new(kind, text), &ctx);
                anyhow::Ok((path, module_id, subsections))
            })
            .collect();

        for result in results {
            match result {
                Ok((path, module_id, subsections)) => {
                    subsection_count += subsections.len();
                    lines.push(serde_json::to_string(&serde_json::json!({
                        "path": path.display().to_string(),
                        "moduleId": module_id,
                        "subsections": subsections,
                    }))?);
                }
                Err(e) => warn!("skipping input: {:#}", e),
            }
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    info!(files = paths.len(), subsections = subsection_count, "batch processed");
    Ok(lines)
}
