//! Command-line surface. Parses arguments, loads the dataset and hands the
//! query to the [`Solver`]; no matching logic lives here.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::{parse_threshold, SolverConfig};
use crate::dataset::Dataset;
use crate::format::{answer_label, confidence_percent, Emphasis, FormattedOutput};
use crate::help;
use crate::ocr::{self, OcrEngine, ProgressView, TesseractEngine};
use crate::pipeline::Solver;

#[derive(Parser, Debug)]
#[command(name = "quizmatch")]
#[command(version, about = "Answer a question by finding the closest entry in a Q&A dataset", long_about = None)]
pub struct Cli {
    /// Dataset JSON file (question → {answer, explanation})
    #[arg(long, global = true)]
    pub dataset: Option<PathBuf>,

    /// Reject matches below this confidence percentage (0-100)
    #[arg(long, global = true, value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Emphasis for rendered values: html, ansi or plain
    #[arg(long, global = true)]
    pub emphasis: Option<Emphasis>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Write logs to stderr as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look up a typed question
    Ask {
        /// Question text
        question: String,
    },

    /// Recognize a question in an image and look it up
    Image {
        /// Image file (screenshot or photo of the question)
        path: PathBuf,

        /// Tesseract language code
        #[arg(long)]
        lang: Option<String>,
    },

    /// List the closest dataset entries for a question
    Rank {
        question: String,

        /// Number of entries to show
        #[arg(long, default_value_t = 5)]
        top: usize,
    },

    /// Translate an OCR engine status string
    Status { raw: String },

    /// Describe a result field
    Explain {
        /// text-solver or image-solver
        page: String,
        field: String,
    },
}

impl Cli {
    /// Environment config with command-line overrides applied.
    fn config(&self) -> Result<SolverConfig> {
        let mut cfg = SolverConfig::from_env().context("reading QUIZMATCH_* environment")?;
        if let Some(path) = &self.dataset {
            cfg.dataset_path = path.clone();
        }
        if self.threshold.is_some() {
            cfg.confidence_threshold = self.threshold;
        }
        if let Some(emphasis) = self.emphasis {
            cfg.emphasis = emphasis;
        }
        if let Commands::Image { lang: Some(lang), .. } = &self.command {
            cfg.ocr_language = lang.clone();
        }
        Ok(cfg)
    }

    pub fn run(self) -> Result<()> {
        match &self.command {
            Commands::Status { raw } => {
                println!("{}", ocr::translate_status(raw));
                Ok(())
            }
            Commands::Explain { page, field } => match help::describe(page, field) {
                Some(text) => {
                    println!("{text}");
                    Ok(())
                }
                None => bail!("no description for field {field:?} on page {page:?}"),
            },
            Commands::Ask { question } => {
                let cfg = self.config()?;
                let solver = build_solver(&cfg)?;
                self.print_output(&solver.solve_text(question))
            }
            Commands::Rank { question, top } => {
                let cfg = self.config()?;
                let solver = build_solver(&cfg)?;
                let ranked = solver.rank(question, *top);
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&ranked)?);
                } else {
                    for (i, m) in ranked.iter().enumerate() {
                        println!(
                            "{:>2}. {:>8}  {:<9}  {}",
                            i + 1,
                            confidence_percent(m.confidence),
                            answer_label(m.answer),
                            m.question_text
                        );
                    }
                }
                Ok(())
            }
            Commands::Image { path, .. } => {
                let cfg = self.config()?;
                let engine = Arc::new(TesseractEngine::new(&cfg.tesseract_bin, &cfg.ocr_language));
                if !engine.is_available() {
                    bail!(
                        "tesseract binary {} is not available",
                        cfg.tesseract_bin.display()
                    );
                }
                let solver = build_solver(&cfg)?.with_engine(engine);

                let (tx, rx) = crossbeam_channel::unbounded();
                let printer = std::thread::Builder::new()
                    .name("ocr-progress".into())
                    .spawn(move || {
                        for event in rx.iter() {
                            let view = ProgressView::from(&event);
                            eprintln!("{}{}", view.status, view.percent);
                        }
                    })
                    .context("spawning progress printer")?;

                let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
                let result = runtime.block_on(solver.solve_image(path, tx));
                if printer.join().is_err() {
                    warn!("progress printer panicked");
                }

                match result.with_context(|| format!("recognizing {}", path.display()))? {
                    Some(out) => self.print_output(&out),
                    None => bail!("image run was superseded"),
                }
            }
        }
    }

    fn print_output(&self, out: &FormattedOutput) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(out)?);
            return Ok(());
        }
        let labels = ["Texto", "Coincidencia", "Confianza", "Respuesta", "Explicación"];
        for (label, (_, value)) in labels.iter().zip(out.fields()) {
            println!("{label}: {value}");
        }
        Ok(())
    }
}

fn build_solver(cfg: &SolverConfig) -> Result<Solver> {
    let dataset = Dataset::load_from_file(&cfg.dataset_path)
        .with_context(|| format!("loading dataset {}", cfg.dataset_path.display()))?;
    if dataset.is_empty() {
        warn!(path = %cfg.dataset_path.display(), "dataset is empty, every lookup will miss");
    }
    info!(
        entries = dataset.len(),
        threshold = ?cfg.confidence_threshold,
        "solver ready"
    );
    Ok(Solver::new(Arc::new(dataset))
        .with_threshold(cfg.threshold_policy())
        .with_emphasis(cfg.emphasis))
}

fn log_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quizmatch=info"))
}

fn init_tracing(json: bool) {
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_filter())
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_filter())
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Parse arguments, initialize logging and run the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    cli.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "quizmatch",
            "ask",
            "¿Es la Tierra redonda?",
            "--threshold",
            "80",
            "--emphasis",
            "plain",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.threshold, Some(80.0));
        assert_eq!(cli.emphasis, Some(Emphasis::Plain));
        assert!(cli.json);
        assert!(!cli.log_json);
        assert!(matches!(cli.command, Commands::Ask { ref question } if question == "¿Es la Tierra redonda?"));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        assert!(Cli::try_parse_from(["quizmatch", "ask", "q", "--threshold", "150"]).is_err());
    }

    #[test]
    fn rank_defaults_to_five() {
        let cli = Cli::try_parse_from(["quizmatch", "rank", "q"]).unwrap();
        assert!(matches!(cli.command, Commands::Rank { top: 5, .. }));
    }

    #[test]
    fn image_lang_overrides_config() {
        let cli = Cli::try_parse_from(["quizmatch", "image", "q.png", "--lang", "eng"]).unwrap();
        assert_eq!(cli.config().unwrap().ocr_language, "eng");
    }

    #[test]
    fn log_json_is_global() {
        let cli = Cli::try_parse_from(["quizmatch", "status", "recognizing text", "--log-json"]).unwrap();
        assert!(cli.log_json);
        assert!(!cli.json);
        let cli = Cli::try_parse_from(["quizmatch", "--log-json", "rank", "q"]).unwrap();
        assert!(cli.log_json);
    }
}
