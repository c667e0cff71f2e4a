use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::app_config::Config;
use crate::errors::SummarizeError;
use crate::providers::CompletionProvider;
use crate::providers::ollama::OllamaClient;
use crate::summarization::{
    InferenceClient, JobOutcome, JobPhase, MapReduceSummarizer, RetryPolicy,
};
use crate::token_budget::TokenEstimator;
use crate::transcript_processor::{TranscriptCollection, TranscriptFormat};

// @module: Application controller for transcript summarization

/// Main application controller for transcript summarization
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    #[allow(dead_code)]
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Summarize a single transcript file, printing the summary to stdout
    /// and optionally writing it to `output_path`.
    pub async fn run(&self, input_file: PathBuf, output_path: Option<PathBuf>) -> Result<()> {
        let start_time = Instant::now();

        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        // Parse the transcript up front; bad input fails before any
        // network call
        let transcript =
            TranscriptCollection::from_file(&input_file, self.config.summarization.cue_policy)?;
        info!(
            "Parsed {} cues from {:?} ({:?})",
            transcript.cues.len(),
            input_file.file_name().unwrap_or_default(),
            transcript.format
        );

        let summarizer = self.build_summarizer()?;

        // A Ctrl-C mid-job propagates to queued and in-flight calls
        let cancel = summarizer.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling job");
                cancel.cancel();
            }
        });

        // Progress bar driven by per-call completions
        let progress_bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Summarizing");

        let pb = progress_bar.clone();
        let outcome = summarizer
            .summarize_cues_with_progress(&transcript.cues, move |phase, done, total| {
                if phase == JobPhase::Reducing {
                    pb.set_message("Reducing");
                }
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            })
            .await;

        progress_bar.finish_and_clear();

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(error) => {
                if error.is_cancellation() {
                    warn!("Job cancelled before completion");
                } else {
                    error!("Summarization failed: {}", error);
                }
                return Err(error.into());
            }
        };

        self.report_outcome(&outcome, start_time);

        if let Some(path) = output_path {
            std::fs::write(&path, format!("{}\n", outcome.summary))?;
            info!("Summary written to {:?}", path);
        }

        println!("{}", outcome.summary);

        Ok(())
    }

    /// Summarize every transcript file found under a directory
    pub async fn run_folder(&self, input_dir: PathBuf) -> Result<()> {
        if !input_dir.is_dir() {
            return Err(anyhow!("Input path is not a directory: {:?}", input_dir));
        }

        let transcript_files: Vec<PathBuf> = WalkDir::new(&input_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.path().to_path_buf())
            .filter(|p| p.is_file() && TranscriptFormat::from_extension(p).is_some())
            .collect();

        if transcript_files.is_empty() {
            warn!("No transcript files found under {:?}", input_dir);
            return Ok(());
        }

        info!("Found {} transcript file(s)", transcript_files.len());

        let mut processed = 0;
        for file in transcript_files {
            info!("Processing {:?}", file);
            let output = default_output_path(&file);
            match self.run(file.clone(), Some(output)).await {
                Ok(()) => processed += 1,
                Err(e) => error!("Failed to summarize {:?}: {}", file, e),
            }
        }

        info!("Finished processing {} file(s)", processed);
        Ok(())
    }

    /// Wire provider, inference client and engine from the configuration
    fn build_summarizer(&self) -> Result<MapReduceSummarizer> {
        let provider_config = &self.config.provider;
        let summarization = &self.config.summarization;

        let provider = OllamaClient::from_endpoint(
            &provider_config.endpoint,
            provider_config.max_concurrent_requests,
        )?;

        let client = InferenceClient::new(
            Arc::new(provider),
            provider_config.model.clone(),
            provider_config.temperature,
            provider_config.max_concurrent_requests,
            provider_config.timeout(),
            RetryPolicy::with_retries(
                provider_config.max_retries,
                provider_config.backoff_base_ms,
            ),
            provider_config.max_output_tokens,
        );

        let estimator = TokenEstimator::new(summarization.chars_per_token);
        let summarizer = MapReduceSummarizer::new(
            client,
            estimator,
            summarization.chunk_token_budget,
            summarization.overlap_token_budget,
            summarization.reduction_token_budget,
            summarization.allow_partial,
        )?;

        Ok(summarizer)
    }

    /// Check the backend is reachable and the model is present, warning
    /// rather than failing; the job itself will surface hard errors.
    pub async fn verify_backend(&self) -> Result<()> {
        let provider_config = &self.config.provider;
        let provider = OllamaClient::from_endpoint(&provider_config.endpoint, 1)?;

        if let Err(e) = provider.test_connection().await {
            warn!(
                "Backend not reachable at {} ({}); requests may fail",
                provider_config.endpoint, e
            );
            return Ok(());
        }
        debug!("Backend reachable at {}", provider_config.endpoint);

        match provider.has_model(&provider_config.model).await {
            Ok(true) => debug!("Model '{}' is available", provider_config.model),
            Ok(false) => warn!(
                "Model '{}' not found on the backend; pull it first or pick another",
                provider_config.model
            ),
            Err(e) => debug!("Could not list models: {}", e),
        }

        Ok(())
    }

    /// Log job statistics after a successful run
    fn report_outcome(&self, outcome: &JobOutcome, start_time: Instant) {
        let stats = &outcome.stats;
        info!(
            "Summarized {} chunk(s) over {} level(s) in {:.1}s ({} attempts, {:.1}x compression)",
            stats.chunks_processed,
            stats.levels,
            start_time.elapsed().as_secs_f64(),
            stats.total_attempts,
            stats.compression_ratio()
        );

        if outcome.partial {
            warn!(
                "Partial summary: {} chunk(s) skipped after retry exhaustion: {:?}",
                outcome.skipped_chunks.len(),
                outcome.skipped_chunks
            );
        }

        debug!("{}", stats.report());
    }
}

/// Convert a summarization failure into a process exit code, separating
/// "fix your input" from "retry later" from "backend misconfigured".
pub fn exit_code_for(error: &SummarizeError) -> i32 {
    match error {
        SummarizeError::Transcript(_) | SummarizeError::Config(_) => 2,
        SummarizeError::InferenceUnavailable { .. } => 3,
        SummarizeError::InferenceRejected(_) => 4,
        SummarizeError::Cancelled => 130,
        SummarizeError::NoProgress { .. } => 5,
    }
}

/// Resolve the default summary output path for a transcript input
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("summary.txt")
}
