use std::{path::Path, sync::Arc};

use regex::Regex;
use tracing::info;

use crate::{
    algorithm::GreedyStringTiling,
    config::Config,
    error::Error,
    input::{read_submission_set, ReadOptions, TokenizingStore},
    language::{Language, LanguageRegistry},
    result::ComparisonResult,
    strategy::{
        ComparisonMode, ComparisonStrategy, ExternalStrategy, NormalStrategy, ParallelStrategy, StrategyOptions,
        SystemMemory,
    },
    submission::SubmissionSet,
};

/// Runs one detection: reads a corpus with the configured frontend and compares it with the configured strategy.
pub struct Detector {
    config: Config,
    language: Arc<dyn Language>,
    minimum_match_length: usize,
}

impl Detector {
    pub fn new(config: Config, registry: &LanguageRegistry) -> Result<Detector, Error> {
        config.validate()?;
        let language: Arc<dyn Language> = Arc::from(registry.create(&config.language)?);
        let minimum_match_length = config
            .minimum_match_length
            .unwrap_or_else(|| language.default_minimum_match_length());
        info!(
            language = language.name(),
            minimum_match_length,
            mode = ?config.comparison_mode,
            "configured detector"
        );
        Ok(Detector {
            config,
            language,
            minimum_match_length,
        })
    }

    pub fn minimum_match_length(&self) -> usize {
        self.minimum_match_length
    }

    pub fn read(&self, root: &Path) -> Result<SubmissionSet, Error> {
        let exclude = self.config.exclude.as_deref().map(Regex::new).transpose()?;
        let options = ReadOptions {
            minimum_match_length: self.minimum_match_length,
            base_code: self.config.base_code.clone(),
            exclude,
            keep_tokens: self.config.comparison_mode != ComparisonMode::External,
        };
        read_submission_set(root, self.language.as_ref(), &options)
    }

    pub fn compare(&self, set: &mut SubmissionSet) -> Result<ComparisonResult, Error> {
        let mut gst = GreedyStringTiling::new(self.minimum_match_length)?;
        if let Some(base_code) = set.base_code() {
            gst.register_base_code(base_code)
                .map_err(|err| Error::Config(format!("base code: {err}")))?;
        }

        let options = StrategyOptions {
            metric: self.config.similarity_metric,
            similarity_threshold: self.config.similarity_threshold,
        };
        let mut result = match self.config.comparison_mode {
            ComparisonMode::Normal => NormalStrategy::new(&gst, options).compare_submissions(set)?,
            ComparisonMode::Parallel => {
                ParallelStrategy::new(&gst, options, self.config.worker_count).compare_submissions(set)?
            }
            ComparisonMode::External => {
                let store = TokenizingStore::new(Arc::clone(&self.language));
                ExternalStrategy::new(&gst, options, store, SystemMemory::new())
                    .with_memory_pressure_factor(self.config.memory_pressure_factor)
                    .compare_submissions(set)?
            }
        };

        if let Some(limit) = self.config.max_comparisons {
            result.drop_comparisons(limit);
        }
        info!("{result}");
        Ok(result)
    }

    /// Reads the corpus under `root` and compares it.
    pub fn run(&self, root: &Path) -> Result<ComparisonResult, Error> {
        let mut set = self.read(root)?;
        self.compare(&mut set)
    }
}
