pub mod discover;
pub mod error;
pub mod extract;
pub mod generator;
pub mod model;
pub mod prompt;
pub mod publish;

use crate::error::{DiscoveryError, StepError};
use crate::generator::{GenerateOptions, TextGenerator};
use crate::model::{PhotoAnalysis, PostResult, RunOutcome, RunReport, Stage};
use std::io::Write;
use std::path::{Path, PathBuf};

pub use crate::generator::CliGenerator;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub model: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("photos"),
            output_dir: PathBuf::from("outputs"),
            model: Some("gemini-1.5-pro".to_string()),
        }
    }
}

/// One photos-to-post run: analyze every image, then write a post about
/// the ones that could be analyzed.
pub struct Pipeline<G> {
    config: Config,
    generator: G,
    report: RunReport,
}

impl<G: TextGenerator> Pipeline<G> {
    pub fn new(config: Config, generator: G) -> Self {
        Self {
            config,
            generator,
            report: RunReport::default(),
        }
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn into_report(self) -> RunReport {
        self.report
    }

    fn options(&self) -> GenerateOptions {
        GenerateOptions {
            model: self.config.model.clone(),
        }
    }

    pub fn analyze_image(&self, image: &Path) -> Result<PhotoAnalysis, StepError> {
        let output = self
            .generator
            .generate(&prompt::analysis_prompt(image), &self.options())?;
        extract::extract_as::<PhotoAnalysis>(&output).map_err(|e| {
            log::debug!("raw output for {}: {output}", image.display());
            StepError::from(e)
        })
    }

    /// Analyzes images one at a time. Failed images are logged, recorded and
    /// left out.
    pub fn analyze_all(&mut self, images: &[PathBuf]) -> Vec<PhotoAnalysis> {
        let mut analyses = Vec::with_capacity(images.len());
        for image in images {
            log::info!("analyzing image: {}", image.display());
            match self.analyze_image(image) {
                Ok(analysis) => analyses.push(analysis),
                Err(e) => {
                    log::warn!("analysis failed for {}, skipping: {e}", image.display());
                    self.report
                        .record(Stage::Analysis, Some(image.clone()), &e);
                }
            }
        }
        self.report.analyzed = analyses.len();
        analyses
    }

    pub fn synthesize_post(&self, analyses: &[PhotoAnalysis]) -> Result<PostResult, StepError> {
        let prompt = prompt::post_prompt(analyses);
        let output = self.generator.generate(&prompt, &self.options())?;
        extract::extract_as::<PostResult>(&output).map_err(|e| {
            log::debug!("raw synthesis output: {output}");
            StepError::from(e)
        })
    }

    /// Runs every stage. Only a failure to list the input directory is
    /// returned as an error; everything else ends up in the outcome and the
    /// report.
    pub fn run(&mut self, console: &mut impl Write) -> Result<RunOutcome, DiscoveryError> {
        let images = discover::discover_images(&self.config.input_dir)?;
        self.report.images = images.len();
        if images.is_empty() {
            log::warn!(
                "no images found in {}",
                self.config.input_dir.display()
            );
            return Ok(RunOutcome::NoImages);
        }

        let analyses = self.analyze_all(&images);
        if analyses.is_empty() {
            log::error!("no analyses were generated from {} images", images.len());
            return Ok(RunOutcome::NoAnalyses);
        }

        log::info!("generating post from {} analyses", analyses.len());
        let post = match self.synthesize_post(&analyses) {
            Ok(post) => post,
            Err(e) => {
                log::error!("post generation failed: {e}");
                self.report.record(Stage::Synthesis, None, &e);
                return Ok(RunOutcome::SynthesisFailed);
            }
        };

        let saved_to = match publish::save_post(&post, &self.config.output_dir) {
            Ok(path) => Some(path),
            Err(e) => {
                log::error!("could not save post: {e}");
                self.report.record(Stage::Write, None, &e);
                None
            }
        };
        if let Err(e) = publish::announce(console, &post, saved_to.as_deref()) {
            log::error!("failed to print post: {e}");
        }
        Ok(RunOutcome::Published { post, saved_to })
    }
}
