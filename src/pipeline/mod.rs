//! End-to-end orchestration.
//!
//! [`Pipeline::run`] discovers the input images, runs ODM, locates its
//! rasters, copies the orthophoto, runs the parking analysis and finally asks
//! the report generator for a summary. Only the first two stages can abort
//! the run; everything after ODM is best-effort.

pub mod stats;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::analysis::{run_analysis_stage, RandomSlotClassifier, SlotClassifier};
use crate::core::config::{OrthoparkConfig, ResolvedPaths};
use crate::core::errors::{OrthoparkError, Result};
use crate::core::file_utils::list_images;
use crate::core::timer::{format_duration, Timer};
use crate::odm::{find_odm_results, CommandRunner, OdmInvocation, OdmRunner};
use crate::report::{run_report_stage, LmStudioClient, ReportGenerator};

pub use stats::PipelineStats;

/// Sequences the processing stages of one run
pub struct Pipeline {
    config: OrthoparkConfig,
    paths: ResolvedPaths,
    odm: OdmRunner,
    reporter: Option<Arc<dyn ReportGenerator>>,
    classifier: Box<dyn SlotClassifier + Send>,
}

impl Pipeline {
    /// Create a pipeline with the system process runner and no report generator.
    pub fn new(config: OrthoparkConfig, paths: ResolvedPaths) -> Self {
        let classifier = Box::new(RandomSlotClassifier::new(config.analysis.seed));
        Self {
            config,
            paths,
            odm: OdmRunner::default(),
            reporter: None,
            classifier,
        }
    }

    /// Validate `config`, resolve its paths and wire the LM Studio client when
    /// reports are enabled.
    pub fn from_config(config: OrthoparkConfig) -> Result<Self> {
        config.validate()?;
        let paths = config.paths.resolve()?;
        let reporter: Option<Arc<dyn ReportGenerator>> = if config.report.enabled {
            Some(Arc::new(LmStudioClient::from_config(&config.report)?))
        } else {
            None
        };
        Ok(Self::new(config, paths).with_report_generator(reporter))
    }

    /// Use `runner` to spawn external processes.
    pub fn with_command_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.odm = OdmRunner::new(runner);
        self
    }

    /// Set or clear the report generator.
    pub fn with_report_generator(mut self, reporter: Option<Arc<dyn ReportGenerator>>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Replace the slot classifier used by the analysis stage.
    pub fn with_classifier(mut self, classifier: Box<dyn SlotClassifier + Send>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Resolved directories of this pipeline.
    pub fn paths(&self) -> &ResolvedPaths {
        &self.paths
    }

    /// Configuration of this pipeline.
    pub fn config(&self) -> &OrthoparkConfig {
        &self.config
    }

    /// Run every stage in order.
    pub async fn run(&mut self) -> Result<PipelineStats> {
        let started = Instant::now();
        let mut stats = PipelineStats::default();

        info!("==================================================");
        info!("=== Orthophoto analysis pipeline started ===");
        info!("==================================================");
        info!("Project root: {}", self.paths.project_root.display());
        info!("Input images: {}", self.paths.input_image_dir.display());
        info!("Output directory: {}", self.paths.output_dir.display());

        // Stage 1: input images
        info!("--- Stage: input image discovery ---");
        let images = list_images(&self.paths.input_image_dir);
        stats.image_count = images.len();
        if images.is_empty() {
            error!(
                "No images found in {}; aborting",
                self.paths.input_image_dir.display()
            );
            return Err(OrthoparkError::pipeline(
                "input",
                format!(
                    "No images found in {}",
                    self.paths.input_image_dir.display()
                ),
            ));
        }
        info!("Found {} images for processing", images.len());

        // Stage 2: ODM
        stats.odm_resolution = self.config.odm.resolution().cloned();
        let invocation = OdmInvocation::from_config(&self.config.odm, &self.paths);
        let run = {
            let _timer = Timer::start("ODM processing");
            self.odm.run(&invocation).await?
        };

        // Stage 3: result rasters
        info!("--- Stage: locating ODM results ---");
        let outputs = find_odm_results(&run.project_dir);
        stats.ortho_found = outputs.orthophoto.is_some();
        stats.dsm_found = outputs.elevation.is_some();

        let orthophoto = outputs.orthophoto.as_deref().map(|source| {
            copy_orthophoto(
                source,
                &self
                    .paths
                    .output_dir
                    .join(&self.config.outputs.orthophoto_filename),
            )
        });

        // Stage 4: parking analysis
        if !self.config.analysis.enabled {
            info!("Parking analysis disabled in configuration");
        } else if let Some(orthophoto) = &orthophoto {
            let results = run_analysis_stage(
                orthophoto,
                &self.config.analysis,
                &self.paths,
                self.classifier.as_mut(),
            );
            stats.analysis_run = true;
            stats.analysis_results = Some(results);
        } else {
            warn!("No orthophoto available; parking analysis skipped");
        }

        stats.total_time = started.elapsed();

        // Stage 5: report
        let report_path = self.paths.output_dir.join(&self.config.report.report_filename);
        let report_written = match &self.reporter {
            Some(reporter) => run_report_stage(reporter.as_ref(), &stats, &report_path)
                .await
                .is_some(),
            None => {
                info!("Report generation disabled");
                false
            }
        };

        info!("==================================================");
        info!(
            "=== Pipeline finished in {} ===",
            format_duration(started.elapsed())
        );
        match &orthophoto {
            Some(path) => info!("Orthophoto: {}", path.display()),
            None => warn!("Orthophoto: not produced"),
        }
        match &outputs.elevation {
            Some(raster) => info!("Elevation model: {}", raster.path.display()),
            None => warn!("Elevation model: not produced"),
        }
        if stats
            .analysis_results
            .as_ref()
            .is_some_and(|r| !r.is_empty())
        {
            info!(
                "Analysis results: {}",
                self.paths
                    .output_dir
                    .join(&self.config.analysis.results_filename)
                    .display()
            );
        }
        if report_written && report_path.exists() {
            info!("Report: {}", report_path.display());
        }
        info!("==================================================");

        Ok(stats)
    }
}

/// Copy the orthophoto into the output directory; falls back to `source`.
fn copy_orthophoto(source: &Path, destination: &Path) -> PathBuf {
    if source == destination {
        return source.to_path_buf();
    }
    info!(
        "Copying orthophoto {} -> {}",
        source.display(),
        destination.display()
    );
    let copied = destination
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| fs::copy(source, destination));
    match copied {
        Ok(_) => destination.to_path_buf(),
        Err(e) => {
            warn!(
                "Failed to copy orthophoto ({}); using original at {}",
                e,
                source.display()
            );
            source.to_path_buf()
        }
    }
}
