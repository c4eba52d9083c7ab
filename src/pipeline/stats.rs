//! Run statistics collected by the pipeline.

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::analysis::{count_statuses, AnalysisResult};
use crate::core::config::OdmOptionValue;

/// Statistics accumulated over one pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    /// Number of input images found
    pub image_count: usize,
    /// Orthophoto resolution passed to ODM, in cm/pixel
    pub odm_resolution: Option<OdmOptionValue>,
    /// Whether an orthophoto was produced
    pub ortho_found: bool,
    /// Whether an elevation raster was produced
    pub dsm_found: bool,
    /// Whether the parking analysis ran
    pub analysis_run: bool,
    /// Analysis results; `None` when the analysis did not run
    pub analysis_results: Option<Vec<AnalysisResult>>,
    /// Wall-clock time of the whole run
    #[serde(rename = "total_time_secs", serialize_with = "serialize_secs")]
    pub total_time: Duration,
}

impl PipelineStats {
    /// Occupied and vacant counts, when the analysis produced results.
    pub fn occupancy(&self) -> Option<(usize, usize, usize)> {
        let results = self.analysis_results.as_ref()?;
        let (occupied, vacant) = count_statuses(results);
        Some((results.len(), occupied, vacant))
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}
