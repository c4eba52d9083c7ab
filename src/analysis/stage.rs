//! Pipeline stage wrapping the parking analysis.

use std::path::Path;

use tracing::{error, info, warn};

use super::{
    analyze_parking_slots, load_slot_definitions, AnalysisResult, ParkingModel, SlotClassifier,
};
use crate::core::config::{AnalysisConfig, ResolvedPaths};
use crate::core::file_utils::save_json;
use crate::core::timer::Timer;

/// Run the parking analysis on `orthophoto` and persist non-empty results.
///
/// Never fails: missing inputs and I/O problems are logged and produce an
/// empty result list.
pub fn run_analysis_stage(
    orthophoto: &Path,
    config: &AnalysisConfig,
    paths: &ResolvedPaths,
    classifier: &mut dyn SlotClassifier,
) -> Vec<AnalysisResult> {
    info!("--- Stage: parking slot analysis ---");
    let _timer = Timer::start("Parking slot analysis");

    let model = match &config.model_filename {
        Some(name) => ParkingModel::load(&paths.models_dir, name),
        None => {
            warn!("No model file configured (analysis.model_filename)");
            None
        }
    };

    let slots = match &config.slot_filename {
        Some(name) => {
            let path = paths.parking_layout_dir.join(name);
            match load_slot_definitions(&path) {
                Ok(slots) => Some(slots),
                Err(e) => {
                    error!("Failed to load slot layout: {}", e);
                    None
                }
            }
        }
        None => {
            warn!("No slot layout configured (analysis.slot_filename)");
            None
        }
    };

    let results = match (&model, &slots) {
        _ if !orthophoto.exists() => {
            error!("Orthophoto not found for analysis: {}", orthophoto.display());
            Vec::new()
        }
        (Some(model), Some(slots)) if !slots.is_empty() => analyze_parking_slots(
            orthophoto,
            Some(model),
            slots,
            config.confidence_threshold,
            classifier,
        ),
        _ => {
            warn!("Skipping parking analysis: model or slot layout not available");
            Vec::new()
        }
    };

    if !results.is_empty() {
        let path = paths.output_dir.join(&config.results_filename);
        if let Err(e) = save_json(&results, &path) {
            error!("Failed to save analysis results: {}", e);
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RandomSlotClassifier;
    use crate::core::config::PathsConfig;
    use std::fs;
    use tempfile::tempdir;

    fn setup(root: &Path) -> (ResolvedPaths, std::path::PathBuf) {
        let paths = PathsConfig {
            project_root: root.to_path_buf(),
            ..PathsConfig::default()
        }
        .resolve()
        .unwrap();
        fs::create_dir_all(&paths.models_dir).unwrap();
        fs::create_dir_all(&paths.parking_layout_dir).unwrap();
        fs::create_dir_all(&paths.output_dir).unwrap();
        let ortho = paths.output_dir.join("final_orthophoto.tif");
        fs::write(&ortho, b"tif").unwrap();
        (paths, ortho)
    }

    #[test]
    fn writes_results_file_when_inputs_exist() {
        let dir = tempdir().unwrap();
        let (paths, ortho) = setup(dir.path());
        let config = AnalysisConfig {
            confidence_threshold: 0.0,
            ..AnalysisConfig::default()
        };
        fs::write(paths.models_dir.join("yolov8s_parking_best.pt"), b"w").unwrap();
        fs::write(
            paths.parking_layout_dir.join("parking_slots_layout.json"),
            r#"[{"id": "A1", "geometry": [[0, 0], [1, 0], [1, 1]]}, {"id": "A2", "geometry": []}]"#,
        )
        .unwrap();

        let mut classifier = RandomSlotClassifier::new(Some(3));
        let results = run_analysis_stage(&ortho, &config, &paths, &mut classifier);
        assert_eq!(results.len(), 1);

        let saved: Vec<AnalysisResult> =
            crate::core::file_utils::load_json(&paths.output_dir.join(&config.results_filename))
                .unwrap();
        assert_eq!(saved, results);
    }

    #[test]
    fn missing_layout_skips_without_writing() {
        let dir = tempdir().unwrap();
        let (paths, ortho) = setup(dir.path());
        let config = AnalysisConfig::default();
        fs::write(paths.models_dir.join("yolov8s_parking_best.pt"), b"w").unwrap();

        let mut classifier = RandomSlotClassifier::new(Some(3));
        assert!(run_analysis_stage(&ortho, &config, &paths, &mut classifier).is_empty());
        assert!(!paths.output_dir.join(&config.results_filename).exists());
    }

    #[test]
    fn unset_filenames_skip_analysis() {
        let dir = tempdir().unwrap();
        let (paths, ortho) = setup(dir.path());
        let config = AnalysisConfig {
            model_filename: None,
            slot_filename: None,
            ..AnalysisConfig::default()
        };
        let mut classifier = RandomSlotClassifier::new(None);
        assert!(run_analysis_stage(&ortho, &config, &paths, &mut classifier).is_empty());
    }
}
