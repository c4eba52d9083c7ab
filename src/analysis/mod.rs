//! Parking slot occupancy analysis.
//!
//! No detector is wired in yet: [`ParkingModel`] only checks that the model
//! file exists and [`RandomSlotClassifier`] assigns synthetic labels. The
//! layout loading, thresholding and result format are the real contract.

pub mod stage;

use std::fmt;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::core::errors::{OrthoparkError, Result};
use crate::core::file_utils::load_json;

pub use stage::run_analysis_stage;

/// Lower bound of the placeholder confidence range.
pub const MIN_PLACEHOLDER_CONFIDENCE: f64 = 0.6;
/// Upper bound (exclusive) of the placeholder confidence range.
pub const MAX_PLACEHOLDER_CONFIDENCE: f64 = 1.0;

/// Identifier of a parking slot, as written in the layout file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotId {
    /// Numeric identifier
    Number(i64),
    /// Textual identifier
    Text(String),
}

impl Default for SlotId {
    fn default() -> Self {
        Self::Text("unknown_slot".to_string())
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One parking space from the layout file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotDefinition {
    /// Slot identifier
    #[serde(default)]
    pub id: SlotId,
    /// Polygon vertices as `[x, y]` pairs
    #[serde(default)]
    pub geometry: Option<Vec<[f64; 2]>>,
}

impl SlotDefinition {
    /// Whether the slot has at least one vertex.
    pub fn has_geometry(&self) -> bool {
        self.geometry.as_ref().is_some_and(|g| !g.is_empty())
    }
}

/// Occupancy label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    /// A vehicle is present
    Occupied,
    /// The slot is free
    Vacant,
}

/// Result for one slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Slot identifier
    pub slot_id: SlotId,
    /// Occupancy label
    pub status: SlotStatus,
    /// Confidence, rounded to three decimals
    pub confidence: f64,
}

/// Counts of occupied and vacant slots in a result list.
pub fn count_statuses(results: &[AnalysisResult]) -> (usize, usize) {
    results.iter().fold((0, 0), |(occupied, vacant), r| match r.status {
        SlotStatus::Occupied => (occupied + 1, vacant),
        SlotStatus::Vacant => (occupied, vacant + 1),
    })
}

/// Handle to a parking detection model on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkingModel {
    path: PathBuf,
}

impl ParkingModel {
    /// Locate `filename` in `models_dir`; `None` when the file is missing.
    pub fn load(models_dir: &Path, filename: &str) -> Option<Self> {
        let path = models_dir.join(filename);
        if !path.is_file() {
            error!("Model file not found: {}", path.display());
            return None;
        }
        info!("Loading parking model from: {}", path.display());
        warn!("Model weights are not deserialized; using placeholder classifier");
        Some(Self { path })
    }

    /// Path of the model file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Assigns a status and confidence to a slot
pub trait SlotClassifier {
    /// Classify one slot.
    fn classify(&mut self, slot: &SlotDefinition) -> (SlotStatus, f64);
}

/// Uniformly random labels with confidence in `[0.6, 1.0)`
pub struct RandomSlotClassifier {
    rng: StdRng,
}

impl RandomSlotClassifier {
    /// Seeded when `seed` is given, otherwise seeded from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl SlotClassifier for RandomSlotClassifier {
    fn classify(&mut self, _slot: &SlotDefinition) -> (SlotStatus, f64) {
        let status = if self.rng.gen_bool(0.5) {
            SlotStatus::Occupied
        } else {
            SlotStatus::Vacant
        };
        let confidence = self
            .rng
            .gen_range(MIN_PLACEHOLDER_CONFIDENCE..MAX_PLACEHOLDER_CONFIDENCE);
        (status, confidence)
    }
}

/// Read a slot layout; the file must hold a JSON array.
///
/// Entries that do not parse as a slot are skipped with a warning.
pub fn load_slot_definitions(path: &Path) -> Result<Vec<SlotDefinition>> {
    let value: serde_json::Value = load_json(path)?;
    let serde_json::Value::Array(entries) = value else {
        return Err(OrthoparkError::analysis(format!(
            "Slot layout '{}' must contain a JSON list",
            path.display()
        )));
    };

    let mut slots = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<SlotDefinition>(entry) {
            Ok(slot) => slots.push(slot),
            Err(e) => warn!("Skipping malformed slot entry #{}: {}", index, e),
        }
    }
    Ok(slots)
}

/// Classify every slot with geometry and keep results at or above `threshold`.
///
/// Returns an empty list when the model is missing, there are no slots, or
/// the orthophoto does not exist.
pub fn analyze_parking_slots(
    orthophoto: &Path,
    model: Option<&ParkingModel>,
    slots: &[SlotDefinition],
    confidence_threshold: f64,
    classifier: &mut dyn SlotClassifier,
) -> Vec<AnalysisResult> {
    let mut results = Vec::new();

    if model.is_none() {
        error!("Parking model not loaded; analysis impossible");
        return results;
    }
    if slots.is_empty() {
        warn!("No parking slot definitions provided; analysis impossible");
        return results;
    }
    if !orthophoto.exists() {
        error!("Orthophoto not found: {}", orthophoto.display());
        return results;
    }

    info!("Analysing parking slots on: {}", orthophoto.display());
    info!("Slots to analyse: {}", slots.len());

    for slot in slots {
        if !slot.has_geometry() {
            warn!("Missing geometry for slot ID: {}", slot.id);
            continue;
        }

        let (status, confidence) = classifier.classify(slot);
        if confidence >= confidence_threshold {
            debug!(
                "Slot {}: status={:?}, confidence={:.2}",
                slot.id, status, confidence
            );
            results.push(AnalysisResult {
                slot_id: slot.id.clone(),
                status,
                confidence: (confidence * 1000.0).round() / 1000.0,
            });
        } else {
            debug!(
                "Slot {}: low confidence ({:.2} < {}), skipped",
                slot.id, confidence, confidence_threshold
            );
        }
    }

    info!("Analysis finished. Status determined for {} slots", results.len());
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    struct FixedClassifier(Vec<(SlotStatus, f64)>);

    impl SlotClassifier for FixedClassifier {
        fn classify(&mut self, _slot: &SlotDefinition) -> (SlotStatus, f64) {
            self.0.remove(0)
        }
    }

    fn slot(id: &str, points: usize) -> SlotDefinition {
        SlotDefinition {
            id: SlotId::Text(id.into()),
            geometry: Some(vec![[0.0, 0.0]; points]),
        }
    }

    fn model_and_ortho(dir: &Path) -> (ParkingModel, PathBuf) {
        fs::write(dir.join("model.pt"), b"weights").unwrap();
        let ortho = dir.join("ortho.tif");
        fs::write(&ortho, b"tif").unwrap();
        (ParkingModel::load(dir, "model.pt").unwrap(), ortho)
    }

    #[test]
    fn zero_slots_yield_empty_results() {
        let dir = tempdir().unwrap();
        let (model, ortho) = model_and_ortho(dir.path());
        let mut classifier = RandomSlotClassifier::new(Some(1));
        let results = analyze_parking_slots(&ortho, Some(&model), &[], 0.4, &mut classifier);
        assert!(results.is_empty());
    }

    #[test]
    fn slots_without_geometry_are_skipped() {
        let dir = tempdir().unwrap();
        let (model, ortho) = model_and_ortho(dir.path());
        let slots = vec![
            slot("A1", 4),
            SlotDefinition {
                id: SlotId::Text("A2".into()),
                geometry: None,
            },
            slot("A3", 0),
            slot("A4", 4),
        ];
        let mut classifier = FixedClassifier(vec![
            (SlotStatus::Occupied, 0.91234),
            (SlotStatus::Vacant, 0.7),
        ]);

        let results = analyze_parking_slots(&ortho, Some(&model), &slots, 0.4, &mut classifier);
        let ids: Vec<String> = results.iter().map(|r| r.slot_id.to_string()).collect();
        assert_eq!(ids, vec!["A1", "A4"]);
        assert_eq!(results[0].confidence, 0.912);
        assert_eq!(results[1].status, SlotStatus::Vacant);
    }

    #[test]
    fn threshold_filters_low_confidence() {
        let dir = tempdir().unwrap();
        let (model, ortho) = model_and_ortho(dir.path());
        let slots = vec![slot("1", 3), slot("2", 3)];
        let mut classifier = FixedClassifier(vec![
            (SlotStatus::Occupied, 0.65),
            (SlotStatus::Occupied, 0.95),
        ]);

        let results = analyze_parking_slots(&ortho, Some(&model), &slots, 0.8, &mut classifier);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].slot_id, SlotId::Text("2".into()));
    }

    #[test]
    fn missing_model_or_orthophoto_yields_empty_results() {
        let dir = tempdir().unwrap();
        let (model, ortho) = model_and_ortho(dir.path());
        let slots = vec![slot("1", 3)];
        let mut classifier = RandomSlotClassifier::new(Some(7));

        assert!(analyze_parking_slots(&ortho, None, &slots, 0.0, &mut classifier).is_empty());
        let missing = dir.path().join("absent.tif");
        assert!(
            analyze_parking_slots(&missing, Some(&model), &slots, 0.0, &mut classifier).is_empty()
        );
        assert!(ParkingModel::load(dir.path(), "absent.pt").is_none());
    }

    #[test]
    fn random_classifier_stays_in_range_and_is_reproducible() {
        let s = slot("x", 3);
        let mut a = RandomSlotClassifier::new(Some(42));
        let mut b = RandomSlotClassifier::new(Some(42));
        for _ in 0..200 {
            let (status_a, conf_a) = a.classify(&s);
            let (status_b, conf_b) = b.classify(&s);
            assert_eq!(status_a, status_b);
            assert_eq!(conf_a, conf_b);
            assert!((MIN_PLACEHOLDER_CONFIDENCE..MAX_PLACEHOLDER_CONFIDENCE).contains(&conf_a));
        }
    }

    #[test]
    fn layout_accepts_numeric_and_missing_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.json");
        fs::write(
            &path,
            r#"[{"id": 7, "geometry": [[1, 2], [3, 4]]}, {"geometry": [[0, 0]]}, {"id": "B2"}]"#,
        )
        .unwrap();

        let slots = load_slot_definitions(&path).unwrap();
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].id, SlotId::Number(7));
        assert_eq!(slots[1].id.to_string(), "unknown_slot");
        assert!(!slots[2].has_geometry());
    }

    #[test]
    fn malformed_entries_do_not_discard_valid_slots() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.json");
        fs::write(
            &path,
            r#"[
                {"id": "A1", "geometry": [[0, 0], [1, 1]]},
                {"id": null, "geometry": [[0, 0]]},
                {"id": 2.5, "geometry": [[0, 0]]},
                {"id": "A2", "geometry": [[0, 0, 5]]},
                "not a slot",
                {"id": 4, "geometry": [[1, 1], [2, 2]]}
            ]"#,
        )
        .unwrap();

        let slots = load_slot_definitions(&path).unwrap();
        let ids: Vec<String> = slots.iter().map(|s| s.id.to_string()).collect();
        assert_eq!(ids, vec!["A1", "4"]);
        assert!(slots.iter().all(SlotDefinition::has_geometry));
    }

    #[test]
    fn layout_must_be_a_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.json");
        fs::write(&path, r#"{"slots": []}"#).unwrap();
        let err = load_slot_definitions(&path).unwrap_err();
        assert!(matches!(err, OrthoparkError::Analysis { .. }));
    }

    #[test]
    fn results_serialize_with_lowercase_status() {
        let result = AnalysisResult {
            slot_id: SlotId::Number(3),
            status: SlotStatus::Occupied,
            confidence: 0.75,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"slot_id": 3, "status": "occupied", "confidence": 0.75})
        );
        assert_eq!(count_statuses(&[result]), (1, 0));
    }
}
