// Vision API response shape; only the fields the client reads are modelled.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    #[serde(default)]
    pub segmentation_results: Vec<SegmentationResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentationResult {
    #[serde(default)]
    pub recognition_results: Vec<DetectedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedItem {
    pub name: String,
    #[serde(default)]
    pub prob: Option<f64>,
}

impl ImageAnalysis {
    /// Items recognised in the first segment of the photo.
    pub fn detected_items(&self) -> &[DetectedItem] {
        self.segmentation_results
            .first()
            .map(|segment| segment.recognition_results.as_slice())
            .unwrap_or_default()
    }
}
