use serde::{Deserialize, Serialize};

/// The two selectable inference configurations.
///
/// `Unet` is the primary model; `UnetMobilenet` adds a MobileNetV2 encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelVariant {
    Unet,
    UnetMobilenet,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 2] = [ModelVariant::Unet, ModelVariant::UnetMobilenet];

    /// Identifier the inference backend expects in the request body.
    pub fn backend_id(self) -> &'static str {
        match self {
            ModelVariant::Unet => "unet",
            ModelVariant::UnetMobilenet => "unet_mobilenet",
        }
    }

    /// Human-readable name for CLI output and log lines.
    pub fn label(self) -> &'static str {
        match self {
            ModelVariant::Unet => "U-Net",
            ModelVariant::UnetMobilenet => "U-Net + MobileNetV2",
        }
    }

    /// Resolve a caller-supplied model string. Anything other than the exact
    /// primary identifier falls back to the auxiliary-encoder variant.
    pub fn parse(input: &str) -> ModelVariant {
        if input == "unet" {
            ModelVariant::Unet
        } else {
            ModelVariant::UnetMobilenet
        }
    }
}

/// Segmentation quality metrics, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub iou: f64,
    pub dice: f64,
    pub pixel_accuracy: f64,
}

/// Normalized inference output. Every field is display-ready: the three
/// image fields always carry a `data:` prefix and the metrics are clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationResult {
    pub original_image: String,
    pub segmented_image: String,
    pub mask_image: String,
    pub metrics: Metrics,
    pub processing_time: f64,
}

/// Paired output of one dual-variant run. Both entries come from the same
/// run; never assembled from two independent operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub unet: SegmentationResult,
    pub unet_mobilenet: SegmentationResult,
}

impl ComparisonResult {
    pub fn get(&self, variant: ModelVariant) -> &SegmentationResult {
        match variant {
            ModelVariant::Unet => &self.unet,
            ModelVariant::UnetMobilenet => &self.unet_mobilenet,
        }
    }
}

/// Inbound request body for the proxy endpoints. Fields are optional so the
/// handler can report which one is missing instead of failing to parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentRequest {
    pub image: Option<String>,
    pub model: Option<String>,
}

/// What the orchestrator should do with an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Single(ModelVariant),
    Compare,
}

/// Result union matching `RunMode`.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutput {
    Single(SegmentationResult),
    Compare(ComparisonResult),
}
