//! Object detection using YOLO-style ONNX exports

use crate::engine::OnnxModel;
use crate::InferenceError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use std::path::Path;
use tracing::debug;

/// Letterbox padding value used by YOLO preprocessing
const PAD_VALUE: u8 = 114;

/// A single detected bounding box
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Class id (index into the model's label table)
    pub class_id: usize,
    /// Class score (0.0 to 1.0)
    pub confidence: f32,
    /// Bounding box [cx, cy, width, height] in model input pixels
    pub bbox: [f32; 4],
}

/// Object detector over decoded images
pub trait Detector: Send + Sync {
    /// Detect objects in an image
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, InferenceError>;
}

/// Detector backed by a YOLOv8-style ONNX export.
///
/// Input is `[1, 3, size, size]` RGB scaled to [0, 1]; output is
/// `[1, 4 + classes, anchors]`.
pub struct OnnxDetector {
    model: OnnxModel,
    input_size: u32,
    confidence_threshold: f32,
}

impl OnnxDetector {
    pub fn load(
        path: impl AsRef<Path>,
        input_size: u32,
        confidence_threshold: f32,
    ) -> Result<Self, InferenceError> {
        if input_size == 0 {
            return Err(InferenceError::ModelLoadError(
                "detector input size must be positive".to_string(),
            ));
        }
        let side = input_size as usize;
        Ok(Self {
            model: OnnxModel::load(path, &[1, 3, side, side])?,
            input_size,
            confidence_threshold,
        })
    }
}

impl Detector for OnnxDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>, InferenceError> {
        let boxed = letterbox(image, self.input_size);
        let input = to_chw(&boxed);
        let output = self.model.run(&input, 0)?;
        let detections = decode_predictions(&output.shape, &output.data, self.confidence_threshold)?;
        debug!("Detector kept {} boxes", detections.len());
        Ok(detections)
    }
}

/// Resize an image into a `size` x `size` square, preserving aspect ratio
/// and padding the remainder with grey.
pub fn letterbox(image: &DynamicImage, size: u32) -> RgbImage {
    let (width, height) = (image.width().max(1), image.height().max(1));
    let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
    let new_w = ((width as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((height as f32 * scale).round() as u32).clamp(1, size);

    let resized = imageops::resize(&image.to_rgb8(), new_w, new_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));
    let x = (size - new_w) / 2;
    let y = (size - new_h) / 2;
    imageops::overlay(&mut canvas, &resized, i64::from(x), i64::from(y));
    canvas
}

/// Convert an RGB image to a planar CHW buffer scaled to [0, 1]
fn to_chw(image: &RgbImage) -> Vec<f32> {
    let (width, height) = image.dimensions();
    let plane = (width * height) as usize;
    let mut data = vec![0.0f32; plane * 3];

    for (x, y, pixel) in image.enumerate_pixels() {
        let idx = (y * width + x) as usize;
        for channel in 0..3 {
            data[channel * plane + idx] = f32::from(pixel[channel]) / 255.0;
        }
    }
    data
}

/// Decode a `[1, 4 + classes, anchors]` prediction tensor.
///
/// Each anchor keeps its best-scoring class when that score reaches the
/// threshold. Suppression is not applied.
pub fn decode_predictions(
    shape: &[usize],
    data: &[f32],
    threshold: f32,
) -> Result<Vec<Detection>, InferenceError> {
    let (rows, anchors) = match shape {
        [1, rows, anchors] | [rows, anchors] => (*rows, *anchors),
        other => {
            return Err(InferenceError::InvalidInputShape {
                expected: "[1, 4 + classes, anchors]".to_string(),
                actual: format!("{:?}", other),
            })
        }
    };

    if rows <= 4 {
        return Err(InferenceError::InvalidInputShape {
            expected: "at least one class row after 4 box rows".to_string(),
            actual: format!("{} rows", rows),
        });
    }
    if data.len() != rows * anchors {
        return Err(InferenceError::InferenceFailed(format!(
            "prediction buffer has {} values, shape {:?} needs {}",
            data.len(),
            shape,
            rows * anchors
        )));
    }

    let classes = rows - 4;
    let mut detections = Vec::new();

    for anchor in 0..anchors {
        let mut best_class = 0;
        let mut best_score = f32::NEG_INFINITY;
        for class in 0..classes {
            let score = data[(4 + class) * anchors + anchor];
            if score > best_score {
                best_class = class;
                best_score = score;
            }
        }

        if best_score >= threshold {
            detections.push(Detection {
                class_id: best_class,
                confidence: best_score,
                bbox: [
                    data[anchor],
                    data[anchors + anchor],
                    data[2 * anchors + anchor],
                    data[3 * anchors + anchor],
                ],
            });
        }
    }

    Ok(detections)
}
