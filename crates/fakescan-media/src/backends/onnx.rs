//! ONNX Runtime face classifier.

use std::path::Path;
use std::sync::Mutex;

use fakescan_models::Classification;
use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use crate::classifier::FaceClassifier;
use crate::error::{MediaError, MediaResult};
use crate::profile::{InputTensor, ModelProfile};

/// Binary classifier backed by an ONNX model whose single output is the
/// probability that the face is real.
pub struct OrtFaceClassifier {
    session: Mutex<Session>,
    output_name: String,
    profile: ModelProfile,
}

impl OrtFaceClassifier {
    pub fn load(model_path: &Path, profile: ModelProfile) -> MediaResult<Self> {
        if !model_path.exists() {
            return Err(MediaError::model_unavailable(format!(
                "Classifier model not found at {}",
                model_path.display()
            )));
        }
        profile.validate()?;

        let model_bytes = std::fs::read(model_path)
            .map_err(|e| MediaError::model_unavailable(format!("ORT read model file: {e}")))?;

        let session = create_session(&model_bytes)?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| MediaError::model_unavailable("Classifier model declares no outputs"))?;

        info!(
            model = %model_path.display(),
            profile = %profile.name,
            input = format!("{}x{}", profile.input_width, profile.input_height),
            output = %output_name,
            "Face classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            profile,
        })
    }
}

/// CUDA when built with the `cuda` feature and a device is present, else CPU.
fn create_session(model_bytes: &[u8]) -> MediaResult<Session> {
    let builder = Session::builder()
        .map_err(|e| MediaError::model_unavailable(format!("ORT session builder: {e}")))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| MediaError::model_unavailable(format!("ORT opt level: {e}")))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(model_bytes) {
                info!("Using CUDA execution provider for face classification");
                return Ok(session);
            }
        }
        debug!("CUDA execution provider not available, using CPU");
    }

    builder
        .commit_from_memory(model_bytes)
        .map_err(|e| MediaError::model_unavailable(format!("ORT load model: {e}")))
}

fn to_ort_value(input: InputTensor) -> MediaResult<Value> {
    Tensor::from_array((input.shape, input.data.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| MediaError::classification_failed(format!("ORT tensor: {e}")))
}

/// Probability real from a `[1]`, `[1, 1]` or two-class `[1, 2]` output.
fn score_from_output(shape: &[i64], data: &[f32]) -> MediaResult<f64> {
    match data.len() {
        1 => Ok(data[0] as f64),
        // Two-class softmax, classes ordered (fake, real)
        2 => Ok(data[1] as f64),
        _ => Err(MediaError::classification_failed(format!(
            "Unexpected classifier output shape: {:?}",
            shape
        ))),
    }
}

impl FaceClassifier for OrtFaceClassifier {
    fn classify(&self, face: &RgbImage) -> MediaResult<Classification> {
        let tensor = to_ort_value(self.profile.preprocess(face))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| MediaError::classification_failed("ORT session poisoned"))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| MediaError::classification_failed(format!("ORT run failed: {e}")))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| MediaError::classification_failed("ORT returned no outputs"))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MediaError::classification_failed(format!("ORT extract: {e}")))?;

        let score = score_from_output(shape, data)?;
        debug!(score, "Face classified");
        Ok(Classification::new(score))
    }

    fn profile(&self) -> &ModelProfile {
        &self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_from_output() {
        assert_eq!(score_from_output(&[1, 1], &[0.75]).unwrap(), 0.75f32 as f64);
        assert_eq!(score_from_output(&[1, 2], &[0.2, 0.8]).unwrap(), 0.8f32 as f64);
        assert!(score_from_output(&[1, 3], &[0.1, 0.2, 0.7]).is_err());
    }

    #[test]
    fn test_missing_model() {
        let err = OrtFaceClassifier::load(Path::new("/no/such/model.onnx"), ModelProfile::baseline_128())
            .err()
            .unwrap();
        assert!(matches!(err, MediaError::ModelUnavailable(_)));
    }
}
