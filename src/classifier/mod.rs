pub mod clean;
pub mod labels;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::MoodError;
use crate::inference::{BertSequenceClassifier, SequenceClassifier};

pub use clean::clean_text;
pub use labels::LabelEncoder;

/// Raw user text in, mood label out.
pub trait MoodClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<String, MoodError>;
}

/// `clean → tokenize → classify → decode`.
pub struct MoodPipeline<M> {
    model: M,
    encoder: LabelEncoder,
}

impl<M: SequenceClassifier> MoodPipeline<M> {
    pub fn new(model: M, encoder: LabelEncoder) -> Self {
        if model.num_classes() != encoder.len() {
            warn!(
                model_classes = model.num_classes(),
                encoder_classes = encoder.len(),
                "classifier head and label encoder disagree on class count"
            );
        }
        Self { model, encoder }
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }
}

impl MoodPipeline<BertSequenceClassifier> {
    /// Loads the checkpoint and the label encoder named by `cfg`.
    pub fn load(cfg: &AppConfig) -> Result<Self> {
        let encoder = LabelEncoder::load(&cfg.label_encoder)?;
        let model = BertSequenceClassifier::load(&cfg.model_dir, &cfg.device, cfg.max_seq_len)
            .with_context(|| format!("failed to load model from {}", cfg.model_dir.display()))?;
        Ok(Self::new(model, encoder))
    }
}

impl<M: SequenceClassifier> MoodClassifier for MoodPipeline<M> {
    fn classify(&self, text: &str) -> Result<String, MoodError> {
        let cleaned = clean_text(text);
        let index = self.model.classify(&cleaned)?;
        let label = self.encoder.decode(index)?;
        debug!(chars = cleaned.len(), index, label, "classified utterance");
        Ok(label.to_string())
    }
}
