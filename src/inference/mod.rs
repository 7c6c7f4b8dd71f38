pub mod bert_classifier;

use anyhow::{anyhow, Result};

pub use bert_classifier::BertSequenceClassifier;

/// Opaque pretrained model: normalized text in, class index out.
pub trait SequenceClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<usize>;

    fn num_classes(&self) -> usize;
}

/// Index of the highest score; ties resolve to the lowest index.
pub fn logits_argmax(logits: &[f32]) -> Result<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in logits.iter().enumerate() {
        if value.is_nan() {
            return Err(anyhow!("logits contain NaN at index {idx}"));
        }
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((idx, value)),
        }
    }
    best.ok_or_else(|| anyhow!("empty logits tensor"))
}
