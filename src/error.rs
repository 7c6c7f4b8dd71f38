use thiserror::Error;

/// Failures a single form submission can run into.
///
/// Startup failures (config, model, tokenizer, encoder) are plain
/// `anyhow::Error`s and never reach this type.
#[derive(Debug, Error)]
pub enum MoodError {
    #[error("please enter both your name and how you're feeling")]
    MissingInput,

    #[error("classifier produced class index {index} but the label encoder only knows {known} classes")]
    UnknownClass { index: usize, known: usize },

    #[error("inference failed: {0}")]
    Inference(#[from] anyhow::Error),
}

