use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::MoodError;

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelEncoderFile {
    Bare(Vec<String>),
    Fitted { classes: Vec<String> },
}

/// Inverse lookup from class index to mood label.
///
/// The class order is the order the classifier head was trained with, i.e. the
/// exported `classes_` of the fitted encoder.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            return Err(anyhow!("label encoder has no classes"));
        }
        if let Some(blank) = classes.iter().position(|c| c.trim().is_empty()) {
            return Err(anyhow!("label encoder class #{blank} is blank"));
        }
        Ok(Self { classes })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: LabelEncoderFile =
            serde_json::from_str(raw).context("label encoder is not a JSON class list")?;
        let classes = match parsed {
            LabelEncoderFile::Bare(classes) => classes,
            LabelEncoderFile::Fitted { classes } => classes,
        };
        Self::new(classes)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("label encoder not found at {}", path.display()));
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn decode(&self, index: usize) -> Result<&str, MoodError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(MoodError::UnknownClass {
                index,
                known: self.classes.len(),
            })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
