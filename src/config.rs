use anyhow::{anyhow, Context, Result};
use std::{path::PathBuf, str::FromStr, time::Duration};

pub const DEFAULT_MODEL_DIR: &str = "saved_mental_bert";
pub const DEFAULT_LABEL_ENCODER: &str = "label_encoder.json";
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_HIGH_RISK_LABEL: &str = "Suicidal";
pub const DEFAULT_CRISIS_URL: &str = "https://www.opencounseling.com/suicide-hotlines";
const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_dir: PathBuf,
    pub label_encoder: PathBuf,
    pub max_seq_len: usize,
    /// `cpu`, `auto`, or `cuda[:N]`.
    pub device: String,
    pub bind: String,
    pub high_risk_label: String,
    pub crisis_url: String,
    pub session_idle: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            label_encoder: PathBuf::from(DEFAULT_LABEL_ENCODER),
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            device: "cpu".to_string(),
            bind: DEFAULT_BIND.to_string(),
            high_risk_label: DEFAULT_HIGH_RISK_LABEL.to_string(),
            crisis_url: DEFAULT_CRISIS_URL.to_string(),
            session_idle: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        }
    }
}

impl AppConfig {
    /// Reads `MENTORIA_*` variables, after loading a `.env` file if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let max_seq_len = match get("MENTORIA_MAX_SEQ_LEN") {
            Some(raw) => parse_number::<usize>("MENTORIA_MAX_SEQ_LEN", &raw)?,
            None => defaults.max_seq_len,
        };
        if max_seq_len == 0 {
            return Err(anyhow!("MENTORIA_MAX_SEQ_LEN must be greater than zero"));
        }

        let session_idle = match get("MENTORIA_SESSION_IDLE_SECS") {
            Some(raw) => Duration::from_secs(parse_number::<u64>(
                "MENTORIA_SESSION_IDLE_SECS",
                &raw,
            )?),
            None => defaults.session_idle,
        };

        Ok(Self {
            model_dir: get("MENTORIA_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            label_encoder: get("MENTORIA_LABEL_ENCODER")
                .map(PathBuf::from)
                .unwrap_or(defaults.label_encoder),
            max_seq_len,
            device: get("MENTORIA_DEVICE").unwrap_or(defaults.device),
            bind: get("MENTORIA_BIND").unwrap_or(defaults.bind),
            high_risk_label: get("MENTORIA_HIGH_RISK_LABEL").unwrap_or(defaults.high_risk_label),
            crisis_url: get("MENTORIA_CRISIS_URL").unwrap_or(defaults.crisis_url),
            session_idle,
        })
    }
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.model_dir, PathBuf::from(DEFAULT_MODEL_DIR));
        assert_eq!(cfg.label_encoder, PathBuf::from(DEFAULT_LABEL_ENCODER));
        assert_eq!(cfg.max_seq_len, 512);
        assert_eq!(cfg.device, "cpu");
        assert_eq!(cfg.high_risk_label, "Suicidal");
        assert_eq!(cfg.session_idle, Duration::from_secs(3600));
    }

    #[test]
    fn overrides_are_trimmed_and_applied() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("MENTORIA_MODEL_DIR", " /models/bert "),
            ("MENTORIA_MAX_SEQ_LEN", "128"),
            ("MENTORIA_DEVICE", "cuda:1"),
            ("MENTORIA_HIGH_RISK_LABEL", "Crisis"),
            ("MENTORIA_SESSION_IDLE_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(cfg.model_dir, PathBuf::from("/models/bert"));
        assert_eq!(cfg.max_seq_len, 128);
        assert_eq!(cfg.device, "cuda:1");
        assert_eq!(cfg.high_risk_label, "Crisis");
        assert_eq!(cfg.session_idle, Duration::from_secs(60));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("MENTORIA_BIND", "   ")])).unwrap();
        assert_eq!(cfg.bind, DEFAULT_BIND);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("MENTORIA_MAX_SEQ_LEN", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("MENTORIA_MAX_SEQ_LEN"));

        assert!(AppConfig::from_lookup(lookup_from(&[("MENTORIA_MAX_SEQ_LEN", "0")])).is_err());
        assert!(
            AppConfig::from_lookup(lookup_from(&[("MENTORIA_SESSION_IDLE_SECS", "-5")])).is_err()
        );
    }
}
