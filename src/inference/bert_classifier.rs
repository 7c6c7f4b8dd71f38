use anyhow::{anyhow, Context, Result};
use candle::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::{Linear, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{info, warn};

use super::{logits_argmax, SequenceClassifier};

/// Fine-tuned BERT with the usual sequence-classification head:
/// pooler (dense + tanh over [CLS]) followed by a linear classifier.
pub struct BertSequenceClassifier {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    num_classes: usize,
}

impl BertSequenceClassifier {
    pub fn load(snapshot: &Path, device: &str, max_seq_len: usize) -> Result<Self> {
        if !snapshot.is_dir() {
            return Err(anyhow!(
                "model directory {} does not exist",
                snapshot.display()
            ));
        }

        let config = load_config(snapshot)?;
        let max_len = max_seq_len.min(config.max_position_embeddings);
        let tokenizer = load_tokenizer(snapshot, max_len)?;

        let weights_path = find_model_weights(snapshot)
            .ok_or_else(|| anyhow!("no model weights found under {}", snapshot.display()))?;

        let device = build_device(device)?;
        let vb = build_var_builder(&weights_path, DType::F32, &device)?;

        let bert = BertModel::load(vb.pp("bert"), &config)
            .with_context(|| format!("failed to load BERT encoder from {}", weights_path.display()))?;
        let pooler = load_linear(&vb.pp("bert.pooler.dense"))
            .context("checkpoint has no bert.pooler.dense weights")?;
        let classifier =
            load_linear(&vb.pp("classifier")).context("checkpoint has no classifier head")?;

        let (num_classes, head_in) = classifier.weight().dims2()?;
        if head_in != config.hidden_size {
            return Err(anyhow!(
                "classifier head expects {head_in} features but hidden_size is {}",
                config.hidden_size
            ));
        }

        info!(
            model_dir = %snapshot.display(),
            device = ?device,
            num_classes,
            max_len,
            "loaded BERT sequence classifier"
        );

        Ok(Self {
            bert,
            pooler,
            classifier,
            tokenizer,
            device,
            num_classes,
        })
    }

    fn logits(&self, text: &str) -> Result<Vec<f32>> {
        let enc = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenizer encode error: {e}"))?;

        let ids = enc.get_ids();
        let seq_len = ids.len();
        if seq_len == 0 {
            return Err(anyhow!("tokenizer produced no tokens"));
        }

        let input = Tensor::new(ids, &self.device)?.reshape((1, seq_len))?;
        let mask = Tensor::new(enc.get_attention_mask(), &self.device)?.reshape((1, seq_len))?;
        let token_type_ids = input.zeros_like()?;

        let hidden = self
            .bert
            .forward(&input, &token_type_ids, Some(&mask))
            .context("BERT forward pass failed")?;

        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?.squeeze(0)?;

        Ok(logits.to_dtype(DType::F32)?.to_vec1::<f32>()?)
    }
}

impl SequenceClassifier for BertSequenceClassifier {
    fn classify(&self, text: &str) -> Result<usize> {
        let logits = self.logits(text)?;
        let (idx, _) = logits_argmax(&logits)?;
        Ok(idx)
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}

fn load_config(snapshot: &Path) -> Result<BertConfig> {
    let path = snapshot.join("config.json");
    if !path.exists() {
        return Err(anyhow!(
            "config.json not found under {}",
            snapshot.display()
        ));
    }
    let raw = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_tokenizer(snapshot: &Path, max_len: usize) -> Result<Tokenizer> {
    let path = snapshot.join("tokenizer.json");
    if !path.exists() {
        return Err(anyhow!(
            "tokenizer.json not found under {}",
            snapshot.display()
        ));
    }
    let mut tokenizer = Tokenizer::from_file(&path)
        .map_err(|e| anyhow!("Tokenizer load failed ({}): {e}", path.display()))?;
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("Tokenizer truncation config failed: {e}"))?;

    // Single-item batches: longest-padding never inserts pad tokens.
    let pad_id = tokenizer
        .get_padding()
        .map(|p| p.pad_id)
        .or_else(|| tokenizer.token_to_id("[PAD]"))
        .unwrap_or(0);
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id,
        ..Default::default()
    }));
    Ok(tokenizer)
}

fn find_model_weights(snapshot: &Path) -> Option<PathBuf> {
    ["model.safetensors", "pytorch_model.bin"]
        .into_iter()
        .map(|candidate| snapshot.join(candidate))
        .find(|path| path.exists())
}

fn build_var_builder(path: &Path, dtype: DType, device: &Device) -> Result<VarBuilder<'static>> {
    let is_safetensors = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("safetensors"))
        .unwrap_or(false);
    if is_safetensors {
        let files = vec![path.to_path_buf()];
        unsafe {
            VarBuilder::from_mmaped_safetensors(&files, dtype, device)
                .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))
        }
    } else {
        VarBuilder::from_pth(path, dtype, device)
            .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))
    }
}

fn load_linear(vb: &VarBuilder) -> Result<Linear> {
    let weight = vb.get_unchecked("weight")?;
    let bias = vb.get_unchecked("bias")?;
    Ok(Linear::new(weight, Some(bias)))
}

pub fn build_device(preference: &str) -> Result<Device> {
    let trimmed = preference.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.is_empty() || lower == "cpu" {
        Ok(Device::Cpu)
    } else if lower == "auto" {
        Ok(Device::cuda_if_available(0)?)
    } else if lower.starts_with("cuda") || lower.starts_with("gpu") {
        let ordinal = trimmed
            .split(':')
            .nth(1)
            .and_then(|part| part.parse::<usize>().ok())
            .unwrap_or(0);
        Device::new_cuda(ordinal).map_err(|err| {
            anyhow!(
                "requested CUDA device {ordinal} but initialization failed ({err}). \
                 Build with the `cuda` feature and ensure CUDA libraries are available."
            )
        })
    } else {
        warn!("unrecognized device '{}', falling back to CPU", trimmed);
        Ok(Device::Cpu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::VarMap;

    const WORDS: [&str; 8] = ["i", "feel", "tired", "and", "worried", "about", "work", "today"];
    const NUM_CLASSES: usize = 3;

    /// Writes a two-layer, hidden-size-8 BERT checkpoint with a word-level
    /// tokenizer and a three-way head.
    fn tiny_snapshot() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mentoria-tiny-bert-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        let config = serde_json::json!({
            "vocab_size": WORDS.len() + 2,
            "hidden_size": 8,
            "num_hidden_layers": 2,
            "num_attention_heads": 2,
            "intermediate_size": 16,
            "hidden_act": "gelu",
            "hidden_dropout_prob": 0.0,
            "max_position_embeddings": 16,
            "type_vocab_size": 2,
            "initializer_range": 0.02,
            "layer_norm_eps": 1e-12,
            "pad_token_id": 0,
            "position_embedding_type": "absolute",
            "use_cache": false,
            "classifier_dropout": null,
            "model_type": "bert"
        });
        fs::write(dir.join("config.json"), config.to_string()).unwrap();

        let mut vocab = serde_json::Map::new();
        vocab.insert("[PAD]".into(), 0.into());
        vocab.insert("[UNK]".into(), 1.into());
        for (i, word) in WORDS.iter().enumerate() {
            vocab.insert((*word).into(), (i + 2).into());
        }
        let tokenizer = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": { "type": "WordLevel", "vocab": vocab, "unk_token": "[UNK]" }
        });
        fs::write(dir.join("tokenizer.json"), tokenizer.to_string()).unwrap();

        let cfg = load_config(&dir).unwrap();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        BertModel::load(vb.pp("bert"), &cfg).unwrap();
        candle_nn::linear(cfg.hidden_size, cfg.hidden_size, vb.pp("bert.pooler.dense")).unwrap();
        candle_nn::linear(cfg.hidden_size, NUM_CLASSES, vb.pp("classifier")).unwrap();
        varmap.save(dir.join("model.safetensors")).unwrap();

        dir
    }

    fn long_text(words: usize) -> String {
        (0..words)
            .map(|i| WORDS[i % WORDS.len()])
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn tiny_checkpoint_classifies_deterministically() {
        let dir = tiny_snapshot();
        let model = BertSequenceClassifier::load(&dir, "cpu", 512).unwrap();
        assert_eq!(model.num_classes(), NUM_CLASSES);

        let logits = model.logits("i feel tired today").unwrap();
        assert_eq!(logits.len(), NUM_CLASSES);
        assert!(logits.iter().all(|v| v.is_finite()));

        let first = model.classify("i feel worried about work").unwrap();
        let second = model.classify("i feel worried about work").unwrap();
        assert_eq!(first, second);
        assert!(first < NUM_CLASSES);

        // Longer than max_position_embeddings: only runs if the limit is capped.
        let idx = model.classify(&long_text(40)).unwrap();
        assert!(idx < NUM_CLASSES);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn tokenizer_truncates_to_the_smaller_limit() {
        let dir = tiny_snapshot();

        let short = BertSequenceClassifier::load(&dir, "cpu", 6).unwrap();
        let enc = short.tokenizer.encode(long_text(20), true).unwrap();
        assert_eq!(enc.get_ids().len(), 6);
        assert!(enc.get_attention_mask().iter().all(|&m| m == 1));

        let capped = BertSequenceClassifier::load(&dir, "cpu", 512).unwrap();
        let enc = capped.tokenizer.encode(long_text(40), true).unwrap();
        assert_eq!(enc.get_ids().len(), 16);

        let enc = capped.tokenizer.encode("i feel tired", true).unwrap();
        assert_eq!(enc.get_ids(), &[2, 3, 4]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn cpu_device_preferences() {
        assert!(build_device("cpu").unwrap().is_cpu());
        assert!(build_device("").unwrap().is_cpu());
        assert!(build_device("  CPU ").unwrap().is_cpu());
        assert!(build_device("tpu").unwrap().is_cpu());
    }

    #[test]
    fn missing_snapshot_fails_to_load() {
        let dir = std::env::temp_dir().join(format!("mentoria-no-model-{}", uuid::Uuid::new_v4()));
        let err = BertSequenceClassifier::load(&dir, "cpu", 512)
            .err()
            .expect("load should fail without a model directory");
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn snapshot_without_config_fails_to_load() {
        let dir = std::env::temp_dir().join(format!("mentoria-empty-model-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let result = BertSequenceClassifier::load(&dir, "cpu", 512);
        fs::remove_dir_all(&dir).ok();
        let err = result.err().expect("load should fail without config.json");
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn run_checkpoint_classification() {
        let snapshot = PathBuf::from(crate::config::DEFAULT_MODEL_DIR);
        if find_model_weights(&snapshot).is_none() {
            eprintln!(
                "classifier snapshot missing under {}, skipping test",
                snapshot.display()
            );
            return;
        }
        let model =
            BertSequenceClassifier::load(&snapshot, "cpu", 512).expect("failed to load classifier");
        let first = model.classify("i cant sleep and i feel worried all the time").unwrap();
        let second = model.classify("i cant sleep and i feel worried all the time").unwrap();
        assert_eq!(first, second);
        assert!(first < model.num_classes());
    }
}
