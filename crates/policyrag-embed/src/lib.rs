//! Sentence embeddings for policy chunks and questions.
//!
//! [`BertEmbedder`] runs a local BERT-family checkpoint (BGE by default) with
//! candle; [`FakeEmbedder`] is a hashing stand-in selected with
//! `APP_USE_FAKE_EMBEDDINGS=1` or `embedding.use_fake = true`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;

use policyrag_core::config::{expand_path, EmbeddingConfig};
use policyrag_core::{EmbedError, Embedder};

pub mod device;
mod fake;
pub mod pool;
pub mod tokenize;

pub use fake::FakeEmbedder;
pub use pool::masked_mean_l2;

const BATCH: usize = 32;

pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
    dim: usize,
    max_len: usize,
}

fn unavailable(what: &str, path: &Path, e: impl std::fmt::Display) -> EmbedError {
    EmbedError::ModelUnavailable(format!("{} ({}): {}", what, path.display(), e))
}

fn inference(e: candle_core::Error) -> EmbedError {
    EmbedError::Inference(e.to_string())
}

impl BertEmbedder {
    /// Load tokenizer, config and weights from `model_dir`.
    ///
    /// Weights are read from `model.safetensors` when present, otherwise from
    /// `pytorch_model.bin`.
    pub fn load(model_dir: &Path, model_name: &str, max_len: usize) -> Result<Self, EmbedError> {
        let device = device::select_device();
        tracing::info!(model = model_name, dir = %model_dir.display(), "loading embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| unavailable("tokenizer", &tokenizer_path, e))?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path).map_err(|e| unavailable("config", &config_path, e))?;
        let config: BertConfig = serde_json::from_str(&raw).map_err(|e| unavailable("config", &config_path, e))?;

        let safetensors = model_dir.join("model.safetensors");
        let vb = if safetensors.exists() {
            // SAFETY: the file is memory-mapped read-only and not modified while the model lives.
            unsafe { VarBuilder::from_mmaped_safetensors(&[&safetensors], DType::F32, &device) }
                .map_err(|e| unavailable("weights", &safetensors, e))?
        } else {
            let weights_path = model_dir.join("pytorch_model.bin");
            let weights = candle_core::pickle::read_all(&weights_path).map_err(|e| unavailable("weights", &weights_path, e))?;
            let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
            VarBuilder::from_tensors(weights_map, DType::F32, &device)
        };
        let model = BertModel::load(vb, &config).map_err(|e| unavailable("model", model_dir, e))?;

        let dim = config.hidden_size;
        let short_name = model_name.rsplit('/').next().unwrap_or(model_name);
        let model_id = format!("{}:d{}", short_name, dim);
        tracing::info!(model_id = %model_id, "embedding model loaded");
        Ok(Self { model, tokenizer, device, model_id, dim, max_len: max_len.min(config.max_position_embeddings) })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let batch = tokenize::tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let hidden = self
            .model
            .forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))
            .map_err(inference)?;
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask).map_err(inference)?;
        pooled.to_device(&Device::Cpu).map_err(inference)?.to_vec2::<f32>().map_err(inference)
    }
}

impl Embedder for BertEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH) {
            out.extend(self.embed_chunk(chunk)?);
        }
        tracing::debug!(count = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(out)
    }
}

fn fake_requested(cfg: &EmbeddingConfig) -> bool {
    cfg.use_fake
        || std::env::var("APP_USE_FAKE_EMBEDDINGS")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
}

/// Build the embedder described by `cfg`. Fails with `ModelUnavailable` when
/// the real model cannot be located or loaded.
pub fn get_default_embedder(cfg: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbedError> {
    if fake_requested(cfg) {
        tracing::warn!(dim = cfg.fake_dim, "using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(cfg.fake_dim)));
    }
    let dir = resolve_model_dir(cfg)?;
    Ok(Arc::new(BertEmbedder::load(&dir, &cfg.model, cfg.max_len)?))
}

fn resolve_model_dir(cfg: &EmbeddingConfig) -> Result<PathBuf, EmbedError> {
    if let Some(dir) = &cfg.model_dir {
        let p = expand_path(dir);
        if p.exists() {
            return Ok(p);
        }
        return Err(EmbedError::ModelUnavailable(format!("embedding.model_dir {} does not exist", p.display())));
    }
    if let Ok(dir) = std::env::var("MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() {
            return Ok(p);
        }
    }
    let short_name = cfg.model.rsplit('/').next().unwrap_or(&cfg.model);
    let local = Path::new("models").join(short_name);
    if local.exists() {
        return Ok(local);
    }
    Err(EmbedError::ModelUnavailable(format!("could not locate model directory for '{}'", cfg.model)))
}
