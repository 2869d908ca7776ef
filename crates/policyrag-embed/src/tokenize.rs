use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use policyrag_core::EmbedError;

/// Token ids, attention mask and token type ids for a batch, each `[B, T]`.
pub struct EncodedBatch {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Tensor,
}

/// Encode, truncate to `max_len` and right-pad to the longest row in the batch.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<EncodedBatch, EmbedError> {
    let pad_id = tokenizer.token_to_id("[PAD]").unwrap_or(0);
    let mut rows: Vec<(Vec<u32>, Vec<u32>)> = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer
            .encode(text.as_str(), true)
            .map_err(|e| EmbedError::Inference(format!("Tokenization failed: {}", e)))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        ids.truncate(max_len);
        mask.truncate(max_len);
        rows.push((ids, mask));
    }
    let width = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);
    let mut flat_ids = Vec::with_capacity(rows.len() * width);
    let mut flat_mask = Vec::with_capacity(rows.len() * width);
    for (mut ids, mut mask) in rows {
        let pad = width - ids.len();
        ids.extend(std::iter::repeat(pad_id).take(pad));
        mask.extend(std::iter::repeat(0).take(pad));
        flat_ids.extend(ids);
        flat_mask.extend(mask);
    }
    let shape = (texts.len(), width);
    let to_err = |e: candle_core::Error| EmbedError::Inference(e.to_string());
    let input_ids = Tensor::from_vec(flat_ids, shape, device).map_err(to_err)?;
    let attention_mask = Tensor::from_vec(flat_mask, shape, device).map_err(to_err)?;
    let token_type_ids = input_ids.zeros_like().map_err(to_err)?;
    Ok(EncodedBatch { input_ids, attention_mask, token_type_ids })
}
