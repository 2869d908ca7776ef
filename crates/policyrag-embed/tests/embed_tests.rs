use policyrag_core::config::EmbeddingConfig;
use policyrag_core::traits::cosine_distance;
use policyrag_core::{EmbedError, Embedder};
use policyrag_embed::{get_default_embedder, FakeEmbedder};

#[test]
fn fake_embedder_shapes_and_determinism() {
    let cfg = EmbeddingConfig { use_fake: true, fake_dim: 384, ..EmbeddingConfig::default() };
    let embedder = get_default_embedder(&cfg).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_many(&texts).expect("embed_many");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim follows config");
    assert_eq!(embedder.dim(), 384);

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
    assert_eq!(embedder.embed("hello world").expect("embed"), *v1);
}

#[test]
fn near_duplicates_are_closer_than_unrelated_text() {
    let embedder = FakeEmbedder::new(768);
    let base = embedder.embed("Employees get 20 days of annual leave per year.").unwrap();
    let near = embedder.embed("Employees get 20 days of annual leave each year.").unwrap();
    let far = embedder.embed("Reimbursement for taxi fares requires receipts.").unwrap();
    assert!(cosine_distance(&base, &near) < cosine_distance(&base, &far));
}

#[test]
fn batch_preserves_input_order() {
    let embedder = FakeEmbedder::new(64);
    let texts = vec!["leave".to_string(), "travel".to_string(), "harassment".to_string()];
    let batch = embedder.embed_many(&texts).unwrap();
    for (text, vector) in texts.iter().zip(&batch) {
        assert_eq!(&embedder.embed(text).unwrap(), vector);
    }
    assert!(embedder.model_id().ends_with(":d64"));
}

#[test]
fn missing_model_dir_is_model_unavailable() {
    let cfg = EmbeddingConfig { model_dir: Some("/definitely/not/a/model/dir".into()), ..EmbeddingConfig::default() };
    match get_default_embedder(&cfg) {
        Err(EmbedError::ModelUnavailable(msg)) => assert!(msg.contains("does not exist")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("model should not load"),
    }
}
