use policyrag_core::chunker::chunk_pages;
use policyrag_core::{CollectionSpec, Embedder, IndexError, IndexRecord, VectorIndex};
use policyrag_embed::FakeEmbedder;
use policyrag_vector::LanceIndex;
use tempfile::TempDir;

fn records(embedder: &FakeEmbedder, pages: &[(u32, String)], source: &str) -> Vec<IndexRecord> {
    let chunks = chunk_pages(pages, 500, source);
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed_many(&texts).expect("embed");
    chunks.into_iter().zip(vectors).map(|(c, v)| IndexRecord::from_chunk(c, v)).collect()
}

#[tokio::test]
async fn lancedb_full_flow() {
    let tmp = TempDir::new().expect("tmp");
    let index = LanceIndex::open(tmp.path()).await.expect("open db");
    let embedder = FakeEmbedder::new(64);
    let spec = CollectionSpec { dim: embedder.dim(), embedder_id: embedder.model_id().to_string() };

    let handle = index.recreate("leave_policy", &spec).await.expect("recreate");
    let empty = index.query(&handle, &embedder.embed("How many leave days?").unwrap(), 5).await.expect("query empty");
    assert!(empty.is_empty(), "fresh collection answers with zero hits");

    let pages = vec![
        (1, "Employees get 20 days leave.".to_string()),
        (2, "Travel must be approved by a manager before booking flights.".to_string()),
    ];
    let rows = records(&embedder, &pages, "handbook.pdf");
    index.write(&handle, &rows).await.expect("write");
    assert_eq!(index.count(&handle).await.expect("count"), 2);

    let res = index.query(&handle, &embedder.embed("How many leave days?").unwrap(), 5).await.expect("query");
    assert_eq!(res.len(), 2);
    assert_eq!(res.hits[0].id, "handbook.pdf_p1_c0");
    assert_eq!(res.hits[0].metadata.page, 1);
    assert!(res.hits[0].distance <= res.hits[1].distance);

    // Writing the same rows again upserts instead of duplicating.
    index.write(&handle, &rows).await.expect("rewrite");
    assert_eq!(index.count(&handle).await.expect("count"), 2);

    let reopened = index.open("leave_policy").await.expect("open");
    assert_eq!(reopened.dim, 64);
}

#[tokio::test]
async fn recreate_and_delete_are_explicit() {
    let tmp = TempDir::new().expect("tmp");
    let index = LanceIndex::open(tmp.path()).await.expect("open db");
    let spec = CollectionSpec { dim: 8, embedder_id: "fake-xxhash:d8".into() };

    assert!(!index.delete_if_exists("travel_policy").await.expect("absent delete"));
    assert!(matches!(index.open("travel_policy").await, Err(IndexError::CollectionNotFound(_))));

    let embedder = FakeEmbedder::new(8);
    let h = index.recreate("travel_policy", &spec).await.expect("create");
    index.write(&h, &records(&embedder, &[(1, "Per diem is 50 EUR.".into())], "travel.pdf")).await.expect("write");
    let h = index.recreate("travel_policy", &spec).await.expect("recreate");
    assert_eq!(index.count(&h).await.expect("count"), 0, "recreate starts clean");

    assert!(index.delete_if_exists("travel_policy").await.expect("delete"));
}

#[tokio::test]
async fn rejects_bad_arguments() {
    let tmp = TempDir::new().expect("tmp");
    let index = LanceIndex::open(tmp.path()).await.expect("open db");
    let spec = CollectionSpec { dim: 4, embedder_id: "fake-xxhash:d4".into() };
    let h = index.recreate("harass_policy", &spec).await.expect("create");

    let wrong = FakeEmbedder::new(6);
    let bad_rows = records(&wrong, &[(1, "Report incidents to HR.".into())], "harass.pdf");
    assert!(matches!(index.write(&h, &bad_rows).await, Err(IndexError::Write { .. })));
    assert!(matches!(index.query(&h, &[0.5; 4], 0).await, Err(IndexError::InvalidArgument(_))));
}
