use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use policyrag_core::{Chunker, Embedder, InMemoryIndex, IngestionError, VectorIndex};
use policyrag_embed::FakeEmbedder;
use policyrag_ingest::{resolve_domain, IngestPipeline};

fn write(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    std::fs::write(&p, body).unwrap();
    p
}

fn pipeline(index: Arc<InMemoryIndex>) -> IngestPipeline {
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(32));
    IngestPipeline::new(embedder, index).with_chunker(Chunker::new(40)).with_batch_size(3)
}

#[tokio::test]
async fn ingests_pages_and_counts_rows() -> anyhow::Result<()> {
    let tmp = tempfile::TempDir::new()?;
    let doc = write(
        tmp.path(),
        "leave.txt",
        "Employees receive 20 days of annual leave per year.\u{000C}Sick leave requires a medical certificate after 3 days.",
    );
    let index = Arc::new(InMemoryIndex::new());
    let report = pipeline(index.clone()).ingest("leave_policy", &[doc]).await?;

    assert_eq!(report.ingested.len(), 1);
    assert!(report.chunks_written >= 2);
    assert_eq!(report.stored, report.chunks_written);

    let handle = index.open("leave_policy").await?;
    assert_eq!(handle.dim, 32);
    assert_eq!(handle.embedder_id.as_deref(), Some("fake-xxhash:d32"));
    Ok(())
}

#[tokio::test]
async fn reingesting_replaces_instead_of_appending() -> anyhow::Result<()> {
    let tmp = tempfile::TempDir::new()?;
    let doc = write(tmp.path(), "travel.txt", "Economy class for flights under six hours. Receipts are mandatory.");
    let index = Arc::new(InMemoryIndex::new());
    let p = pipeline(index.clone());

    let first = p.ingest("travel_policy", &[doc.clone()]).await?;
    let second = p.ingest("travel_policy", &[doc]).await?;
    assert_eq!(first.stored, second.stored);
    Ok(())
}

#[tokio::test]
async fn missing_files_are_skipped() -> anyhow::Result<()> {
    let tmp = tempfile::TempDir::new()?;
    let doc = write(tmp.path(), "a.txt", "Harassment must be reported to HR within 10 working days.");
    let gone = tmp.path().join("gone.pdf");
    let index = Arc::new(InMemoryIndex::new());

    let report = pipeline(index).ingest("harass_policy", &[gone.clone(), doc]).await?;
    assert_eq!(report.missing, vec![gone]);
    assert!(report.stored > 0);
    Ok(())
}

#[tokio::test]
async fn directories_expand_to_supported_files() -> anyhow::Result<()> {
    let tmp = tempfile::TempDir::new()?;
    write(tmp.path(), "one.txt", "Remote work needs manager approval.");
    write(tmp.path(), "two.md", "Overtime is paid at 1.5x.");
    write(tmp.path(), "skip.csv", "a,b,c");
    let index = Arc::new(InMemoryIndex::new());

    let report = pipeline(index).ingest("hr", &[tmp.path().to_path_buf()]).await?;
    assert_eq!(report.ingested.len(), 2);
    Ok(())
}

#[tokio::test]
async fn no_usable_sources_is_fatal_and_keeps_old_collection() -> anyhow::Result<()> {
    let tmp = tempfile::TempDir::new()?;
    let doc = write(tmp.path(), "leave.txt", "Parental leave is 16 weeks.");
    let index = Arc::new(InMemoryIndex::new());
    let p = pipeline(index.clone());
    let before = p.ingest("leave_policy", &[doc]).await?.stored;

    let err = p.ingest("leave_policy", &[tmp.path().join("nope.pdf")]).await.unwrap_err();
    assert!(matches!(err, IngestionError::NoSources(1)));

    let blank = write(tmp.path(), "blank.txt", "   \n\t ");
    let err = p.ingest("leave_policy", &[blank]).await.unwrap_err();
    assert!(matches!(err, IngestionError::NoChunks(1)));

    let handle = index.open("leave_policy").await?;
    assert_eq!(index.count(&handle).await?, before);
    Ok(())
}

#[test]
fn unknown_domain_lists_known_ones() {
    let mut domains = BTreeMap::new();
    domains.insert("leave".to_string(), "leave_policy".to_string());
    domains.insert("travel".to_string(), "travel_policy".to_string());

    assert_eq!(resolve_domain(&domains, "travel").unwrap(), "travel_policy");
    match resolve_domain(&domains, "payroll") {
        Err(IngestionError::UnknownDomain { domain, known }) => {
            assert_eq!(domain, "payroll");
            assert_eq!(known, "leave, travel");
        }
        other => panic!("unexpected: {:?}", other),
    }
}
