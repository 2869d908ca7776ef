use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use policyrag_core::{Chunk, Chunker, CollectionSpec, EmbedError, Embedder, IndexRecord, IngestionError, VectorIndex};

use crate::extract::ExtractorSet;

/// Outcome of one ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub collection: String,
    pub ingested: Vec<(PathBuf, usize)>,
    pub missing: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub chunks_written: usize,
    /// Row count read back from the index after writing.
    pub stored: usize,
}

/// Extract → chunk → embed → write, rebuilding one collection from scratch.
pub struct IngestPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    extractors: ExtractorSet,
    chunker: Chunker,
    batch_size: usize,
    show_progress: bool,
}

impl IngestPipeline {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index, extractors: ExtractorSet::default(), chunker: Chunker::default(), batch_size: 256, show_progress: false }
    }

    pub fn with_chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_extractors(mut self, extractors: ExtractorSet) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Rebuild `collection` from `paths`. Missing or unreadable files are
    /// reported and skipped; the run fails only when nothing is left to index.
    ///
    /// Sources are extracted before the collection is dropped, so a run with
    /// no usable input leaves the previous contents in place.
    pub async fn ingest(&self, collection: &str, paths: &[PathBuf]) -> Result<IngestReport, IngestionError> {
        let mut report = IngestReport { collection: collection.to_string(), ..IngestReport::default() };
        let files = expand_paths(paths, &self.extractors, &mut report.missing);
        if files.is_empty() {
            return Err(IngestionError::NoSources(paths.len()));
        }

        let mut chunks: Vec<Chunk> = Vec::new();
        for file in &files {
            let source = display_name(file);
            match self.extractors.extract(file) {
                Ok(pages) => {
                    let file_chunks = self.chunker.chunk(&pages, &source);
                    tracing::info!(file = %file.display(), pages = pages.len(), chunks = file_chunks.len(), "extracted");
                    if file_chunks.is_empty() {
                        tracing::warn!(file = %file.display(), "no text extracted");
                    }
                    report.ingested.push((file.clone(), file_chunks.len()));
                    chunks.extend(file_chunks);
                }
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "skipping unreadable file");
                    report.failed.push((file.clone(), e.to_string()));
                }
            }
        }
        if chunks.is_empty() {
            return Err(IngestionError::NoChunks(files.len()));
        }

        let spec = CollectionSpec { dim: self.embedder.dim(), embedder_id: self.embedder.model_id().to_string() };
        let handle = self.index.recreate(collection, &spec).await?;

        let pb = self.progress_bar(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embed_blocking(self.embedder.clone(), texts).await?;
            let records: Vec<IndexRecord> = batch.iter().cloned().zip(vectors).map(|(c, v)| IndexRecord::from_chunk(c, v)).collect();
            self.index.write(&handle, &records).await?;
            report.chunks_written += records.len();
            pb.inc(records.len() as u64);
        }
        pb.finish_with_message("indexed");

        report.stored = self.index.count(&handle).await?;
        tracing::info!(collection, written = report.chunks_written, stored = report.stored, "ingestion complete");
        Ok(report)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        let pb = ProgressBar::new(len as u64);
        if !self.show_progress {
            pb.set_draw_target(ProgressDrawTarget::hidden());
            return pb;
        }
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}") {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

async fn embed_blocking(embedder: Arc<dyn Embedder>, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedError> {
    let expected = texts.len();
    let vectors = tokio::task::spawn_blocking(move || embedder.embed_many(&texts))
        .await
        .map_err(|e| EmbedError::Inference(format!("embedding task failed: {}", e)))??;
    if vectors.len() != expected {
        return Err(EmbedError::Inference(format!("expected {} vectors, got {}", expected, vectors.len())));
    }
    Ok(vectors)
}

/// Files named directly are kept as given; directories expand to the
/// supported files inside them, sorted. Paths that do not exist go to `missing`.
pub fn expand_paths(paths: &[PathBuf], extractors: &ExtractorSet, missing: &mut Vec<PathBuf>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let mut found: Vec<PathBuf> = walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && extractors.supports(e.path()))
                .map(|e| e.path().to_path_buf())
                .collect();
            found.sort();
            files.extend(found);
        } else {
            tracing::warn!(path = %path.display(), "file not found");
            missing.push(path.clone());
        }
    }
    files
}

/// Look up the collection for a domain in the fixed mapping.
pub fn resolve_domain<'a>(domains: &'a BTreeMap<String, String>, domain: &str) -> Result<&'a str, IngestionError> {
    domains.get(domain).map(String::as_str).ok_or_else(|| IngestionError::UnknownDomain {
        domain: domain.to_string(),
        known: domains.keys().cloned().collect::<Vec<_>>().join(", "),
    })
}

pub fn display_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string())
}
