use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use policyrag_answer::{
    AnswerComposer, AnswerError, AnswerStatus, CompletionError, CompletionRequest, CompletionService, Retriever,
    NO_DOCUMENTS_MESSAGE,
};
use policyrag_core::{ChunkMetadata, CollectionSpec, Embedder, IndexError, IndexRecord, InMemoryIndex, VectorIndex};
use policyrag_embed::FakeEmbedder;

/// Records prompts and replies with a canned answer or status.
struct StubCompletion {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    reply: Result<String, u16>,
}

impl StubCompletion {
    fn replying(text: &str) -> Self {
        Self { calls: AtomicUsize::new(0), prompts: Mutex::new(Vec::new()), reply: Ok(text.to_string()) }
    }

    fn failing(status: u16) -> Self {
        Self { calls: AtomicUsize::new(0), prompts: Mutex::new(Vec::new()), reply: Err(status) }
    }
}

#[async_trait]
impl CompletionService for StubCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());
        match &self.reply {
            Ok(t) => Ok(t.clone()),
            Err(status) => Err(CompletionError::Status { status: *status, body: String::new() }),
        }
    }
}

async fn seeded(embedder: &Arc<dyn Embedder>, index: &Arc<InMemoryIndex>, texts: &[&str]) {
    let spec = CollectionSpec { dim: embedder.dim(), embedder_id: embedder.model_id().to_string() };
    let handle = index.recreate("leave_policy_pdfs", &spec).await.unwrap();
    let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
    let vectors = embedder.embed_many(&owned).unwrap();
    let records: Vec<IndexRecord> = owned
        .into_iter()
        .zip(vectors)
        .enumerate()
        .map(|(i, (text, vector))| {
            let metadata = ChunkMetadata { source: "leave.pdf".into(), page: i as u32 + 1, chunk_id: 0 };
            IndexRecord { id: format!("leave.pdf_p{}_c0", i + 1), vector, text, metadata }
        })
        .collect();
    index.write(&handle, &records).await.unwrap();
}

#[tokio::test]
async fn annual_leave_question_is_grounded_in_the_right_chunk() {
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(64));
    let index = Arc::new(InMemoryIndex::new());
    seeded(
        &embedder,
        &index,
        &[
            "Employees are entitled to 20 days of annual leave per year.",
            "Travel claims must be filed with receipts within one month.",
            "Harassment complaints go to the HR ombudsperson.",
        ],
    )
    .await;

    let retriever = Retriever::new(embedder, index, "leave_policy_pdfs", 5);
    let result = retriever.retrieve("How many days of annual leave do employees get?").await.unwrap();
    assert_eq!(result.len(), 3);
    assert!(result.hits[0].text.contains("20 days"));

    let stub = Arc::new(StubCompletion::replying("  Employees get 20 days of annual leave.  "));
    let composer = AnswerComposer::new(stub.clone());
    let answer = composer.compose("How many days of annual leave do employees get?", &result).await.unwrap();

    assert_eq!(answer.status, AnswerStatus::Grounded);
    assert_eq!(answer.text, "Employees get 20 days of annual leave.");
    let prompts = stub.prompts.lock().unwrap();
    assert!(prompts[0].starts_with("You are an assistant on leave policy.\n\nContext:\nDocument: Employees are entitled to 20 days"));
    assert!(prompts[0].ends_with("User question: How many days of annual leave do employees get?\nAnswer:"));
}

#[tokio::test]
async fn empty_collection_short_circuits_without_completion_call() {
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(16));
    let index = Arc::new(InMemoryIndex::new());
    seeded(&embedder, &index, &[]).await;

    let retriever = Retriever::new(embedder, index, "leave_policy_pdfs", 5);
    let result = retriever.retrieve("anything").await.unwrap();
    assert!(result.is_empty());

    let stub = Arc::new(StubCompletion::replying("unused"));
    let answer = AnswerComposer::new(stub.clone()).compose("anything", &result).await.unwrap();
    assert_eq!(answer.text, NO_DOCUMENTS_MESSAGE);
    assert_eq!(answer.status, AnswerStatus::NoDocuments);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn service_status_becomes_in_band_text() {
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(16));
    let index = Arc::new(InMemoryIndex::new());
    seeded(&embedder, &index, &["Sick leave needs a certificate."]).await;

    let result = Retriever::new(embedder, index, "leave_policy_pdfs", 5).retrieve("sick leave").await.unwrap();
    let answer = AnswerComposer::new(Arc::new(StubCompletion::failing(429))).compose("sick leave", &result).await.unwrap();
    assert_eq!(answer.text, "API error: 429");
    assert_eq!(answer.status, AnswerStatus::ServiceError { status: 429 });
}

#[tokio::test]
async fn querying_with_a_different_embedder_is_refused() {
    let builder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(16));
    let index = Arc::new(InMemoryIndex::new());
    seeded(&builder, &index, &["Sick leave needs a certificate."]).await;

    let other: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(32));
    let err = Retriever::new(other, index, "leave_policy_pdfs", 5).retrieve("sick").await.unwrap_err();
    assert!(matches!(err, AnswerError::Index(IndexError::EmbedderMismatch { .. })));
}

#[tokio::test]
async fn missing_collection_is_an_index_error() {
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(16));
    let index = Arc::new(InMemoryIndex::new());
    let err = Retriever::new(embedder, index, "nope", 5).retrieve("q").await.unwrap_err();
    assert!(matches!(err, AnswerError::Index(IndexError::CollectionNotFound(_))));
}
