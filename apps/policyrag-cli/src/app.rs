//! Composition root: every service is built here once and handed out as `Arc`s.

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use policyrag_answer::{AnswerComposer, CompletionService, OpenAiCompatibleClient, Retriever};
use policyrag_core::config::{Config, Settings};
use policyrag_core::{Chunker, Embedder, VectorIndex};
use policyrag_embed::get_default_embedder;
use policyrag_ingest::{resolve_domain, IngestLock, IngestPipeline};
use policyrag_router::{AgentLoop, DomainRouter, ReactOrchestrator};
use policyrag_server::{AppState, PolicyServer};
use policyrag_vector::LanceIndex;

use crate::cli::{Cli, Command};

pub fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let config = Config::load_from(&cli.config_dir, &cli.env)?;
    Ok(config.settings()?)
}

async fn open_index(settings: &Settings) -> anyhow::Result<Arc<dyn VectorIndex>> {
    let path = settings.store_path();
    let index = LanceIndex::open(&path).await.with_context(|| format!("opening vector store at {}", path.display()))?;
    Ok(Arc::new(index))
}

fn load_embedder(settings: &Settings) -> anyhow::Result<Arc<dyn Embedder>> {
    let embedder = get_default_embedder(&settings.embedding)?;
    tracing::info!(model = embedder.model_id(), dim = embedder.dim(), "embedder ready");
    Ok(embedder)
}

fn completion(settings: &Settings) -> anyhow::Result<Arc<dyn CompletionService>> {
    Ok(Arc::new(OpenAiCompatibleClient::from_config(&settings.completion)?))
}

fn agent(settings: &Settings, embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, completion: Arc<dyn CompletionService>) -> AgentLoop {
    let router = DomainRouter::from_mapping(&settings.domains, embedder, index, settings.retrieval.top_k);
    let orchestrator = ReactOrchestrator::new(completion, settings.agent.temperature).with_max_tokens(settings.completion.max_tokens);
    AgentLoop::new(Arc::new(orchestrator), router)
        .with_max_iterations(settings.agent.max_iterations)
        .with_deadline(settings.agent.deadline_secs.map(Duration::from_secs))
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(&cli)?;
    match cli.command {
        Command::Ingest { domain, paths } => ingest(&settings, &domain, &paths).await,
        Command::Ask { question, routed } => ask(&settings, &question, routed).await,
        Command::Serve { host, port } => serve(&settings, host, port).await,
        Command::Health => health(&settings).await,
    }
}

async fn ingest(settings: &Settings, domain: &str, paths: &[PathBuf]) -> anyhow::Result<()> {
    let collection = resolve_domain(&settings.domains, domain)?.to_string();
    let _lock = IngestLock::acquire(&settings.store_path())?;
    let embedder = load_embedder(settings)?;
    let index = open_index(settings).await?;

    println!("Ingesting {} path(s) into '{}'", paths.len(), collection);
    let pipeline = IngestPipeline::new(embedder, index)
        .with_chunker(Chunker::new(settings.retrieval.chunk_size))
        .with_batch_size(settings.retrieval.write_batch_size)
        .with_progress(true);
    let report = pipeline.ingest(&collection, paths).await?;

    for p in &report.missing {
        println!("⚠️  File not found: {}", p.display());
    }
    for (p, reason) in &report.failed {
        println!("⚠️  Skipped {}: {}", p.display(), reason);
    }
    for (p, n) in &report.ingested {
        println!("📄 {} → {} chunks", p.display(), n);
    }
    println!("✅ Ingest complete: {} chunks stored in '{}'", report.stored, report.collection);
    Ok(())
}

async fn ask(settings: &Settings, question: &str, routed: bool) -> anyhow::Result<()> {
    let embedder = load_embedder(settings)?;
    let index = open_index(settings).await?;
    let completion = completion(settings)?;

    if routed {
        let cancel = CancellationToken::new();
        let outcome = agent(settings, embedder, index, completion).run(question, &cancel).await?;
        for (i, step) in outcome.steps.iter().enumerate() {
            println!("🔎 Step {}: {}({})", i + 1, step.tool, step.input);
        }
        println!("{}", outcome.answer);
        return Ok(());
    }

    let retriever = Retriever::new(embedder, index, settings.retrieval.collection.clone(), settings.retrieval.top_k);
    let result = retriever.retrieve(question).await?;
    let answer = AnswerComposer::from_config(completion, &settings.completion).compose(question, &result).await?;
    println!("{}", answer.text);
    if !result.is_empty() {
        println!("\nSources:");
        for hit in result.iter() {
            println!("  {} (page {}, dist {:.3})", hit.metadata.source, hit.metadata.page, hit.distance);
        }
    }
    Ok(())
}

async fn serve(settings: &Settings, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let embedder = load_embedder(settings)?;
    let index = open_index(settings).await?;
    let completion = completion(settings)?;

    let shutdown = CancellationToken::new();
    let state = AppState {
        retriever: Retriever::new(embedder.clone(), index.clone(), settings.retrieval.collection.clone(), settings.retrieval.top_k),
        composer: AnswerComposer::from_config(completion.clone(), &settings.completion),
        agent: Arc::new(agent(settings, embedder, index, completion)),
        shutdown: shutdown.clone(),
    };

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let server = PolicyServer::new(&host, port, state).with_max_body_size(settings.server.max_body_bytes);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });
    server.serve().await?;
    Ok(())
}

async fn health(settings: &Settings) -> anyhow::Result<()> {
    let index = open_index(settings).await?;
    let handle = index.open(&settings.retrieval.collection).await?;
    let count = index.count(&handle).await?;
    let body = serde_json::json!({ "status": "healthy", "collection": handle.name, "count": count });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
