use policyrag_core::config::Config;
use policyrag_core::VectorIndex;
use policyrag_vector::LanceIndex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let index = LanceIndex::open(&settings.store_path()).await?;
    let mut collections: Vec<&str> = settings.domains.values().map(String::as_str).collect();
    collections.push(&settings.retrieval.collection);
    for name in collections {
        match index.open(name).await {
            Ok(handle) => println!("{}: rows={} dim={} embedder={}", name, index.count(&handle).await?, handle.dim, handle.embedder_id.as_deref().unwrap_or("?")),
            Err(e) => println!("{}: {}", name, e),
        }
    }
    Ok(())
}
