use policyrag_core::config::Config;
use policyrag_embed::get_default_embedder;

fn main() -> anyhow::Result<()> {
    let settings = Config::load()?.settings()?;
    let embedder = get_default_embedder(&settings.embedding)?;
    let texts = vec!["How many days of annual leave?".to_string(), "Travel must be pre-approved.".to_string()];
    let embs = embedder.embed_many(&texts)?;
    println!("model={} B={} dim={}", embedder.model_id(), embs.len(), embedder.dim());
    Ok(())
}
