use chat_local::llm_engine::TITLE_MODEL;
use chat_local::{init_logging, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let app_config = AppConfig::from_env();
    log::info!("Chat-Local starting (database: {})", app_config.db_path.display());

    let state = AppState::new(&app_config)?;

    let overview = state.config.models_overview()?;
    for model in &overview.models {
        log::info!("Model available: {} ({})", model.id, model.name);
    }
    log::info!("Default model: {}", overview.default_model_id);

    let endpoint = state.config.get_endpoint()?;
    if state
        .prober
        .test_connection(&endpoint.base_url, endpoint.api_format)
        .await?
    {
        log::info!("Ollama server reachable at {}", endpoint.base_url);
    } else {
        log::warn!(
            "Ollama server at {} is not reachable using {} API format",
            endpoint.base_url,
            endpoint.api_format
        );
    }

    let provider = state.assembler.build()?;
    let title_model = provider.language_model(TITLE_MODEL)?;
    log::info!(
        "Provider ready with {} models ({} -> {})",
        provider.model_ids().len(),
        TITLE_MODEL,
        title_model.model_id()
    );

    Ok(())
}
