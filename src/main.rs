//! Calamari provider host - starts the Calamari service providers and serves
//! their descriptions, configuration models and premises over HTTP.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use calamari_provider::config::{MicroserviceArchitecture, ServiceProviderConfiguration};
use calamari_provider::{
    CalamariProvider, LifecycleState, Locale, Model, Premise, ProcessorType, ServiceProvider,
    Target,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type SharedProvider = Arc<RwLock<CalamariProvider>>;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    providers: Arc<HashMap<ProcessorType, SharedProvider>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "calamari_provider=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let configuration = ServiceProviderConfiguration::from_env();
    let registry = MicroserviceArchitecture::from_env()?;
    info!("Loaded {} msa hosts", registry.len());

    let mut providers = HashMap::new();
    for kind in ProcessorType::ALL {
        let mut provider = CalamariProvider::new(kind, configuration.clone(), registry.clone());

        // start failures are not fatal, restart retries them
        if let Err(e) = provider.start().await {
            error!("Failed to start {} provider: {}", kind, e);
        }

        providers.insert(kind, Arc::new(RwLock::new(provider)));
    }

    let state = AppState {
        providers: Arc::new(providers),
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/providers", get(list_providers))
        .route("/providers/:kind", get(get_provider))
        .route("/providers/:kind/model", get(get_model))
        .route("/providers/:kind/premise", get(get_premise))
        .route("/providers/:kind/restart", post(restart_provider))
        .route("/providers/:kind/refresh", post(refresh_provider))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Deserialize)]
struct LocaleQuery {
    lang: Option<String>,
}

impl LocaleQuery {
    fn locale(&self) -> Locale {
        self.lang.clone().map(Locale::new).unwrap_or_default()
    }
}

/// Provider overview returned by the listing endpoints.
#[derive(Serialize)]
struct ProviderSummary {
    provider: String,
    name: String,
    description: Option<String>,
    state: LifecycleState,
    version: f32,
    index: i32,
    categories: Option<Vec<String>>,
    steps: Option<Vec<String>>,
    base_url: Option<String>,
    timeout_active_processor_ms: u128,
}

fn summarize(provider: &CalamariProvider, locale: &Locale) -> ProviderSummary {
    ProviderSummary {
        provider: provider.provider(),
        name: provider.name(locale),
        description: provider.description(locale),
        state: provider.state(),
        version: provider.version(),
        index: provider.index(),
        categories: provider.categories(),
        steps: provider.steps(),
        base_url: provider.endpoint().map(|e| e.base_url.clone()),
        timeout_active_processor_ms: provider.timeout_active_processor().as_millis(),
    }
}

fn lookup(state: &AppState, kind: &str) -> Result<SharedProvider, StatusCode> {
    ProcessorType::parse(kind)
        .and_then(|kind| state.providers.get(&kind).cloned())
        .ok_or(StatusCode::NOT_FOUND)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// List all providers.
async fn list_providers(
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
) -> Json<Vec<ProviderSummary>> {
    let locale = query.locale();
    let mut summaries = Vec::new();
    for kind in ProcessorType::ALL {
        if let Some(provider) = state.providers.get(&kind) {
            summaries.push(summarize(&*provider.read().await, &locale));
        }
    }
    Json(summaries)
}

/// Get one provider.
async fn get_provider(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<LocaleQuery>,
) -> Result<Json<ProviderSummary>, StatusCode> {
    let provider = lookup(&state, &kind)?;
    let provider = provider.read().await;
    Ok(Json(summarize(&provider, &query.locale())))
}

/// Get the configuration model. 404 until a description is cached.
async fn get_model(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Model>, StatusCode> {
    let provider = lookup(&state, &kind)?;
    let provider = provider.read().await;
    provider
        .model(&Target::default())
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Ping the microservice and report the premise.
async fn get_premise(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Premise>, StatusCode> {
    let provider = lookup(&state, &kind)?;
    let provider = provider.read().await;
    Ok(Json(provider.premise(&Target::default()).await))
}

/// Run the restart lifecycle step.
async fn restart_provider(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ProviderSummary>, (StatusCode, String)> {
    let provider = lookup(&state, &kind).map_err(|s| (s, format!("Unknown provider: {}", kind)))?;
    let mut provider = provider.write().await;

    provider.restart().await.map_err(|e| {
        error!("Restart of {} failed: {}", kind, e);
        (StatusCode::BAD_GATEWAY, format!("Restart failed: {}", e))
    })?;

    Ok(Json(summarize(&provider, &Locale::default())))
}

/// Force a fresh description fetch.
async fn refresh_provider(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ProviderSummary>, (StatusCode, String)> {
    let provider = lookup(&state, &kind).map_err(|s| (s, format!("Unknown provider: {}", kind)))?;
    let mut provider = provider.write().await;

    provider.refresh().await.map_err(|e| {
        error!("Refresh of {} failed: {}", kind, e);
        (StatusCode::BAD_GATEWAY, format!("Refresh failed: {}", e))
    })?;

    Ok(Json(summarize(&provider, &Locale::default())))
}
