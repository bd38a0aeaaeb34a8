use std::sync::Arc;

use actix_web::{web::Data, App, HttpServer};
use anyhow::Context;
use paperclip::actix::OpenApiExt;
use tracing_actix_web::TracingLogger;

use bookalchemy_catalog::app_config::config_app;
use bookalchemy_catalog::catalog::Catalog;
use bookalchemy_catalog::library_repository::{
    InMemoryLibraryRepository, LibraryRepository, PostgresLibraryRepository,
};
use bookalchemy_catalog::settings::Settings;

const APP_NAME: &str = "bookalchemy_catalog";

// Based on https://github.com/LukeMathWalker/tracing-actix-web/blob/main/examples/opentelemetry/src/main.rs#L15
fn init_telemetry(jaeger_enabled: bool) -> anyhow::Result<()> {
    use opentelemetry::global;
    use opentelemetry_sdk::propagation::TraceContextPropagator;
    use opentelemetry_sdk::runtime::TokioCurrentThread;
    use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::{EnvFilter, Registry};

    // Spans are exported to Jaeger in batch when enabled
    let telemetry = if jaeger_enabled {
        global::set_text_map_propagator(TraceContextPropagator::new());
        #[allow(deprecated)]
        let tracer = opentelemetry_jaeger::new_agent_pipeline()
            .with_service_name(APP_NAME)
            .install_batch(TokioCurrentThread)
            .context("Failed to install OpenTelemetry tracer.")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    // Tunable via `RUST_LOG` env variable
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    let formatting_layer = BunyanFormattingLayer::new(APP_NAME.into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(telemetry)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install `tracing` subscriber.")
}

async fn init_repository(settings: &Settings) -> anyhow::Result<Arc<dyn LibraryRepository>> {
    if settings.use_in_memory_db {
        tracing::info!("Using in-memory library repository");
        return Ok(Arc::new(InMemoryLibraryRepository::default()));
    }
    let repository = PostgresLibraryRepository::init(settings.postgres_config())
        .await
        .context("Failed to init postgres")?;
    Ok(Arc::new(repository))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    init_telemetry(settings.jaeger_enabled)?;

    let catalog = Data::new(Catalog::new(init_repository(&settings).await?));

    tracing::info!(
        "starting HTTP server at http://{}:{}",
        settings.host,
        settings.port
    );
    HttpServer::new(move || {
        App::new()
            .wrap_api()
            .app_data(catalog.clone())
            .wrap(TracingLogger::default())
            .configure(config_app)
            .with_json_spec_at("/apispec/v2")
            .build()
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
    .context("HTTP server failed")
}
