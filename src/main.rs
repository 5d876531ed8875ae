//! Keyword Opportunity Scorer: Binary Entrypoint
//! Boots the Axum HTTP server with the scoring pipeline behind `/analyze`.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    keyword_opportunity_scorer::telemetry::init_tracing();

    let router = keyword_opportunity_scorer::app()?;
    Ok(router.into())
}
