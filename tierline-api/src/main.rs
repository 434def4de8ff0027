use std::net::SocketAddr;
use std::sync::Arc;
use tierline_api::{app, AppState};
use tierline_store::{
    app_config::Config, spawn_event_forwarder, ChannelEventSink, DbClient, EventProducer,
    PgOfferStorage, StoreOfferRepository, StripeCouponClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tierline_api=debug,tierline_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Tierline API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url).await?;
    db.migrate().await?;

    let stripe = StripeCouponClient::new(&config.stripe)?;

    // Code change events go out through Kafka
    let producer = EventProducer::new(&config.kafka.brokers)?;
    let (sink, rx) = ChannelEventSink::new();
    let _forwarder = spawn_event_forwarder(rx, producer, config.kafka.topic.clone());

    let repository = StoreOfferRepository::new(
        PgOfferStorage::new(db.pool.clone()),
        Arc::new(stripe),
        Arc::new(sink),
    );

    let app_state = AppState { offers: Arc::new(repository) };
    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
