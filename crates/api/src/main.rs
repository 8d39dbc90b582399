use tracing::info;

use wareflow_api::app::{build_app, services};
use wareflow_api::config::Config;
use wareflow_infra::{Consumer, RedisStreamsTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wareflow_api::telemetry::init();

    let config = Config::from_env();

    let (app_services, engine) = match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(8)
                .connect(url)
                .await?;
            wareflow_infra::store::ensure_schema(&pool).await?;
            info!("connected to postgres");
            services::build_postgres(pool, config.cache_capacity)
        }
        None => services::build_in_memory(config.cache_capacity),
    };

    let consumer = match &config.redis_url {
        Some(url) => {
            let transport = RedisStreamsTransport::new(
                url,
                config.stream_key.clone(),
                config.consumer_group.clone(),
                config.consumer_name.clone(),
                config.block_ms,
            )?;
            info!(
                stream_key = %config.stream_key,
                group = %config.consumer_group,
                consumer = %config.consumer_name,
                "starting event consumer"
            );
            Some(Consumer::new(transport, engine, tokio::runtime::Handle::current()).spawn())
        }
        None => None,
    };

    let app = build_app(app_services);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    if let Some(handle) = consumer {
        handle.stop();
        handle.join();
    }

    Ok(())
}
