use clap::Parser;
use funhttp::{bind, Config, HttpFetcher, Server, Site, SystemClock, WwwDirectory};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "funhttp=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    let server_limits = config.server_limits();

    tracing::info!(
        address = %config.addr(),
        www = %config.www.display(),
        github_api = %config.github_api,
        workers = server_limits.max_connections,
        "configuration loaded"
    );

    let listener = bind(config.addr(), server_limits.max_pending_connections).map_err(|err| {
        tracing::error!(address = %config.addr(), error = %err, "bind failed");
        err
    })?;
    tracing::info!(address = %listener.local_addr()?, "listening for connections");

    let site = Site::new(
        WwwDirectory::new(&config.www),
        HttpFetcher::new(config.fetch_timeout())?,
        SystemClock,
    )
    .github_api(config.github_api.clone())
    .query_parts(config.max_query_params);

    Server::builder()
        .listener(listener)
        .handler(site)
        .server_limits(server_limits)
        .connection_limits(config.conn_limits())
        .request_limits(config.req_limits())
        .build()?
        .launch()
        .await;

    Ok(())
}
