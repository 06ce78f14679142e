use std::sync::Arc;

use forum_api::config::Config;
use forum_infra::InMemoryForumStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    forum_observability::init();

    let config = Config::from_env()?;
    let store = Arc::new(InMemoryForumStore::new());
    let app = forum_api::app::build_app(store);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
