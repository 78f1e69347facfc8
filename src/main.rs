use std::sync::Arc;

use dotenv::dotenv;

use hansom::config::Config;
use hansom::db::PgPool;
use hansom::engine::Engine;
use hansom::external::push_gateway::PushGateway;
use hansom::notify::{self, LogNotifier, LogSummaryService, Notifier};
use hansom::server::serve;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().unwrap();

    let PgPool(pool) = PgPool::new(&config.database_url, config.database_max_connections)
        .await
        .unwrap();

    let notifier: Arc<dyn Notifier> = match PushGateway::from_env() {
        Ok(gateway) => Arc::new(gateway),
        Err(_) => {
            tracing::warn!("no push gateway configured, notifications will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let (events, inbox) = async_channel::unbounded();
    tokio::spawn(notify::dispatch(
        inbox,
        notifier,
        Arc::new(LogSummaryService),
    ));

    let engine = Engine::new(pool, config.limits, events).await.unwrap();

    serve(engine, config.listen_addr).await;
}
