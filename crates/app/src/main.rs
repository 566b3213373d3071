use std::sync::Arc;

use shop_app::config::AppConfig;
use shop_app::demo::{self, Shop};
use shop_infra::InMemoryStore;

fn main() -> anyhow::Result<()> {
    shop_observability::init();

    let config = AppConfig::from_env();
    let shop = Shop::new(Arc::new(InMemoryStore::new()));

    let report = demo::run(&config, &shop)?;
    tracing::info!(member_id = %report.member_id, "demo complete");

    println!("{}", serde_json::to_string_pretty(&report.summaries)?);
    Ok(())
}
