//! Marble registry demo.
//!
//! Creates a few marbles keyed by (color, name), reads one back, lists every
//! blue marble with a single prefix scan, and hands a marble to a new owner.
//!
//! Run with `RUST_LOG=compound=debug` to see the store operations.

use compound::{Config, RecordRead, RecordStore};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
storage:
  type: InMemory
schemas:
  - object_type: Marble
    key_fields: [color, name]
"#;

#[derive(Debug, Serialize, Deserialize)]
struct Marble {
    #[serde(rename = "docType")]
    object_type: String,
    name: String,
    color: String,
    size: u32,
    owner: String,
}

async fn init_marble(
    store: &RecordStore,
    name: &str,
    color: &str,
    size: u32,
    owner: &str,
) -> anyhow::Result<()> {
    let marble = Marble {
        object_type: "Marble".to_string(),
        name: name.to_string(),
        color: color.to_string(),
        size,
        owner: owner.to_string(),
    };
    store.put_json("Marble", &[color, name], &marble).await?;
    Ok(())
}

async fn set_owner(store: &RecordStore, color: &str, name: &str, owner: &str) -> anyhow::Result<()> {
    let mut marble: Marble = store
        .get_json("Marble", &[color, name])
        .await?
        .ok_or_else(|| anyhow::anyhow!("no {} marble named {}", color, name))?;
    marble.owner = owner.to_string();
    store.put_json("Marble", &[color, name], &marble).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config: Config = serde_yaml::from_str(CONFIG)?;
    let store = RecordStore::open(config).await?;

    init_marble(&store, "rose", "blue", 35, "bob").await?;
    init_marble(&store, "tulip", "blue", 10, "alice").await?;
    init_marble(&store, "daisy", "red", 5, "carol").await?;

    let rose: Option<Marble> = store.get_json("Marble", &["blue", "rose"]).await?;
    println!("got marble: {:?}", rose);

    let mut blue = store.scan_by_prefix("Marble", &["blue"]).await?;
    while let Some(record) = blue.next().await? {
        let marble: Marble = record.payload_json()?;
        println!("blue marble: {} (owner {})", marble.name, marble.owner);
    }

    set_owner(&store, "blue", "rose", "tom").await?;
    let rose: Option<Marble> = store.get_json("Marble", &["blue", "rose"]).await?;
    println!("new owner: {:?}", rose.map(|m| m.owner));

    store.close().await?;
    Ok(())
}
