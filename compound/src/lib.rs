//! Compound - composite keys and prefix range queries over an ordered
//! key-value store.
//!
//! Compound turns a record identified by an object type and an ordered tuple
//! of string fields into a single physical key, such that every record
//! sharing a leading run of fields occupies one contiguous key range. A
//! "prefix query" is then a single forward range scan.
//!
//! # Architecture
//!
//! - **codec**: the reversible key encoding. Every segment carries a
//!   fixed-width length prefix, so no byte is reserved as a separator and
//!   keys with different field values never collide or nest.
//! - **planner**: turns an encoded prefix into the half-open range
//!   `[prefix, successor(prefix))`.
//! - **RecordStore**: checks tuples against the declared
//!   [`ObjectSchema`] of their object type and runs puts, exact gets and
//!   prefix scans through the codec and planner.
//!
//! # Key Concepts
//!
//! - **RecordStore**: The main entry point providing both read and write
//!   operations.
//! - **RecordStoreReader**: A read-only view of the store.
//! - **RecordRead**: Trait defining read operations shared by both types.
//!
//! # Example
//!
//! ```ignore
//! use compound::{Config, ObjectSchema, RecordRead, RecordStore};
//! use bytes::Bytes;
//!
//! let config = Config {
//!     schemas: vec![ObjectSchema::new("Marble", ["color", "name"])],
//!     ..Default::default()
//! };
//! let store = RecordStore::open(config).await?;
//!
//! store.put("Marble", &["blue", "rose"], Bytes::from("a")).await?;
//! store.put("Marble", &["blue", "tulip"], Bytes::from("b")).await?;
//! store.put("Marble", &["red", "rose"], Bytes::from("c")).await?;
//!
//! // Every blue marble, in key order
//! let mut iter = store.scan_by_prefix("Marble", &["blue"]).await?;
//! while let Some(record) = iter.next().await? {
//!     println!("{:?} -> {:?}", record.tail(), record.payload);
//! }
//! ```

pub mod codec;
mod config;
mod error;
mod model;
pub mod payload;
pub mod planner;
mod reader;
mod schema;
mod storage;
mod store;

pub use codec::{DecodedKey, decode_key, encode_key, encode_prefix};
pub use config::{Config, WriteOptions};
pub use error::{Error, Result};
pub use model::ScannedRecord;
pub use planner::{lex_increment, plan_prefix_range};
pub use reader::{RecordIterator, RecordRead, RecordStoreReader};
pub use schema::{ObjectSchema, SchemaRegistry};
pub use store::RecordStore;
