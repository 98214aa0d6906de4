//! Indexer domain
//!
//! - `entities` - listable tables, default orderings and filter maps
//! - `sync` - indexed-vs-chain-head sync status

pub mod entities;
pub mod sync;

pub use entities::{ENTITIES, EntityDef};
pub use sync::{ChainRpcClient, SyncError, SyncStatus};
