pub mod differ;
pub mod engine;
pub mod scanner;
pub mod snapshot;

pub use differ::{changes, SyncPlan};
pub use engine::{EngineOptions, SyncEngine, SyncReport};
pub use scanner::scan_local;
pub use snapshot::{Mtime, Snapshot};
