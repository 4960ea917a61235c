// ABOUTME: Public library API for notion2md page export
// ABOUTME: Re-exports core modules for external use

pub mod api;
pub mod auth;
pub mod cli;
pub mod codec;
pub mod convert;
pub mod diff;
pub mod error;
pub mod export;
pub mod fetch;
pub mod locator;
pub mod logging;
pub mod model;
pub mod render;
pub mod snapshot;
pub mod util;

pub use codec::Codec;
pub use error::{Error, Result};
pub use export::{Download, Exporter};
pub use fetch::{BlockSource, TreeFetcher};
pub use model::{ChildrenPage, FieldSlots, Frontmatter, RawRecord, Record, Timestamp};
pub use snapshot::SnapshotStore;
