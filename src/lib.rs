// Mediacache: on-demand media derivatives backed by a flat disk cache

pub mod asset;
pub mod cache;
pub mod config;
pub mod error;
pub mod janitor;
pub mod logging;
pub mod origin;
pub mod resources; // peak memory for janitor reports
pub mod storage;
pub mod transform;

pub use asset::{AssetDescriptor, StorageKind};
pub use cache::{DeliveryMode, Disposition, MediaOnTheFly, ServedFile};
pub use error::MediaError;
pub use janitor::{EvictionReport, Janitor};
