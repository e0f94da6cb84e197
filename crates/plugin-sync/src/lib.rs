pub mod cleanup;
pub mod error;
pub mod fetch;
pub mod layout;
pub mod manifest;
pub mod specifier;
pub mod staging;
pub mod sync;

pub use cleanup::{CleanupReport, remove_unwritten};
pub use error::{EntryError, SyncError};
pub use fetch::{FetchError, Fetcher, Sink};
pub use layout::PluginLayout;
pub use manifest::{ManifestEntry, parse_manifest, read_manifest};
pub use specifier::{Specifier, SpecifierError, Version};
pub use sync::{EntryOutcome, SyncConfig, SyncReport, Synchronizer};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
