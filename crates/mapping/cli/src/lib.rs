//! # mapping-cli
//!
//! Library half of the `mapweave` binary: the JSON directory provider adapter
//! and the subcommand implementations.
//!
//! Input layout:
//!
//! ```text
//! <input>/manifest.json          upstream version manifest
//! <input>/<release>/<provider>.json
//! ```

pub mod commands;
pub mod provider;

pub use commands::{RunOptions, MANIFEST_FILE};
pub use provider::{discover_providers, JsonDirectoryProvider};
