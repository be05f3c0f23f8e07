//! # mapping-emit
//!
//! Serializes a merged release tree to a tab-separated, line-based
//! interchange format and reads it back.
//!
//! ```text
//! tiny	2	0	source	mojang	spigot
//! c	a	net/example/Alpha	Alpha
//! 	f	I	b	count
//! 	m	(La;)V	c	accept
//! 		p	1		other
//! ```
//!
//! One record per class, field, method and parameter, one column per
//! namespace, descriptors in the structural namespace. Fields without a
//! descriptor cannot be addressed in this format and are skipped.
//!
//! With structure enabled, three extra `meta_` columns carry the supertype,
//! interfaces and access flags so the tree's structure survives a round trip.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{EmitError, EmitResult};
pub use reader::read_tiny;
pub use writer::{TinyWriter, WriteSummary};

/// Format identifier of the first header column.
pub const FORMAT: &str = "tiny";
pub const MAJOR_VERSION: &str = "2";
pub const MINOR_VERSION: &str = "0";

pub const META_SUPER: &str = "meta_super";
pub const META_INTERFACES: &str = "meta_interfaces";
pub const META_MODIFIERS: &str = "meta_modifiers";
