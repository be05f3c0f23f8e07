//! # mapping-analysis
//!
//! Resolves structural gaps in one release's merged tree using a
//! reconstructed inheritance graph:
//!
//! - **Malformed entities**: bad descriptors or class names; the entity is
//!   dropped with a logged cause
//! - **Inner-class name completion**: a nested class missing a name borrows
//!   the simple name from a candidate namespace and the enclosing class's name
//! - **Inheritance propagation**: an overriding method without a name in an
//!   inheritance namespace takes the name of its closest named ancestor
//!
//! [`Analyzer::analyze`] only stages repairs. Callers inspect the returned
//! [`AnalysisReport`] and commit it with [`AnalysisReport::accept`] as one
//! batch, or discard it for a dry run.

pub mod analyzer;
pub mod error;
pub mod inheritance;
pub mod options;
pub mod report;

pub use analyzer::Analyzer;
pub use error::{AnalysisError, AnalysisResult};
pub use inheritance::InheritanceGraph;
pub use options::AnalysisOptions;
pub use report::{AcceptSummary, AnalysisReport, Resolution};
