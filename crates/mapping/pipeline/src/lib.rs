//! # mapping-pipeline
//!
//! Drives the engine end to end:
//!
//! 1. One task per release fetches provider fragments through the shared
//!    [`ProviderCache`](mapping_cache::ProviderCache), composes them, runs the
//!    interceptor chain and analyzes the result. Tasks share nothing else.
//! 2. Results are buffered until every release has finished. Failed releases
//!    drop out with a [`ReleaseFailure`]; survivors keep their order.
//! 3. Ancestry is resolved over the surviving sequence, indices are assigned
//!    and optionally stamped into a synthetic namespace.
//!
//! [`PipelineSettings`] is the file form of the whole configuration.

pub mod contributor;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod settings;

pub use contributor::ContributorSpec;
pub use error::{PipelineError, PipelineResult, ReleaseFailure, Stage};
pub use output::{PipelineOutput, ReleaseOutcome, LINEAGE_FILE};
pub use pipeline::{MappingPipeline, MappingPipelineBuilder};
pub use settings::{
    ContributorSettings, InterceptorSpec, PipelineSettings, ReleaseSelection, TransformSpec,
    DEFAULT_INDEX_NAMESPACE,
};
