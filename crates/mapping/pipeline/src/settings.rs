//! File-based pipeline configuration.
//!
//! ```toml
//! index_namespace = "lineage"
//!
//! [releases]
//! oldest = "1.14.4"
//! newest = "1.20.1"
//! exclude = ["1.16.5"]
//! kinds = ["release"]
//!
//! [[contributors]]
//! id = "mojang"
//!
//! [[contributors]]
//! id = "spigot-legacy"
//! wraps = "spigot"
//! transform = { kind = "package_prefix", namespace = "spigot", prefix = "net/minecraft/server/" }
//!
//! [[interceptors]]
//! kind = "remove_namespace"
//! namespace = "searge_id"
//!
//! [ancestry]
//! namespaces = ["mojang", "spigot"]
//! ```

use std::path::Path;
use std::sync::Arc;

use mapping_analysis::AnalysisOptions;
use mapping_ancestry::AncestryOptions;
use mapping_cache::MappingProvider;
use mapping_compose::{
    FragmentTransform, InterceptorChain, NameReplacer, NamespaceFilter, ObjectOverrideFilter,
    PackagePrefixer, ParameterNameFilter, StaticInitializerFilter,
};
use mapping_types::{Namespace, Release, ReleaseKind, VersionManifest};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contributor::ContributorSpec;
use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_INDEX_NAMESPACE: &str = "lineage";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub releases: ReleaseSelection,
    pub contributors: Vec<ContributorSettings>,
    pub interceptors: Vec<InterceptorSpec>,
    pub analysis: AnalysisOptions,
    pub ancestry: AncestryOptions,
    /// Synthetic namespace receiving lineage indices; `None` skips stamping.
    pub index_namespace: Option<Namespace>,
    /// Analyze without committing repairs.
    pub dry_run: bool,
    /// Emit supertypes, interfaces and access flags.
    pub emit_structure: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            releases: ReleaseSelection::default(),
            contributors: Vec::new(),
            interceptors: Vec::new(),
            analysis: AnalysisOptions::default(),
            ancestry: AncestryOptions::default(),
            index_namespace: Some(Namespace::new(DEFAULT_INDEX_NAMESPACE)),
            dry_run: false,
            emit_structure: true,
        }
    }
}

impl PipelineSettings {
    pub fn from_toml(text: &str) -> PipelineResult<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        if path.exists() {
            Self::from_toml(&std::fs::read_to_string(path)?)
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if let Some(ns) = &self.index_namespace {
            if ns.is_source() || ns.is_meta() {
                return Err(PipelineError::Settings(format!(
                    "index namespace {ns} is reserved"
                )));
            }
        }
        for contributor in &self.contributors {
            match (&contributor.wraps, &contributor.transform) {
                (Some(_), None) => {
                    return Err(PipelineError::Settings(format!(
                        "contributor {} wraps another contributor but has no transform",
                        contributor.id
                    )))
                }
                (None, Some(_)) => {
                    return Err(PipelineError::Settings(format!(
                        "contributor {} has a transform but wraps nothing",
                        contributor.id
                    )))
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Build the interceptor chain in configured order.
    pub fn interceptor_chain(&self) -> InterceptorChain {
        self.interceptors
            .iter()
            .fold(InterceptorChain::builder(), |builder, spec| match spec {
                InterceptorSpec::RemoveNamespace { namespace } => {
                    builder.then(NamespaceFilter::new(namespace.clone()))
                }
                InterceptorSpec::StripStaticInitializers => builder.then(StaticInitializerFilter),
                InterceptorSpec::StripObjectOverrides => builder.then(ObjectOverrideFilter),
                InterceptorSpec::StripParameterNames { namespace } => {
                    builder.then(ParameterNameFilter::new(namespace.clone()))
                }
            })
            .build()
    }

    /// Turn the contributor list into specs, resolving each plain contributor's
    /// provider through `provider_for`.
    pub fn contributor_specs<F>(&self, mut provider_for: F) -> Vec<ContributorSpec>
    where
        F: FnMut(&str) -> Arc<dyn MappingProvider>,
    {
        self.contributors
            .iter()
            .map(|c| match (&c.wraps, &c.transform) {
                (Some(inner), Some(transform)) => {
                    ContributorSpec::wrap(c.id.as_str(), inner.as_str(), transform.build())
                }
                _ => ContributorSpec::add(c.id.as_str(), provider_for(c.id.as_str())),
            })
            .collect()
    }
}

/// Release range and filters applied to a version manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseSelection {
    /// Oldest release, inclusive; defaults to the oldest in the manifest.
    pub oldest: Option<String>,
    /// Newest release, inclusive; defaults to the newest in the manifest.
    pub newest: Option<String>,
    pub exclude: Vec<String>,
    /// Release kinds to keep; empty keeps all.
    pub kinds: Vec<ReleaseKind>,
}

impl ReleaseSelection {
    pub fn resolve(&self, manifest: &VersionManifest) -> PipelineResult<Vec<Release>> {
        let (Some(first), Some(last)) = (manifest.versions.iter().min(), manifest.versions.iter().max())
        else {
            return Ok(Vec::new());
        };
        let oldest = self.oldest.as_deref().unwrap_or(&first.id);
        let newest = self.newest.as_deref().unwrap_or(&last.id);

        let mut filter = manifest.range(oldest, newest)?.exclude(self.exclude.iter().cloned());
        if !self.kinds.is_empty() {
            filter = filter.include_kinds(self.kinds.iter().copied());
        }
        Ok(filter.resolve())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorSettings {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wraps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformSpec {
    PackagePrefix {
        namespace: Namespace,
        prefix: String,
        #[serde(default)]
        prepend_everything_in: Vec<String>,
    },
    ReplaceName {
        namespace: Namespace,
        from: String,
        to: String,
    },
}

impl TransformSpec {
    pub fn build(&self) -> Arc<dyn FragmentTransform> {
        match self {
            Self::PackagePrefix {
                namespace,
                prefix,
                prepend_everything_in,
            } => Arc::new(
                PackagePrefixer::new(namespace.clone(), prefix.clone())
                    .prepend_everything_in(prepend_everything_in.iter().cloned()),
            ),
            Self::ReplaceName {
                namespace,
                from,
                to,
            } => Arc::new(NameReplacer::new(namespace.clone(), from.clone(), to.clone())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterceptorSpec {
    RemoveNamespace { namespace: Namespace },
    StripStaticInitializers,
    StripObjectOverrides,
    StripParameterNames { namespace: Namespace },
}
