//! Per-release fan-out followed by the cross-release ancestry barrier.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use mapping_analysis::{AnalysisOptions, Analyzer};
use mapping_ancestry::{AncestryOptions, AncestryResolver, IndexAssigner};
use mapping_cache::{CacheError, CachedProvider, MappingProvider, ProviderCache, ProviderError};
use mapping_compose::{compose, Contribution, ContributorId, InterceptorChain};
use mapping_types::{Fragment, MappingTree, Namespace, Release};
use tracing::{debug, info, warn};

use crate::contributor::ContributorSpec;
use crate::error::{PipelineError, PipelineResult, ReleaseFailure, Stage};
use crate::output::{PipelineOutput, ReleaseOutcome};
use crate::settings::PipelineSettings;

/// Everything one release task needs; shared read-only by all of them.
#[derive(Debug)]
struct ReleaseStage {
    contributors: Vec<ContributorSpec>,
    chain: InterceptorChain,
    analyzer: Analyzer,
    cache: Arc<ProviderCache>,
    dry_run: bool,
}

struct Processed {
    tree: MappingTree,
    outcome: ReleaseOutcome,
}

/// Compose, intercept and analyze every release, then compute lineage over
/// the surviving sequence.
///
/// A release whose fetch, composition or analysis fails is removed from the
/// sequence with a [`ReleaseFailure`]; the run only fails when no release
/// survives.
#[derive(Debug)]
pub struct MappingPipeline {
    releases: Vec<Release>,
    stage: Arc<ReleaseStage>,
    resolver: AncestryResolver,
    index_namespace: Option<Namespace>,
}

impl MappingPipeline {
    pub fn builder() -> MappingPipelineBuilder {
        MappingPipelineBuilder::default()
    }

    /// Start a builder from file settings. `provider_for` resolves each plain
    /// contributor id to its adapter.
    pub fn from_settings<F>(
        settings: &PipelineSettings,
        releases: Vec<Release>,
        provider_for: F,
    ) -> MappingPipelineBuilder
    where
        F: FnMut(&str) -> Arc<dyn MappingProvider>,
    {
        MappingPipelineBuilder {
            releases,
            contributors: settings.contributor_specs(provider_for),
            chain: Some(settings.interceptor_chain()),
            analysis: settings.analysis.clone(),
            ancestry: settings.ancestry.clone(),
            index_namespace: settings.index_namespace.clone(),
            cache: None,
            dry_run: settings.dry_run,
        }
    }

    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    pub fn is_dry_run(&self) -> bool {
        self.stage.dry_run
    }

    pub async fn run(&self) -> PipelineResult<PipelineOutput> {
        info!(
            releases = self.releases.len(),
            contributors = self.stage.contributors.len(),
            interceptors = ?self.stage.chain.names(),
            dry_run = self.stage.dry_run,
            "Starting mapping pipeline"
        );

        let handles: Vec<_> = self
            .releases
            .iter()
            .cloned()
            .map(|release| {
                let stage = Arc::clone(&self.stage);
                tokio::spawn(async move { process_release(&stage, release).await })
            })
            .collect();

        let mut trees = Vec::with_capacity(handles.len());
        let mut outcomes = Vec::with_capacity(handles.len());
        let mut failures = Vec::new();
        for (release, joined) in self.releases.iter().zip(join_all(handles).await) {
            let result = joined.unwrap_or_else(|e| Err(ReleaseFailure::new(release, Stage::Panic, e)));
            match result {
                Ok(processed) => {
                    trees.push(processed.tree);
                    outcomes.push(processed.outcome);
                }
                Err(failure) => {
                    warn!(
                        release = %failure.release,
                        stage = %failure.stage,
                        error = %failure.message,
                        "Release removed from sequence"
                    );
                    failures.push(failure);
                }
            }
        }

        if trees.is_empty() {
            return Err(PipelineError::NoReleases);
        }

        let shared: Vec<Arc<MappingTree>> = trees.into_iter().map(Arc::new).collect();
        let sequence: Arc<[Arc<MappingTree>]> = shared.iter().cloned().collect();
        let ancestry = self.resolver.resolve(Arc::clone(&sequence)).await?;
        let index = IndexAssigner::new(self.resolver.options()).assign(&ancestry, &sequence)?;
        drop(sequence);

        let mut trees: Vec<MappingTree> = shared
            .into_iter()
            .map(|tree| Arc::try_unwrap(tree).unwrap_or_else(|shared| (*shared).clone()))
            .collect();
        if let Some(namespace) = &self.index_namespace {
            index.apply(namespace, &mut trees)?;
        }

        info!(
            releases = trees.len(),
            failed = failures.len(),
            class_lineages = ancestry.class_count(),
            "Mapping pipeline finished"
        );
        Ok(PipelineOutput {
            trees,
            outcomes,
            ancestry,
            index,
            failures,
        })
    }
}

async fn process_release(stage: &ReleaseStage, release: Release) -> Result<Processed, ReleaseFailure> {
    let fetched = fetch_fragments(stage, &release)
        .await
        .map_err(|e| ReleaseFailure::new(&release, Stage::Fetch, e))?;
    if fetched.is_empty() {
        return Err(ReleaseFailure::new(
            &release,
            Stage::Fetch,
            "no contributor has data for this release",
        ));
    }

    let mut skipped: HashSet<&ContributorId> = HashSet::new();
    let mut contributions = Vec::with_capacity(stage.contributors.len());
    for spec in &stage.contributors {
        match spec {
            ContributorSpec::Add { id, .. } => match fetched.get(id) {
                Some(fragment) => contributions.push(Contribution::add(id.clone(), Arc::clone(fragment))),
                None => {
                    skipped.insert(id);
                }
            },
            ContributorSpec::Wrap {
                id,
                inner,
                transform,
            } => {
                if skipped.contains(inner) {
                    debug!(release = %release, contributor = %id, inner = %inner, "Skipping wrapper of absent contributor");
                    skipped.insert(id);
                } else {
                    contributions.push(Contribution::wrap(id.clone(), inner.clone(), Arc::clone(transform)));
                }
            }
        }
    }

    let tree = compose(&release, &contributions)
        .map_err(|e| ReleaseFailure::new(&release, Stage::Compose, e))?;
    let mut tree = stage.chain.apply(tree);
    let report = stage.analyzer.analyze(&tree);

    let outcome = if stage.dry_run {
        debug!(
            release = %release,
            resolutions = report.resolutions().len(),
            diagnostics = report.diagnostics().len(),
            "Dry run, analysis not committed"
        );
        ReleaseOutcome::DryRun(report)
    } else {
        let summary = report
            .accept(&mut tree)
            .map_err(|e| ReleaseFailure::new(&release, Stage::Analyze, e))?;
        ReleaseOutcome::Accepted(summary)
    };
    Ok(Processed { tree, outcome })
}

/// Fetch every plain contributor concurrently through the shared cache.
///
/// Contributors without data for the release are left out of the map.
async fn fetch_fragments<'s>(
    stage: &'s ReleaseStage,
    release: &Release,
) -> Result<HashMap<&'s ContributorId, Arc<Fragment>>, CacheError> {
    let fetches = stage.contributors.iter().filter_map(|spec| match spec {
        ContributorSpec::Add { id, provider } => {
            let provider = CachedProvider::new(Arc::clone(provider), Arc::clone(&stage.cache));
            Some(async move {
                match provider.fetch(release).await {
                    Ok(fragment) => Ok(Some((id, fragment))),
                    Err(CacheError::Provider(ProviderError::Unavailable { .. })) => {
                        debug!(release = %release, contributor = %id, "Contributor has no data");
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            })
        }
        ContributorSpec::Wrap { .. } => None,
    });
    Ok(try_join_all(fetches).await?.into_iter().flatten().collect())
}

/// Builder for [`MappingPipeline`].
#[derive(Debug, Default)]
pub struct MappingPipelineBuilder {
    releases: Vec<Release>,
    contributors: Vec<ContributorSpec>,
    chain: Option<InterceptorChain>,
    analysis: AnalysisOptions,
    ancestry: AncestryOptions,
    index_namespace: Option<Namespace>,
    cache: Option<Arc<ProviderCache>>,
    dry_run: bool,
}

impl MappingPipelineBuilder {
    /// Releases in ancestry order.
    pub fn releases(mut self, releases: Vec<Release>) -> Self {
        self.releases = releases;
        self
    }

    /// Append a contributor; list order is merge order.
    pub fn contributor(mut self, spec: ContributorSpec) -> Self {
        self.contributors.push(spec);
        self
    }

    pub fn interceptors(mut self, chain: InterceptorChain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn analysis(mut self, options: AnalysisOptions) -> Self {
        self.analysis = options;
        self
    }

    pub fn ancestry(mut self, options: AncestryOptions) -> Self {
        self.ancestry = options;
        self
    }

    pub fn index_namespace(mut self, namespace: impl Into<Namespace>) -> Self {
        self.index_namespace = Some(namespace.into());
        self
    }

    /// Share a provider cache across runs.
    pub fn cache(mut self, cache: Arc<ProviderCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn build(self) -> PipelineResult<MappingPipeline> {
        validate_contributors(&self.contributors)?;
        if let Some(ns) = &self.index_namespace {
            if ns.is_source() || ns.is_meta() {
                return Err(PipelineError::Settings(format!("index namespace {ns} is reserved")));
            }
        }

        Ok(MappingPipeline {
            releases: self.releases,
            stage: Arc::new(ReleaseStage {
                contributors: self.contributors,
                chain: self.chain.unwrap_or_default(),
                analyzer: Analyzer::new(self.analysis),
                cache: self
                    .cache
                    .unwrap_or_else(|| Arc::new(ProviderCache::in_memory())),
                dry_run: self.dry_run,
            }),
            resolver: AncestryResolver::new(self.ancestry),
            index_namespace: self.index_namespace,
        })
    }
}

/// Contributor lists are fixed for the whole run, so check them once instead
/// of failing every release at composition.
fn validate_contributors(contributors: &[ContributorSpec]) -> PipelineResult<()> {
    let mut seen: HashSet<&ContributorId> = HashSet::new();
    let mut wrapped: HashSet<&ContributorId> = HashSet::new();
    for spec in contributors {
        if let ContributorSpec::Wrap { id, inner, .. } = spec {
            if !seen.contains(inner) {
                return Err(PipelineError::Settings(format!(
                    "contributor {id} wraps {inner}, which is not an earlier contributor"
                )));
            }
            if !wrapped.insert(inner) {
                return Err(PipelineError::Settings(format!(
                    "contributor {inner} is wrapped more than once"
                )));
            }
        }
        if !seen.insert(spec.id()) {
            return Err(PipelineError::Settings(format!(
                "duplicate contributor id: {}",
                spec.id()
            )));
        }
    }
    Ok(())
}
