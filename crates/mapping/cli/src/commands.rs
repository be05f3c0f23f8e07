//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use mapping_cache::{MappingProvider, ProviderCache};
use mapping_pipeline::{
    ContributorSettings, MappingPipeline, PipelineOutput, PipelineSettings, ReleaseOutcome,
};
use mapping_types::{Release, VersionManifest};
use tracing::{info, warn};

use crate::provider::{discover_providers, JsonDirectoryProvider};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Arguments of `mapweave run`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub out: PathBuf,
    pub cache: Option<PathBuf>,
    pub dry_run: bool,
}

pub fn load_manifest(input: &Path) -> anyhow::Result<VersionManifest> {
    let path = input.join(MANIFEST_FILE);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(VersionManifest::from_json(&text)?)
}

pub fn resolve_releases(settings: &PipelineSettings, input: &Path) -> anyhow::Result<Vec<Release>> {
    let manifest = load_manifest(input)?;
    Ok(settings.releases.resolve(&manifest)?)
}

/// `mapweave releases`: the release sequence a run would process.
pub fn releases(settings: &PipelineSettings, input: &Path) -> anyhow::Result<Vec<Release>> {
    let releases = resolve_releases(settings, input)?;
    for release in &releases {
        println!("{}\t{:?}\t{}", release.id, release.kind, release.released_at.to_rfc3339());
    }
    Ok(releases)
}

/// `mapweave run`: compose, analyze and index every selected release, then
/// write the trees and the lineage index to `options.out`.
pub async fn run(mut settings: PipelineSettings, options: &RunOptions) -> anyhow::Result<PipelineOutput> {
    if settings.contributors.is_empty() {
        settings.contributors = discover_providers(&options.input)
            .with_context(|| format!("scanning {}", options.input.display()))?
            .into_iter()
            .map(|id| ContributorSettings {
                id,
                wraps: None,
                transform: None,
            })
            .collect();
        info!(contributors = settings.contributors.len(), "Using discovered providers");
    }
    if settings.contributors.is_empty() {
        bail!("no contributors configured and none found in {}", options.input.display());
    }
    if settings.ancestry.namespaces.is_empty() {
        warn!("No ancestry namespaces configured, every release starts new lineages");
    }

    let releases = resolve_releases(&settings, &options.input)?;
    let cache = match &options.cache {
        Some(root) => ProviderCache::with_root(root),
        None => ProviderCache::in_memory(),
    };
    let input = options.input.clone();
    let pipeline = MappingPipeline::from_settings(&settings, releases, |id| {
        Arc::new(JsonDirectoryProvider::new(id, &input)) as Arc<dyn MappingProvider>
    })
    .cache(Arc::new(cache))
    .dry_run(settings.dry_run || options.dry_run)
    .build()?;

    let output = pipeline.run().await?;
    for failure in &output.failures {
        eprintln!("skipped {failure}");
    }
    for (tree, outcome) in output.trees.iter().zip(&output.outcomes) {
        match outcome {
            ReleaseOutcome::Accepted(summary) => println!(
                "{}: {} classes, {} names completed, {} dropped, {} warnings",
                tree.release(),
                tree.class_count(),
                summary.names_set,
                summary.entities_dropped,
                summary.warnings
            ),
            ReleaseOutcome::DryRun(report) => {
                println!(
                    "{}: {} classes, {} pending resolutions",
                    tree.release(),
                    tree.class_count(),
                    report.resolutions().len()
                );
                for diagnostic in report.diagnostics() {
                    println!("  {diagnostic}");
                }
            }
        }
    }

    output.write_to(&options.out, settings.emit_structure)?;
    Ok(output)
}
