use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use mapping_analysis::{AcceptSummary, AnalysisReport};
use mapping_ancestry::{AncestrySet, LineageIndex};
use mapping_emit::TinyWriter;
use mapping_types::MappingTree;
use tracing::info;

use crate::error::{PipelineResult, ReleaseFailure};

/// File name of the serialized lineage index.
pub const LINEAGE_FILE: &str = "lineage.json";

/// What analysis did to one surviving release.
#[derive(Clone, Debug)]
pub enum ReleaseOutcome {
    /// Resolutions were committed to the tree.
    Accepted(AcceptSummary),
    /// Dry run: the staged report, not applied.
    DryRun(AnalysisReport),
}

/// Result of a pipeline run.
///
/// `trees` and `outcomes` are aligned and follow the input release order,
/// minus the releases listed in `failures`.
#[derive(Debug)]
pub struct PipelineOutput {
    pub trees: Vec<MappingTree>,
    pub outcomes: Vec<ReleaseOutcome>,
    pub ancestry: AncestrySet,
    pub index: LineageIndex,
    pub failures: Vec<ReleaseFailure>,
}

impl PipelineOutput {
    pub fn tree(&self, release: &str) -> Option<&MappingTree> {
        self.trees.iter().find(|t| t.release().id == release)
    }

    pub fn release_ids(&self) -> Vec<&str> {
        self.trees.iter().map(|t| t.release().id.as_str()).collect()
    }

    /// Write `<release>.tiny` for every tree and the lineage index as JSON
    /// into `dir`. Returns the written paths.
    pub fn write_to(&self, dir: &Path, structure: bool) -> PipelineResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let writer = TinyWriter::new().with_structure(structure);

        let mut written = Vec::with_capacity(self.trees.len() + 1);
        for tree in &self.trees {
            let path = dir.join(format!("{}.tiny", tree.release().id));
            writer.write_file(tree, &path)?;
            written.push(path);
        }

        let path = dir.join(LINEAGE_FILE);
        serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), &self.index.summary())?;
        written.push(path);

        info!(dir = %dir.display(), files = written.len(), "Wrote pipeline output");
        Ok(written)
    }
}
