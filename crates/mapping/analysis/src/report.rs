use mapping_types::{Diagnostic, FieldKey, MappingTree, MethodKey, Named, Namespace, Severity};
use tracing::{debug, info};

use crate::error::{AnalysisError, AnalysisResult};

/// One staged repair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    SetClassName {
        class: String,
        namespace: Namespace,
        name: String,
    },
    SetMethodName {
        class: String,
        method: MethodKey,
        namespace: Namespace,
        name: String,
    },
    DropClass {
        class: String,
    },
    DropField {
        class: String,
        field: FieldKey,
    },
    DropMethod {
        class: String,
        method: MethodKey,
    },
}

/// Counts of what an accepted report changed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AcceptSummary {
    pub names_set: usize,
    pub entities_dropped: usize,
    pub warnings: usize,
    pub skipped: usize,
}

/// Staged output of one analysis pass.
#[derive(Clone, Debug, Default)]
pub struct AnalysisReport {
    release: String,
    resolutions: Vec<Resolution>,
    diagnostics: Vec<Diagnostic>,
}

impl AnalysisReport {
    pub(crate) fn new(release: impl Into<String>) -> Self {
        Self {
            release: release.into(),
            ..Self::default()
        }
    }

    pub(crate) fn stage(&mut self, resolution: Resolution) {
        self.resolutions.push(resolution);
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn is_clean(&self) -> bool {
        self.resolutions.is_empty() && self.diagnostics.is_empty()
    }

    /// Commit every staged resolution to `tree` as one batch and attach the
    /// diagnostics to it.
    ///
    /// Resolutions whose target no longer exists are skipped.
    pub fn accept(self, tree: &mut MappingTree) -> AnalysisResult<AcceptSummary> {
        if tree.release().id != self.release {
            return Err(AnalysisError::ReleaseMismatch {
                report: self.release,
                tree: tree.release().id.clone(),
            });
        }

        let mut summary = AcceptSummary {
            warnings: self.warnings().count(),
            ..AcceptSummary::default()
        };
        for resolution in self.resolutions {
            let applied = apply(tree, resolution);
            match applied {
                Some(Applied::Named) => summary.names_set += 1,
                Some(Applied::Dropped) => summary.entities_dropped += 1,
                None => summary.skipped += 1,
            }
        }
        tree.extend_diagnostics(self.diagnostics);

        info!(
            release = %tree.release(),
            names_set = summary.names_set,
            dropped = summary.entities_dropped,
            warnings = summary.warnings,
            "Accepted analysis resolutions"
        );
        Ok(summary)
    }
}

enum Applied {
    Named,
    Dropped,
}

fn apply(tree: &mut MappingTree, resolution: Resolution) -> Option<Applied> {
    let applied = match &resolution {
        Resolution::SetClassName {
            class,
            namespace,
            name,
        } => {
            tree.register_namespace(namespace);
            tree.class_mut(class)
                .map(|c| c.set_name(namespace.clone(), name.clone()))
                .map(|_| Applied::Named)
        }
        Resolution::SetMethodName {
            class,
            method,
            namespace,
            name,
        } => {
            tree.register_namespace(namespace);
            tree.class_mut(class)
                .and_then(|c| c.methods.get_mut(method))
                .map(|m| m.set_name(namespace.clone(), name.clone()))
                .map(|_| Applied::Named)
        }
        Resolution::DropClass { class } => tree.remove_class(class).map(|_| Applied::Dropped),
        Resolution::DropField { class, field } => tree
            .class_mut(class)
            .and_then(|c| c.fields.remove(field))
            .map(|_| Applied::Dropped),
        Resolution::DropMethod { class, method } => tree
            .class_mut(class)
            .and_then(|c| c.methods.remove(method))
            .map(|_| Applied::Dropped),
    };
    if applied.is_none() {
        debug!(resolution = ?resolution, "Skipping resolution with missing target");
    }
    applied
}
