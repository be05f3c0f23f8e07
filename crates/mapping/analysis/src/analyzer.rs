use std::collections::{HashMap, HashSet};

use mapping_types::descriptor::{
    validate_class_name, validate_field_descriptor, validate_method_descriptor,
};
use mapping_types::tree::simple_name;
use mapping_types::{
    ClassEntity, Diagnostic, EntityPath, MappingTree, MethodKey, Named, Namespace,
};
use tracing::{debug, info, warn};

use crate::inheritance::InheritanceGraph;
use crate::options::AnalysisOptions;
use crate::report::{AnalysisReport, Resolution};

/// Entities already staged for removal; later passes ignore them.
#[derive(Default)]
struct Dropped {
    classes: HashSet<String>,
    methods: HashSet<(String, MethodKey)>,
}

impl Dropped {
    fn has_method(&self, class: &str, key: &MethodKey) -> bool {
        self.classes.contains(class) || self.methods.contains(&(class.to_string(), key.clone()))
    }
}

/// One inherited name candidate: distance, declaring ancestor, name.
type Inherited<'t> = (usize, &'t str, &'t str);

/// Stages repairs for one release tree.
#[derive(Clone, Debug, Default)]
pub struct Analyzer {
    options: AnalysisOptions,
}

impl Analyzer {
    pub fn new(options: AnalysisOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Analyze `tree` without modifying it.
    pub fn analyze(&self, tree: &MappingTree) -> AnalysisReport {
        let mut report = AnalysisReport::new(tree.release().id.clone());

        let dropped = self.check_malformed(tree, &mut report);
        let graph = InheritanceGraph::build(tree);
        self.complete_inner_class_names(tree, &dropped, &mut report);
        self.propagate_inherited_names(tree, &graph, &dropped, &mut report);

        info!(
            release = %tree.release(),
            inheritance_edges = graph.edge_count(),
            resolutions = report.resolutions().len(),
            diagnostics = report.diagnostics().len(),
            "Analyzed release tree"
        );
        report
    }

    fn check_malformed(&self, tree: &MappingTree, report: &mut AnalysisReport) -> Dropped {
        let release = &tree.release().id;
        let mut dropped = Dropped::default();

        for class in tree.classes() {
            let broken = validate_class_name(&class.source)
                .err()
                .map(|e| e.to_string())
                .or_else(|| {
                    class.supertypes().find_map(|s| {
                        if s == class.source {
                            Some("class is its own supertype".to_string())
                        } else {
                            validate_class_name(s)
                                .err()
                                .map(|e| format!("broken supertype reference: {e}"))
                        }
                    })
                });
            if let Some(cause) = broken {
                warn!(release = %release, class = %class.source, cause = %cause, "Dropping malformed class");
                report.report(Diagnostic::error(EntityPath::class(&class.source), cause));
                report.stage(Resolution::DropClass {
                    class: class.source.clone(),
                });
                dropped.classes.insert(class.source.clone());
                continue;
            }

            for field in class.fields.values() {
                let Some(descriptor) = &field.descriptor else {
                    continue;
                };
                if let Err(e) = validate_field_descriptor(descriptor) {
                    let path = EntityPath::Field {
                        class: class.source.clone(),
                        name: field.source.clone(),
                        descriptor: field.descriptor.clone(),
                    };
                    warn!(release = %release, field = %path, cause = %e, "Dropping malformed field");
                    report.report(Diagnostic::error(path, e.to_string()));
                    report.stage(Resolution::DropField {
                        class: class.source.clone(),
                        field: field.key(),
                    });
                }
            }

            for method in class.methods.values() {
                if let Err(e) = validate_method_descriptor(&method.descriptor) {
                    let path = EntityPath::Method {
                        class: class.source.clone(),
                        name: method.source.clone(),
                        descriptor: method.descriptor.clone(),
                    };
                    warn!(release = %release, method = %path, cause = %e, "Dropping malformed method");
                    report.report(Diagnostic::error(path, e.to_string()));
                    report.stage(Resolution::DropMethod {
                        class: class.source.clone(),
                        method: method.key(),
                    });
                    dropped.methods.insert((class.source.clone(), method.key()));
                }
            }
        }
        dropped
    }

    /// Complete missing names of nested classes.
    ///
    /// Outer classes are processed before inner ones so names completed for
    /// an enclosing class are visible to its own nested classes.
    fn complete_inner_class_names(
        &self,
        tree: &MappingTree,
        dropped: &Dropped,
        report: &mut AnalysisReport,
    ) {
        let mut nested: Vec<&ClassEntity> = tree
            .classes()
            .filter(|c| c.enclosing_source().is_some() && !dropped.classes.contains(&c.source))
            .collect();
        nested.sort_by_key(|c| (c.source.matches('$').count(), c.source.as_str()));

        let mut completed: HashMap<(&str, &Namespace), String> = HashMap::new();
        for class in nested {
            let Some(outer) = class.enclosing_source() else {
                continue;
            };
            if dropped.classes.contains(outer) || tree.class(outer).is_none() {
                continue;
            }

            for namespace in tree.namespaces() {
                if namespace.is_meta()
                    || !self.options.is_completion_target(namespace)
                    || class.name(namespace.as_str()).is_some()
                {
                    continue;
                }
                let enclosing = tree
                    .class_name(outer, namespace.as_str())
                    .map(str::to_string)
                    .or_else(|| completed.get(&(outer, namespace)).cloned());
                let Some(enclosing) = enclosing else {
                    debug!(
                        release = %tree.release(),
                        class = %class.source,
                        namespace = %namespace,
                        outer = %outer,
                        "Enclosing class has no name"
                    );
                    report.report(Diagnostic::warning(
                        EntityPath::class(&class.source),
                        format!("inner class name in {namespace} unresolved: enclosing class {outer} has no name there"),
                    ));
                    continue;
                };

                let candidate = self
                    .options
                    .inner_class_name_completion_candidates
                    .iter()
                    .filter(|c| *c != namespace)
                    .find_map(|c| class.name(c.as_str()));
                match candidate {
                    Some(candidate) => {
                        let name = format!("{}${}", enclosing, simple_name(candidate));
                        debug!(
                            release = %tree.release(),
                            class = %class.source,
                            namespace = %namespace,
                            name = %name,
                            "Completed inner class name"
                        );
                        completed.insert((class.source.as_str(), namespace), name.clone());
                        report.stage(Resolution::SetClassName {
                            class: class.source.clone(),
                            namespace: namespace.clone(),
                            name,
                        });
                    }
                    None => {
                        debug!(
                            release = %tree.release(),
                            class = %class.source,
                            namespace = %namespace,
                            "No candidate namespace names inner class"
                        );
                        report.report(Diagnostic::warning(
                            EntityPath::class(&class.source),
                            format!("inner class name in {namespace} unresolved: no candidate namespace names it"),
                        ));
                    }
                }
            }
        }
    }

    fn propagate_inherited_names(
        &self,
        tree: &MappingTree,
        graph: &InheritanceGraph,
        dropped: &Dropped,
        report: &mut AnalysisReport,
    ) {
        if self.options.inheritance_additional_namespaces.is_empty() {
            return;
        }

        for class in tree.classes() {
            if dropped.classes.contains(&class.source) {
                continue;
            }
            let levels = graph.ancestor_levels(&class.source);
            if levels.is_empty() {
                continue;
            }

            for (key, method) in &class.methods {
                if !method.is_overridable() || dropped.has_method(&class.source, key) {
                    continue;
                }
                for namespace in &self.options.inheritance_additional_namespaces {
                    let inherited = inherited_names(tree, &levels, key, namespace, dropped);
                    let Some(&(depth, origin, winner)) = inherited.first() else {
                        continue;
                    };
                    let path = EntityPath::Method {
                        class: class.source.clone(),
                        name: key.name.clone(),
                        descriptor: key.descriptor.clone(),
                    };

                    match method.name(namespace.as_str()) {
                        None => {
                            let losers: Vec<String> = inherited
                                .iter()
                                .filter(|(_, _, name)| *name != winner)
                                .map(|(d, c, name)| format!("{name} from {c} at distance {}", d + 1))
                                .collect();
                            if !losers.is_empty() {
                                warn!(
                                    release = %tree.release(),
                                    method = %path,
                                    namespace = %namespace,
                                    chosen = winner,
                                    "Conflicting inherited names"
                                );
                                report.report(Diagnostic::warning(
                                    path.clone(),
                                    format!(
                                        "conflicting inherited names in {namespace}: chose {winner} from {origin} at distance {} over {}",
                                        depth + 1,
                                        losers.join(", ")
                                    ),
                                ));
                            }
                            report.stage(Resolution::SetMethodName {
                                class: class.source.clone(),
                                method: key.clone(),
                                namespace: namespace.clone(),
                                name: winner.to_string(),
                            });
                        }
                        Some(own) if own != winner => {
                            report.report(Diagnostic::warning(
                                path,
                                format!(
                                    "name {own} in {namespace} differs from {winner} declared by overridden method in {origin}"
                                ),
                            ));
                        }
                        Some(_) => {}
                    }
                }
            }
        }
    }
}

/// Names of the overridden method in `namespace`, nearest ancestors first.
fn inherited_names<'t>(
    tree: &'t MappingTree,
    levels: &[Vec<&'t str>],
    key: &MethodKey,
    namespace: &Namespace,
    dropped: &Dropped,
) -> Vec<Inherited<'t>> {
    let mut found = Vec::new();
    for (depth, level) in levels.iter().enumerate() {
        for &ancestor in level {
            if dropped.has_method(ancestor, key) {
                continue;
            }
            let name = tree
                .class(ancestor)
                .and_then(|c| c.methods.get(key))
                .filter(|m| m.is_overridable())
                .and_then(|m| m.name(namespace.as_str()));
            if let Some(name) = name {
                found.push((depth, ancestor, name));
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mapping_types::{access, FieldKey, Release, ReleaseKind, Severity};

    fn tree() -> MappingTree {
        let mut tree = MappingTree::new(Release::new("1.0", ReleaseKind::Release, Utc::now()));
        for ns in ["mojang", "spigot", "searge"] {
            tree.register_namespace(&Namespace::new(ns));
        }
        tree
    }

    fn named(tree: &mut MappingTree, class: &str, names: &[(&str, &str)]) {
        let entity = tree.class_or_insert(class);
        for (ns, name) in names {
            entity.set_name(Namespace::new(*ns), *name);
        }
    }

    #[test]
    fn inner_class_borrows_candidate_simple_name() {
        let mut tree = tree();
        named(&mut tree, "a", &[("mojang", "net/example/Outer"), ("spigot", "net/server/Outer")]);
        named(&mut tree, "a$b", &[("spigot", "net/server/Outer$Inner")]);

        let analyzer = Analyzer::new(
            AnalysisOptions::new()
                .completion_candidates(["spigot"])
                .completion_targets(["mojang"]),
        );
        let report = analyzer.analyze(&tree);
        assert_eq!(
            report.resolutions(),
            &[Resolution::SetClassName {
                class: "a$b".into(),
                namespace: Namespace::new("mojang"),
                name: "net/example/Outer$Inner".into(),
            }]
        );

        report.accept(&mut tree).unwrap();
        assert_eq!(tree.class_name("a$b", "mojang"), Some("net/example/Outer$Inner"));
    }

    #[test]
    fn deeper_nesting_uses_completed_enclosing_names() {
        let mut tree = tree();
        named(&mut tree, "a", &[("mojang", "Outer")]);
        named(&mut tree, "a$b", &[("spigot", "X$Middle")]);
        named(&mut tree, "a$b$c", &[("spigot", "X$Middle$Leaf")]);

        let analyzer = Analyzer::new(
            AnalysisOptions::new()
                .completion_candidates(["spigot"])
                .completion_targets(["mojang"]),
        );
        analyzer.analyze(&tree).accept(&mut tree).unwrap();
        assert_eq!(tree.class_name("a$b", "mojang"), Some("Outer$Middle"));
        assert_eq!(tree.class_name("a$b$c", "mojang"), Some("Outer$Middle$Leaf"));
    }

    #[test]
    fn missing_candidate_resolves_to_none_with_diagnostic() {
        let mut tree = tree();
        named(&mut tree, "a", &[("mojang", "Outer")]);
        named(&mut tree, "a$b", &[]);

        let analyzer = Analyzer::new(
            AnalysisOptions::new()
                .completion_candidates(["spigot"])
                .completion_targets(["mojang"]),
        );
        let report = analyzer.analyze(&tree);
        assert!(report.resolutions().is_empty());
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(report.diagnostics()[0].path, EntityPath::class("a$b"));

        report.accept(&mut tree).unwrap();
        assert_eq!(tree.class_name("a$b", "mojang"), None);
        assert_eq!(tree.diagnostics().len(), 1);
    }

    #[test]
    fn unnamed_enclosing_class_is_reported() {
        let mut tree = tree();
        named(&mut tree, "a", &[("spigot", "Outer")]);
        named(&mut tree, "a$b", &[("spigot", "Outer$Inner")]);

        let analyzer = Analyzer::new(
            AnalysisOptions::new()
                .completion_candidates(["spigot"])
                .completion_targets(["mojang"]),
        );
        let report = analyzer.analyze(&tree);
        assert!(report.resolutions().is_empty());
        assert_eq!(report.warnings().count(), 1);
        let warning = &report.diagnostics()[0];
        assert_eq!(warning.path, EntityPath::class("a$b"));
        assert!(warning.message.contains("enclosing class a"));

        report.accept(&mut tree).unwrap();
        assert_eq!(tree.class_name("a$b", "mojang"), None);
        assert_eq!(tree.diagnostics().len(), 1);
    }

    fn hierarchy() -> MappingTree {
        // d extends b implements c; b and c declare the same method.
        let mut tree = tree();
        for class in ["b", "c", "d"] {
            tree.class_or_insert(class);
        }
        let d = tree.class_or_insert("d");
        d.super_class = Some("b".into());
        d.interfaces = vec!["c".into()];
        for class in ["b", "c", "d"] {
            tree.class_or_insert(class)
                .method_or_insert(MethodKey::new("m", "(I)V"))
                .modifiers = access::PUBLIC;
        }
        tree
    }

    fn set_method_name(tree: &mut MappingTree, class: &str, ns: &str, name: &str) {
        tree.class_mut(class)
            .unwrap()
            .methods
            .get_mut(&MethodKey::new("m", "(I)V"))
            .unwrap()
            .set_name(Namespace::new(ns), name);
    }

    fn method_name<'t>(tree: &'t MappingTree, class: &str, ns: &str) -> Option<&'t str> {
        tree.class(class)?
            .method(&MethodKey::new("m", "(I)V"))?
            .name(ns)
    }

    #[test]
    fn inherited_name_propagates_down() {
        let mut tree = hierarchy();
        set_method_name(&mut tree, "b", "searge", "m_100_");

        let analyzer = Analyzer::new(AnalysisOptions::new().inheritance_namespaces(["searge"]));
        let report = analyzer.analyze(&tree);
        assert_eq!(report.warnings().count(), 0);
        report.accept(&mut tree).unwrap();
        assert_eq!(method_name(&tree, "d", "searge"), Some("m_100_"));
        assert_eq!(method_name(&tree, "c", "searge"), None);
    }

    #[test]
    fn diamond_conflict_is_flagged_and_first_supertype_wins() {
        let mut tree = hierarchy();
        set_method_name(&mut tree, "b", "searge", "m_100_");
        set_method_name(&mut tree, "c", "searge", "m_200_");

        let analyzer = Analyzer::new(AnalysisOptions::new().inheritance_namespaces(["searge"]));
        let report = analyzer.analyze(&tree);
        assert_eq!(report.warnings().count(), 1);
        report.accept(&mut tree).unwrap();
        assert_eq!(method_name(&tree, "d", "searge"), Some("m_100_"));
    }

    #[test]
    fn closest_ancestor_wins_over_farther_one() {
        let mut tree = hierarchy();
        // e extends d; d's own name is closer than b's.
        tree.class_or_insert("e").super_class = Some("d".into());
        tree.class_or_insert("e")
            .method_or_insert(MethodKey::new("m", "(I)V"))
            .modifiers = access::PUBLIC;
        set_method_name(&mut tree, "b", "searge", "m_100_");
        set_method_name(&mut tree, "d", "searge", "m_300_");

        let analyzer = Analyzer::new(AnalysisOptions::new().inheritance_namespaces(["searge"]));
        let report = analyzer.analyze(&tree);
        // d disagrees with b: reported, not repaired. e gets d's name with a conflict warning.
        assert_eq!(report.warnings().count(), 2);
        report.accept(&mut tree).unwrap();
        assert_eq!(method_name(&tree, "e", "searge"), Some("m_300_"));
        assert_eq!(method_name(&tree, "d", "searge"), Some("m_300_"));
    }

    #[test]
    fn static_methods_do_not_inherit() {
        let mut tree = hierarchy();
        set_method_name(&mut tree, "b", "searge", "m_100_");
        tree.class_mut("d")
            .unwrap()
            .methods
            .get_mut(&MethodKey::new("m", "(I)V"))
            .unwrap()
            .modifiers = access::STATIC;

        let analyzer = Analyzer::new(AnalysisOptions::new().inheritance_namespaces(["searge"]));
        assert!(analyzer.analyze(&tree).resolutions().is_empty());
    }

    #[test]
    fn malformed_entities_are_dropped_only_on_accept() {
        let mut tree = tree();
        let a = tree.class_or_insert("a");
        a.field_or_insert(FieldKey::new("f", Some("Q".into())));
        a.field_or_insert(FieldKey::new("g", Some("I".into())));
        a.method_or_insert(MethodKey::new("m", "(I"));
        tree.class_or_insert("bad.name");

        let report = Analyzer::default().analyze(&tree);
        assert_eq!(report.resolutions().len(), 3);
        assert!(report
            .diagnostics()
            .iter()
            .all(|d| d.severity == Severity::Error));
        // Dry run: nothing changed yet.
        assert_eq!(tree.class_count(), 2);

        let summary = report.accept(&mut tree).unwrap();
        assert_eq!(summary.entities_dropped, 3);
        let a = tree.class("a").unwrap();
        assert_eq!(a.fields.len(), 1);
        assert!(a.methods.is_empty());
        assert!(tree.class("bad.name").is_none());
    }

    #[test]
    fn report_for_another_release_is_rejected() {
        let report = Analyzer::default().analyze(&tree());
        let mut other =
            MappingTree::new(Release::new("2.0", ReleaseKind::Release, Utc::now()));
        assert!(report.accept(&mut other).is_err());
    }
}
