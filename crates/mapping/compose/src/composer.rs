use std::collections::HashMap;
use std::sync::Arc;

use mapping_types::{
    ClassEntity, Diagnostic, EntityPath, FieldKey, Fragment, FragmentField, FragmentMethod,
    MappingTree, MethodKey, Named, Namespace, Release,
};
use tracing::{debug, info, warn};

use crate::contributor::{Contribution, ContributorId};
use crate::error::{ComposeError, ComposeResult};

/// Compose one release's tree from an ordered contributor list.
///
/// Contributions are applied strictly in list order. A wrapped contributor is
/// merged once, transformed, at its wrapper's position. Conflicting names for
/// the same entity and namespace resolve to the last contributor's value.
pub fn compose(release: &Release, contributions: &[Contribution]) -> ComposeResult<MappingTree> {
    let wrapped = validate(contributions)?;

    let mut tree = MappingTree::new(release.clone());
    let mut pending: HashMap<&ContributorId, Arc<Fragment>> = HashMap::new();

    for contribution in contributions {
        let output = match contribution {
            Contribution::Add { fragment, .. } => Arc::clone(fragment),
            Contribution::Wrap {
                id,
                inner,
                transform,
            } => {
                let inner_output =
                    pending
                        .remove(inner)
                        .ok_or_else(|| ComposeError::UnknownInner {
                            wrapper: id.clone(),
                            inner: inner.clone(),
                        })?;
                let fragment =
                    Arc::try_unwrap(inner_output).unwrap_or_else(|shared| (*shared).clone());
                debug!(
                    release = %release,
                    contributor = %id,
                    inner = %inner,
                    transform = transform.name(),
                    "Applying wrapping contributor"
                );
                Arc::new(transform.transform(release, fragment))
            }
        };

        let id = contribution.id();
        if wrapped.contains_key(id) {
            pending.insert(id, output);
        } else {
            merge(&mut tree, id, &output);
        }
    }

    debug!(
        release = %release,
        classes = tree.class_count(),
        namespaces = tree.namespaces().len(),
        "Composed release tree"
    );
    Ok(tree)
}

/// Check ids and wrap references; returns inner id -> wrapper id.
fn validate(
    contributions: &[Contribution],
) -> ComposeResult<HashMap<&ContributorId, &ContributorId>> {
    let mut seen: HashMap<&ContributorId, usize> = HashMap::new();
    let mut wrapped: HashMap<&ContributorId, &ContributorId> = HashMap::new();

    for (position, contribution) in contributions.iter().enumerate() {
        let id = contribution.id();
        if let Contribution::Wrap { inner, .. } = contribution {
            if !seen.contains_key(inner) {
                return Err(ComposeError::UnknownInner {
                    wrapper: id.clone(),
                    inner: inner.clone(),
                });
            }
            if wrapped.insert(inner, id).is_some() {
                return Err(ComposeError::AlreadyWrapped {
                    wrapper: id.clone(),
                    inner: inner.clone(),
                });
            }
        }
        if seen.insert(id, position).is_some() {
            return Err(ComposeError::DuplicateContributor(id.clone()));
        }
    }
    Ok(wrapped)
}

struct MergeContext<'a> {
    release: &'a str,
    contributor: &'a ContributorId,
    namespace: &'a Namespace,
}

impl MergeContext<'_> {
    fn record_name<E: Named>(&self, entity: &mut E, name: &str, path: impl FnOnce() -> EntityPath) {
        if let Some(previous) = entity.set_name(self.namespace.clone(), name) {
            if previous != name {
                info!(
                    release = self.release,
                    contributor = %self.contributor,
                    namespace = %self.namespace,
                    entity = %path(),
                    previous = %previous,
                    name,
                    "Later contributor overrides name"
                );
            }
        }
    }
}

fn merge(tree: &mut MappingTree, contributor: &ContributorId, fragment: &Fragment) {
    let namespace = &fragment.namespace;
    tree.register_namespace(namespace);

    let release = tree.release().id.clone();
    let ctx = MergeContext {
        release: &release,
        contributor,
        namespace,
    };
    let structural = fragment.is_structural();
    let mut diagnostics = Vec::new();

    for incoming in &fragment.classes {
        let class = tree.class_or_insert(&incoming.source);

        if !structural {
            if let Some(name) = &incoming.name {
                ctx.record_name(class, name, || EntityPath::class(&incoming.source));
            }
        }
        if let Some(super_class) = &incoming.super_class {
            if class.super_class.as_ref().is_some_and(|s| s != super_class) {
                info!(
                    release = ctx.release,
                    contributor = %contributor,
                    class = %incoming.source,
                    "Later contributor overrides superclass"
                );
            }
            class.super_class = Some(super_class.clone());
        }
        if let Some(interfaces) = &incoming.interfaces {
            class.interfaces = interfaces.clone();
        }
        if let Some(modifiers) = incoming.modifiers {
            class.modifiers = modifiers;
        }

        for field in &incoming.fields {
            if let Some(diagnostic) = merge_field(&ctx, class, field, structural) {
                diagnostics.push(diagnostic);
            }
        }
        for method in &incoming.methods {
            merge_method(&ctx, class, method, structural);
        }
    }

    tree.extend_diagnostics(diagnostics);
}

fn merge_field(
    ctx: &MergeContext<'_>,
    class: &mut ClassEntity,
    incoming: &FragmentField,
    structural: bool,
) -> Option<Diagnostic> {
    let key = match &incoming.descriptor {
        Some(descriptor) => {
            let key = FieldKey::new(incoming.source.clone(), Some(descriptor.clone()));
            // An earlier contributor may have known the field only by name.
            let bare = FieldKey::new(incoming.source.clone(), None);
            if !class.fields.contains_key(&key) {
                if let Some(mut field) = class.fields.remove(&bare) {
                    field.descriptor = Some(descriptor.clone());
                    class.fields.insert(key.clone(), field);
                }
            }
            key
        }
        None => {
            let mut matches = class.fields_named(&incoming.source).map(|f| f.key());
            match (matches.next(), matches.next()) {
                (None, _) => FieldKey::new(incoming.source.clone(), None),
                (Some(only), None) => only,
                (Some(_), Some(_)) => {
                    let path = EntityPath::Field {
                        class: class.source.clone(),
                        name: incoming.source.clone(),
                        descriptor: None,
                    };
                    warn!(
                        release = ctx.release,
                        contributor = %ctx.contributor,
                        entity = %path,
                        "Field without descriptor matches several fields, skipping"
                    );
                    return Some(Diagnostic::warning(
                        path,
                        format!(
                            "contributor {} names a field without descriptor that matches several fields",
                            ctx.contributor
                        ),
                    ));
                }
            }
        }
    };

    let owner = class.source.clone();
    let field = class.field_or_insert(key);
    if let Some(modifiers) = incoming.modifiers {
        field.modifiers = modifiers;
    }
    if !structural {
        if let Some(name) = &incoming.name {
            let descriptor = field.descriptor.clone();
            ctx.record_name(field, name, || EntityPath::Field {
                class: owner,
                name: incoming.source.clone(),
                descriptor,
            });
        }
    }
    None
}

fn merge_method(
    ctx: &MergeContext<'_>,
    class: &mut ClassEntity,
    incoming: &FragmentMethod,
    structural: bool,
) {
    let owner = class.source.clone();
    let method = class.method_or_insert(MethodKey::new(
        incoming.source.clone(),
        incoming.descriptor.clone(),
    ));
    if let Some(modifiers) = incoming.modifiers {
        method.modifiers = modifiers;
    }
    if structural {
        return;
    }

    if let Some(name) = &incoming.name {
        ctx.record_name(method, name, || EntityPath::Method {
            class: owner.clone(),
            name: incoming.source.clone(),
            descriptor: incoming.descriptor.clone(),
        });
    }
    for param in &incoming.params {
        let entity = method.param_mut(param.index);
        ctx.record_name(entity, &param.name, || EntityPath::Parameter {
            class: owner.clone(),
            method: incoming.source.clone(),
            descriptor: incoming.descriptor.clone(),
            index: param.index,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contributor::PackagePrefixer;
    use chrono::Utc;
    use mapping_types::{FragmentClass, ReleaseKind};

    fn release(id: &str) -> Release {
        Release::new(id, ReleaseKind::Release, Utc::now())
    }

    fn structure() -> Fragment {
        Fragment::new("source").class(
            FragmentClass::new("a")
                .extends("java/lang/Object")
                .implements("b")
                .modifiers(1)
                .field(FragmentField::new("c", Some("I")))
                .method(FragmentMethod::new("d", "(La;)V").modifiers(1)),
        )
    }

    #[test]
    fn merges_namespaces_and_structure() {
        let mojang = Fragment::new("mojang").class(
            FragmentClass::new("a")
                .named("net/example/Alpha")
                .field(FragmentField::new("c", Some("I")).named("count"))
                .method(FragmentMethod::new("d", "(La;)V").named("merge").param(1, "other")),
        );
        let tree = compose(
            &release("1.0"),
            &[
                Contribution::add("vanilla", structure()),
                Contribution::add("mojang", mojang),
            ],
        )
        .unwrap();

        assert_eq!(tree.namespaces(), &[Namespace::new("mojang")]);
        let a = tree.class("a").unwrap();
        assert_eq!(a.name("mojang"), Some("net/example/Alpha"));
        assert_eq!(a.super_class.as_deref(), Some("java/lang/Object"));
        assert_eq!(a.interfaces, vec!["b".to_string()]);
        let d = a.method(&MethodKey::new("d", "(La;)V")).unwrap();
        assert_eq!(d.name("mojang"), Some("merge"));
        assert_eq!(d.modifiers, 1);
        assert_eq!(d.params[&1].name("mojang"), Some("other"));
        assert_eq!(
            a.field(&FieldKey::new("c", Some("I".into()))).unwrap().name("mojang"),
            Some("count")
        );
    }

    #[test]
    fn last_contributor_wins_on_conflict() {
        let first = Fragment::new("yarn").class(FragmentClass::new("a").named("First"));
        let second = Fragment::new("yarn").class(FragmentClass::new("a").named("Second"));

        let tree = compose(
            &release("1.0"),
            &[Contribution::add("one", first.clone()), Contribution::add("two", second.clone())],
        )
        .unwrap();
        assert_eq!(tree.class_name("a", "yarn"), Some("Second"));

        let reversed = compose(
            &release("1.0"),
            &[Contribution::add("two", second), Contribution::add("one", first)],
        )
        .unwrap();
        assert_eq!(reversed.class_name("a", "yarn"), Some("First"));
    }

    #[test]
    fn wrap_replaces_inner_output() {
        let spigot = Fragment::new("spigot").class(FragmentClass::new("a").named("Block"));
        let tree = compose(
            &release("1.12"),
            &[
                Contribution::add("spigot", spigot),
                Contribution::wrap(
                    "spigot-prefixed",
                    "spigot",
                    Arc::new(PackagePrefixer::new("spigot", "net/minecraft/server/")),
                ),
            ],
        )
        .unwrap();
        assert_eq!(tree.class_name("a", "spigot"), Some("net/minecraft/server/Block"));
    }

    #[test]
    fn descriptor_less_field_joins_unique_match_and_is_upgraded_later() {
        let spigot = Fragment::new("spigot")
            .class(FragmentClass::new("a").field(FragmentField::new("c", None).named("count")));
        let tree = compose(
            &release("1.0"),
            &[
                Contribution::add("spigot", spigot),
                Contribution::add("vanilla", structure()),
            ],
        )
        .unwrap();
        let a = tree.class("a").unwrap();
        assert_eq!(a.fields.len(), 1);
        let c = a.field(&FieldKey::new("c", Some("I".into()))).unwrap();
        assert_eq!(c.name("spigot"), Some("count"));
    }

    #[test]
    fn ambiguous_descriptor_less_field_is_reported() {
        let structure = Fragment::new("source").class(
            FragmentClass::new("a")
                .field(FragmentField::new("c", Some("I")))
                .field(FragmentField::new("c", Some("J"))),
        );
        let spigot = Fragment::new("spigot")
            .class(FragmentClass::new("a").field(FragmentField::new("c", None).named("count")));
        let tree = compose(
            &release("1.0"),
            &[Contribution::add("vanilla", structure), Contribution::add("spigot", spigot)],
        )
        .unwrap();
        assert_eq!(tree.diagnostics().len(), 1);
        assert!(tree
            .class("a")
            .unwrap()
            .fields
            .values()
            .all(|f| f.name("spigot").is_none()));
    }

    #[test]
    fn invalid_contributor_lists_are_rejected() {
        let transform = Arc::new(PackagePrefixer::new("spigot", "x/"));
        let fragment = Fragment::new("spigot");

        assert!(matches!(
            compose(
                &release("1.0"),
                &[Contribution::add("a", fragment.clone()), Contribution::add("a", fragment.clone())]
            ),
            Err(ComposeError::DuplicateContributor(_))
        ));
        assert!(matches!(
            compose(&release("1.0"), &[Contribution::wrap("w", "a", transform.clone())]),
            Err(ComposeError::UnknownInner { .. })
        ));
        assert!(matches!(
            compose(
                &release("1.0"),
                &[
                    Contribution::add("a", fragment),
                    Contribution::wrap("w1", "a", transform.clone()),
                    Contribution::wrap("w2", "a", transform),
                ]
            ),
            Err(ComposeError::AlreadyWrapped { .. })
        ));
    }
}
