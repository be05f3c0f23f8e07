//! Identity signatures: what an entity looks like in the identity namespaces.

use std::collections::BTreeMap;

use mapping_types::descriptor::CONSTRUCTOR;
use mapping_types::{ClassEntity, FieldEntity, MappingTree, MethodEntity, Named, Namespace};

use crate::options::AncestryOptions;

/// Identity string per namespace; absent namespaces have no entry.
pub type Signature = BTreeMap<Namespace, String>;

pub fn class_signature(class: &ClassEntity, options: &AncestryOptions) -> Signature {
    named(class, options)
}

/// Fields are identified by name alone so a type change keeps the lineage.
pub fn field_signature(field: &FieldEntity, options: &AncestryOptions) -> Signature {
    named(field, options)
}

/// Methods are identified by name plus descriptor, mapped into each namespace.
///
/// A namespace contributes an entry only when every class of the tree named
/// in the descriptor has a name there, so obfuscated names never enter a
/// signature. Constructors have no name of their own; they are identified by
/// their mapped descriptor in namespaces that name the owning class.
pub fn method_signature(
    tree: &MappingTree,
    owner: &ClassEntity,
    method: &MethodEntity,
    options: &AncestryOptions,
) -> Signature {
    options
        .namespaces
        .iter()
        .filter_map(|ns| {
            let name = if method.is_constructor() {
                owner.name(ns.as_str()).map(|_| CONSTRUCTOR)?
            } else {
                method.name(ns.as_str())?
            };
            let descriptor = tree.map_descriptor_strict(&method.descriptor, ns.as_str())?;
            Some((ns.clone(), format!("{name}{descriptor}")))
        })
        .collect()
}

fn named(entity: &impl Named, options: &AncestryOptions) -> Signature {
    options
        .namespaces
        .iter()
        .filter_map(|ns| entity.name(ns.as_str()).map(|name| (ns.clone(), name.to_string())))
        .collect()
}

/// Score of linking an open node last seen as `previous` to `current`.
///
/// Present-and-equal names count one each. Names present on both sides but
/// different, and names present on one side of a mandatory namespace, rule
/// the pair out.
pub fn compatibility(
    options: &AncestryOptions,
    previous: &Signature,
    current: &Signature,
) -> Option<usize> {
    let mut score = 0;
    for ns in &options.namespaces {
        match (previous.get(ns), current.get(ns)) {
            (Some(a), Some(b)) if a == b => score += 1,
            (Some(_), Some(_)) => return None,
            (None, None) => {}
            _ if options.is_mandatory(ns) => return None,
            _ => {}
        }
    }
    Some(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mapping_types::{MethodKey, Release, ReleaseKind};

    fn sig(pairs: &[(&str, &str)]) -> Signature {
        pairs
            .iter()
            .map(|(ns, name)| (Namespace::new(*ns), name.to_string()))
            .collect()
    }

    #[test]
    fn compatibility_rules() {
        let options = AncestryOptions::new(["mojang", "spigot"]);
        let full = sig(&[("mojang", "A"), ("spigot", "B")]);

        assert_eq!(compatibility(&options, &full, &full), Some(2));
        assert_eq!(compatibility(&options, &full, &sig(&[("mojang", "A")])), Some(1));
        assert_eq!(compatibility(&options, &full, &sig(&[("mojang", "X")])), None);
        assert_eq!(compatibility(&options, &sig(&[]), &sig(&[])), Some(0));

        let strict = options.mandatory(["spigot"]);
        assert_eq!(compatibility(&strict, &full, &sig(&[("mojang", "A")])), None);
    }

    #[test]
    fn method_signatures_map_descriptors() {
        let mut tree = MappingTree::new(Release::new("1.0", ReleaseKind::Release, Utc::now()));
        let mojang = Namespace::new("mojang");
        let spigot = Namespace::new("spigot");
        tree.class_or_insert("a").set_name(mojang.clone(), "net/Alpha");
        let b = tree.class_or_insert("b");
        b.set_name(mojang.clone(), "net/Beta");
        b.set_name(spigot.clone(), "Beta");
        let x = b.method_or_insert(MethodKey::new("x", "(La;)V"));
        x.set_name(mojang.clone(), "accept");
        x.set_name(spigot.clone(), "accept");
        b.method_or_insert(MethodKey::new("<init>", "(La;)V"));
        b.method_or_insert(MethodKey::new("<init>", "(Ljava/lang/String;)V"));

        let options = AncestryOptions::new(["mojang", "spigot"]);
        let b = tree.class("b").unwrap();
        let method = b.method(&MethodKey::new("x", "(La;)V")).unwrap();
        assert_eq!(
            method_signature(&tree, b, method, &options),
            sig(&[("mojang", "accept(Lnet/Alpha;)V")])
        );

        let ctor = b.method(&MethodKey::new("<init>", "(La;)V")).unwrap();
        assert_eq!(
            method_signature(&tree, b, ctor, &options),
            sig(&[("mojang", "<init>(Lnet/Alpha;)V")])
        );

        let ctor = b.method(&MethodKey::new("<init>", "(Ljava/lang/String;)V")).unwrap();
        assert_eq!(
            method_signature(&tree, b, ctor, &options),
            sig(&[
                ("mojang", "<init>(Ljava/lang/String;)V"),
                ("spigot", "<init>(Ljava/lang/String;)V")
            ])
        );
    }

    #[test]
    fn constructors_of_unnamed_classes_have_no_identity() {
        let mut tree = MappingTree::new(Release::new("1.0", ReleaseKind::Release, Utc::now()));
        tree.class_or_insert("a").method_or_insert(MethodKey::new("<init>", "()V"));

        let options = AncestryOptions::new(["mojang"]);
        let a = tree.class("a").unwrap();
        let ctor = a.method(&MethodKey::new("<init>", "()V")).unwrap();
        assert!(method_signature(&tree, a, ctor, &options).is_empty());
    }
}
