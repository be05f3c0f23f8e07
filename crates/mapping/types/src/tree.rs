use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::{self, remap_descriptor};
use crate::diagnostic::Diagnostic;
use crate::namespace::Namespace;
use crate::release::Release;

/// Per-namespace names of one entity.
pub type NameMap = BTreeMap<Namespace, String>;

/// JVM access flags carried in the structural namespace.
pub mod access {
    pub const PUBLIC: u32 = 0x0001;
    pub const PRIVATE: u32 = 0x0002;
    pub const PROTECTED: u32 = 0x0004;
    pub const STATIC: u32 = 0x0008;
    pub const FINAL: u32 = 0x0010;
    pub const BRIDGE: u32 = 0x0040;
    pub const INTERFACE: u32 = 0x0200;
    pub const ABSTRACT: u32 = 0x0400;
    pub const SYNTHETIC: u32 = 0x1000;
}

/// Entities carrying per-namespace names.
pub trait Named {
    fn names(&self) -> &NameMap;
    fn names_mut(&mut self) -> &mut NameMap;

    fn name(&self, namespace: &str) -> Option<&str> {
        self.names().get(namespace).map(String::as_str)
    }

    /// Set a name, returning the previous one.
    fn set_name(&mut self, namespace: Namespace, name: impl Into<String>) -> Option<String> {
        self.names_mut().insert(namespace, name.into())
    }

    fn remove_name(&mut self, namespace: &str) -> Option<String> {
        self.names_mut().remove(namespace)
    }
}

/// Key of a field inside its class.
///
/// Some providers publish fields without a descriptor, so it is optional.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldKey {
    pub name: String,
    pub descriptor: Option<String>,
}

impl FieldKey {
    pub fn new(name: impl Into<String>, descriptor: Option<String>) -> Self {
        Self {
            name: name.into(),
            descriptor,
        }
    }
}

/// Key of a method inside its class; the descriptor tells overloads apart.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodKey {
    pub name: String,
    pub descriptor: String,
}

impl MethodKey {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ParamEntity {
    pub index: u16,
    pub names: NameMap,
}

impl Named for ParamEntity {
    fn names(&self) -> &NameMap {
        &self.names
    }

    fn names_mut(&mut self) -> &mut NameMap {
        &mut self.names
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FieldEntity {
    pub source: String,
    pub descriptor: Option<String>,
    pub names: NameMap,
    pub modifiers: u32,
}

impl FieldEntity {
    pub fn new(source: impl Into<String>, descriptor: Option<String>) -> Self {
        Self {
            source: source.into(),
            descriptor,
            ..Default::default()
        }
    }

    pub fn key(&self) -> FieldKey {
        FieldKey::new(self.source.clone(), self.descriptor.clone())
    }
}

impl Named for FieldEntity {
    fn names(&self) -> &NameMap {
        &self.names
    }

    fn names_mut(&mut self) -> &mut NameMap {
        &mut self.names
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct MethodEntity {
    pub source: String,
    pub descriptor: String,
    pub names: NameMap,
    pub modifiers: u32,
    pub params: BTreeMap<u16, ParamEntity>,
}

impl MethodEntity {
    pub fn new(source: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            descriptor: descriptor.into(),
            ..Default::default()
        }
    }

    pub fn key(&self) -> MethodKey {
        MethodKey::new(self.source.clone(), self.descriptor.clone())
    }

    pub fn is_constructor(&self) -> bool {
        descriptor::is_constructor(&self.source)
    }

    pub fn is_static_initializer(&self) -> bool {
        descriptor::is_static_initializer(&self.source)
    }

    /// Whether the method can take part in an override chain.
    pub fn is_overridable(&self) -> bool {
        !self.is_constructor()
            && !self.is_static_initializer()
            && self.modifiers & (access::STATIC | access::PRIVATE) == 0
    }

    pub fn param_mut(&mut self, index: u16) -> &mut ParamEntity {
        self.params.entry(index).or_insert_with(|| ParamEntity {
            index,
            names: NameMap::new(),
        })
    }
}

impl Named for MethodEntity {
    fn names(&self) -> &NameMap {
        &self.names
    }

    fn names_mut(&mut self) -> &mut NameMap {
        &mut self.names
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ClassEntity {
    /// Name in the structural namespace; the class's key in its tree.
    pub source: String,
    pub names: NameMap,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub modifiers: u32,
    pub fields: BTreeMap<FieldKey, FieldEntity>,
    pub methods: BTreeMap<MethodKey, MethodEntity>,
}

impl ClassEntity {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Source name of the enclosing class, if this class is nested.
    pub fn enclosing_source(&self) -> Option<&str> {
        match self.source.rsplit_once('$') {
            Some((outer, inner)) if !outer.is_empty() && !inner.is_empty() => Some(outer),
            _ => None,
        }
    }

    /// Direct supertypes: the superclass first, then interfaces in declared order.
    pub fn supertypes(&self) -> impl Iterator<Item = &str> {
        self.super_class
            .iter()
            .chain(self.interfaces.iter())
            .map(String::as_str)
    }

    pub fn field(&self, key: &FieldKey) -> Option<&FieldEntity> {
        self.fields.get(key)
    }

    pub fn method(&self, key: &MethodKey) -> Option<&MethodEntity> {
        self.methods.get(key)
    }

    /// Fields sharing a source name, regardless of descriptor.
    pub fn fields_named<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a FieldEntity> {
        self.fields.values().filter(move |f| f.source == source)
    }

    pub fn field_or_insert(&mut self, key: FieldKey) -> &mut FieldEntity {
        self.fields
            .entry(key.clone())
            .or_insert_with(|| FieldEntity::new(key.name, key.descriptor))
    }

    pub fn method_or_insert(&mut self, key: MethodKey) -> &mut MethodEntity {
        self.methods
            .entry(key.clone())
            .or_insert_with(|| MethodEntity::new(key.name, key.descriptor))
    }
}

impl Named for ClassEntity {
    fn names(&self) -> &NameMap {
        &self.names
    }

    fn names_mut(&mut self) -> &mut NameMap {
        &mut self.names
    }
}

/// Simple name of a class: the part after the last `$`, or after the last
/// `/` for top-level classes.
pub fn simple_name(name: &str) -> &str {
    let tail = name.rsplit('/').next().unwrap_or(name);
    tail.rsplit('$').next().unwrap_or(tail)
}

/// One release's merged multi-namespace tree.
#[derive(Clone, Debug)]
pub struct MappingTree {
    release: Release,
    namespaces: Vec<Namespace>,
    classes: BTreeMap<String, ClassEntity>,
    diagnostics: Vec<Diagnostic>,
}

impl MappingTree {
    pub fn new(release: Release) -> Self {
        Self {
            release,
            namespaces: Vec::new(),
            classes: BTreeMap::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn release(&self) -> &Release {
        &self.release
    }

    /// Non-structural namespaces, in first-contribution order.
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.iter().any(|ns| ns.as_str() == namespace)
    }

    /// Register a namespace; the structural one is implicit and never listed.
    pub fn register_namespace(&mut self, namespace: &Namespace) {
        if !namespace.is_source() && !self.has_namespace(namespace.as_str()) {
            self.namespaces.push(namespace.clone());
        }
    }

    /// Delete every name in `namespace`, including parameter names.
    pub fn remove_namespace(&mut self, namespace: &str) -> bool {
        let before = self.namespaces.len();
        self.namespaces.retain(|ns| ns.as_str() != namespace);

        for class in self.classes.values_mut() {
            class.remove_name(namespace);
            for field in class.fields.values_mut() {
                field.remove_name(namespace);
            }
            for method in class.methods.values_mut() {
                method.remove_name(namespace);
                for param in method.params.values_mut() {
                    param.remove_name(namespace);
                }
                method.params.retain(|_, p| !p.names.is_empty());
            }
        }
        before != self.namespaces.len()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassEntity> {
        self.classes.values()
    }

    pub fn classes_mut(&mut self) -> impl Iterator<Item = &mut ClassEntity> {
        self.classes.values_mut()
    }

    pub fn class(&self, source: &str) -> Option<&ClassEntity> {
        self.classes.get(source)
    }

    pub fn class_mut(&mut self, source: &str) -> Option<&mut ClassEntity> {
        self.classes.get_mut(source)
    }

    pub fn class_or_insert(&mut self, source: &str) -> &mut ClassEntity {
        self.classes
            .entry(source.to_string())
            .or_insert_with(|| ClassEntity::new(source))
    }

    pub fn insert_class(&mut self, class: ClassEntity) -> Option<ClassEntity> {
        self.classes.insert(class.source.clone(), class)
    }

    pub fn remove_class(&mut self, source: &str) -> Option<ClassEntity> {
        self.classes.remove(source)
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// A class's name in `namespace`.
    pub fn class_name(&self, source: &str, namespace: &str) -> Option<&str> {
        self.class(source).and_then(|c| c.name(namespace))
    }

    /// Rewrite a source-namespace descriptor into `namespace`.
    pub fn map_descriptor(&self, desc: &str, namespace: &str) -> String {
        if namespace == Namespace::SOURCE {
            return desc.to_string();
        }
        remap_descriptor(desc, |class| self.class_name(class, namespace))
    }

    /// Like [`map_descriptor`](Self::map_descriptor), but `None` when a class
    /// of this tree referenced by `desc` has no name in `namespace`.
    ///
    /// Classes outside the tree keep their name in every namespace.
    pub fn map_descriptor_strict(&self, desc: &str, namespace: &str) -> Option<String> {
        if namespace == Namespace::SOURCE {
            return Some(desc.to_string());
        }
        let unresolved = descriptor::class_references(desc)
            .into_iter()
            .any(|class| self.class(class).is_some() && self.class_name(class, namespace).is_none());
        (!unresolved).then(|| self.map_descriptor(desc, namespace))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Same namespaces, entities, names and descriptors; diagnostics ignored.
    pub fn same_content(&self, other: &MappingTree) -> bool {
        self.release.id == other.release.id
            && self.namespaces == other.namespaces
            && self.classes == other.classes
    }
}
