//! Provider adapter output.
//!
//! A fragment carries one namespace's view of one release. Entities are keyed
//! by their structural (`source`) names; a fragment in the `source` namespace
//! contributes structure only (supertypes, modifiers, member lists).

use serde::{Deserialize, Serialize};

use crate::namespace::Namespace;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentParam {
    pub index: u16,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentField {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<u32>,
}

impl FragmentField {
    pub fn new(source: impl Into<String>, descriptor: Option<&str>) -> Self {
        Self {
            source: source.into(),
            descriptor: descriptor.map(str::to_string),
            name: None,
            modifiers: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn modifiers(mut self, modifiers: u32) -> Self {
        self.modifiers = Some(modifiers);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentMethod {
    pub source: String,
    pub descriptor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<FragmentParam>,
}

impl FragmentMethod {
    pub fn new(source: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            descriptor: descriptor.into(),
            name: None,
            modifiers: None,
            params: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn modifiers(mut self, modifiers: u32) -> Self {
        self.modifiers = Some(modifiers);
        self
    }

    pub fn param(mut self, index: u16, name: impl Into<String>) -> Self {
        self.params.push(FragmentParam {
            index,
            name: name.into(),
        });
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentClass {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FragmentField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<FragmentMethod>,
}

impl FragmentClass {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            name: None,
            super_class: None,
            interfaces: None,
            modifiers: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn extends(mut self, super_class: impl Into<String>) -> Self {
        self.super_class = Some(super_class.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces
            .get_or_insert_with(Vec::new)
            .push(interface.into());
        self
    }

    pub fn modifiers(mut self, modifiers: u32) -> Self {
        self.modifiers = Some(modifiers);
        self
    }

    pub fn field(mut self, field: FragmentField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: FragmentMethod) -> Self {
        self.methods.push(method);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub namespace: Namespace,
    #[serde(default)]
    pub classes: Vec<FragmentClass>,
}

impl Fragment {
    pub fn new(namespace: impl Into<Namespace>) -> Self {
        Self {
            namespace: namespace.into(),
            classes: Vec::new(),
        }
    }

    pub fn class(mut self, class: FragmentClass) -> Self {
        self.classes.push(class);
        self
    }

    pub fn is_structural(&self) -> bool {
        self.namespace.is_source()
    }
}
