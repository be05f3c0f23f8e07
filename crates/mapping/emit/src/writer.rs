use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use mapping_types::{ClassEntity, MappingTree, Named, NameMap, Namespace};
use tracing::{debug, info};

use crate::error::{EmitError, EmitResult};
use crate::{FORMAT, MAJOR_VERSION, META_INTERFACES, META_MODIFIERS, META_SUPER, MINOR_VERSION};

/// Counts of written and skipped records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub classes: usize,
    pub fields: usize,
    pub methods: usize,
    pub parameters: usize,
    /// Fields left out because they have no descriptor.
    pub skipped_fields: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TinyWriter {
    structure: bool,
}

impl TinyWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also write supertypes, interfaces and access flags.
    pub fn with_structure(mut self, structure: bool) -> Self {
        self.structure = structure;
        self
    }

    pub fn write<W: Write>(&self, tree: &MappingTree, mut out: W) -> EmitResult<WriteSummary> {
        let namespaces = tree.namespaces();
        let mut summary = WriteSummary::default();

        write!(out, "{FORMAT}\t{MAJOR_VERSION}\t{MINOR_VERSION}\t{}", Namespace::SOURCE)?;
        for ns in namespaces {
            write!(out, "\t{ns}")?;
        }
        if self.structure {
            write!(out, "\t{META_SUPER}\t{META_INTERFACES}\t{META_MODIFIERS}")?;
        }
        writeln!(out)?;

        for class in tree.classes() {
            write!(out, "c\t{}", checked(&class.source)?)?;
            self.write_names(&mut out, namespaces, &class.names)?;
            if self.structure {
                write!(
                    out,
                    "\t{}\t{}\t{}",
                    checked_opt(class.super_class.as_deref())?,
                    interfaces(class)?,
                    class.modifiers
                )?;
            }
            writeln!(out)?;
            summary.classes += 1;

            for field in class.fields.values() {
                let Some(descriptor) = &field.descriptor else {
                    debug!(class = %class.source, field = %field.source, "Skipping field without descriptor");
                    summary.skipped_fields += 1;
                    continue;
                };
                write!(out, "\tf\t{}\t{}", checked(descriptor)?, checked(&field.source)?)?;
                self.write_names(&mut out, namespaces, &field.names)?;
                self.write_member_structure(&mut out, field.modifiers)?;
                writeln!(out)?;
                summary.fields += 1;
            }

            for method in class.methods.values() {
                write!(
                    out,
                    "\tm\t{}\t{}",
                    checked(&method.descriptor)?,
                    checked(&method.source)?
                )?;
                self.write_names(&mut out, namespaces, &method.names)?;
                self.write_member_structure(&mut out, method.modifiers)?;
                writeln!(out)?;
                summary.methods += 1;

                for param in method.params.values().filter(|p| !p.names.is_empty()) {
                    // Parameters have no structural name.
                    write!(out, "\t\tp\t{}\t", param.index)?;
                    self.write_names(&mut out, namespaces, param.names())?;
                    if self.structure {
                        write!(out, "\t\t\t")?;
                    }
                    writeln!(out)?;
                    summary.parameters += 1;
                }
            }
        }
        out.flush()?;

        info!(
            release = %tree.release(),
            classes = summary.classes,
            fields = summary.fields,
            methods = summary.methods,
            skipped_fields = summary.skipped_fields,
            "Wrote mapping tree"
        );
        Ok(summary)
    }

    pub fn write_to_string(&self, tree: &MappingTree) -> EmitResult<String> {
        let mut buf = Vec::new();
        self.write(tree, &mut buf)?;
        String::from_utf8(buf).map_err(|e| EmitError::InvalidName {
            name: String::from_utf8_lossy(e.as_bytes()).into_owned(),
            reason: "not valid UTF-8",
        })
    }

    pub fn write_file(&self, tree: &MappingTree, path: &Path) -> EmitResult<WriteSummary> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.write(tree, BufWriter::new(File::create(path)?))
    }

    fn write_names<W: Write>(
        &self,
        out: &mut W,
        namespaces: &[Namespace],
        names: &NameMap,
    ) -> EmitResult<()> {
        for ns in namespaces {
            write!(out, "\t{}", checked_opt(names.get(ns).map(String::as_str))?)?;
        }
        Ok(())
    }

    fn write_member_structure<W: Write>(&self, out: &mut W, modifiers: u32) -> EmitResult<()> {
        if self.structure {
            write!(out, "\t\t\t{modifiers}")?;
        }
        Ok(())
    }
}

fn checked(name: &str) -> EmitResult<&str> {
    if name.is_empty() {
        Err(EmitError::InvalidName {
            name: name.to_string(),
            reason: "empty names are indistinguishable from missing ones",
        })
    } else if name.contains(['\t', '\n', '\r']) {
        Err(EmitError::InvalidName {
            name: name.to_string(),
            reason: "contains a column or record separator",
        })
    } else {
        Ok(name)
    }
}

fn checked_opt(name: Option<&str>) -> EmitResult<&str> {
    name.map_or(Ok(""), checked)
}

fn interfaces(class: &ClassEntity) -> EmitResult<String> {
    for interface in &class.interfaces {
        checked(interface)?;
        if interface.contains(',') {
            return Err(EmitError::InvalidName {
                name: interface.clone(),
                reason: "interface names cannot contain ','",
            });
        }
    }
    Ok(class.interfaces.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mapping_types::{FieldKey, MethodKey, Release, ReleaseKind};

    fn tree() -> MappingTree {
        let mut tree = MappingTree::new(Release::new("1.0", ReleaseKind::Release, Utc::now()));
        let mojang = Namespace::new("mojang");
        tree.register_namespace(&mojang);
        let a = tree.class_or_insert("a");
        a.set_name(mojang.clone(), "net/Alpha");
        a.field_or_insert(FieldKey::new("b", Some("I".into())))
            .set_name(mojang.clone(), "count");
        a.field_or_insert(FieldKey::new("c", None))
            .set_name(mojang.clone(), "bare");
        let m = a.method_or_insert(MethodKey::new("d", "(La;)V"));
        m.set_name(mojang.clone(), "accept");
        m.param_mut(1).set_name(mojang, "other");
        tree
    }

    #[test]
    fn writes_records_and_skips_fields_without_descriptor() {
        let writer = TinyWriter::new();
        let text = writer.write_to_string(&tree()).unwrap();
        assert_eq!(
            text,
            "tiny\t2\t0\tsource\tmojang\n\
             c\ta\tnet/Alpha\n\
             \tf\tI\tb\tcount\n\
             \tm\t(La;)V\td\taccept\n\
             \t\tp\t1\t\tother\n"
        );

        let summary = writer.write(&tree(), Vec::new()).unwrap();
        assert_eq!(summary.fields, 1);
        assert_eq!(summary.skipped_fields, 1);
        assert_eq!(summary.parameters, 1);
    }

    #[test]
    fn structure_columns() {
        let mut tree = tree();
        let a = tree.class_mut("a").unwrap();
        a.super_class = Some("java/lang/Object".into());
        a.interfaces = vec!["e".into(), "f".into()];
        a.modifiers = 1;

        let text = TinyWriter::new().with_structure(true).write_to_string(&tree).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("tiny\t2\t0\tsource\tmojang\tmeta_super\tmeta_interfaces\tmeta_modifiers")
        );
        assert_eq!(lines.next(), Some("c\ta\tnet/Alpha\tjava/lang/Object\te,f\t1"));
        assert_eq!(lines.next(), Some("\tf\tI\tb\tcount\t\t\t0"));
    }

    #[test]
    fn rejects_names_with_separators() {
        let mut tree = tree();
        tree.class_mut("a")
            .unwrap()
            .set_name(Namespace::new("mojang"), "net/Al\tpha");
        let err = TinyWriter::new().write_to_string(&tree).unwrap_err();
        assert!(matches!(err, EmitError::InvalidName { .. }));
    }

    #[test]
    fn writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("1.0.tiny");
        let summary = TinyWriter::new().write_file(&tree(), &path).unwrap();
        assert_eq!(summary.classes, 1);
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("tiny\t2\t0"));
    }
}
