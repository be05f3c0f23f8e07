use mapping_types::{FieldKey, MappingTree, MethodKey, Named, Namespace, Release};

use crate::error::{EmitError, EmitResult};
use crate::{FORMAT, MAJOR_VERSION, META_INTERFACES, META_MODIFIERS, META_SUPER};

/// Role of one name column.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Column {
    Names(Namespace),
    Super,
    Interfaces,
    Modifiers,
}

/// Parse interchange text back into a tree for `release`.
pub fn read_tiny(input: &str, release: Release) -> EmitResult<MappingTree> {
    let mut lines = input.lines().enumerate();
    let (_, header) = lines
        .next()
        .ok_or_else(|| EmitError::Header("empty input".to_string()))?;
    let columns = parse_header(header)?;

    let mut tree = MappingTree::new(release);
    for column in &columns {
        if let Column::Names(ns) = column {
            tree.register_namespace(ns);
        }
    }

    let mut class: Option<String> = None;
    let mut method: Option<MethodKey> = None;
    for (number, line) in lines {
        let line_no = number + 1;
        if line.is_empty() {
            continue;
        }
        let depth = line.len() - line.trim_start_matches('\t').len();
        let parts: Vec<&str> = line[depth..].split('\t').collect();
        let syntax = |message: &str| EmitError::Syntax {
            line: line_no,
            message: message.to_string(),
        };

        match (depth, parts[0]) {
            (0, "c") => {
                let [_, source, rest @ ..] = parts.as_slice() else {
                    return Err(syntax("class record without a structural name"));
                };
                let entity = tree.class_or_insert(source);
                apply_columns(&columns, rest, line_no, |column, value| match column {
                    Column::Names(ns) => {
                        entity.set_name(ns.clone(), value);
                        Ok(())
                    }
                    Column::Super => {
                        entity.super_class = Some(value.to_string());
                        Ok(())
                    }
                    Column::Interfaces => {
                        entity.interfaces = value.split(',').map(str::to_string).collect();
                        Ok(())
                    }
                    Column::Modifiers => {
                        entity.modifiers = parse_number(value, line_no)?;
                        Ok(())
                    }
                })?;
                class = Some((*source).to_string());
                method = None;
            }
            (1, "f") => {
                let [_, descriptor, source, rest @ ..] = parts.as_slice() else {
                    return Err(syntax("field record needs a descriptor and a structural name"));
                };
                let owner = class
                    .as_deref()
                    .and_then(|c| tree.class_mut(c))
                    .ok_or_else(|| syntax("field record outside a class"))?;
                let field =
                    owner.field_or_insert(FieldKey::new(*source, Some((*descriptor).to_string())));
                apply_columns(&columns, rest, line_no, |column, value| match column {
                    Column::Names(ns) => {
                        field.set_name(ns.clone(), value);
                        Ok(())
                    }
                    Column::Modifiers => {
                        field.modifiers = parse_number(value, line_no)?;
                        Ok(())
                    }
                    _ => Ok(()),
                })?;
                method = None;
            }
            (1, "m") => {
                let [_, descriptor, source, rest @ ..] = parts.as_slice() else {
                    return Err(syntax("method record needs a descriptor and a structural name"));
                };
                let owner = class
                    .as_deref()
                    .and_then(|c| tree.class_mut(c))
                    .ok_or_else(|| syntax("method record outside a class"))?;
                let key = MethodKey::new(*source, *descriptor);
                let entity = owner.method_or_insert(key.clone());
                apply_columns(&columns, rest, line_no, |column, value| match column {
                    Column::Names(ns) => {
                        entity.set_name(ns.clone(), value);
                        Ok(())
                    }
                    Column::Modifiers => {
                        entity.modifiers = parse_number(value, line_no)?;
                        Ok(())
                    }
                    _ => Ok(()),
                })?;
                method = Some(key);
            }
            (2, "p") => {
                let [_, index, _, rest @ ..] = parts.as_slice() else {
                    return Err(syntax("parameter record needs an index"));
                };
                let index: u16 = parse_number(index, line_no)?;
                let owner = class
                    .as_deref()
                    .zip(method.as_ref())
                    .and_then(|(c, m)| tree.class_mut(c)?.methods.get_mut(m))
                    .ok_or_else(|| syntax("parameter record outside a method"))?;
                let param = owner.param_mut(index);
                apply_columns(&columns, rest, line_no, |column, value| {
                    if let Column::Names(ns) = column {
                        param.set_name(ns.clone(), value);
                    }
                    Ok(())
                })?;
            }
            (_, kind) => {
                return Err(syntax(&format!("unknown record {kind:?} at depth {depth}")));
            }
        }
    }
    Ok(tree)
}

fn parse_header(header: &str) -> EmitResult<Vec<Column>> {
    let parts: Vec<&str> = header.split('\t').collect();
    match parts.as_slice() {
        [format, major, _minor, source, rest @ ..]
            if *format == FORMAT && *major == MAJOR_VERSION && *source == Namespace::SOURCE =>
        {
            Ok(rest
                .iter()
                .map(|name| match *name {
                    META_SUPER => Column::Super,
                    META_INTERFACES => Column::Interfaces,
                    META_MODIFIERS => Column::Modifiers,
                    other => Column::Names(Namespace::new(other)),
                })
                .collect())
        }
        _ => Err(EmitError::Header(header.to_string())),
    }
}

/// Feed every non-empty value to `apply` with its column.
fn apply_columns<F>(columns: &[Column], values: &[&str], line: usize, mut apply: F) -> EmitResult<()>
where
    F: FnMut(&Column, &str) -> EmitResult<()>,
{
    if values.len() > columns.len() {
        return Err(EmitError::Syntax {
            line,
            message: format!("{} columns, header declares {}", values.len(), columns.len()),
        });
    }
    for (column, value) in columns.iter().zip(values) {
        if !value.is_empty() {
            apply(column, value)?;
        }
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(value: &str, line: usize) -> EmitResult<T> {
    value.parse().map_err(|_| EmitError::Syntax {
        line,
        message: format!("expected a number, got {value:?}"),
    })
}
