//! The textual bytecode loader (spec.md §4.5).
//!
//! Parses `CLASS_DEFINE`/`METHOD_DEFINE`/`FIELD_DEFINE` blocks via a small
//! recursive-descent state machine: each element kind's own `*_BEGIN`/
//! `*_END` pair is self-distinguishing in the text, so nested classes
//! recurse straight through `build_class` without any shared depth
//! counter. Grounded in `examples/original_source/src/vm/element/Class.cpp`'s
//! loader state machine.

use std::collections::HashSet;

use super::class::{Class, Field, Method};
use super::modifier::Modifiers;
use super::signature::TypeSignature;
use crate::error::LoadError;

struct Line<'a> {
    number: usize,
    word: &'a str,
    args: Vec<&'a str>,
}

fn tokenize(source: &str) -> Vec<Line<'_>> {
    source
        .lines()
        .enumerate()
        .filter_map(|(index, raw)| {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return None;
            }
            let mut parts = trimmed.split_whitespace();
            let word = parts.next()?;
            Some(Line {
                number: index + 1,
                word,
                args: parts.collect(),
            })
        })
        .collect()
}

/// Loads a complete textual program into its flattened class graph. Inner
/// classes are promoted to top-level entries with a qualified name; class
/// name collisions (including an inner class colliding with a top-level
/// one) are fatal.
pub fn load(source: &str) -> Result<Vec<Class>, LoadError> {
    let lines = tokenize(source);
    let mut classes = Vec::new();
    let mut seen = HashSet::new();
    let mut idx = 0;

    while idx < lines.len() {
        match lines[idx].word {
            "CLASS_DEFINE" => {
                let (built, next) = build_class(&lines, idx, None)?;
                for class in built {
                    if !seen.insert(class.name.clone()) {
                        return Err(LoadError::DuplicateClass(class.name));
                    }
                    classes.push(class);
                }
                idx = next;
            }
            other => {
                return Err(LoadError::DanglingInstruction {
                    line: lines[idx].number,
                    instruction: other.to_string(),
                })
            }
        }
    }

    Ok(classes)
}

fn build_class(lines: &[Line], mut idx: usize, enclosing: Option<&str>) -> Result<(Vec<Class>, usize), LoadError> {
    let define_line = lines[idx].number;
    let name = lines[idx].args.first().ok_or_else(|| malformed(&lines[idx]))?.to_string();
    idx += 1;

    let mut modifier_words = Vec::new();
    let mut super_name = "Object".to_string();
    let mut interfaces = Vec::new();

    loop {
        let line = lines.get(idx).ok_or(LoadError::UnbalancedNesting {
            kind: "CLASS",
            offset: 1,
        })?;
        match line.word {
            "CLASS_MODIFIER" => {
                modifier_words.push(line.args.first().ok_or_else(|| malformed(line))?.to_string());
                idx += 1;
            }
            "CLASS_EXTENDS" => {
                super_name = line.args.first().ok_or_else(|| malformed(line))?.to_string();
                idx += 1;
            }
            "CLASS_IMPLEMENTS" => {
                interfaces.push(line.args.first().ok_or_else(|| malformed(line))?.to_string());
                idx += 1;
            }
            "CLASS_BEGIN" => {
                idx += 1;
                break;
            }
            other => {
                return Err(LoadError::DanglingInstruction {
                    line: line.number,
                    instruction: other.to_string(),
                })
            }
        }
    }

    let mut methods: Vec<Method> = Vec::new();
    let mut fields = Vec::new();
    let mut inner_names = Vec::new();
    let mut inner_flat = Vec::new();

    let modifiers = Modifiers::from_words(&modifier_words).map_err(|word| LoadError::MalformedLine {
        line: define_line,
        text: word,
    })?;

    let qualified_name = match enclosing {
        Some(parent) => format!("{}{}{}", parent, if modifiers.is_static() { "." } else { "$" }, name),
        None => name,
    };

    loop {
        let line = lines.get(idx).ok_or(LoadError::UnbalancedNesting {
            kind: "CLASS",
            offset: 1,
        })?;
        match line.word {
            "METHOD_DEFINE" => {
                let (method, next) = build_method(lines, idx)?;
                if methods.iter().any(|existing: &Method| existing.signature_key() == method.signature_key()) {
                    return Err(LoadError::DuplicateMethod {
                        class: qualified_name.clone(),
                        name: method.name,
                        params: method.params_display(),
                    });
                }
                methods.push(method);
                idx = next;
            }
            "FIELD_DEFINE" => {
                let (field, next) = build_field(lines, idx)?;
                fields.push(field);
                idx = next;
            }
            "CLASS_DEFINE" => {
                let (mut built, next) = build_class(lines, idx, Some(&qualified_name))?;
                inner_names.push(built[0].name.clone());
                inner_flat.append(&mut built);
                idx = next;
            }
            "CLASS_END" => {
                idx += 1;
                break;
            }
            other => {
                return Err(LoadError::DanglingInstruction {
                    line: line.number,
                    instruction: other.to_string(),
                })
            }
        }
    }

    log::trace!("loader: closed class '{}' ({} method(s), {} field(s))", qualified_name, methods.len(), fields.len());

    let own = Class {
        name: qualified_name,
        super_name,
        modifiers,
        interfaces,
        methods,
        fields,
        inner_classes: inner_names,
    };

    let mut result = vec![own];
    result.append(&mut inner_flat);
    Ok((result, idx))
}

fn build_method(lines: &[Line], mut idx: usize) -> Result<(Method, usize), LoadError> {
    let define_line = lines[idx].number;
    let name = lines[idx].args.first().ok_or_else(|| malformed(&lines[idx]))?.to_string();
    idx += 1;

    let mut modifier_words = Vec::new();
    let mut return_type = TypeSignature::Void;
    let mut parameters = Vec::new();

    loop {
        let line = lines.get(idx).ok_or(LoadError::UnbalancedNesting {
            kind: "METHOD",
            offset: 1,
        })?;
        match line.word {
            "METHOD_MODIFIER" => {
                modifier_words.push(line.args.first().ok_or_else(|| malformed(line))?.to_string());
                idx += 1;
            }
            "METHOD_RETURN_TYPE" => {
                let raw = line.args.first().ok_or_else(|| malformed(line))?;
                return_type = TypeSignature::parse(raw).map_err(|_| malformed(line))?;
                idx += 1;
            }
            "METHOD_PARAMETERS" => {
                parameters = line
                    .args
                    .iter()
                    .map(|raw| TypeSignature::parse(raw).map_err(|_| malformed(line)))
                    .collect::<Result<Vec<_>, _>>()?;
                idx += 1;
            }
            "METHOD_BEGIN" => {
                idx += 1;
                break;
            }
            other => {
                return Err(LoadError::DanglingInstruction {
                    line: line.number,
                    instruction: other.to_string(),
                })
            }
        }
    }

    let mut instructions = Vec::new();
    loop {
        let line = lines.get(idx).ok_or(LoadError::UnbalancedNesting {
            kind: "METHOD",
            offset: 1,
        })?;
        if line.word == "METHOD_END" {
            idx += 1;
            break;
        }
        instructions.push(crate::bytecode::instruction::Instruction::parse(line.word, &line.args, line.number)?);
        idx += 1;
    }

    let modifiers = Modifiers::from_words(&modifier_words).map_err(|word| LoadError::MalformedLine {
        line: define_line,
        text: word,
    })?;

    log::trace!("loader: closed method '{}' ({} instruction(s))", name, instructions.len());

    Ok((
        Method {
            name,
            return_type,
            modifiers,
            parameters,
            instructions,
        },
        idx,
    ))
}

fn build_field(lines: &[Line], mut idx: usize) -> Result<(Field, usize), LoadError> {
    let define_line = lines[idx].number;
    let name = lines[idx].args.first().ok_or_else(|| malformed(&lines[idx]))?.to_string();
    idx += 1;

    let mut modifier_words = Vec::new();
    let mut ty = TypeSignature::Int;

    loop {
        let line = lines.get(idx).ok_or(LoadError::UnbalancedNesting {
            kind: "FIELD",
            offset: 1,
        })?;
        match line.word {
            "FIELD_MODIFIER" => {
                modifier_words.push(line.args.first().ok_or_else(|| malformed(line))?.to_string());
                idx += 1;
            }
            "FIELD_TYPE" => {
                let raw = line.args.first().ok_or_else(|| malformed(line))?;
                ty = TypeSignature::parse(raw).map_err(|_| malformed(line))?;
                idx += 1;
            }
            "FIELD_BEGIN" => {
                idx += 1;
                break;
            }
            other => {
                return Err(LoadError::DanglingInstruction {
                    line: line.number,
                    instruction: other.to_string(),
                })
            }
        }
    }

    // A field's body carries no operations in this grammar (spec.md §9
    // leaves field-initializer semantics an open question); skip to its
    // terminator without interpreting the lines in between.
    loop {
        let line = lines.get(idx).ok_or(LoadError::UnbalancedNesting {
            kind: "FIELD",
            offset: 1,
        })?;
        idx += 1;
        if line.word == "FIELD_END" {
            break;
        }
    }

    let modifiers = Modifiers::from_words(&modifier_words).map_err(|word| LoadError::MalformedLine {
        line: define_line,
        text: word,
    })?;

    Ok((Field { name, ty, modifiers }, idx))
}

fn malformed(line: &Line) -> LoadError {
    LoadError::MalformedLine {
        line: line.number,
        text: std::iter::once(line.word).chain(line.args.iter().copied()).collect::<Vec<_>>().join(" "),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn loads_a_single_class_with_one_method() {
        let source = r#"
CLASS_DEFINE Main
CLASS_MODIFIER public
CLASS_BEGIN
METHOD_DEFINE add
METHOD_MODIFIER public
METHOD_MODIFIER static
METHOD_RETURN_TYPE I
METHOD_PARAMETERS I I
METHOD_BEGIN
ILOAD 0
ILOAD 1
IADD
IRETURN
METHOD_END
CLASS_END
"#;
        let classes = load(source).unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name, "Main");
        assert_eq!(classes[0].methods.len(), 1);
        assert_eq!(classes[0].methods[0].instructions.len(), 4);
    }

    #[test]
    fn nested_class_is_flattened_with_a_qualified_name() {
        let source = r#"
CLASS_DEFINE Outer
CLASS_BEGIN
CLASS_DEFINE Inner
CLASS_MODIFIER static
CLASS_BEGIN
CLASS_END
CLASS_END
"#;
        let classes = load(source).unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].name, "Outer");
        assert_eq!(classes[1].name, "Outer.Inner");
        assert_eq!(classes[0].inner_classes, vec!["Outer.Inner".to_string()]);
    }

    #[test]
    fn duplicate_method_signatures_are_fatal() {
        let source = r#"
CLASS_DEFINE Main
CLASS_BEGIN
METHOD_DEFINE run
METHOD_RETURN_TYPE V
METHOD_BEGIN
RETURN
METHOD_END
METHOD_DEFINE run
METHOD_RETURN_TYPE V
METHOD_BEGIN
RETURN
METHOD_END
CLASS_END
"#;
        assert!(matches!(load(source), Err(LoadError::DuplicateMethod { .. })));
    }

    #[test]
    fn unbalanced_class_end_is_reported() {
        let source = "CLASS_DEFINE Main\nCLASS_BEGIN\n";
        assert!(matches!(load(source), Err(LoadError::UnbalancedNesting { kind: "CLASS", .. })));
    }
}
