//! Type signatures (spec.md §6): single letters for primitives, `L<name>;`
//! for classes, `[T` for arrays of `T`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSignature {
    Void,
    Int,
    Long,
    Float,
    Double,
    Bool,
    Byte,
    Short,
    Char,
    Object(String),
    Array(Box<TypeSignature>),
}

impl TypeSignature {
    /// Parses a complete signature, rejecting trailing characters.
    pub fn parse(raw: &str) -> Result<TypeSignature, String> {
        let (signature, rest) = Self::parse_prefix(raw)?;
        if !rest.is_empty() {
            return Err(format!("trailing characters '{}' after type signature '{}'", rest, raw));
        }
        Ok(signature)
    }

    fn parse_prefix(s: &str) -> Result<(TypeSignature, &str), String> {
        let mut chars = s.chars();
        let first = chars.next().ok_or_else(|| "empty type signature".to_string())?;
        match first {
            'V' => Ok((TypeSignature::Void, &s[1..])),
            'I' => Ok((TypeSignature::Int, &s[1..])),
            'J' => Ok((TypeSignature::Long, &s[1..])),
            'F' => Ok((TypeSignature::Float, &s[1..])),
            'D' => Ok((TypeSignature::Double, &s[1..])),
            'Z' => Ok((TypeSignature::Bool, &s[1..])),
            'B' => Ok((TypeSignature::Byte, &s[1..])),
            'S' => Ok((TypeSignature::Short, &s[1..])),
            'C' => Ok((TypeSignature::Char, &s[1..])),
            'L' => {
                let end = s.find(';').ok_or_else(|| format!("class signature '{}' is missing its ';' terminator", s))?;
                let name = s[1..end].to_string();
                Ok((TypeSignature::Object(name), &s[end + 1..]))
            }
            '[' => {
                let (inner, rest) = Self::parse_prefix(&s[1..])?;
                Ok((TypeSignature::Array(Box::new(inner)), rest))
            }
            other => Err(format!("unrecognized type signature character '{}'", other)),
        }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Void => write!(f, "V"),
            TypeSignature::Int => write!(f, "I"),
            TypeSignature::Long => write!(f, "J"),
            TypeSignature::Float => write!(f, "F"),
            TypeSignature::Double => write!(f, "D"),
            TypeSignature::Bool => write!(f, "Z"),
            TypeSignature::Byte => write!(f, "B"),
            TypeSignature::Short => write!(f, "S"),
            TypeSignature::Char => write!(f, "C"),
            TypeSignature::Object(name) => write!(f, "L{};", name),
            TypeSignature::Array(inner) => write!(f, "[{}", inner),
        }
    }
}

/// Joins a parameter list into the comma-separated form used in duplicate
/// signature diagnostics (spec.md §8 S5).
pub fn join_signatures(signatures: &[TypeSignature]) -> String {
    signatures
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn primitives_round_trip() {
        for raw in ["V", "I", "J", "F", "D", "Z", "B", "S", "C"] {
            let parsed = TypeSignature::parse(raw).unwrap();
            assert_eq!(parsed.to_string(), raw);
        }
    }

    #[test]
    fn object_round_trips() {
        let parsed = TypeSignature::parse("LFoo/Bar;").unwrap();
        assert_eq!(parsed, TypeSignature::Object("Foo/Bar".to_string()));
        assert_eq!(parsed.to_string(), "LFoo/Bar;");
    }

    #[test]
    fn nested_array_round_trips() {
        let parsed = TypeSignature::parse("[[I").unwrap();
        assert_eq!(parsed.to_string(), "[[I");
    }

    #[test]
    fn trailing_characters_are_rejected() {
        assert!(TypeSignature::parse("II").is_err());
    }
}
