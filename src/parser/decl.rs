//! Declaration parsing: packages, imports, type/method/field dispatch,
//! modifiers, generics, array dimensions, and varargs (spec.md §4.3).

use crate::ast::{FieldDecl, MethodDecl, MultiFieldDecl, Node, Param, TypeDecl};
use crate::error::ParseError;
use crate::token::{Token, TokenKind};

use super::Parser;

/// The full recognized modifier vocabulary (spec.md §6). Which subset is
/// legal for a given declaration depends on [`ModifierScope`].
const ALL_MODIFIER_WORDS: &[&str] = &[
    "public",
    "private",
    "protected",
    "static",
    "final",
    "abstract",
    "native",
    "synchronized",
    "default",
    "volatile",
    "transient",
];

const TYPE_MODIFIERS: &[&str] = &[
    "public",
    "private",
    "protected",
    "static",
    "final",
    "abstract",
];
const FIELD_MODIFIERS: &[&str] = TYPE_MODIFIERS;
const METHOD_MODIFIERS: &[&str] = &[
    "public",
    "private",
    "protected",
    "static",
    "final",
    "abstract",
    "native",
    "synchronized",
];

/// Which declaration kind a modifier prefix is attached to; determines the
/// legal modifier subset (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierScope {
    Type,
    Method,
    Field,
}

impl ModifierScope {
    fn allowed(self) -> &'static [&'static str] {
        match self {
            ModifierScope::Type => TYPE_MODIFIERS,
            ModifierScope::Method => METHOD_MODIFIERS,
            ModifierScope::Field => FIELD_MODIFIERS,
        }
    }
}

const TYPE_KEYWORDS: &[&str] = &["class", "struct", "enum", "interface", "@interface"];

impl Parser {
    /// The top-level (and, recursively, type-body) dispatch: package and
    /// import declarations, then a modifier prefix followed by either a
    /// type keyword or a `<type> <name>` pair disambiguated into a method
    /// or a field by the token that follows the name (spec.md §4.3).
    pub(crate) fn dispatch_top_level(&mut self) -> Result<Node, ParseError> {
        let current = self.cursor.peek().clone();

        if current.kind == TokenKind::Keyword && current.value == "package" {
            return self.next_package();
        }
        if current.kind == TokenKind::Keyword && current.value == "import" {
            return self.next_import();
        }

        let raw_modifiers = self.parse_raw_modifier_prefix()?;

        let current = self.cursor.peek().clone();
        if current.kind == TokenKind::Keyword && TYPE_KEYWORDS.contains(&current.value.as_str()) {
            let modifiers = self.validate_modifiers(raw_modifiers, ModifierScope::Type)?;
            return self.next_type(modifiers);
        }

        self.next_method_or_field(raw_modifiers)
    }

    /// Consumes the maximal prefix of recognized modifier words regardless
    /// of the eventual declaration kind; the kind-specific subset is
    /// enforced once that kind is known (see [`Parser::validate_modifiers`]).
    fn parse_raw_modifier_prefix(&mut self) -> Result<Vec<(String, usize)>, ParseError> {
        let mut modifiers = Vec::new();
        loop {
            let token = self.cursor.peek().clone();
            if token.kind == TokenKind::Keyword && ALL_MODIFIER_WORDS.contains(&token.value.as_str()) {
                modifiers.push((token.value.clone(), self.cursor.position()));
                self.cursor.skip(1);
            } else {
                break;
            }
        }
        Ok(modifiers)
    }

    fn validate_modifiers(
        &self,
        raw: Vec<(String, usize)>,
        scope: ModifierScope,
    ) -> Result<Vec<String>, ParseError> {
        let allowed = scope.allowed();
        for (word, position) in &raw {
            if !allowed.contains(&word.as_str()) {
                return Err(ParseError::UnknownModifier {
                    word: word.clone(),
                    position: *position,
                });
            }
        }
        Ok(raw.into_iter().map(|(word, _)| word).collect())
    }

    fn next_package(&mut self) -> Result<Node, ParseError> {
        self.cursor.get_literal(TokenKind::Keyword, "package")?;
        let name = self.parse_qualified_name()?;
        self.cursor.get_kind(TokenKind::Terminator)?;
        Ok(Node::Package(name))
    }

    fn next_import(&mut self) -> Result<Node, ParseError> {
        self.cursor.get_literal(TokenKind::Keyword, "import")?;
        let name = self.parse_qualified_name()?;
        self.cursor.get_kind(TokenKind::Terminator)?;
        Ok(Node::Import(name))
    }

    fn parse_qualified_name(&mut self) -> Result<String, ParseError> {
        let mut parts = vec![self.cursor.get_kind(TokenKind::Identifier)?.value];
        while self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "." {
            self.cursor.skip(1);
            parts.push(self.cursor.get_kind(TokenKind::Identifier)?.value);
        }
        Ok(parts.join("."))
    }

    /// Parses a `<...>` generic segment, balancing angle brackets, and
    /// returns the raw tokens inside. Returns an empty list if no `<` is
    /// present — generics are optional everywhere they appear.
    pub(crate) fn parse_generics(&mut self) -> Result<Vec<Token>, ParseError> {
        if !(self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "<") {
            return Ok(Vec::new());
        }
        self.cursor.skip(1);

        let mut depth = 1;
        let mut collected = Vec::new();
        loop {
            let token = self.cursor.peek().clone();
            if token.kind == TokenKind::Eof {
                return Err(ParseError::UnmatchedBracket {
                    position: self.cursor.position(),
                });
            }
            if token.kind == TokenKind::Operator && token.value == "<" {
                depth += 1;
                self.cursor.skip(1);
                collected.push(token);
                continue;
            }
            if token.kind == TokenKind::Operator && token.value == ">" {
                depth -= 1;
                self.cursor.skip(1);
                if depth == 0 {
                    return Ok(collected);
                }
                collected.push(token);
                continue;
            }
            self.cursor.skip(1);
            collected.push(token);
        }
    }

    /// Convenience over [`Parser::parse_generics`] that keeps only the
    /// identifier names (dropping separating commas).
    pub(crate) fn parse_generic_names(&mut self) -> Result<Vec<String>, ParseError> {
        let tokens = self.parse_generics()?;
        Ok(tokens
            .into_iter()
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.value)
            .collect())
    }

    /// Counts trailing `[]` pairs, returning the array dimension.
    pub(crate) fn parse_array(&mut self) -> Result<u32, ParseError> {
        let mut dimensions = 0;
        loop {
            let is_open = self.cursor.peek().kind == TokenKind::Open && self.cursor.peek().value == "[";
            if !is_open {
                break;
            }
            let next = self.cursor.at(self.cursor.position() + 1).clone();
            if next.kind == TokenKind::Close && next.value == "]" {
                self.cursor.skip(2);
                dimensions += 1;
            } else {
                break;
            }
        }
        Ok(dimensions)
    }

    /// Peeks (and, if present, consumes) a trailing `...` varargs marker.
    pub(crate) fn test_varargs(&mut self) -> bool {
        if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "..." {
            self.cursor.skip(1);
            true
        } else {
            false
        }
    }

    fn next_type(&mut self, modifiers: Vec<String>) -> Result<Node, ParseError> {
        let keyword = self.cursor.get().value;
        let name = self.cursor.get_kind(TokenKind::Identifier)?.value;
        let generics = self.parse_generic_names()?;

        let mut super_name = None;
        if self.cursor.peek().kind == TokenKind::Keyword && self.cursor.peek().value == "extends" {
            self.cursor.skip(1);
            super_name = Some(self.cursor.get_kind(TokenKind::Identifier)?.value);
        }

        let mut interfaces = Vec::new();
        if self.cursor.peek().kind == TokenKind::Keyword && self.cursor.peek().value == "implements" {
            self.cursor.skip(1);
            interfaces.push(self.cursor.get_kind(TokenKind::Identifier)?.value);
            while self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "," {
                self.cursor.skip(1);
                interfaces.push(self.cursor.get_kind(TokenKind::Identifier)?.value);
            }
        }

        // A `struct` immediately followed by `(` is a TupleStruct: its
        // member list is a parenthesized parameter list rather than a
        // brace-delimited body (spec.md's ambiguous struct/TupleStruct
        // disambiguation).
        if keyword == "struct" && self.cursor.peek().kind == TokenKind::Open && self.cursor.peek().value == "(" {
            let members = self.parse_tuple_struct_members()?;
            self.cursor.get_kind(TokenKind::Terminator)?;
            return Ok(Node::TupleStruct(TypeDecl {
                name,
                modifiers,
                generics,
                super_name,
                interfaces,
                members,
            }));
        }

        self.cursor.get_literal(TokenKind::Open, "{")?;
        let mut members = Vec::new();
        while !(self.cursor.peek().kind == TokenKind::Close && self.cursor.peek().value == "}") {
            if self.cursor.peek().kind == TokenKind::Eof {
                break;
            }
            members.push(self.next_content());
        }
        self.cursor.get_literal(TokenKind::Close, "}")?;

        let decl = TypeDecl {
            name,
            modifiers,
            generics,
            super_name,
            interfaces,
            members,
        };
        Ok(match keyword.as_str() {
            "class" => Node::Class(decl),
            "enum" => Node::Enum(decl),
            "interface" => Node::Interface(decl),
            "@interface" => Node::Annotation(decl),
            _ => Node::Struct(decl),
        })
    }

    fn parse_tuple_struct_members(&mut self) -> Result<Vec<Node>, ParseError> {
        self.cursor.get_literal(TokenKind::Open, "(")?;
        let mut members = Vec::new();
        while !(self.cursor.peek().kind == TokenKind::Close && self.cursor.peek().value == ")") {
            let ty = self.cursor.get_kind(TokenKind::Type)?;
            let name = self.cursor.get_kind(TokenKind::Identifier)?.value;
            members.push(Node::Field(FieldDecl {
                modifiers: Vec::new(),
                ty,
                name,
                value: None,
            }));
            if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "," {
                self.cursor.skip(1);
            } else {
                break;
            }
        }
        self.cursor.get_literal(TokenKind::Close, ")")?;
        Ok(members)
    }

    fn next_method_or_field(&mut self, raw_modifiers: Vec<(String, usize)>) -> Result<Node, ParseError> {
        let ty = self.cursor.get_kind(TokenKind::Type)?;
        let name = self.cursor.get_kind(TokenKind::Identifier)?.value;

        let is_method = self.cursor.peek().kind == TokenKind::Open && self.cursor.peek().value == "(";
        if is_method {
            let modifiers = self.validate_modifiers(raw_modifiers, ModifierScope::Method)?;
            self.next_method(modifiers, ty, name)
        } else {
            let modifiers = self.validate_modifiers(raw_modifiers, ModifierScope::Field)?;
            self.next_field(modifiers, ty, name)
        }
    }

    fn next_method(&mut self, modifiers: Vec<String>, return_type: Token, name: String) -> Result<Node, ParseError> {
        self.cursor.get_literal(TokenKind::Open, "(")?;
        let mut parameters = Vec::new();
        let mut varargs = false;
        while !(self.cursor.peek().kind == TokenKind::Close && self.cursor.peek().value == ")") {
            let param_type = self.cursor.get_kind(TokenKind::Type)?;
            let param_name = self.cursor.get_kind(TokenKind::Identifier)?.value;
            if self.test_varargs() {
                varargs = true;
            }
            parameters.push(Param {
                ty: param_type,
                name: param_name,
            });
            if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "," {
                self.cursor.skip(1);
            } else {
                break;
            }
        }
        self.cursor.get_literal(TokenKind::Close, ")")?;

        let body = if self.cursor.peek().kind == TokenKind::Terminator {
            self.cursor.skip(1);
            Vec::new()
        } else {
            self.cursor.get_literal(TokenKind::Open, "{")?;
            let mut statements = Vec::new();
            while !(self.cursor.peek().kind == TokenKind::Close && self.cursor.peek().value == "}") {
                if self.cursor.peek().kind == TokenKind::Eof {
                    break;
                }
                statements.push(self.next_statement());
            }
            self.cursor.get_literal(TokenKind::Close, "}")?;
            statements
        };

        Ok(Node::Method(MethodDecl {
            modifiers,
            return_type,
            name,
            generics: Vec::new(),
            parameters,
            body,
            varargs,
        }))
    }

    fn next_field(&mut self, modifiers: Vec<String>, ty: Token, name: String) -> Result<Node, ParseError> {
        if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "," {
            return self.next_multi_field(modifiers, ty, name);
        }

        let value = if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "=" {
            self.cursor.skip(1);
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        self.cursor.get_kind(TokenKind::Terminator)?;
        Ok(Node::Field(FieldDecl {
            modifiers,
            ty,
            name,
            value,
        }))
    }

    fn next_multi_field(&mut self, modifiers: Vec<String>, ty: Token, first_name: String) -> Result<Node, ParseError> {
        let mut entries = Vec::new();
        let mut name = first_name;
        loop {
            let value = if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "=" {
                self.cursor.skip(1);
                Some(self.parse_expression()?)
            } else {
                None
            };
            entries.push((name, value));

            if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "," {
                self.cursor.skip(1);
                name = self.cursor.get_kind(TokenKind::Identifier)?.value;
            } else {
                break;
            }
        }
        self.cursor.get_kind(TokenKind::Terminator)?;
        Ok(Node::MultiField(MultiFieldDecl {
            modifiers,
            ty,
            entries,
        }))
    }
}
