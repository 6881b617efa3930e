//! Statement parsing: locals, assignment, control flow, and the
//! expression-statement fallback (spec.md §4.3).

use crate::ast::{Branch, Node};
use crate::error::ParseError;
use crate::token::TokenKind;

use super::Parser;

impl Parser {
    /// Parses one statement inside a method or block body, recovering to
    /// the next statement boundary on error rather than aborting (spec.md
    /// §4.3, §7).
    pub(crate) fn next_statement(&mut self) -> Node {
        match self.parse_statement() {
            Ok(node) => node,
            Err(error) => self.recover(error),
        }
    }

    fn parse_statement(&mut self) -> Result<Node, ParseError> {
        let current = self.cursor.peek().clone();

        if current.kind == TokenKind::Keyword {
            match current.value.as_str() {
                "if" => return self.parse_if(),
                "while" => return self.parse_while(),
                "do" => return self.parse_do_while(),
                "for" => return self.parse_for(),
                "return" => return self.parse_return(),
                "defer" => return self.parse_defer(),
                _ => {}
            }
        }

        if current.kind == TokenKind::Type {
            return self.parse_local_declare();
        }

        if current.kind == TokenKind::Identifier {
            let next = self.cursor.at(self.cursor.position() + 1).clone();
            if next.kind == TokenKind::Operator && next.value == "=" {
                let name = self.cursor.get_kind(TokenKind::Identifier)?.value;
                self.cursor.get_literal(TokenKind::Operator, "=")?;
                let value = self.parse_expression()?;
                self.cursor.get_kind(TokenKind::Terminator)?;
                return Ok(Node::LocalAssign {
                    name,
                    value: Box::new(value),
                });
            }
        }

        let expr = self.parse_expression()?;
        self.cursor.get_kind(TokenKind::Terminator)?;
        Ok(expr)
    }

    fn parse_local_declare(&mut self) -> Result<Node, ParseError> {
        let current = self.cursor.peek().clone();
        let after = self.cursor.at(self.cursor.position() + 1).clone();

        if current.value == "var" && after.kind == TokenKind::Open && after.value == "(" {
            self.cursor.skip(1);
            self.cursor.get_literal(TokenKind::Open, "(")?;
            let mut names = vec![self.cursor.get_kind(TokenKind::Identifier)?.value];
            while self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "," {
                self.cursor.skip(1);
                names.push(self.cursor.get_kind(TokenKind::Identifier)?.value);
            }
            self.cursor.get_literal(TokenKind::Close, ")")?;
            self.cursor.get_literal(TokenKind::Operator, "=")?;
            let value = self.parse_expression()?;
            self.cursor.get_kind(TokenKind::Terminator)?;
            return Ok(Node::LocalDeclareDestructure {
                names,
                value: Box::new(value),
            });
        }

        let ty = self.cursor.get_kind(TokenKind::Type)?;
        let name = self.cursor.get_kind(TokenKind::Identifier)?.value;

        if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "," {
            let mut names = vec![name];
            while self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "," {
                self.cursor.skip(1);
                names.push(self.cursor.get_kind(TokenKind::Identifier)?.value);
            }
            self.cursor.get_kind(TokenKind::Terminator)?;
            return Ok(Node::MultiLocalDeclare { ty, names });
        }

        if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "=" {
            self.cursor.skip(1);
            let value = self.parse_expression()?;
            self.cursor.get_kind(TokenKind::Terminator)?;
            return Ok(Node::LocalDeclareAssign {
                ty,
                name,
                value: Box::new(value),
            });
        }

        self.cursor.get_kind(TokenKind::Terminator)?;
        Ok(Node::LocalDeclare { ty, name })
    }

    pub(crate) fn parse_block(&mut self) -> Result<Vec<Node>, ParseError> {
        self.cursor.get_literal(TokenKind::Open, "{")?;
        let mut statements = Vec::new();
        while !(self.cursor.peek().kind == TokenKind::Close && self.cursor.peek().value == "}") {
            if self.cursor.peek().kind == TokenKind::Eof {
                break;
            }
            statements.push(self.next_statement());
        }
        self.cursor.get_literal(TokenKind::Close, "}")?;
        Ok(statements)
    }

    fn parse_if(&mut self) -> Result<Node, ParseError> {
        self.cursor.get_literal(TokenKind::Keyword, "if")?;
        self.cursor.get_literal(TokenKind::Open, "(")?;
        let condition = self.parse_expression()?;
        self.cursor.get_literal(TokenKind::Close, ")")?;
        let body = self.parse_block()?;
        let or_else = self.parse_else_tail()?;
        Ok(Node::If(Branch {
            condition: Box::new(condition),
            body,
            or_else,
        }))
    }

    fn parse_elseif(&mut self) -> Result<Node, ParseError> {
        self.cursor.get_literal(TokenKind::Keyword, "if")?;
        self.cursor.get_literal(TokenKind::Open, "(")?;
        let condition = self.parse_expression()?;
        self.cursor.get_literal(TokenKind::Close, ")")?;
        let body = self.parse_block()?;
        let or_else = self.parse_else_tail()?;
        Ok(Node::ElseIf(Branch {
            condition: Box::new(condition),
            body,
            or_else,
        }))
    }

    fn parse_else_tail(&mut self) -> Result<Option<Box<Node>>, ParseError> {
        if !(self.cursor.peek().kind == TokenKind::Keyword && self.cursor.peek().value == "else") {
            return Ok(None);
        }
        self.cursor.skip(1);
        if self.cursor.peek().kind == TokenKind::Keyword && self.cursor.peek().value == "if" {
            return Ok(Some(Box::new(self.parse_elseif()?)));
        }
        let body = self.parse_block()?;
        Ok(Some(Box::new(Node::Else(body))))
    }

    fn parse_while(&mut self) -> Result<Node, ParseError> {
        self.cursor.get_literal(TokenKind::Keyword, "while")?;
        self.cursor.get_literal(TokenKind::Open, "(")?;
        let condition = self.parse_expression()?;
        self.cursor.get_literal(TokenKind::Close, ")")?;
        let body = self.parse_block()?;
        Ok(Node::While {
            condition: Box::new(condition),
            body,
        })
    }

    fn parse_do_while(&mut self) -> Result<Node, ParseError> {
        self.cursor.get_literal(TokenKind::Keyword, "do")?;
        let body = self.parse_block()?;
        self.cursor.get_literal(TokenKind::Keyword, "while")?;
        self.cursor.get_literal(TokenKind::Open, "(")?;
        let condition = self.parse_expression()?;
        self.cursor.get_literal(TokenKind::Close, ")")?;
        self.cursor.get_kind(TokenKind::Terminator)?;
        Ok(Node::DoWhile {
            condition: Box::new(condition),
            body,
        })
    }

    /// Tries a `for each` reading first — `for (Type name in iterable)` —
    /// backtracking to a classic C-style `for` on mismatch (spec.md §4.3).
    fn parse_for(&mut self) -> Result<Node, ParseError> {
        self.cursor.get_literal(TokenKind::Keyword, "for")?;
        self.cursor.get_literal(TokenKind::Open, "(")?;

        let checkpoint = self.cursor.position();
        if let Ok(node) = self.try_parse_for_each() {
            return Ok(node);
        }
        self.cursor.reset(checkpoint);

        let init = self.parse_for_init()?;
        self.cursor.get_kind(TokenKind::Terminator)?;
        let condition = if self.cursor.peek().kind == TokenKind::Terminator {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.cursor.get_kind(TokenKind::Terminator)?;
        let update = self.parse_for_update()?;
        self.cursor.get_literal(TokenKind::Close, ")")?;
        let body = self.parse_block()?;
        Ok(Node::For {
            init,
            condition,
            update,
            body,
        })
    }

    fn try_parse_for_each(&mut self) -> Result<Node, ParseError> {
        let declared_type = self.cursor.get_kind(TokenKind::Type)?;
        let name = self.cursor.get_kind(TokenKind::Identifier)?.value;
        self.cursor.get_literal(TokenKind::Keyword, "in")?;
        let iterable = self.parse_expression()?;
        self.cursor.get_literal(TokenKind::Close, ")")?;
        let body = self.parse_block()?;
        Ok(Node::ForEach {
            declared_type: Some(declared_type),
            name,
            iterable: Box::new(iterable),
            body,
        })
    }

    fn parse_for_init(&mut self) -> Result<Option<Box<Node>>, ParseError> {
        if self.cursor.peek().kind == TokenKind::Terminator {
            return Ok(None);
        }
        if self.cursor.peek().kind == TokenKind::Type {
            let ty = self.cursor.get_kind(TokenKind::Type)?;
            let name = self.cursor.get_kind(TokenKind::Identifier)?.value;
            if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "=" {
                self.cursor.skip(1);
                let value = self.parse_expression()?;
                return Ok(Some(Box::new(Node::LocalDeclareAssign {
                    ty,
                    name,
                    value: Box::new(value),
                })));
            }
            return Ok(Some(Box::new(Node::LocalDeclare { ty, name })));
        }
        let expr = self.parse_expression()?;
        Ok(Some(Box::new(expr)))
    }

    fn parse_for_update(&mut self) -> Result<Option<Box<Node>>, ParseError> {
        if self.cursor.peek().kind == TokenKind::Close {
            return Ok(None);
        }
        let expr = self.parse_expression()?;
        Ok(Some(Box::new(expr)))
    }

    fn parse_return(&mut self) -> Result<Node, ParseError> {
        self.cursor.get_literal(TokenKind::Keyword, "return")?;
        if self.cursor.peek().kind == TokenKind::Terminator {
            self.cursor.skip(1);
            return Ok(Node::Return(None));
        }
        let value = self.parse_expression()?;
        self.cursor.get_kind(TokenKind::Terminator)?;
        Ok(Node::Return(Some(Box::new(value))))
    }

    fn parse_defer(&mut self) -> Result<Node, ParseError> {
        self.cursor.get_literal(TokenKind::Keyword, "defer")?;
        let deferred = self.next_statement();
        Ok(Node::Defer(Box::new(deferred)))
    }
}
