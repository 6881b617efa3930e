//! Expression parsing: primaries, prefix/postfix operators, and the binary
//! operator draft fed into [`super::precedence::fix_operation_tree`]
//! (spec.md §4.2, §4.3).

use crate::ast::{ConstructKind, Node, NewExpr, Param};
use crate::error::ParseError;
use crate::token::{Token, TokenKind};

use super::precedence;
use super::Parser;

const PREFIX_OPERATORS: &[&str] = &["-", "!", "++", "--"];
const POSTFIX_OPERATORS: &[&str] = &["++", "--"];

impl Parser {
    /// Parses one expression: a left-leaning draft of primaries joined by
    /// binary operators, rewritten to respect precedence.
    pub(crate) fn parse_expression(&mut self) -> Result<Node, ParseError> {
        let draft = self.parse_operation_draft()?;
        precedence::fix_operation_tree(draft)
    }

    fn parse_operation_draft(&mut self) -> Result<Node, ParseError> {
        let mut left = self.parse_unary()?;
        while self.cursor.peek().kind == TokenKind::Operator
            && precedence::operator_info(&self.cursor.peek().value).is_ok()
        {
            let operator = self.cursor.get().value;
            let right = self.parse_unary()?;
            left = Node::operation(left, operator, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        let current = self.cursor.peek().clone();
        if current.kind == TokenKind::Operator && PREFIX_OPERATORS.contains(&current.value.as_str()) {
            self.cursor.skip(1);
            let operand = self.parse_unary()?;
            return Ok(Node::SideOperation {
                operator: current.value,
                operand: Box::new(operand),
                prefix: true,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Node, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            let current = self.cursor.peek().clone();
            if current.kind == TokenKind::Operator && POSTFIX_OPERATORS.contains(&current.value.as_str()) {
                self.cursor.skip(1);
                expr = Node::SideOperation {
                    operator: current.value,
                    operand: Box::new(expr),
                    prefix: false,
                };
                continue;
            }
            break;
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let current = self.cursor.peek().clone();
        match current.kind {
            TokenKind::Integer | TokenKind::Float => {
                self.cursor.skip(1);
                Ok(Node::Value(current))
            }
            TokenKind::String => {
                self.cursor.skip(1);
                if current.value.contains("${") {
                    Ok(Node::Template(current))
                } else {
                    Ok(Node::Value(current))
                }
            }
            TokenKind::Keyword if current.value == "true" || current.value == "false" || current.value == "null" => {
                self.cursor.skip(1);
                Ok(Node::Value(current))
            }
            TokenKind::Keyword if current.value == "new" => self.parse_new(),
            TokenKind::Open if current.value == "(" => self.parse_paren_or_tuple(),
            TokenKind::Identifier => self.parse_identifier_led(),
            _ => Err(ParseError::UnexpectedToken {
                found: current,
                position: self.cursor.position(),
            }),
        }
    }

    fn parse_identifier_led(&mut self) -> Result<Node, ParseError> {
        let name = self.cursor.get_kind(TokenKind::Identifier)?.value;
        let current = self.cursor.peek().clone();

        if current.kind == TokenKind::Open && current.value == "(" {
            self.cursor.skip(1);
            let arguments = self.parse_arguments(")")?;
            self.cursor.get_literal(TokenKind::Close, ")")?;
            return Ok(Node::MethodCall {
                callee: name,
                arguments,
            });
        }

        if current.kind == TokenKind::Open && current.value == "[" {
            self.cursor.skip(1);
            let index = self.parse_expression()?;
            self.cursor.get_literal(TokenKind::Close, "]")?;
            if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "=" {
                self.cursor.skip(1);
                let value = self.parse_expression()?;
                return Ok(Node::IndexAssign {
                    container: name,
                    index: Box::new(index),
                    value: Box::new(value),
                });
            }
            return Ok(Node::IndexFetch {
                container: name,
                index: Box::new(index),
            });
        }

        if current.kind == TokenKind::Operator && current.value == "->" {
            self.cursor.skip(1);
            let body = self.parse_expression()?;
            return Ok(Node::Lambda {
                parameters: vec![Param {
                    ty: Token::new(TokenKind::Type, "var"),
                    name,
                }],
                body: Box::new(body),
            });
        }

        Ok(Node::Value(Token::new(TokenKind::Identifier, name)))
    }

    fn parse_paren_or_tuple(&mut self) -> Result<Node, ParseError> {
        self.cursor.get_literal(TokenKind::Open, "(")?;

        if self.cursor.peek().kind == TokenKind::Close && self.cursor.peek().value == ")" {
            self.cursor.skip(1);
            return Ok(Node::Tuple(Vec::new()));
        }

        let first = self.parse_expression()?;

        if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "," {
            let mut items = vec![first];
            while self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "," {
                self.cursor.skip(1);
                items.push(self.parse_expression()?);
            }
            self.cursor.get_literal(TokenKind::Close, ")")?;
            return Ok(Node::Tuple(items));
        }

        self.cursor.get_literal(TokenKind::Close, ")")?;

        if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "->" {
            self.cursor.skip(1);
            let body = self.parse_expression()?;
            let name = match &first {
                Node::Value(token) => token.value.clone(),
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        found: self.cursor.peek().clone(),
                        position: self.cursor.position(),
                    })
                }
            };
            return Ok(Node::Lambda {
                parameters: vec![Param {
                    ty: Token::new(TokenKind::Type, "var"),
                    name,
                }],
                body: Box::new(body),
            });
        }

        Ok(Node::Group(Box::new(first)))
    }

    fn parse_new(&mut self) -> Result<Node, ParseError> {
        self.cursor.get_literal(TokenKind::Keyword, "new")?;
        let name = self.cursor.get_kind(TokenKind::Identifier)?.value;

        let arguments = if self.cursor.peek().kind == TokenKind::Open && self.cursor.peek().value == "(" {
            self.cursor.skip(1);
            let args = self.parse_arguments(")")?;
            self.cursor.get_literal(TokenKind::Close, ")")?;
            args
        } else {
            Vec::new()
        };

        let initializator = if self.cursor.peek().kind == TokenKind::Open && self.cursor.peek().value == "{" {
            Some(Box::new(self.parse_initializator()?))
        } else {
            None
        };

        Ok(Node::New(NewExpr {
            name,
            kind: ConstructKind::Default,
            arguments,
            initializator,
        }))
    }

    fn parse_initializator(&mut self) -> Result<Node, ParseError> {
        self.cursor.get_literal(TokenKind::Open, "{")?;
        let mut entries = Vec::new();
        while !(self.cursor.peek().kind == TokenKind::Close && self.cursor.peek().value == "}") {
            let name = self.cursor.get_kind(TokenKind::Identifier)?.value;
            if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == ":" {
                self.cursor.skip(1);
            } else {
                self.cursor.get_literal(TokenKind::Operator, "=")?;
            }
            let value = self.parse_expression()?;
            entries.push((name, value));
            if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "," {
                self.cursor.skip(1);
            } else {
                break;
            }
        }
        self.cursor.get_literal(TokenKind::Close, "}")?;
        Ok(Node::Initializator(entries))
    }

    fn parse_arguments(&mut self, closing: &str) -> Result<Vec<Node>, ParseError> {
        let mut arguments = Vec::new();
        while !(self.cursor.peek().kind == TokenKind::Close && self.cursor.peek().value == closing) {
            arguments.push(self.parse_expression()?);
            if self.cursor.peek().kind == TokenKind::Operator && self.cursor.peek().value == "," {
                self.cursor.skip(1);
            } else {
                break;
            }
        }
        Ok(arguments)
    }
}
