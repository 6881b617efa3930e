//! Operator precedence and the `fixOperationTree` rewrite (spec.md §4.2).
//!
//! The expression parser emits a left-leaning draft tree while consuming
//! primaries separated by binary operators; [`fix_operation_tree`] rewrites
//! that draft into the canonical precedence-respecting tree. The table
//! values match `examples/original_source/src/compiler/node/NodeParser.hpp`'s
//! `OPERATION_INFO` exactly.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::ast::Node;
use crate::error::ParseError;

/// `(precedence, right_associative)` for a binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorInfo {
    pub precedence: u8,
    pub right_associative: bool,
}

static OPERATION_INFO: Lazy<HashMap<&'static str, OperatorInfo>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        "+",
        OperatorInfo {
            precedence: 1,
            right_associative: false,
        },
    );
    table.insert(
        "-",
        OperatorInfo {
            precedence: 1,
            right_associative: false,
        },
    );
    table.insert(
        "*",
        OperatorInfo {
            precedence: 2,
            right_associative: false,
        },
    );
    table.insert(
        "/",
        OperatorInfo {
            precedence: 2,
            right_associative: false,
        },
    );
    table.insert(
        "%",
        OperatorInfo {
            precedence: 2,
            right_associative: false,
        },
    );
    table.insert(
        "^",
        OperatorInfo {
            precedence: 3,
            right_associative: true,
        },
    );
    table
});

/// Looks up an operator's precedence and associativity. Unknown operators
/// are a hard parse error — they are never silently treated as precedence 0
/// (spec.md §4.2).
pub fn operator_info(operator: &str) -> Result<OperatorInfo, ParseError> {
    OPERATION_INFO
        .get(operator)
        .copied()
        .ok_or_else(|| ParseError::UnknownOperator {
            operator: operator.to_string(),
            position: 0,
        })
}

/// `true` iff `a` binds tighter than `b`: `prec(a) > prec(b)`, or they're
/// equal and `a` is left-associative.
pub fn has_precedence(a: &str, b: &str) -> Result<bool, ParseError> {
    let info_a = operator_info(a)?;
    let info_b = operator_info(b)?;
    Ok(info_a.precedence > info_b.precedence
        || (info_a.precedence == info_b.precedence && !info_a.right_associative))
}

/// `true` iff `operator`, applied after `lop` in a left-leaning draft,
/// needs to migrate below `lop` to respect precedence: either `operator`
/// binds strictly tighter, or the two are the same right-associative
/// operator (`2 ^ 3 ^ 2` must nest as `2 ^ (3 ^ 2)`, not `(2 ^ 3) ^ 2`).
fn should_rotate(operator: &str, lop: &str) -> Result<bool, ParseError> {
    let info_op = operator_info(operator)?;
    let info_lop = operator_info(lop)?;
    Ok(info_op.precedence > info_lop.precedence
        || (info_op.precedence == info_lop.precedence && info_op.right_associative))
}

/// Rewrites a left-leaning draft `Operation` tree to respect operator
/// precedence.
///
/// The draft always nests its *left* child (`parse_operation_draft` builds
/// `left = Node::operation(left, operator, right)` as each operator/operand
/// pair arrives), so the rewrite walks the left spine rather than the
/// right one: once `left` has been fixed bottom-up, its top operator
/// (`lop`) is compared against this node's `operator`. If `operator` needs
/// to bind tighter than `lop` ([`should_rotate`]), the two swap places —
/// `lop` becomes the new root holding `operator`'s old right operand
/// nested one level deeper — and the result is re-fixed, since the newly
/// formed right-hand side may itself need further rotation against its
/// own left-leaning remnants. `Group`-wrapped sub-expressions are opaque:
/// their interior is never rotated into, and the rewrite never descends
/// past a non-`Operation` node.
pub fn fix_operation_tree(root: Node) -> Result<Node, ParseError> {
    match root {
        Node::Operation {
            left,
            operator,
            right,
        } => {
            let right = fix_operation_tree(*right)?;
            let left = fix_operation_tree(*left)?;

            if let Node::Operation {
                left: ll,
                operator: lop,
                right: lr,
            } = left
            {
                if should_rotate(&operator, &lop)? {
                    let new_right = Node::operation(*lr, operator, right);
                    let rotated = Node::operation(*ll, lop, new_right);
                    fix_operation_tree(rotated)
                } else {
                    Ok(Node::operation(Node::operation(*ll, lop, *lr), operator, right))
                }
            } else {
                Ok(Node::operation(left, operator, right))
            }
        }
        // SideOperation binds tighter than any binary operator and Group is
        // opaque to the fix-up; both pass through untouched, along with
        // every other node kind.
        other => Ok(other),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::{Token, TokenKind};

    fn value(n: i64) -> Node {
        Node::Value(Token::new(TokenKind::Integer, n.to_string()))
    }

    #[test]
    fn s1_left_assoc_mixed_precedence() {
        // 1 + 2 * 3 ^ 2 parsed left-leaning as (((1 + 2) * 3) ^ 2)
        let left_leaning = Node::operation(
            Node::operation(Node::operation(value(1), "+", value(2)), "*", value(3)),
            "^",
            value(2),
        );

        let fixed = fix_operation_tree(left_leaning).unwrap();
        let expected = Node::operation(
            value(1),
            "+",
            Node::operation(value(2), "*", Node::operation(value(3), "^", value(2))),
        );
        assert_eq!(fixed, expected);
    }

    #[test]
    fn s2_right_associative_power() {
        // 2 ^ 3 ^ 2 parsed left-leaning as ((2 ^ 3) ^ 2)
        let left_leaning = Node::operation(Node::operation(value(2), "^", value(3)), "^", value(2));
        let fixed = fix_operation_tree(left_leaning).unwrap();
        let expected = Node::operation(value(2), "^", Node::operation(value(3), "^", value(2)));
        assert_eq!(fixed, expected);
    }

    #[test]
    fn unknown_operator_is_an_error() {
        assert!(operator_info("~").is_err());
    }

    #[test]
    fn same_precedence_left_associative_stays_left_leaning() {
        // 1 - 2 + 3 parsed left-leaning as ((1 - 2) + 3), already canonical.
        let left_leaning = Node::operation(Node::operation(value(1), "-", value(2)), "+", value(3));
        let fixed = fix_operation_tree(left_leaning.clone()).unwrap();
        assert_eq!(fixed, left_leaning);
    }
}
