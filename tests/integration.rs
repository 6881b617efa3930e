//! End-to-end scenarios across the parser, loader, and VM (spec.md §8
//! "End-to-end scenarios" S1-S6).

use langkit::ast::Node;
use langkit::bytecode;
use langkit::error::LoadError;
use langkit::token::{Token, TokenKind};
use langkit::vm::{Value, VirtualMachine, VmConfig};

fn tok(kind: TokenKind, value: &str) -> Token {
    Token::new(kind, value)
}

fn wrap_method_body(tokens: Vec<Token>) -> Vec<Token> {
    let mut all = vec![
        tok(TokenKind::Type, "int"),
        tok(TokenKind::Identifier, "f"),
        tok(TokenKind::Open, "("),
        tok(TokenKind::Close, ")"),
        tok(TokenKind::Open, "{"),
        tok(TokenKind::Keyword, "return"),
    ];
    all.extend(tokens);
    all.push(tok(TokenKind::Terminator, ";"));
    all.push(tok(TokenKind::Close, "}"));
    all
}

fn method_return_expression(nodes: &[Node]) -> &Node {
    match &nodes[0] {
        Node::Method(method) => match &method.body[0] {
            Node::Return(Some(expr)) => expr.as_ref(),
            other => panic!("expected Return(Some(..)), found {:?}", other),
        },
        other => panic!("expected Method, found {:?}", other),
    }
}

#[test]
fn s1_precedence_over_addition_multiplication_and_power() {
    // 1 + 2 * 3 ^ 2 => Operation(+, 1, Operation(*, 2, Operation(^, 3, 2)))
    let tokens = wrap_method_body(vec![
        tok(TokenKind::Integer, "1"),
        tok(TokenKind::Operator, "+"),
        tok(TokenKind::Integer, "2"),
        tok(TokenKind::Operator, "*"),
        tok(TokenKind::Integer, "3"),
        tok(TokenKind::Operator, "^"),
        tok(TokenKind::Integer, "2"),
    ]);

    let nodes = langkit::parse(tokens);
    assert!(nodes.last().unwrap().is_finish());

    let expr = method_return_expression(&nodes);
    let expected = Node::operation(
        Node::Value(tok(TokenKind::Integer, "1")),
        "+",
        Node::operation(
            Node::Value(tok(TokenKind::Integer, "2")),
            "*",
            Node::operation(Node::Value(tok(TokenKind::Integer, "3")), "^", Node::Value(tok(TokenKind::Integer, "2"))),
        ),
    );
    assert_eq!(expr, &expected);
}

#[test]
fn s2_power_is_right_associative() {
    // 2 ^ 3 ^ 2 => Operation(^, 2, Operation(^, 3, 2))
    let tokens = wrap_method_body(vec![
        tok(TokenKind::Integer, "2"),
        tok(TokenKind::Operator, "^"),
        tok(TokenKind::Integer, "3"),
        tok(TokenKind::Operator, "^"),
        tok(TokenKind::Integer, "2"),
    ]);

    let nodes = langkit::parse(tokens);
    let expr = method_return_expression(&nodes);
    let expected = Node::operation(
        Node::Value(tok(TokenKind::Integer, "2")),
        "^",
        Node::operation(Node::Value(tok(TokenKind::Integer, "3")), "^", Node::Value(tok(TokenKind::Integer, "2"))),
    );
    assert_eq!(expr, &expected);
}

#[test]
fn s3_public_static_method_declaration() {
    // public static int add(int a, int b) { return a + b; }
    let tokens = vec![
        tok(TokenKind::Keyword, "public"),
        tok(TokenKind::Keyword, "static"),
        tok(TokenKind::Type, "int"),
        tok(TokenKind::Identifier, "add"),
        tok(TokenKind::Open, "("),
        tok(TokenKind::Type, "int"),
        tok(TokenKind::Identifier, "a"),
        tok(TokenKind::Operator, ","),
        tok(TokenKind::Type, "int"),
        tok(TokenKind::Identifier, "b"),
        tok(TokenKind::Close, ")"),
        tok(TokenKind::Open, "{"),
        tok(TokenKind::Keyword, "return"),
        tok(TokenKind::Identifier, "a"),
        tok(TokenKind::Operator, "+"),
        tok(TokenKind::Identifier, "b"),
        tok(TokenKind::Terminator, ";"),
        tok(TokenKind::Close, "}"),
    ];

    let nodes = langkit::parse(tokens);
    match &nodes[0] {
        Node::Method(method) => {
            assert_eq!(method.modifiers, vec!["public".to_string(), "static".to_string()]);
            assert_eq!(method.return_type, tok(TokenKind::Type, "int"));
            assert_eq!(method.name, "add");
            assert_eq!(method.parameters.len(), 2);
            assert_eq!(method.parameters[0].name, "a");
            assert_eq!(method.parameters[1].name, "b");
            assert_eq!(
                method.body[0],
                Node::Return(Some(Box::new(Node::operation(
                    Node::Value(tok(TokenKind::Identifier, "a")),
                    "+",
                    Node::Value(tok(TokenKind::Identifier, "b")),
                ))))
            );
        }
        other => panic!("expected Method, found {:?}", other),
    }
}

#[test]
fn s4_nested_class_separator_depends_on_static() {
    let static_source = r#"
CLASS_DEFINE Outer
CLASS_BEGIN
CLASS_DEFINE Inner
CLASS_MODIFIER static
CLASS_BEGIN
CLASS_END
CLASS_END
"#;
    let classes = bytecode::load(static_source).unwrap();
    assert!(classes.iter().any(|c| c.name == "Outer.Inner"));

    let instance_source = r#"
CLASS_DEFINE Outer
CLASS_BEGIN
CLASS_DEFINE Inner
CLASS_BEGIN
CLASS_END
CLASS_END
"#;
    let classes = bytecode::load(instance_source).unwrap();
    assert!(classes.iter().any(|c| c.name == "Outer$Inner"));
}

#[test]
fn s5_duplicate_method_signature_is_fatal() {
    let source = r#"
CLASS_DEFINE Main
CLASS_BEGIN
METHOD_DEFINE add
METHOD_RETURN_TYPE I
METHOD_PARAMETERS I I
METHOD_BEGIN
IRETURN
METHOD_END
METHOD_DEFINE add
METHOD_RETURN_TYPE I
METHOD_PARAMETERS I I
METHOD_BEGIN
IRETURN
METHOD_END
CLASS_END
"#;
    let error = bytecode::load(source).unwrap_err();
    assert!(matches!(error, LoadError::DuplicateMethod { .. }));
}

#[test]
fn s6_instruction_execution_adds_two_integers() {
    let source = r#"
CLASS_DEFINE Main
CLASS_BEGIN
METHOD_DEFINE f
METHOD_MODIFIER public
METHOD_MODIFIER static
METHOD_RETURN_TYPE I
METHOD_BEGIN
IPUSH 3
IPUSH 4
IADD
IRETURN
METHOD_END
CLASS_END
"#;
    let classes = bytecode::load(source).unwrap();
    let mut vm = VirtualMachine::new(VmConfig::default());
    for class in classes {
        vm.register_class(class).unwrap();
    }
    vm.initialize().unwrap();

    let result = vm.execute_method("Main", "f", &[], Vec::new()).unwrap();
    assert_eq!(result, Some(Value::Int(7)));
}

#[test]
fn error_survival_law_reaches_finish_after_a_malformed_token() {
    // A stray top-level Close `}` with nothing to close is not a valid
    // start of any declaration; the parser should still reach Finish.
    let tokens = vec![tok(TokenKind::Close, "}")];
    let nodes = langkit::parse(tokens);
    assert!(nodes.iter().any(Node::is_error));
    assert!(nodes.last().unwrap().is_finish());
    assert_eq!(nodes.iter().filter(|n| n.is_finish()).count(), 1);
}

