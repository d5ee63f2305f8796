#[cfg(test)]
mod parser_tests {
    use loxide as lox;

    use lox::ast::{Expr, Stmt};
    use lox::error::LoxError;
    use lox::parser::Parser;
    use lox::scanner::Scanner;
    use lox::token::{Token, TokenType};

    fn tokens(source: &str) -> Vec<Token> {
        Scanner::new(source).filter_map(Result::ok).collect()
    }

    fn parse(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        Parser::new(tokens(source)).parse()
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        statements
    }

    #[test]
    fn test_empty_program() {
        let statements = parse_ok("");
        assert!(statements.is_empty());
    }

    #[test]
    fn test_expression_statement() {
        let statements = parse_ok("1 + 2 * 3;");

        assert_eq!(statements.len(), 1);
        match &statements[0] {
            Stmt::Expression(Expr::Binary { op, right, .. }) => {
                assert_eq!(op.token_type, TokenType::PLUS);
                // Precedence: the multiplication hangs off the addition.
                assert!(matches!(**right, Expr::Binary { .. }));
            }
            other => panic!("expected binary expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_var_declaration_with_and_without_initializer() {
        let statements = parse_ok("var a = 1; var b;");

        assert_eq!(statements.len(), 2);
        assert!(matches!(
            &statements[0],
            Stmt::Var {
                initializer: Some(_),
                ..
            }
        ));
        assert!(matches!(
            &statements[1],
            Stmt::Var {
                initializer: None,
                ..
            }
        ));
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let statements = parse_ok("a = b = 1;");

        match &statements[0] {
            Stmt::Expression(Expr::Assign { value, .. }) => {
                assert!(matches!(**value, Expr::Assign { .. }));
            }
            other => panic!("expected nested assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_assignment_target_keeps_expression() {
        let (statements, errors) = parse("1 = 2;");

        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .contains("invalid assignment target."));

        // The left-hand side survives as an ordinary expression statement.
        assert_eq!(statements.len(), 1);
        assert!(matches!(
            &statements[0],
            Stmt::Expression(Expr::Literal { .. })
        ));
    }

    #[test]
    fn test_property_assignment_becomes_set() {
        let statements = parse_ok("obj.field = 1;");

        assert!(matches!(
            &statements[0],
            Stmt::Expression(Expr::Set { .. })
        ));
    }

    #[test]
    fn test_call_and_property_chains() {
        let statements = parse_ok("a.b(1, 2).c;");

        match &statements[0] {
            Stmt::Expression(Expr::Get { object, .. }) => {
                assert!(matches!(**object, Expr::Call { .. }));
            }
            other => panic!("expected get of a call, got {:?}", other),
        }
    }

    #[test]
    fn test_logical_operators_produce_logical_nodes() {
        let statements = parse_ok("a or b and c;");

        match &statements[0] {
            Stmt::Expression(Expr::Logical { op, right, .. }) => {
                assert_eq!(op.token_type, TokenType::OR);
                // `and` binds tighter than `or`.
                assert!(matches!(**right, Expr::Logical { .. }));
            }
            other => panic!("expected logical expression, got {:?}", other),
        }
    }

    #[test]
    fn test_if_with_else() {
        let statements = parse_ok("if (a) print 1; else print 2;");

        assert!(matches!(
            &statements[0],
            Stmt::If {
                else_branch: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_for_desugars_to_while() {
        let statements = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");

        // Block { Var, While { cond, Block { body, Expression(inc) } } }
        match &statements[0] {
            Stmt::Block(inner) => {
                assert_eq!(inner.len(), 2);
                assert!(matches!(&inner[0], Stmt::Var { .. }));

                match &inner[1] {
                    Stmt::While { body, .. } => match &**body {
                        Stmt::Block(loop_body) => {
                            assert_eq!(loop_body.len(), 2);
                            assert!(matches!(&loop_body[0], Stmt::Print(_)));
                            assert!(matches!(&loop_body[1], Stmt::Expression(_)));
                        }
                        other => panic!("expected desugared loop body block, got {:?}", other),
                    },
                    other => panic!("expected while loop, got {:?}", other),
                }
            }
            other => panic!("expected wrapping block, got {:?}", other),
        }
    }

    #[test]
    fn test_for_without_clauses() {
        let statements = parse_ok("for (;;) print 1;");

        // No initializer and no increment: just While with a true literal.
        match &statements[0] {
            Stmt::While { condition, body } => {
                assert!(matches!(condition, Expr::Literal { .. }));
                assert!(matches!(**body, Stmt::Print(_)));
            }
            other => panic!("expected bare while loop, got {:?}", other),
        }
    }

    #[test]
    fn test_function_declaration() {
        let statements = parse_ok("fun add(a, b) { return a + b; }");

        match &statements[0] {
            Stmt::Function(decl) => {
                assert_eq!(decl.name.lexeme, "add");
                assert_eq!(decl.params.len(), 2);
                assert_eq!(decl.body.len(), 1);
                assert!(matches!(&decl.body[0], Stmt::Return { .. }));
            }
            other => panic!("expected function declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_class_declaration_with_superclass_and_methods() {
        let statements = parse_ok("class B < A { init(x) {} speak() {} }");

        match &statements[0] {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                assert_eq!(name.lexeme, "B");
                assert!(matches!(superclass, Some(Expr::Variable { .. })));
                assert_eq!(methods.len(), 2);
                assert_eq!(methods[0].name.lexeme, "init");
                assert_eq!(methods[1].name.lexeme, "speak");
            }
            other => panic!("expected class declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_super_and_this_expressions() {
        let statements = parse_ok("class B < A { m() { super.m(); return this; } }");

        match &statements[0] {
            Stmt::Class { methods, .. } => {
                let body = &methods[0].body;
                assert!(matches!(
                    &body[0],
                    Stmt::Expression(Expr::Call { .. })
                ));
                assert!(matches!(
                    &body[1],
                    Stmt::Return {
                        value: Some(Expr::This { .. }),
                        ..
                    }
                ));
            }
            other => panic!("expected class declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_255_parameters_allowed() {
        let params: Vec<String> = (0..255).map(|i| format!("p{}", i)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        let (_, errors) = parse(&source);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_256_parameters_rejected_without_crash() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        let (statements, errors) = parse(&source);
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("can't have more than 255 parameters.")));
        // The declaration itself still parses.
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_256_arguments_rejected_without_crash() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let (_, errors) = parse(&source);
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("Can't have more than 255 arguments.")));
    }

    #[test]
    fn test_error_recovery_surfaces_multiple_errors() {
        // Two broken statements, one good one in between.
        let (statements, errors) = parse("var 1 = 2;\nprint 3;\nvar 4 = 5;");

        assert_eq!(errors.len(), 2);
        assert_eq!(statements.len(), 1);
        assert!(matches!(&statements[0], Stmt::Print(_)));
    }

    #[test]
    fn test_missing_semicolon_reports_at_next_token() {
        let (_, errors) = parse("print 1");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains(" at end"));
        assert!(errors[0].to_string().contains("expect ';' after value."));
    }

    #[test]
    fn test_parser_is_stable_across_runs() {
        let source = "class C < D { m(a) { for (var i = 0; i < a; i = i + 1) print this; } }";

        let first = format!("{:?}", parse_ok(source));
        let second = format!("{:?}", parse_ok(source));

        assert_eq!(first, second);
    }
}
