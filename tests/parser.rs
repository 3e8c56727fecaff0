#[cfg(test)]
mod parser_tests {
    use rox::ast::{Expr, LiteralValue, Stmt};
    use rox::error::LoxError;
    use rox::parser::Parser;
    use rox::scanner::Scanner;
    use rox::token::TokenType;

    fn parse(source: &str) -> (Vec<Stmt>, Vec<LoxError>) {
        let (tokens, lex_errors) = Scanner::new(source).scan_all();
        assert!(lex_errors.is_empty(), "unexpected lexical errors: {:?}", lex_errors);
        Parser::new(tokens).parse()
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let (statements, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        statements
    }

    fn messages(errors: &[LoxError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_precedence() {
        let statements = parse_ok("1 + 2 * 3 == 7;");

        let Stmt::Expression(Expr::Binary { left, operator, .. }) = &statements[0] else {
            panic!("expected equality at the root, got {:?}", statements[0]);
        };
        assert_eq!(operator.token_type, TokenType::EQUAL_EQUAL);

        let Expr::Binary { operator, right, .. } = left.as_ref() else {
            panic!("expected addition, got {:?}", left);
        };
        assert_eq!(operator.token_type, TokenType::PLUS);
        assert!(matches!(
            right.as_ref(),
            Expr::Binary { operator, .. } if operator.token_type == TokenType::STAR
        ));
    }

    #[test]
    fn test_binary_operators_are_left_associative() {
        let statements = parse_ok("1 - 2 - 3;");

        let Stmt::Expression(Expr::Binary { left, right, .. }) = &statements[0] else {
            panic!("expected subtraction, got {:?}", statements[0]);
        };
        assert!(matches!(left.as_ref(), Expr::Binary { .. }));
        assert_eq!(right.as_ref(), &Expr::Literal(LiteralValue::Number(3.0)));
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let statements = parse_ok("a = b = 1;");

        let Stmt::Expression(Expr::Assign { name, value, .. }) = &statements[0] else {
            panic!("expected assignment, got {:?}", statements[0]);
        };
        assert_eq!(name.lexeme, "a");
        assert!(matches!(value.as_ref(), Expr::Assign { name, .. } if name.lexeme == "b"));
    }

    #[test]
    fn test_property_assignment_becomes_set() {
        let statements = parse_ok("point.x = 3;");

        assert!(matches!(
            &statements[0],
            Stmt::Expression(Expr::Set { name, .. }) if name.lexeme == "x"
        ));
    }

    #[test]
    fn test_for_loop_desugars_to_while() {
        let statements = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected a block around the loop, got {:?}", statements[0]);
        };
        assert!(matches!(&outer[0], Stmt::Var { name, .. } if name.lexeme == "i"));

        let Stmt::While { body, .. } = &outer[1] else {
            panic!("expected a while loop, got {:?}", outer[1]);
        };
        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected body plus increment, got {:?}", body);
        };
        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_empty_for_clauses_loop_forever() {
        let statements = parse_ok("for (;;) print 1;");

        assert!(matches!(
            &statements[0],
            Stmt::While { condition: Expr::Literal(LiteralValue::True), .. }
        ));
    }

    #[test]
    fn test_class_with_superclass() {
        let statements = parse_ok("class B < A { init(x) { this.x = x; } get() { return this.x; } }");

        let Stmt::Class { name, superclass, methods } = &statements[0] else {
            panic!("expected a class, got {:?}", statements[0]);
        };
        assert_eq!(name.lexeme, "B");
        assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));

        let names: Vec<&str> = methods.iter().map(|m| m.name.lexeme.as_str()).collect();
        assert_eq!(names, vec!["init", "get"]);
        assert_eq!(methods[0].params.len(), 1);
    }

    #[test]
    fn test_chained_calls_and_super() {
        let statements = parse_ok("class B < A { m() { return super.m()(1)(2); } }");

        let Stmt::Class { methods, .. } = &statements[0] else {
            panic!("expected a class");
        };
        let Stmt::Return { value: Some(Expr::Call { callee, arguments, .. }), .. } = &methods[0].body[0]
        else {
            panic!("expected a returned call, got {:?}", methods[0].body[0]);
        };
        assert_eq!(arguments.len(), 1);

        let Expr::Call { callee, .. } = callee.as_ref() else {
            panic!("expected a nested call, got {:?}", callee);
        };
        let Expr::Call { callee, arguments, .. } = callee.as_ref() else {
            panic!("expected the innermost call, got {:?}", callee);
        };
        assert!(arguments.is_empty());
        assert!(matches!(callee.as_ref(), Expr::Super { method, .. } if method.lexeme == "m"));
    }

    #[test]
    fn test_missing_semicolon() {
        let (_, errors) = parse("print 1");

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at end: Expect ';' after value."]
        );
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (statements, errors) = parse("1 + 2 = 3;");

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
        // Not fatal: the statement is still produced.
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_recovers_at_statement_boundary() {
        let (statements, errors) = parse("var = 1;\nprint 2;\nprint (3;\nprint 4;");

        assert_eq!(
            messages(&errors),
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at ';': Expect ')' after expression.",
            ]
        );
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_expect_expression() {
        let (_, errors) = parse("print ;");

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at ';': Expect expression."]
        );
    }

    #[test]
    fn test_too_many_arguments() {
        let args = vec!["1"; 256].join(", ");
        let (statements, errors) = parse(&format!("f({});", args));

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at '1': Can't have more than 255 arguments."]
        );
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_too_many_parameters() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let (_, errors) = parse(&format!("fun f({}) {{}}", params.join(", ")));

        assert_eq!(
            messages(&errors),
            vec!["[line 1] Error at 'p255': Can't have more than 255 parameters."]
        );
    }
}
