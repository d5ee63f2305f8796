#[cfg(test)]
mod scanner_tests {
    use loxide as lox;

    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_one_and_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >= / ;",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SLASH, "/"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_keywords_and_identifiers() {
        assert_token_sequence(
            "class Foo < Bar { fun return_value while_ _this }",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "Foo"),
                (TokenType::LESS, "<"),
                (TokenType::IDENTIFIER, "Bar"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "return_value"),
                (TokenType::IDENTIFIER, "while_"),
                (TokenType::IDENTIFIER, "_this"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_all_reserved_words() {
        let source = "and class else false for fun if nil or print return super this true var while";
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        let expected = [
            TokenType::AND,
            TokenType::CLASS,
            TokenType::ELSE,
            TokenType::FALSE,
            TokenType::FOR,
            TokenType::FUN,
            TokenType::IF,
            TokenType::NIL,
            TokenType::OR,
            TokenType::PRINT,
            TokenType::RETURN,
            TokenType::SUPER,
            TokenType::THIS,
            TokenType::TRUE,
            TokenType::VAR,
            TokenType::WHILE,
            TokenType::EOF,
        ];

        assert_eq!(tokens.len(), expected.len());
        for (actual, expected_type) in tokens.iter().zip(expected.iter()) {
            assert_eq!(&actual.token_type, expected_type);
        }
    }

    #[test]
    fn test_scanner_number_literals() {
        let scanner = Scanner::new("42 3.25 0.5 7.");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        // "7." scans as the number 7 followed by a dot.
        assert_eq!(tokens.len(), 6);

        match tokens[0].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 42.0),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }

        match tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 3.25),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }

        match tokens[2].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 0.5),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }

        match tokens[3].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 7.0),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }
        assert_eq!(tokens[4].token_type, TokenType::DOT);
    }

    #[test]
    fn test_scanner_string_literal_strips_quotes() {
        let scanner = Scanner::new("\"hello world\"");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 2);
        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hello world"),
            other => panic!("expected STRING, got {:?}", other),
        }
        assert_eq!(tokens[0].lexeme, "\"hello world\"");
    }

    #[test]
    fn test_scanner_multiline_string_keeps_start_line() {
        let scanner = Scanner::new("\"line one\nline two\"\nident");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 3);
        // The string token is reported where its lexeme starts.
        assert_eq!(tokens[0].line, 1);
        // The identifier after it sees both newlines.
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_scanner_line_numbers_monotonic() {
        let scanner = Scanner::new("var a = 1;\nvar b = 2;\n\nprint a + b;");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        let mut last_line = 0;
        for token in &tokens {
            assert!(token.line >= last_line, "line numbers went backwards");
            last_line = token.line;
        }
        assert_eq!(tokens.last().unwrap().line, 4);
    }

    #[test]
    fn test_scanner_comments_are_skipped() {
        assert_token_sequence(
            "// a comment\nvar x; // trailing\n// last line",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_unexpected_characters_are_reported_and_skipped() {
        let scanner = Scanner::new(",.$(#");
        let results: Vec<_> = scanner.collect();

        // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF.
        assert_eq!(results.len(), 6);

        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(results[2].is_err());
        assert!(results[3].is_ok());
        assert!(results[4].is_err());
        assert!(results[5].is_ok());

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(err.to_string(), "[line 1]: : unexpected character.");
        }
    }

    #[test]
    fn test_scanner_unterminated_string() {
        let scanner = Scanner::new("var s = \"no closing quote");
        let results: Vec<_> = scanner.collect();

        let errors: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1]: : unterminated string.");

        // The EOF token is still emitted.
        let tokens: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(tokens.last().unwrap().token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_empty_source() {
        let scanner = Scanner::new("");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::EOF);
        assert_eq!(tokens[0].line, 1);
    }
}
