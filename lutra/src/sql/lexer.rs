use crate::errors::{ErrorKind, LutraError, LutraResult};

/// Tokens of the minimal SQL dialect.
///
/// Keywords are not distinguished here; the parser matches identifiers
/// case-insensitively, so `select` and `SELECT` both work while quoted
/// identifiers (`"count"`) stay verbatim.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Bare or `"quoted"` identifier.
    Ident(String),
    /// `'single-quoted'` string literal.
    StringLit(String),
    IntLit(i64),
    FloatLit(f64),
    /// `=`, `==`, `!=`, `<>`, `<`, `<=`, `>`, `>=`
    Compare(String),
    LeftParen,
    RightParen,
    Comma,
    Dot,
    Star,
    Minus,
    Semicolon,
}

pub(crate) fn tokenize(sql: &str) -> LutraResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = sql.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LeftParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RightParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            ';' => {
                chars.next();
                tokens.push(Token::Semicolon);
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Compare("==".to_string()));
                } else {
                    tokens.push(Token::Compare("=".to_string()));
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Compare("!=".to_string()));
                } else {
                    return Err(lex_error("Unexpected character '!'"));
                }
            }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some(&'=') => {
                        chars.next();
                        tokens.push(Token::Compare("<=".to_string()));
                    }
                    Some(&'>') => {
                        chars.next();
                        tokens.push(Token::Compare("<>".to_string()));
                    }
                    _ => tokens.push(Token::Compare("<".to_string())),
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Compare(">=".to_string()));
                } else {
                    tokens.push(Token::Compare(">".to_string()));
                }
            }
            '\'' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => text.push(c),
                        None => return Err(lex_error("Unterminated string literal")),
                    }
                }
                tokens.push(Token::StringLit(text));
            }
            '"' => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => name.push(c),
                        None => return Err(lex_error("Unterminated quoted identifier")),
                    }
                }
                tokens.push(Token::Ident(name));
            }
            c if c.is_ascii_digit() => {
                let mut number = String::new();
                let mut is_float = false;
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() {
                        number.push(c);
                        chars.next();
                    } else if c == '.' && !is_float {
                        // lookahead: a dot not followed by a digit belongs
                        // to a qualified name, not this number
                        let mut ahead = chars.clone();
                        ahead.next();
                        match ahead.peek() {
                            Some(d) if d.is_ascii_digit() => {
                                is_float = true;
                                number.push(c);
                                chars.next();
                            }
                            _ => break,
                        }
                    } else {
                        break;
                    }
                }
                if is_float {
                    tokens.push(Token::FloatLit(number.parse()?));
                } else {
                    tokens.push(Token::IntLit(number.parse()?));
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            other => {
                return Err(lex_error(&format!("Unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

fn lex_error(message: &str) -> LutraError {
    log::error!("SQL lexer: {}", message);
    LutraError::new(message, ErrorKind::ParseError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_select() {
        let tokens = tokenize("SELECT * FROM db.coll WHERE count >= 10;").unwrap();
        assert_eq!(tokens[0], Token::Ident("SELECT".to_string()));
        assert_eq!(tokens[1], Token::Star);
        assert_eq!(tokens[3], Token::Ident("db".to_string()));
        assert_eq!(tokens[4], Token::Dot);
        assert!(tokens.contains(&Token::Compare(">=".to_string())));
        assert_eq!(*tokens.last().unwrap(), Token::Semicolon);
    }

    #[test]
    fn test_tokenize_literals() {
        let tokens = tokenize("name = 'doc 10' AND price = 2.5").unwrap();
        assert!(tokens.contains(&Token::StringLit("doc 10".to_string())));
        assert!(tokens.contains(&Token::FloatLit(2.5)));
    }

    #[test]
    fn test_quoted_identifier() {
        let tokens = tokenize("\"count\" = 2").unwrap();
        assert_eq!(tokens[0], Token::Ident("count".to_string()));
    }

    #[test]
    fn test_qualified_name_is_not_a_float() {
        let tokens = tokenize("db1.coll").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("db1".to_string()),
                Token::Dot,
                Token::Ident("coll".to_string())
            ]
        );
    }

    #[test]
    fn test_unterminated_string_fails() {
        let err = tokenize("'abc").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ParseError);
    }

    #[test]
    fn test_unexpected_character_fails() {
        let err = tokenize("a ? b").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ParseError);
    }
}
