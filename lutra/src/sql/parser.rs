use crate::collection::Document;
use crate::common::{SortOrder, Value};
use crate::errors::{ErrorKind, LutraError, LutraResult};
use crate::sql::lexer::{tokenize, Token};

/// A parsed SQL statement, already translated to the document/filter/update
/// structures the native API consumes — execution semantics are therefore
/// identical regardless of entry point.
#[derive(Debug)]
pub(crate) enum SqlStatement {
    Select {
        database: String,
        collection: String,
        filter: Document,
        order_by: Vec<(String, SortOrder)>,
    },
    Insert {
        database: String,
        collection: String,
        docs: Vec<Document>,
    },
    Update {
        database: String,
        collection: String,
        update: Document,
        filter: Document,
    },
    Delete {
        database: String,
        collection: String,
        filter: Document,
    },
}

/// Parses one SQL statement.
///
/// Grammar: `SELECT * FROM db.coll [WHERE cond] [ORDER BY f [ASC|DESC], …]`,
/// `INSERT INTO db.coll (f, …) VALUES (v, …)[, (…)]`,
/// `UPDATE db.coll SET f = v[, …] [WHERE cond]`,
/// `DELETE FROM db.coll [WHERE cond]`. Conditions support the comparison
/// operators, `AND`/`OR`/`NOT`, parentheses and `LIKE`.
pub(crate) fn parse(sql: &str) -> LutraResult<SqlStatement> {
    let tokens = tokenize(sql)?;
    let mut parser = Parser { tokens, pos: 0 };
    let statement = parser.parse_statement()?;
    parser.expect_end()?;
    Ok(statement)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// WHERE condition tree; translated to a filter document after parsing,
/// with `NOT` pushed down to the comparisons.
enum Condition {
    Cmp {
        field: String,
        operator: &'static str,
        value: Value,
    },
    Like {
        field: String,
        pattern: String,
    },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

impl Parser {
    fn parse_statement(&mut self) -> LutraResult<SqlStatement> {
        match self.peek_keyword() {
            Some(keyword) if keyword == "SELECT" => self.parse_select(),
            Some(keyword) if keyword == "INSERT" => self.parse_insert(),
            Some(keyword) if keyword == "UPDATE" => self.parse_update(),
            Some(keyword) if keyword == "DELETE" => self.parse_delete(),
            _ => Err(self.error("Expected SELECT, INSERT, UPDATE or DELETE")),
        }
    }

    fn parse_select(&mut self) -> LutraResult<SqlStatement> {
        self.expect_keyword("SELECT")?;
        self.expect(Token::Star)?;
        self.expect_keyword("FROM")?;
        let (database, collection) = self.parse_qualified_name()?;
        let filter = self.parse_optional_where()?;

        let mut order_by = Vec::new();
        if self.accept_keyword("ORDER") {
            self.expect_keyword("BY")?;
            loop {
                let field = self.expect_identifier()?;
                let order = if self.accept_keyword("DESC") {
                    SortOrder::Descending
                } else {
                    self.accept_keyword("ASC");
                    SortOrder::Ascending
                };
                order_by.push((field, order));
                if !self.accept(Token::Comma) {
                    break;
                }
            }
        }

        Ok(SqlStatement::Select {
            database,
            collection,
            filter,
            order_by,
        })
    }

    fn parse_insert(&mut self) -> LutraResult<SqlStatement> {
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let (database, collection) = self.parse_qualified_name()?;

        self.expect(Token::LeftParen)?;
        let mut fields = Vec::new();
        loop {
            fields.push(self.expect_identifier()?);
            if !self.accept(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightParen)?;

        self.expect_keyword("VALUES")?;
        let mut docs = Vec::new();
        loop {
            self.expect(Token::LeftParen)?;
            let mut values = Vec::new();
            loop {
                values.push(self.parse_value()?);
                if !self.accept(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RightParen)?;

            if values.len() != fields.len() {
                return Err(self.error(&format!(
                    "VALUES tuple has {} items but {} fields were declared",
                    values.len(),
                    fields.len()
                )));
            }
            let mut doc = Document::new();
            for (field, value) in fields.iter().zip(values) {
                doc.put(field, value)?;
            }
            docs.push(doc);

            if !self.accept(Token::Comma) {
                break;
            }
        }

        Ok(SqlStatement::Insert {
            database,
            collection,
            docs,
        })
    }

    fn parse_update(&mut self) -> LutraResult<SqlStatement> {
        self.expect_keyword("UPDATE")?;
        let (database, collection) = self.parse_qualified_name()?;
        self.expect_keyword("SET")?;

        let mut assignments = Document::new();
        loop {
            let field = self.expect_identifier()?;
            match self.next_token() {
                Some(Token::Compare(op)) if op == "=" || op == "==" => {}
                _ => return Err(self.error("Expected '=' in SET assignment")),
            }
            let value = self.parse_value()?;
            assignments.put(&field, value)?;
            if !self.accept(Token::Comma) {
                break;
            }
        }

        let mut update = Document::new();
        update.put("$set", assignments)?;
        let filter = self.parse_optional_where()?;

        Ok(SqlStatement::Update {
            database,
            collection,
            update,
            filter,
        })
    }

    fn parse_delete(&mut self) -> LutraResult<SqlStatement> {
        self.expect_keyword("DELETE")?;
        self.expect_keyword("FROM")?;
        let (database, collection) = self.parse_qualified_name()?;
        let filter = self.parse_optional_where()?;

        Ok(SqlStatement::Delete {
            database,
            collection,
            filter,
        })
    }

    fn parse_optional_where(&mut self) -> LutraResult<Document> {
        if self.accept_keyword("WHERE") {
            let condition = self.parse_or()?;
            condition_to_filter(condition)
        } else {
            // absent WHERE matches everything
            Ok(Document::new())
        }
    }

    fn parse_or(&mut self) -> LutraResult<Condition> {
        let mut left = self.parse_and()?;
        while self.accept_keyword("OR") {
            let right = self.parse_and()?;
            left = Condition::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> LutraResult<Condition> {
        let mut left = self.parse_unary()?;
        while self.accept_keyword("AND") {
            let right = self.parse_unary()?;
            left = Condition::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> LutraResult<Condition> {
        if self.accept_keyword("NOT") {
            let inner = self.parse_unary()?;
            return Ok(Condition::Not(Box::new(inner)));
        }

        if self.accept(Token::LeftParen) {
            let condition = self.parse_or()?;
            self.expect(Token::RightParen)?;
            return Ok(condition);
        }

        let field = self.expect_identifier()?;
        if self.accept_keyword("LIKE") {
            let pattern = match self.next_token() {
                Some(Token::StringLit(pattern)) => pattern,
                _ => return Err(self.error("LIKE requires a string pattern")),
            };
            return Ok(Condition::Like { field, pattern });
        }

        let operator = match self.next_token() {
            Some(Token::Compare(op)) => match op.as_str() {
                "=" | "==" => "$eq",
                "!=" | "<>" => "$ne",
                "<" => "$lt",
                "<=" => "$lte",
                ">" => "$gt",
                ">=" => "$gte",
                other => return Err(self.error(&format!("Unknown comparison '{}'", other))),
            },
            _ => return Err(self.error("Expected comparison operator")),
        };
        let value = self.parse_value()?;
        Ok(Condition::Cmp {
            field,
            operator,
            value,
        })
    }

    fn parse_value(&mut self) -> LutraResult<Value> {
        match self.next_token() {
            Some(Token::StringLit(text)) => Ok(Value::String(text)),
            Some(Token::IntLit(number)) => Ok(Value::Int(number)),
            Some(Token::FloatLit(number)) => Ok(Value::Double(number)),
            Some(Token::Minus) => match self.next_token() {
                Some(Token::IntLit(number)) => Ok(Value::Int(-number)),
                Some(Token::FloatLit(number)) => Ok(Value::Double(-number)),
                _ => Err(self.error("Expected a number after '-'")),
            },
            Some(Token::Ident(word)) => match word.to_ascii_uppercase().as_str() {
                "TRUE" => Ok(Value::Bool(true)),
                "FALSE" => Ok(Value::Bool(false)),
                "NULL" => Ok(Value::Null),
                _ => Err(self.error(&format!("Unexpected identifier '{}' as value", word))),
            },
            _ => Err(self.error("Expected a literal value")),
        }
    }

    fn parse_qualified_name(&mut self) -> LutraResult<(String, String)> {
        let database = self.expect_identifier()?;
        self.expect(Token::Dot)?;
        let collection = self.expect_identifier()?;
        Ok((database, collection))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_keyword(&self) -> Option<String> {
        match self.peek() {
            Some(Token::Ident(word)) => Some(word.to_ascii_uppercase()),
            _ => None,
        }
    }

    fn accept(&mut self, token: Token) -> bool {
        if self.peek() == Some(&token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn accept_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword().as_deref() == Some(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> LutraResult<()> {
        if self.accept(token.clone()) {
            Ok(())
        } else {
            Err(self.error(&format!("Expected {:?}", token)))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> LutraResult<()> {
        if self.accept_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(&format!("Expected {}", keyword)))
        }
    }

    fn expect_identifier(&mut self) -> LutraResult<String> {
        match self.next_token() {
            Some(Token::Ident(name)) => Ok(name),
            _ => Err(self.error("Expected identifier")),
        }
    }

    fn expect_end(&mut self) -> LutraResult<()> {
        self.accept(Token::Semicolon);
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(self.error("Unexpected trailing input"))
        }
    }

    fn error(&self, message: &str) -> LutraError {
        let context = match self.peek() {
            Some(token) => format!("{} at token {:?}", message, token),
            None => format!("{} at end of input", message),
        };
        log::error!("SQL parser: {}", context);
        LutraError::new(&context, ErrorKind::ParseError)
    }
}

/// Lowers a condition tree to a Mongo-style filter document, pushing `NOT`
/// down to the comparisons first.
fn condition_to_filter(condition: Condition) -> LutraResult<Document> {
    match condition {
        Condition::Cmp {
            field,
            operator,
            value,
        } => {
            let mut operand = Document::new();
            operand.put(&operator.to_string(), value)?;
            let mut doc = Document::new();
            doc.put(&field, operand)?;
            Ok(doc)
        }
        Condition::Like { field, pattern } => {
            let mut operand = Document::new();
            operand.put("$regex", like_to_regex(&pattern))?;
            let mut doc = Document::new();
            doc.put(&field, operand)?;
            Ok(doc)
        }
        Condition::And(left, right) => combine("$and", *left, *right),
        Condition::Or(left, right) => combine("$or", *left, *right),
        Condition::Not(inner) => condition_to_filter(negate(*inner)?),
    }
}

fn combine(operator: &str, left: Condition, right: Condition) -> LutraResult<Document> {
    let branches = vec![
        Value::Document(condition_to_filter(left)?),
        Value::Document(condition_to_filter(right)?),
    ];
    let mut doc = Document::new();
    doc.put(operator, branches)?;
    Ok(doc)
}

fn negate(condition: Condition) -> LutraResult<Condition> {
    match condition {
        Condition::Cmp {
            field,
            operator,
            value,
        } => {
            let negated = match operator {
                "$eq" => "$ne",
                "$ne" => "$eq",
                "$gt" => "$lte",
                "$gte" => "$lt",
                "$lt" => "$gte",
                "$lte" => "$gt",
                other => {
                    return Err(LutraError::new(
                        &format!("Cannot negate operator {}", other),
                        ErrorKind::ParseError,
                    ))
                }
            };
            Ok(Condition::Cmp {
                field,
                operator: negated,
                value,
            })
        }
        Condition::And(left, right) => Ok(Condition::Or(
            Box::new(negate(*left)?),
            Box::new(negate(*right)?),
        )),
        Condition::Or(left, right) => Ok(Condition::And(
            Box::new(negate(*left)?),
            Box::new(negate(*right)?),
        )),
        Condition::Not(inner) => Ok(*inner),
        Condition::Like { .. } => Err(LutraError::new(
            "NOT LIKE is not supported",
            ErrorKind::ParseError,
        )),
    }
}

/// Converts an SQL LIKE pattern to an anchored regular expression:
/// `%` becomes `.*`, `_` becomes `.`, everything else is escaped.
fn like_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() + 2);
    regex.push('^');
    for c in pattern.chars() {
        match c {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            c => {
                if "\\.+*?()|[]{}^$".contains(c) {
                    regex.push('\\');
                }
                regex.push(c);
            }
        }
    }
    regex.push('$');
    regex
}
