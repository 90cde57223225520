//! Restricted literal-expression call parser.
//!
//! Grammar (informal):
//! ```text
//! call    = IDENT '(' [ arg (',' arg)* [','] ] ')'
//! arg     = IDENT '=' value | value
//! value   = STRING | NUMBER | 'True' | 'False' | 'None'
//!         | 'true' | 'false' | 'none' | 'null'
//!         | '[' [ value (',' value)* [','] ] ']'
//!         | '{' [ STRING ':' value (',' STRING ':' value)* [','] ] '}'
//! ```
//!
//! Values are *data*, never code: an identifier in value position, a
//! nested call, or attribute access is a hard parse error. This is the
//! sandboxing contract — nothing the model writes inside a call is ever
//! evaluated.

use muster_core::ToolCall;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected character '{ch}' at byte {at}")]
    UnexpectedChar { ch: char, at: usize },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("expected {expected}, found {found}")]
    Expected {
        expected: &'static str,
        found: String,
    },

    #[error("not a function call")]
    NotACall,

    #[error("identifier '{0}' is not a literal value")]
    IdentifierValue(String),

    #[error("nested calls are not allowed")]
    NestedCall,

    #[error("positional argument follows keyword argument")]
    PositionalAfterKeyword,

    #[error("duplicate keyword argument '{0}'")]
    DuplicateKeyword(String),

    #[error("mapping keys must be string literals")]
    NonStringKey,

    #[error("unexpected input after call expression")]
    TrailingInput,
}

/// Parse a single restricted call expression.
///
/// Input is trimmed first. The returned [`ToolCall`] keeps the trimmed
/// source text so error reports and observers can show what actually ran.
pub fn parse_call(input: &str) -> Result<ToolCall, ParseError> {
    let source = input.trim();
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(&tokens);

    let name = match parser.next() {
        Some(Token::Ident(name)) => name.clone(),
        Some(_) | None => return Err(ParseError::NotACall),
    };
    match parser.next() {
        Some(Token::LParen) => {}
        Some(_) | None => return Err(ParseError::NotACall),
    }

    let mut args = Vec::new();
    let mut kwargs = Map::new();
    let mut seen_keyword = false;

    loop {
        if matches!(parser.peek(), Some(Token::RParen)) {
            parser.next();
            break;
        }

        // `name=value` is a keyword argument; a bare identifier that is not
        // followed by `=` falls through to value parsing and errors there.
        if let (Some(Token::Ident(name)), Some(Token::Eq)) = (parser.peek(), parser.peek2()) {
            let name = name.clone();
            parser.next();
            parser.next();
            let value = parse_value(&mut parser)?;
            if kwargs.contains_key(&name) {
                return Err(ParseError::DuplicateKeyword(name));
            }
            kwargs.insert(name, value);
            seen_keyword = true;
        } else {
            if seen_keyword {
                return Err(ParseError::PositionalAfterKeyword);
            }
            args.push(parse_value(&mut parser)?);
        }

        match parser.peek() {
            Some(Token::Comma) => {
                parser.next();
            }
            Some(Token::RParen) => {}
            Some(tok) => {
                return Err(ParseError::Expected {
                    expected: "',' or ')'",
                    found: tok.describe(),
                });
            }
            None => return Err(ParseError::UnexpectedEnd),
        }
    }

    if parser.peek().is_some() {
        return Err(ParseError::TrailingInput);
    }

    Ok(ToolCall {
        source: source.to_string(),
        name,
        args,
        kwargs,
    })
}

fn parse_value(parser: &mut Parser<'_>) -> Result<Value, ParseError> {
    match parser.next() {
        Some(Token::Str(s)) => Ok(Value::String(s.clone())),
        Some(Token::Int(n)) => Ok(Value::from(*n)),
        Some(Token::Float(f)) => Ok(Value::from(*f)),
        Some(Token::Minus) => match parser.next() {
            Some(Token::Int(n)) => Ok(Value::from(-n)),
            Some(Token::Float(f)) => Ok(Value::from(-f)),
            Some(tok) => Err(ParseError::Expected {
                expected: "a number after '-'",
                found: tok.describe(),
            }),
            None => Err(ParseError::UnexpectedEnd),
        },
        Some(Token::Plus) => match parser.next() {
            Some(Token::Int(n)) => Ok(Value::from(*n)),
            Some(Token::Float(f)) => Ok(Value::from(*f)),
            Some(tok) => Err(ParseError::Expected {
                expected: "a number after '+'",
                found: tok.describe(),
            }),
            None => Err(ParseError::UnexpectedEnd),
        },
        Some(Token::Ident(name)) => match name.as_str() {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "none" | "null" => Ok(Value::Null),
            _ => {
                if matches!(parser.peek(), Some(Token::LParen)) {
                    Err(ParseError::NestedCall)
                } else {
                    Err(ParseError::IdentifierValue(name.clone()))
                }
            }
        },
        Some(Token::LBracket) => {
            let mut items = Vec::new();
            loop {
                if matches!(parser.peek(), Some(Token::RBracket)) {
                    parser.next();
                    break;
                }
                items.push(parse_value(parser)?);
                match parser.peek() {
                    Some(Token::Comma) => {
                        parser.next();
                    }
                    Some(Token::RBracket) => {}
                    Some(tok) => {
                        return Err(ParseError::Expected {
                            expected: "',' or ']'",
                            found: tok.describe(),
                        });
                    }
                    None => return Err(ParseError::UnexpectedEnd),
                }
            }
            Ok(Value::Array(items))
        }
        Some(Token::LBrace) => {
            let mut map = Map::new();
            loop {
                match parser.next() {
                    Some(Token::RBrace) => break,
                    Some(Token::Str(key)) => {
                        let key = key.clone();
                        match parser.next() {
                            Some(Token::Colon) => {}
                            Some(tok) => {
                                return Err(ParseError::Expected {
                                    expected: "':'",
                                    found: tok.describe(),
                                });
                            }
                            None => return Err(ParseError::UnexpectedEnd),
                        }
                        let value = parse_value(parser)?;
                        map.insert(key, value);
                        match parser.peek() {
                            Some(Token::Comma) => {
                                parser.next();
                            }
                            Some(Token::RBrace) => {}
                            Some(tok) => {
                                return Err(ParseError::Expected {
                                    expected: "',' or '}'",
                                    found: tok.describe(),
                                });
                            }
                            None => return Err(ParseError::UnexpectedEnd),
                        }
                    }
                    Some(_) => return Err(ParseError::NonStringKey),
                    None => return Err(ParseError::UnexpectedEnd),
                }
            }
            Ok(Value::Object(map))
        }
        Some(tok) => Err(ParseError::Expected {
            expected: "a literal value",
            found: tok.describe(),
        }),
        None => Err(ParseError::UnexpectedEnd),
    }
}

// ─── Tokenizer ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Eq,
    Minus,
    Plus,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier '{s}'"),
            Token::Str(_) => "string literal".into(),
            Token::Int(n) => format!("number {n}"),
            Token::Float(f) => format!("number {f}"),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::LBracket => "'['".into(),
            Token::RBracket => "']'".into(),
            Token::LBrace => "'{'".into(),
            Token::RBrace => "'}'".into(),
            Token::Comma => "','".into(),
            Token::Colon => "':'".into(),
            Token::Eq => "'='".into(),
            Token::Minus => "'-'".into(),
            Token::Plus => "'+'".into(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '{' => {
                tokens.push(Token::LBrace);
                i += 1;
            }
            '}' => {
                tokens.push(Token::RBrace);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '"' | '\'' => {
                let (s, next) = read_string(&chars, i)?;
                tokens.push(Token::Str(s));
                i = next;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let (tok, next) = read_number(&chars, i)?;
                tokens.push(tok);
                i = next;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            c => {
                let at = chars[..i].iter().map(|c| c.len_utf8()).sum();
                return Err(ParseError::UnexpectedChar { ch: c, at });
            }
        }
    }

    Ok(tokens)
}

/// Read a quoted string starting at `start` (which holds the quote char).
/// Returns the decoded content and the index past the closing quote.
fn read_string(chars: &[char], start: usize) -> Result<(String, usize), ParseError> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        let ch = chars[i];
        if ch == '\\' {
            let Some(&next) = chars.get(i + 1) else {
                return Err(ParseError::UnterminatedString);
            };
            match next {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '\\' => out.push('\\'),
                '\'' => out.push('\''),
                '"' => out.push('"'),
                '0' => out.push('\0'),
                // Unknown escape: keep both characters, the way the model
                // most likely meant them.
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
            i += 2;
        } else if ch == quote {
            return Ok((out, i + 1));
        } else {
            out.push(ch);
            i += 1;
        }
    }

    Err(ParseError::UnterminatedString)
}

fn read_number(chars: &[char], start: usize) -> Result<(Token, usize), ParseError> {
    let mut i = start;
    let mut saw_dot = false;
    let mut saw_exp = false;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            i += 1;
        } else if c == '.' && !saw_dot && !saw_exp {
            saw_dot = true;
            i += 1;
        } else if (c == 'e' || c == 'E') && !saw_exp && i > start {
            saw_exp = true;
            i += 1;
            if matches!(chars.get(i), Some('+') | Some('-')) {
                i += 1;
            }
        } else {
            break;
        }
    }

    let text: String = chars[start..i].iter().collect();
    if saw_dot || saw_exp {
        text.parse::<f64>()
            .map(|f| (Token::Float(f), i))
            .map_err(|_| ParseError::InvalidNumber(text))
    } else {
        match text.parse::<i64>() {
            Ok(n) => Ok((Token::Int(n), i)),
            // Out-of-range integers degrade to floats rather than failing.
            Err(_) => text
                .parse::<f64>()
                .map(|f| (Token::Float(f), i))
                .map_err(|_| ParseError::InvalidNumber(text)),
        }
    }
}

// ─── Parser state ────────────────────────────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek2(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos + 1)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn simple_keyword_call() {
        let call = parse_call(r#"add(a=2, b=3)"#).unwrap();
        assert_eq!(call.name, "add");
        assert!(call.args.is_empty());
        assert_eq!(call.kwargs["a"], json!(2));
        assert_eq!(call.kwargs["b"], json!(3));
    }

    #[test]
    fn positional_then_keyword() {
        let call = parse_call(r#"greet("Ada", punctuation="!")"#).unwrap();
        assert_eq!(call.args, vec![json!("Ada")]);
        assert_eq!(call.kwargs["punctuation"], json!("!"));
    }

    #[test]
    fn zero_argument_call() {
        let call = parse_call("ping()").unwrap();
        assert!(call.args.is_empty());
        assert!(call.kwargs.is_empty());
    }

    #[test]
    fn all_literal_kinds() {
        let call = parse_call(
            r#"config(s="x", i=7, f=2.5, neg=-3, t=True, n=None, l=[1, "two", 3.0], m={"k": "v"})"#,
        )
        .unwrap();
        assert_eq!(call.kwargs["s"], json!("x"));
        assert_eq!(call.kwargs["i"], json!(7));
        assert_eq!(call.kwargs["f"], json!(2.5));
        assert_eq!(call.kwargs["neg"], json!(-3));
        assert_eq!(call.kwargs["t"], json!(true));
        assert_eq!(call.kwargs["n"], Value::Null);
        assert_eq!(call.kwargs["l"], json!([1, "two", 3.0]));
        assert_eq!(call.kwargs["m"], json!({"k": "v"}));
    }

    #[test]
    fn json_spelling_of_booleans_accepted() {
        let call = parse_call("flags(a=true, b=false, c=null)").unwrap();
        assert_eq!(call.kwargs["a"], json!(true));
        assert_eq!(call.kwargs["b"], json!(false));
        assert_eq!(call.kwargs["c"], Value::Null);
    }

    #[test]
    fn string_escapes_decode() {
        let call = parse_call(r#"note(text="line1\nline2\t\"quoted\"")"#).unwrap();
        assert_eq!(call.kwargs["text"], json!("line1\nline2\t\"quoted\""));
    }

    #[test]
    fn single_quoted_strings() {
        let call = parse_call(r#"note(text='it\'s fine')"#).unwrap();
        assert_eq!(call.kwargs["text"], json!("it's fine"));
    }

    #[test]
    fn trailing_commas_tolerated() {
        assert!(parse_call("f(a=1,)").is_ok());
        assert!(parse_call("f(a=[1, 2,],)").is_ok());
        assert!(parse_call(r#"f(m={"k": 1,})"#).is_ok());
    }

    #[test]
    fn rejects_identifier_value() {
        let err = parse_call("f(a=os)").unwrap_err();
        assert_eq!(err, ParseError::IdentifierValue("os".into()));
    }

    #[test]
    fn rejects_nested_call() {
        let err = parse_call("f(a=g(1))").unwrap_err();
        assert_eq!(err, ParseError::NestedCall);
    }

    #[test]
    fn rejects_attribute_access() {
        assert!(parse_call("f(a=os.path)").is_err());
        assert!(parse_call("os.system(\"ls\")").is_err());
    }

    #[test]
    fn rejects_positional_after_keyword() {
        let err = parse_call("f(a=1, 2)").unwrap_err();
        assert_eq!(err, ParseError::PositionalAfterKeyword);
    }

    #[test]
    fn rejects_duplicate_keyword() {
        let err = parse_call("f(a=1, a=2)").unwrap_err();
        assert_eq!(err, ParseError::DuplicateKeyword("a".into()));
    }

    #[test]
    fn rejects_bare_expression() {
        assert_eq!(parse_call("42").unwrap_err(), ParseError::NotACall);
        assert_eq!(parse_call(r#""hello""#).unwrap_err(), ParseError::NotACall);
    }

    #[test]
    fn rejects_trailing_input() {
        assert_eq!(
            parse_call("f(a=1) extra").unwrap_err(),
            ParseError::TrailingInput
        );
    }

    #[test]
    fn rejects_unterminated_string() {
        assert_eq!(
            parse_call(r#"f(a="oops)"#).unwrap_err(),
            ParseError::UnterminatedString
        );
    }

    #[test]
    fn rejects_non_string_mapping_key() {
        assert_eq!(
            parse_call("f(m={1: 2})").unwrap_err(),
            ParseError::NonStringKey
        );
    }

    #[test]
    fn huge_integers_degrade_to_float() {
        let call = parse_call("f(n=99999999999999999999999)").unwrap();
        assert!(call.kwargs["n"].is_f64());
    }

    #[test]
    fn source_is_preserved_trimmed() {
        let call = parse_call("  f(a=1)  ").unwrap();
        assert_eq!(call.source, "f(a=1)");
    }

    #[test]
    fn never_panics_on_garbage() {
        for input in [
            "", "(", ")", "f(", "f(a=", "f(a=1", "=", "][", "f(}", "\\", "'",
            "f(a=1))", "f(@)", "🤖(a=1)",
        ] {
            let _ = parse_call(input);
        }
    }
}
