use serde::Serialize;

use crate::ast::{CompareOp, Condition, Helper, LogicalOp};

/// Byte range into the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Text(String),
    Variable(String),
    BlockStart { helper: Helper, condition: Condition },
    Else,
    BlockEnd(Helper),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    /// Position of the next unescaped `{{` at or after the cursor.
    fn next_open(&self) -> Option<usize> {
        let mut from = self.cursor;
        while let Some(idx) = self.input[from..].find("{{") {
            let at = from + idx;
            if at > 0 && self.input.as_bytes()[at - 1] == b'\\' {
                // `\{{` is literal text
                from = at + 2;
                continue;
            }
            return Some(at);
        }
        None
    }

    fn text(&mut self, end: usize) -> Token {
        let span = Span::new(self.cursor, end);
        self.cursor = end;
        Token {
            kind: TokenKind::Text(self.input[span.start..span.end].to_string()),
            span,
        }
    }

    pub fn next_token(&mut self) -> Option<Token> {
        if self.remaining().is_empty() {
            return None;
        }

        let open = match self.next_open() {
            Some(at) if at > self.cursor => return Some(self.text(at)),
            Some(at) => at,
            None => return Some(self.text(self.input.len())),
        };

        let close = match self.input[open + 2..].find("}}") {
            Some(idx) => open + 2 + idx,
            // Unterminated tag: the rest is literal.
            None => return Some(self.text(self.input.len())),
        };
        let end = close + 2;

        match classify(&self.input[open + 2..close]) {
            Some(kind) => {
                self.cursor = end;
                Some(Token {
                    kind,
                    span: Span::new(open, end),
                })
            }
            None => Some(self.text(end)),
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// Tokenize a whole template, merging adjacent text runs.
pub fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    for token in Tokenizer::new(template) {
        if let (TokenKind::Text(next), Some(Token { kind: TokenKind::Text(prev), span })) =
            (&token.kind, tokens.last_mut())
        {
            if span.end == token.span.start {
                prev.push_str(next);
                span.end = token.span.end;
                continue;
            }
        }
        tokens.push(token);
    }
    tokens
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Interpret the body of a `{{...}}` tag. `None` means the tag is not
/// template syntax and stays as text.
fn classify(body: &str) -> Option<TokenKind> {
    let body = body.trim();

    if body == "else" {
        return Some(TokenKind::Else);
    }
    if let Some(name) = body.strip_prefix('/') {
        return Helper::from_name(name.trim()).map(TokenKind::BlockEnd);
    }
    if let Some(rest) = body.strip_prefix('#') {
        let (name, args) = match rest.find(char::is_whitespace) {
            Some(idx) => (&rest[..idx], rest[idx..].trim()),
            None => (rest, ""),
        };
        let helper = Helper::from_name(name)?;
        let condition = block_condition(helper, args)?;
        return Some(TokenKind::BlockStart { helper, condition });
    }
    if is_identifier(body) {
        return Some(TokenKind::Variable(body.to_string()));
    }
    None
}

fn block_condition(helper: Helper, args: &str) -> Option<Condition> {
    if is_identifier(args) {
        return Some(Condition::Truthy {
            key: args.to_string(),
        });
    }
    // Sub-expressions are only meaningful on conditionals.
    if !matches!(helper, Helper::If | Helper::Unless) {
        return None;
    }
    let inner = args.strip_prefix('(')?.strip_suffix(')')?;
    let mut words = split_args(inner)?.into_iter();
    let op = match words.next()? {
        Arg::Ident(op) => op,
        Arg::Literal(_) => return None,
    };
    let rest: Vec<Arg> = words.collect();

    match (op.as_str(), rest.as_slice()) {
        ("not", [Arg::Ident(key)]) => Some(Condition::Not { key: key.clone() }),
        ("and" | "or", operands) if operands.len() >= 2 => {
            let keys = operands
                .iter()
                .map(|arg| match arg {
                    Arg::Ident(key) => Some(key.clone()),
                    Arg::Literal(_) => None,
                })
                .collect::<Option<Vec<_>>>()?;
            let op = if op == "and" { LogicalOp::And } else { LogicalOp::Or };
            Some(Condition::Logical { op, keys })
        }
        (name, [Arg::Ident(key), Arg::Literal(literal)]) => Some(Condition::Compare {
            op: CompareOp::from_name(name)?,
            key: key.clone(),
            literal: literal.clone(),
        }),
        _ => None,
    }
}

#[derive(Debug, PartialEq)]
enum Arg {
    Ident(String),
    Literal(String),
}

/// Split sub-expression arguments on whitespace. Quoted strings may contain
/// spaces and `\`-escaped quotes; bare numbers are literals too.
fn split_args(input: &str) -> Option<Vec<Arg>> {
    let mut args = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' || c == '\'' {
            chars.next();
            let mut s = String::new();
            let mut closed = false;
            while let Some((_, c2)) = chars.next() {
                if c2 == c {
                    closed = true;
                    break;
                }
                if c2 == '\\' {
                    if let Some((_, esc)) = chars.next() {
                        s.push(esc);
                    }
                } else {
                    s.push(c2);
                }
            }
            if !closed {
                return None;
            }
            args.push(Arg::Literal(s));
            continue;
        }

        let mut end = input.len();
        while let Some(&(idx, c2)) = chars.peek() {
            if c2.is_whitespace() {
                end = idx;
                break;
            }
            chars.next();
        }
        let word = &input[start..end];
        if is_identifier(word) {
            args.push(Arg::Ident(word.to_string()));
        } else if word.parse::<f64>().is_ok() {
            args.push(Arg::Literal(word.to_string()));
        } else {
            return None;
        }
    }

    Some(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(template: &str) -> Vec<TokenKind> {
        tokenize(template).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn plain_text_is_one_token() {
        assert_eq!(kinds("Hello, world!"), vec![TokenKind::Text("Hello, world!".into())]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn variables_and_text_with_spans() {
        let tokens = tokenize("Hi {{ name }}!");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].kind, TokenKind::Variable("name".into()));
        assert_eq!(tokens[1].span, Span::new(3, 13));
        assert_eq!(tokens[2].span, Span::new(13, 14));
    }

    #[test]
    fn simple_blocks() {
        assert_eq!(
            kinds("{{#unless draft}}x{{else}}y{{/unless}}"),
            vec![
                TokenKind::BlockStart {
                    helper: Helper::Unless,
                    condition: Condition::Truthy { key: "draft".into() },
                },
                TokenKind::Text("x".into()),
                TokenKind::Else,
                TokenKind::Text("y".into()),
                TokenKind::BlockEnd(Helper::Unless),
            ]
        );
    }

    #[test]
    fn each_and_with_are_recognised() {
        let k = kinds("{{#each items}}{{/each}}{{#with ctx}}{{/with}}");
        assert_eq!(k[1], TokenKind::BlockEnd(Helper::Each));
        assert_eq!(k[3], TokenKind::BlockEnd(Helper::With));
    }

    #[test]
    fn comparison_blocks() {
        assert_eq!(
            kinds(r#"{{#if (eq tone "formal tone")}}"#),
            vec![TokenKind::BlockStart {
                helper: Helper::If,
                condition: Condition::Compare {
                    op: CompareOp::Eq,
                    key: "tone".into(),
                    literal: "formal tone".into(),
                },
            }]
        );
        assert_eq!(
            kinds("{{#unless (gte age 18)}}"),
            vec![TokenKind::BlockStart {
                helper: Helper::Unless,
                condition: Condition::Compare {
                    op: CompareOp::Gte,
                    key: "age".into(),
                    literal: "18".into(),
                },
            }]
        );
    }

    #[test]
    fn logical_blocks() {
        assert_eq!(
            kinds("{{#if (and a b c)}}"),
            vec![TokenKind::BlockStart {
                helper: Helper::If,
                condition: Condition::Logical {
                    op: LogicalOp::And,
                    keys: vec!["a".into(), "b".into(), "c".into()],
                },
            }]
        );
        assert_eq!(
            kinds("{{#if (not a)}}"),
            vec![TokenKind::BlockStart {
                helper: Helper::If,
                condition: Condition::Not { key: "a".into() },
            }]
        );
    }

    #[test]
    fn unrecognised_tags_stay_text() {
        for template in [
            "{{#if (eq tone)}}",
            "{{#if (bogus a \"x\")}}",
            "{{#loop items}}",
            "{{> partial}}",
            "{{user.name}}",
            "{{#each (eq a \"b\")}}",
            "{{#if (eq a \"unterminated)}}",
        ] {
            assert_eq!(kinds(template), vec![TokenKind::Text(template.into())], "{template}");
        }
    }

    #[test]
    fn unterminated_tag_is_text() {
        assert_eq!(
            kinds("{{#if unclosed}"),
            vec![TokenKind::Text("{{#if unclosed}".into())]
        );
        assert_eq!(
            kinds("a {{b}} {{c"),
            vec![
                TokenKind::Text("a ".into()),
                TokenKind::Variable("b".into()),
                TokenKind::Text(" {{c".into()),
            ]
        );
    }

    #[test]
    fn escaped_open_is_text() {
        assert_eq!(
            kinds(r"Said: Hello \{{name\}}"),
            vec![TokenKind::Text(r"Said: Hello \{{name\}}".into())]
        );
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("first_name"));
        assert!(is_identifier("_x-1"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier("a.b"));
        assert!(!is_identifier(""));
    }
}
