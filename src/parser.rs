use crate::ast::*;
use crate::error::ParseError;
use crate::lexer::{Span, Token, TokenKind};

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    nodes: Vec<Node>,
    depth: usize,
    max_depth: usize,
}

/// Build a [`Template`] from a token stream.
pub fn parse(source: &str, tokens: &[Token], max_depth: usize) -> Result<Template, ParseError> {
    let mut parser = Parser::new(tokens, max_depth);
    let root = parser.parse()?;
    Ok(Template {
        source: source.to_string(),
        nodes: parser.nodes,
        root,
    })
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], max_depth: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            nodes: Vec::new(),
            depth: 0,
            max_depth,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });
        id
    }

    /// Parse top-level content. Any `{{else}}` or close tag left over once
    /// the sequence stops has nothing to attach to.
    pub fn parse(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let root = self.parse_sequence()?;
        match self.peek().map(|t| (&t.kind, t.span)) {
            None => Ok(root),
            Some((TokenKind::BlockEnd(helper), span)) => Err(ParseError::UnmatchedBlockEnd {
                helper: *helper,
                at: span.start,
            }),
            // parse_sequence only stops early on else or a close tag
            Some((_, span)) => Err(ParseError::ElseOutsideBlock { at: span.start }),
        }
    }

    /// Collect siblings until `{{else}}`, a close tag, or EOF. The
    /// terminator is left for the caller.
    fn parse_sequence(&mut self) -> Result<Vec<NodeId>, ParseError> {
        let mut children = Vec::new();
        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Else | TokenKind::BlockEnd(_) => break,
                TokenKind::Text(s) => {
                    self.consume();
                    children.push(self.push(NodeKind::Text(s.clone()), token.span));
                }
                TokenKind::Variable(key) => {
                    self.consume();
                    children.push(self.push(NodeKind::Variable { key: key.clone() }, token.span));
                }
                TokenKind::BlockStart { helper, condition } => {
                    self.consume();
                    children.push(self.parse_block(*helper, condition, token.span)?);
                }
            }
        }
        Ok(children)
    }

    fn parse_block(
        &mut self,
        helper: Helper,
        condition: &Condition,
        open_span: Span,
    ) -> Result<NodeId, ParseError> {
        if self.depth >= self.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.max_depth,
                at: open_span.start,
            });
        }
        self.depth += 1;

        let consequent = self.parse_sequence()?;
        let mut alternate = None;
        let mut else_span = None;

        if let Some(Token {
            kind: TokenKind::Else,
            span,
        }) = self.peek()
        {
            self.consume();
            else_span = Some(*span);
            alternate = Some(self.parse_sequence()?);
            if let Some(Token {
                kind: TokenKind::Else,
                span,
            }) = self.peek()
            {
                return Err(ParseError::MultipleElse { at: span.start });
            }
        }

        let close_span = match self.consume() {
            Some(Token {
                kind: TokenKind::BlockEnd(found),
                span,
            }) => {
                if *found != helper {
                    return Err(ParseError::MismatchedBlockEnd {
                        expected: helper,
                        found: *found,
                        at: span.start,
                    });
                }
                *span
            }
            _ => {
                return Err(ParseError::UnmatchedBlockStart {
                    helper,
                    at: open_span.start,
                })
            }
        };

        self.depth -= 1;
        Ok(self.push(
            NodeKind::Block {
                helper,
                condition: condition.clone(),
                consequent,
                alternate,
                open_span,
                else_span,
                close_span,
            },
            Span::new(open_span.start, close_span.end),
        ))
    }
}
