//! Core parser infrastructure: token cursor, error reporting, statements.

use metal_lexer::{Lexer, Token, TokenKind};
use metal_types::{ErrorCode, Graph, MetalError, NodeId, SourceFile, Span};

/// One top-level unit of input, handed to the REPL driver as soon as it
/// is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    /// An expression tree to evaluate against the VM.
    Expr { node: NodeId, span: Span },
    /// `;`: reset the VM stack.
    Clear(Span),
    /// `?`: dump the VM.
    Print(Span),
    /// `??`: dump the VM, then end the session.
    PrintExit(Span),
    /// `.end`: end the session silently.
    End(Span),
}

impl Statement {
    pub fn span(&self) -> Span {
        match *self {
            Statement::Expr { span, .. }
            | Statement::Clear(span)
            | Statement::Print(span)
            | Statement::PrintExit(span)
            | Statement::End(span) => span,
        }
    }
}

/// The metaL parser.
///
/// Pulls tokens from the lexer one at a time with a single token of
/// lookahead, so a statement can be executed before the text after it has
/// been scanned. There is no error recovery: the first lexical or syntax
/// error ends the chunk.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    source_file: &'src SourceFile,
    /// The next token, once pulled.
    lookahead: Option<Token>,
    /// Open `(` / `[` and where each was opened, innermost last. Line
    /// breaks are insignificant while any is open.
    pub(crate) open: Vec<(&'static str, Span)>,
    /// Current recursion depth of the expression parser.
    pub(crate) expr_depth: u32,
    /// Span of the last consumed token.
    last_span: Span,
}

impl<'src> Parser<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            lexer: Lexer::new(source_file),
            source_file,
            lookahead: None,
            open: Vec::new(),
            expr_depth: 0,
            last_span: Span::point(1, 1),
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Make sure `lookahead` holds the next significant token.
    fn fill(&mut self) -> Result<(), MetalError> {
        loop {
            let pull = match &self.lookahead {
                None => true,
                Some(token) => !self.open.is_empty() && token.kind == TokenKind::Newline,
            };
            if !pull {
                return Ok(());
            }
            self.lookahead = Some(self.lexer.next_token()?);
        }
    }

    /// The kind of the next token, pulling it if needed.
    pub(crate) fn peek(&mut self) -> Result<&TokenKind, MetalError> {
        self.fill()?;
        Ok(self
            .lookahead
            .as_ref()
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof))
    }

    /// Span of the next token.
    pub(crate) fn peek_span(&mut self) -> Result<Span, MetalError> {
        self.fill()?;
        Ok(self.lookahead.as_ref().map(|t| t.span).unwrap_or(self.last_span))
    }

    /// Consume and return the next token.
    pub(crate) fn advance(&mut self) -> Result<Token, MetalError> {
        self.fill()?;
        let token = self
            .lookahead
            .take()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, self.last_span));
        self.last_span = token.span;
        Ok(token)
    }

    /// Span of the last consumed token.
    pub(crate) fn previous_span(&self) -> Span {
        self.last_span
    }

    /// Consume the next token if it is `kind`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> Result<bool, MetalError> {
        if self.peek()? == kind {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> MetalError {
        MetalError::in_source(self.source_file, code, message, span)
    }

    /// An UNEXPECTED_TOKEN error on the next token. Running out of input
    /// inside a `(` or `[` is reported as that delimiter being unclosed.
    pub(crate) fn unexpected(&mut self, expected: &str) -> MetalError {
        let (found, span) = match self.fill() {
            Ok(()) => match &self.lookahead {
                Some(token) => (&token.kind, token.span),
                None => (&TokenKind::Eof, self.last_span),
            },
            Err(err) => return err,
        };
        if let (TokenKind::Eof, Some(&(open, open_span))) = (found, self.open.last()) {
            return self.unclosed(open, open_span);
        }
        let found = found.to_string();
        self.error_at(
            ErrorCode::UNEXPECTED_TOKEN,
            format!("expected {expected}, got '{found}'"),
            span,
        )
    }

    pub(crate) fn unclosed(&self, open: &str, open_span: Span) -> MetalError {
        self.error_at(
            ErrorCode::UNCLOSED_DELIMITER,
            format!("unclosed '{open}' opened at {open_span}"),
            open_span,
        )
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the next top-level statement, allocating its nodes in `graph`.
    ///
    /// Returns `Ok(None)` at end of input. Blank lines between statements
    /// are skipped; statements need no separator.
    pub fn next_statement(&mut self, graph: &mut Graph) -> Result<Option<Statement>, MetalError> {
        loop {
            let span = self.peek_span()?;
            let statement = match self.peek()? {
                TokenKind::Eof => return Ok(None),
                TokenKind::Newline => {
                    self.advance()?;
                    continue;
                }
                TokenKind::Semicolon => Statement::Clear(span),
                TokenKind::Question => Statement::Print(span),
                TokenKind::QuestionQuestion => Statement::PrintExit(span),
                TokenKind::End => Statement::End(span),
                _ => {
                    let expr = self.parse_expression(graph)?;
                    return Ok(Some(Statement::Expr {
                        node: expr.node,
                        span: expr.span,
                    }));
                }
            };
            self.advance()?;
            return Ok(Some(statement));
        }
    }

    /// Parse every statement of the chunk without executing anything.
    pub fn parse_all(mut self, graph: &mut Graph) -> Result<Vec<Statement>, MetalError> {
        let mut statements = Vec::new();
        while let Some(statement) = self.next_statement(graph)? {
            statements.push(statement);
        }
        Ok(statements)
    }
}

/// Whether `source` ends inside a string literal or an open `(` / `[`, so
/// more lines could still complete it.
///
/// Parses into a scratch graph; nothing is executed.
pub fn is_incomplete(source: &SourceFile) -> bool {
    let mut scratch = Graph::new();
    match Parser::new(source).parse_all(&mut scratch) {
        Ok(_) => false,
        Err(err) => matches!(
            err.code,
            ErrorCode::UNTERMINATED_STRING | ErrorCode::UNCLOSED_DELIMITER
        ),
    }
}
