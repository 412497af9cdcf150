//! Core metaL lexer: converts source text to a token stream.
//!
//! The lexer is pull-based: the parser asks for one token at a time, so
//! statements ahead of a malformed one have already been handed over (and
//! executed by the REPL driver) before the error surfaces.
//!
//! At each position the rules are tried in a fixed priority order and the
//! first one that matches wins:
//!
//! 1. quoted string (`'...'`, exclusive mode, backslash escapes next char)
//! 2. comment (`#` to end of line, discarded)
//! 3. newline, `??`, `?`, `.end`, brackets
//! 4. the operator glyphs `` ` `` `=` `//` `<<` `>>` `:` and `;`
//! 5. URL, email, IPv4 dotted quad
//! 6. float (`1.5`, `2e10`), hex (`0x1F`), bin (`0b101`), signed integer
//! 7. symbol: any run free of whitespace, `#`, brackets, `:`, `;`, and
//!    control characters
//!
//! Tokens are not required to be separated: `x=5` is one symbol, while
//! `-7abc` is the integer `-7` followed by the symbol `abc`.

use metal_types::{ErrorCode, MetalError, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// The metaL lexer.
pub struct Lexer<'src> {
    source: &'src [u8],
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, in bytes).
    col: u32,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.source.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            finished: false,
        }
    }

    /// Lex the whole chunk, stopping at the first error.
    ///
    /// On success the stream always ends with [`TokenKind::Eof`].
    pub fn lex(mut self) -> Result<Vec<Token>, MetalError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    /// Scan the next token. Once the input is exhausted every call
    /// returns [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Result<Token, MetalError> {
        loop {
            self.skip_whitespace();
            if self.peek() == Some(b'#') {
                self.skip_comment();
                continue;
            }
            break;
        }

        if self.at_end() {
            self.finished = true;
            return Ok(Token::new(TokenKind::Eof, self.current_span()));
        }

        let start_line = self.line;
        let start_col = self.col;

        if self.peek() == Some(b'\'') {
            return self.scan_string(start_line, start_col);
        }

        if let Some((len, kind)) = self.match_punctuation() {
            self.advance_by(len);
            return Ok(Token::new(kind, self.span_from(start_line, start_col)));
        }

        if let Some(len) = self.match_url() {
            let text = self.take(len);
            return Ok(Token::new(TokenKind::Url(text), self.span_from(start_line, start_col)));
        }
        if let Some(len) = self.match_email() {
            let text = self.take(len);
            return Ok(Token::new(TokenKind::Email(text), self.span_from(start_line, start_col)));
        }
        if let Some(len) = self.match_ip() {
            let text = self.take(len);
            return Ok(Token::new(TokenKind::Ip(text), self.span_from(start_line, start_col)));
        }

        if let Some(len) = self.match_number_dot().or_else(|| self.match_number_exp()) {
            let text = self.take(len);
            let span = self.span_from(start_line, start_col);
            let value: f64 = text
                .parse()
                .map_err(|_| self.error(ErrorCode::INVALID_LITERAL, format!("invalid number '{text}'"), span))?;
            return Ok(Token::new(TokenKind::Number(value), span));
        }
        if let Some(len) = self.match_radix(b'x', |b| b.is_ascii_hexdigit()) {
            return self.radix_literal(len, 16, start_line, start_col);
        }
        if let Some(len) = self.match_radix(b'b', |b| b == b'0' || b == b'1') {
            return self.radix_literal(len, 2, start_line, start_col);
        }
        if let Some(len) = self.match_integer() {
            let text = self.take(len);
            let span = self.span_from(start_line, start_col);
            let value: i64 = text.parse().map_err(|_| {
                self.error(
                    ErrorCode::INVALID_LITERAL,
                    format!("integer '{text}' out of range"),
                    span,
                )
            })?;
            return Ok(Token::new(TokenKind::Integer(value), span));
        }

        let len = self.run_len(0, is_symbol_byte);
        if len > 0 {
            let text = self.take(len);
            return Ok(Token::new(TokenKind::Symbol(text), self.span_from(start_line, start_col)));
        }

        let ch = self.source_file.source[self.pos..].chars().next().unwrap_or('\0');
        self.advance();
        let span = self.span_from(start_line, start_col);
        Err(self.error(
            ErrorCode::UNEXPECTED_CHARACTER,
            format!("unexpected character {ch:?}"),
            span,
        ))
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn starts_with(&self, prefix: &[u8]) -> bool {
        self.source[self.pos..].starts_with(prefix)
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn advance_by(&mut self, len: usize) {
        for _ in 0..len {
            self.advance();
        }
    }

    /// Consume `len` bytes and return them as text.
    ///
    /// Every rule stops on an ASCII byte, so the slice is always on a
    /// UTF-8 boundary.
    fn take(&mut self, len: usize) -> String {
        let start = self.pos;
        self.advance_by(len);
        String::from_utf8_lossy(&self.source[start..self.pos]).into_owned()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Length of the run of bytes satisfying `pred`, starting `offset`
    /// bytes ahead of the cursor.
    fn run_len(&self, offset: usize, pred: impl Fn(u8) -> bool) -> usize {
        self.source
            .get(self.pos + offset..)
            .map(|rest| rest.iter().take_while(|&&b| pred(b)).count())
            .unwrap_or(0)
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> MetalError {
        MetalError::in_source(self.source_file, code, message, span)
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip spaces, tabs and carriage returns (newlines are tokens).
    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r')) {
            self.advance();
        }
    }

    /// Skip a `#` comment up to, not including, the line break.
    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == b'\n' {
                break;
            }
            self.advance();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Rule matchers: each returns the length it would consume
    // ─────────────────────────────────────────────────────────────

    fn match_punctuation(&self) -> Option<(usize, TokenKind)> {
        let first = self.peek()?;
        let second = self.peek_at(1);
        let hit = match (first, second) {
            (b'\n', _) => (1, TokenKind::Newline),
            (b'?', Some(b'?')) => (2, TokenKind::QuestionQuestion),
            (b'?', _) => (1, TokenKind::Question),
            (b'.', _) if self.starts_with(b".end") => (4, TokenKind::End),
            (b'(', _) => (1, TokenKind::LParen),
            (b')', _) => (1, TokenKind::RParen),
            (b'[', _) => (1, TokenKind::LBracket),
            (b']', _) => (1, TokenKind::RBracket),
            (b'{', _) => (1, TokenKind::LBrace),
            (b'}', _) => (1, TokenKind::RBrace),
            (b'`', _) => (1, TokenKind::Tick),
            (b'=', _) => (1, TokenKind::Eq),
            (b'/', Some(b'/')) => (2, TokenKind::Push),
            (b'<', Some(b'<')) => (2, TokenKind::LShift),
            (b'>', Some(b'>')) => (2, TokenKind::RShift),
            (b':', _) => (1, TokenKind::Colon),
            (b';', _) => (1, TokenKind::Semicolon),
            _ => return None,
        };
        Some(hit)
    }

    /// `https?://` followed by at least one non-blank.
    fn match_url(&self) -> Option<usize> {
        let scheme = if self.starts_with(b"https://") {
            8
        } else if self.starts_with(b"http://") {
            7
        } else {
            return None;
        };
        let rest = self.run_len(scheme, is_not_blank);
        (rest > 0).then_some(scheme + rest)
    }

    /// `[a-z]+@` followed by at least one non-blank.
    fn match_email(&self) -> Option<usize> {
        let local = self.run_len(0, |b| b.is_ascii_lowercase());
        if local == 0 || self.peek_at(local) != Some(b'@') {
            return None;
        }
        let domain = self.run_len(local + 1, is_not_blank);
        (domain > 0).then_some(local + 1 + domain)
    }

    /// Three `1-3 digit` groups each followed by `.`, then 1-3 digits.
    fn match_ip(&self) -> Option<usize> {
        let mut len = 0;
        for _ in 0..3 {
            let digits = self.run_len(len, |b| b.is_ascii_digit());
            if !(1..=3).contains(&digits) || self.peek_at(len + digits) != Some(b'.') {
                return None;
            }
            len += digits + 1;
        }
        let last = self.run_len(len, |b| b.is_ascii_digit());
        (last > 0).then_some(len + last.min(3))
    }

    fn sign_len(&self, offset: usize) -> usize {
        usize::from(matches!(self.peek_at(offset), Some(b'+' | b'-')))
    }

    /// `[+-]?[0-9]+\.[0-9]+`
    fn match_number_dot(&self) -> Option<usize> {
        let sign = self.sign_len(0);
        let int = self.run_len(sign, |b| b.is_ascii_digit());
        if int == 0 || self.peek_at(sign + int) != Some(b'.') {
            return None;
        }
        let frac = self.run_len(sign + int + 1, |b| b.is_ascii_digit());
        (frac > 0).then_some(sign + int + 1 + frac)
    }

    /// `[+-]?[0-9]+[eE][+-]?[0-9]+`
    fn match_number_exp(&self) -> Option<usize> {
        let sign = self.sign_len(0);
        let int = self.run_len(sign, |b| b.is_ascii_digit());
        if int == 0 || !matches!(self.peek_at(sign + int), Some(b'e' | b'E')) {
            return None;
        }
        let at = sign + int + 1;
        let exp_sign = self.sign_len(at);
        let exp = self.run_len(at + exp_sign, |b| b.is_ascii_digit());
        (exp > 0).then_some(at + exp_sign + exp)
    }

    /// `0<marker>` followed by at least one digit accepted by `digit`.
    fn match_radix(&self, marker: u8, digit: impl Fn(u8) -> bool) -> Option<usize> {
        if self.peek() != Some(b'0') || self.peek_at(1) != Some(marker) {
            return None;
        }
        let digits = self.run_len(2, digit);
        (digits > 0).then_some(2 + digits)
    }

    /// `[+-]?[0-9]+`
    fn match_integer(&self) -> Option<usize> {
        let sign = self.sign_len(0);
        let digits = self.run_len(sign, |b| b.is_ascii_digit());
        (digits > 0).then_some(sign + digits)
    }

    fn radix_literal(
        &mut self,
        len: usize,
        radix: u32,
        start_line: u32,
        start_col: u32,
    ) -> Result<Token, MetalError> {
        let text = self.take(len);
        let span = self.span_from(start_line, start_col);
        let value = i64::from_str_radix(&text[2..], radix).map_err(|_| {
            self.error(
                ErrorCode::INVALID_LITERAL,
                format!("literal '{text}' out of range"),
                span,
            )
        })?;
        let kind = if radix == 16 {
            TokenKind::Hex(value)
        } else {
            TokenKind::Bin(value)
        };
        Ok(Token::new(kind, span))
    }

    // ─────────────────────────────────────────────────────────────
    // String literals
    // ─────────────────────────────────────────────────────────────

    /// Scan `'...'`. Line breaks are kept verbatim; a backslash makes the
    /// following character literal (`\'` is a quote, `\\` a backslash).
    fn scan_string(&mut self, start_line: u32, start_col: u32) -> Result<Token, MetalError> {
        self.advance(); // opening quote
        let mut buf = Vec::new();
        loop {
            match self.advance() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    return Err(self.error(
                        ErrorCode::UNTERMINATED_STRING,
                        "unterminated string literal",
                        span,
                    ));
                }
                Some(b'\'') => break,
                Some(b'\\') => match self.advance() {
                    Some(escaped) => buf.push(escaped),
                    None => buf.push(b'\\'),
                },
                Some(ch) => buf.push(ch),
            }
        }
        let text = String::from_utf8(buf)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
        Ok(Token::new(TokenKind::Str(text), self.span_from(start_line, start_col)))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, MetalError>;

    /// Yields tokens up to, not including, `Eof`.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => None,
            other => Some(other),
        }
    }
}

fn is_not_blank(b: u8) -> bool {
    !matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_symbol_byte(b: u8) -> bool {
    !matches!(
        b,
        b' ' | b'\t'
            | b'\r'
            | b'\n'
            | b'#'
            | b'('
            | b')'
            | b'['
            | b']'
            | b'{'
            | b'}'
            | b':'
            | b';'
    ) && !b.is_ascii_control()
}
