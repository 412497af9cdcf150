//! Expression parsing with operator precedence.
//!
//! Precedence (lowest → highest):
//! 4. `=` (right-associative)
//! 3. `//` (left-associative)
//! 2. `<<`, `>>` (left-associative)
//! 1. prefix `` ` ``, binary `:` (non-associative)
//!
//! Every reduction allocates an `op` node whose value is the operator
//! glyph and whose sequence holds the operands in source order.
//!
//! Trees deeper than [`MAX_NESTING_DEPTH`] are rejected, whether the depth
//! comes from nesting or from a long left-associative chain.

use metal_lexer::TokenKind;
use metal_types::{ErrorCode, Graph, Kind, MetalError, NodeId, Scalar, Span};

use crate::parser::Parser;

/// Deepest expression tree the parser builds.
pub const MAX_NESTING_DEPTH: u32 = 128;

/// A reduced expression and the source it covers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Parsed {
    pub(crate) node: NodeId,
    pub(crate) span: Span,
    /// Height of the tree under `node`; a leaf is 1.
    pub(crate) depth: u32,
}

impl Parsed {
    fn leaf(node: NodeId, span: Span) -> Self {
        Self { node, span, depth: 1 }
    }
}

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse one full expression.
    pub(crate) fn parse_expression(&mut self, graph: &mut Graph) -> Result<Parsed, MetalError> {
        self.nested(|p| p.parse_assign(graph))
    }

    /// Run `parse` one recursion level deeper, refusing to go past
    /// [`MAX_NESTING_DEPTH`].
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, MetalError>,
    ) -> Result<T, MetalError> {
        self.expr_depth += 1;
        if self.expr_depth > MAX_NESTING_DEPTH {
            let depth = self.expr_depth;
            self.expr_depth -= 1;
            let span = self.peek_span().unwrap_or_else(|_| self.previous_span());
            return Err(self.too_deep(depth, span));
        }
        let result = parse(self);
        self.expr_depth -= 1;
        result
    }

    fn reduce(&self, graph: &mut Graph, glyph: &str, operands: &[Parsed]) -> Result<Parsed, MetalError> {
        let span = operands
            .iter()
            .map(|p| p.span)
            .reduce(Span::merge)
            .unwrap_or(self.previous_span());
        let depth = 1 + operands.iter().map(|p| p.depth).max().unwrap_or(0);
        if depth > MAX_NESTING_DEPTH {
            return Err(self.too_deep(depth, span));
        }
        let node = graph.alloc(Kind::Op, glyph);
        for operand in operands {
            graph.push(node, operand.node);
        }
        Ok(Parsed { node, span, depth })
    }

    fn too_deep(&self, depth: u32, span: Span) -> MetalError {
        self.error_at(
            ErrorCode::NESTING_TOO_DEEP,
            format!("maximum expression nesting depth is {MAX_NESTING_DEPTH}, got {depth}"),
            span,
        )
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `Assign = Push [ "=" Assign ]`
    fn parse_assign(&mut self, graph: &mut Graph) -> Result<Parsed, MetalError> {
        let left = self.parse_push(graph)?;
        if self.eat(&TokenKind::Eq)? {
            let right = self.nested(|p| p.parse_assign(graph))?;
            return self.reduce(graph, "=", &[left, right]);
        }
        Ok(left)
    }

    /// `Push = Shift { "//" Shift }`
    fn parse_push(&mut self, graph: &mut Graph) -> Result<Parsed, MetalError> {
        let mut left = self.parse_shift(graph)?;
        while self.eat(&TokenKind::Push)? {
            let right = self.parse_shift(graph)?;
            left = self.reduce(graph, "//", &[left, right])?;
        }
        Ok(left)
    }

    /// `Shift = Apply { ("<<" | ">>") Apply }`
    fn parse_shift(&mut self, graph: &mut Graph) -> Result<Parsed, MetalError> {
        let mut left = self.parse_apply(graph)?;
        loop {
            let glyph = match self.peek()? {
                TokenKind::LShift => "<<",
                TokenKind::RShift => ">>",
                _ => break,
            };
            self.advance()?;
            let right = self.parse_apply(graph)?;
            left = self.reduce(graph, glyph, &[left, right])?;
        }
        Ok(left)
    }

    /// `Apply = Quote [ ":" Quote ]`
    ///
    /// `:` shares its level with prefix `` ` `` and neither associates:
    /// `a : b : c` and `` `a : b `` are rejected.
    fn parse_apply(&mut self, graph: &mut Graph) -> Result<Parsed, MetalError> {
        let left_quoted = self.peek()? == &TokenKind::Tick;
        let left = self.parse_quote(graph)?;
        if self.peek()? != &TokenKind::Colon {
            return Ok(left);
        }
        if left_quoted {
            return Err(self.non_associative("`"));
        }
        self.advance()?;
        let right = self.parse_quote(graph)?;
        if self.peek()? == &TokenKind::Colon {
            return Err(self.non_associative(":"));
        }
        self.reduce(graph, ":", &[left, right])
    }

    /// `Quote = "`" Quote | Primary`
    fn parse_quote(&mut self, graph: &mut Graph) -> Result<Parsed, MetalError> {
        if self.peek()? != &TokenKind::Tick {
            return self.parse_primary(graph);
        }
        let tick = self.advance()?;
        let operand = self.nested(|p| p.parse_quote(graph))?;
        let mut quoted = self.reduce(graph, "`", &[operand])?;
        quoted.span = tick.span.merge(operand.span);
        Ok(quoted)
    }

    fn non_associative(&mut self, glyph: &str) -> MetalError {
        let span = self.peek_span().unwrap_or_else(|_| self.previous_span());
        self.error_at(
            ErrorCode::NON_ASSOCIATIVE,
            format!("'{glyph}' does not associate with ':'; use parentheses"),
            span,
        )
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self, graph: &mut Graph) -> Result<Parsed, MetalError> {
        let kind = self.peek()?.clone();
        let (node_kind, value): (Kind, Scalar) = match kind {
            // ── Literals ────────────────────────────────────────────────
            TokenKind::Symbol(name) => {
                let token = self.advance()?;
                if self.peek()? == &TokenKind::LBracket {
                    return self.parse_vector(graph, Scalar::Text(name), token.span);
                }
                let node = graph.alloc(Kind::Symbol, name);
                return Ok(Parsed::leaf(node, token.span));
            }
            TokenKind::Str(s) => (Kind::String, s.into()),
            TokenKind::Number(x) => (Kind::Number, x.into()),
            TokenKind::Integer(n) => (Kind::Integer, n.into()),
            TokenKind::Hex(n) => (Kind::Hex, n.into()),
            TokenKind::Bin(n) => (Kind::Bin, n.into()),
            TokenKind::Url(s) => (Kind::Url, s.into()),
            TokenKind::Email(s) => (Kind::Email, s.into()),
            TokenKind::Ip(s) => (Kind::Ip, s.into()),

            // ── Collections ─────────────────────────────────────────────
            TokenKind::LBracket => {
                let span = self.peek_span()?;
                return self.parse_vector(graph, Scalar::Empty, span);
            }

            // ── Grouping ────────────────────────────────────────────────
            TokenKind::LParen => return self.parse_group(graph),

            _ => return Err(self.unexpected("an expression")),
        };
        let token = self.advance()?;
        let node = graph.alloc(node_kind, value);
        Ok(Parsed::leaf(node, token.span))
    }

    /// `"(" Assign ")"`: the parentheses leave no trace in the tree.
    fn parse_group(&mut self, graph: &mut Graph) -> Result<Parsed, MetalError> {
        let open = self.advance()?;
        self.open.push(("(", open.span));
        let inner = self.parse_expression(graph);
        let inner = inner.and_then(|inner| {
            self.close(&TokenKind::RParen, "(", open.span)?;
            Ok(inner)
        });
        self.open.pop();
        let inner = inner?;
        Ok(Parsed {
            span: open.span.merge(self.previous_span()),
            ..inner
        })
    }

    /// `[Symbol] "[" { Assign } "]"`: elements are kept unevaluated.
    fn parse_vector(&mut self, graph: &mut Graph, name: Scalar, start: Span) -> Result<Parsed, MetalError> {
        let open = self.advance()?;
        let vector = graph.alloc(Kind::Vector, name);
        self.open.push(("[", open.span));
        let result = self.parse_elements(graph, vector, open.span);
        self.open.pop();
        let deepest = result?;
        let span = start.merge(self.previous_span());
        let depth = deepest + 1;
        if depth > MAX_NESTING_DEPTH {
            return Err(self.too_deep(depth, span));
        }
        Ok(Parsed {
            node: vector,
            span,
            depth,
        })
    }

    /// Parse elements up to `]`, returning the depth of the deepest one.
    fn parse_elements(&mut self, graph: &mut Graph, vector: NodeId, open: Span) -> Result<u32, MetalError> {
        let mut deepest = 0;
        loop {
            match self.peek()? {
                TokenKind::RBracket => {
                    self.advance()?;
                    return Ok(deepest);
                }
                TokenKind::Eof => return Err(self.unclosed("[", open)),
                _ => {
                    let element = self.parse_expression(graph)?;
                    graph.push(vector, element.node);
                    deepest = deepest.max(element.depth);
                }
            }
        }
    }

    /// Consume the closing delimiter `close`, or report why it is missing.
    fn close(&mut self, close: &TokenKind, open: &str, open_span: Span) -> Result<(), MetalError> {
        if self.eat(close)? {
            return Ok(());
        }
        if self.peek()? == &TokenKind::Eof {
            return Err(self.unclosed(open, open_span));
        }
        Err(self.unexpected(&format!("'{close}'")))
    }
}
