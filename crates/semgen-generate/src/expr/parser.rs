use std::collections::HashMap;

use super::ast::{BinaryOp, Expr, HookKind, HookSite, Span, UnaryOp};
use super::error::CompilationError;
use super::functions::MathFunction;
use super::lexer::{Token, TokenKind};

const QUALIFIERS: [&str; 3] = ["math", "np", "numpy"];

/// Name bindings visible to equations: variable slots, then constants.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    slots: HashMap<String, usize>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a slot, returning the existing slot if already bound.
    pub fn bind(&mut self, name: &str) -> usize {
        let next = self.slots.len();
        *self.slots.entry(name.to_string()).or_insert(next)
    }

    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn resolve(&self, name: &str) -> Expr {
        if let Some(slot) = self.slot(name) {
            return Expr::Variable {
                name: name.to_string(),
                slot: Some(slot),
            };
        }
        match name {
            "pi" => Expr::Number(std::f64::consts::PI),
            "e" => Expr::Number(std::f64::consts::E),
            "tau" => Expr::Number(std::f64::consts::TAU),
            "inf" => Expr::Number(f64::INFINITY),
            _ => Expr::Variable {
                name: name.to_string(),
                slot: None,
            },
        }
    }
}

/// Running occurrence counters used to number hook sites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookOrdinals {
    pub noise: usize,
    pub coef: usize,
}

impl HookOrdinals {
    fn next(&mut self, kind: HookKind) -> usize {
        let counter = match kind {
            HookKind::Noise | HookKind::Data => &mut self.noise,
            HookKind::Coef => &mut self.coef,
        };
        let ordinal = *counter;
        *counter += 1;
        ordinal
    }
}

/// Result of parsing one equation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEquation {
    /// Assignment target when the text reads `NAME = expr`.
    pub target: Option<String>,
    pub expr: Expr,
    /// Hook sites in evaluation order.
    pub hooks: Vec<HookSite>,
}

/// Split a leading `NAME =` off the token stream.
pub fn split_assignment(tokens: &[Token]) -> (Option<&str>, &[Token]) {
    match tokens {
        [
            Token {
                kind: TokenKind::Ident(name),
                ..
            },
            Token {
                kind: TokenKind::Assign,
                ..
            },
            rest @ ..,
        ] => (Some(name.as_str()), rest),
        _ => (None, tokens),
    }
}

/// Parse tokenized equation text. Hook ordinals are only advanced when the
/// whole equation parses.
pub fn parse_equation(
    source: &str,
    tokens: &[Token],
    scope: &Scope,
    ordinals: &mut HookOrdinals,
) -> Result<ParsedEquation, CompilationError> {
    let (target, body) = split_assignment(tokens);
    let mut parser = Parser {
        source,
        tokens: body,
        pos: 0,
        scope,
        ordinals: *ordinals,
        hooks: Vec::new(),
    };

    if body.is_empty() {
        return Err(CompilationError::new(source, source.len(), "empty equation"));
    }

    let expr = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(parser.error_at(token.span, "unexpected token"));
    }

    *ordinals = parser.ordinals;
    Ok(ParsedEquation {
        target: target.map(str::to_string),
        expr,
        hooks: parser.hooks,
    })
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    pos: usize,
    scope: &'a Scope,
    ordinals: HookOrdinals,
    hooks: Vec<HookSite>,
}

impl<'a> Parser<'a> {
    fn expression(&mut self) -> Result<Expr, CompilationError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, CompilationError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, CompilationError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Plus) => UnaryOp::Pos,
            _ => return self.power(),
        };
        self.pos += 1;
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    // `**` binds tighter than a unary minus on its left and is right associative.
    fn power(&mut self) -> Result<Expr, CompilationError> {
        let base = self.primary()?;
        if self.peek_kind() == Some(&TokenKind::StarStar) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, CompilationError> {
        let Some(token) = self.advance() else {
            return Err(CompilationError::new(
                self.source,
                self.source.len(),
                "unexpected end of equation",
            ));
        };

        match &token.kind {
            TokenKind::Number(value) => Ok(Expr::Number(*value)),
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect_rparen(token.span)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                let (name, span) = self.qualified_name(name, token.span)?;
                if self.peek_kind() == Some(&TokenKind::LParen) {
                    self.pos += 1;
                    self.call(name, span)
                } else {
                    Ok(self.scope.resolve(name))
                }
            }
            _ => Err(self.error_at(token.span, "expected a number, name or '('")),
        }
    }

    fn qualified_name(
        &mut self,
        name: &'a str,
        span: Span,
    ) -> Result<(&'a str, Span), CompilationError> {
        if self.peek_kind() != Some(&TokenKind::Dot) {
            return Ok((name, span));
        }
        if !QUALIFIERS.contains(&name) {
            return Err(self.error_at(
                span,
                format!("attribute access on '{name}' is not supported"),
            ));
        }
        self.pos += 1;
        match self.advance() {
            Some(Token {
                kind: TokenKind::Ident(member),
                span: member_span,
            }) => Ok((member.as_str(), span.to(*member_span))),
            Some(token) => Err(self.error_at(token.span, "expected a name after '.'")),
            None => Err(CompilationError::new(
                self.source,
                self.source.len(),
                "expected a name after '.'",
            )),
        }
    }

    fn call(&mut self, name: &str, name_span: Span) -> Result<Expr, CompilationError> {
        let mut args = Vec::new();
        if self.peek_kind() != Some(&TokenKind::RParen) {
            loop {
                args.push(self.expression()?);
                if self.peek_kind() == Some(&TokenKind::Comma) {
                    self.pos += 1;
                    continue;
                }
                break;
            }
        }
        let close = self.expect_rparen(name_span)?;
        let span = name_span.to(close);

        if let Some(kind) = HookKind::lookup(name) {
            if !args.is_empty() {
                return Err(self.error_at(span, format!("{}() takes no arguments", kind.name())));
            }
            let site = HookSite {
                kind,
                ordinal: self.ordinals.next(kind),
                span,
            };
            self.hooks.push(site);
            return Ok(Expr::Hook(site));
        }

        let Some(function) = MathFunction::lookup(name) else {
            return Err(self.error_at(name_span, format!("unknown function '{name}'")));
        };
        if !function.accepts(args.len()) {
            return Err(self.error_at(
                span,
                format!("{name}() does not take {} argument(s)", args.len()),
            ));
        }
        Ok(Expr::Call { function, args })
    }

    fn expect_rparen(&mut self, open: Span) -> Result<Span, CompilationError> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::RParen,
                span,
            }) => Ok(*span),
            Some(token) => Err(self.error_at(token.span, "expected ')'")),
            None => Err(self.error_at(open, "unclosed '('")),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn error_at(&self, span: Span, message: impl Into<String>) -> CompilationError {
        CompilationError::new(self.source, span.start, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{EvalError, Hooks, tokenize};

    struct Constant(f64);

    impl Hooks for Constant {
        fn draw(&mut self, _site: &HookSite) -> Result<f64, EvalError> {
            Ok(self.0)
        }
    }

    fn parse(source: &str, scope: &Scope, ordinals: &mut HookOrdinals) -> ParsedEquation {
        let tokens = tokenize(source).expect("tokenize");
        parse_equation(source, &tokens, scope, ordinals).expect("parse")
    }

    fn eval(source: &str) -> f64 {
        let scope = Scope::new();
        let parsed = parse(source, &scope, &mut HookOrdinals::default());
        parsed.expr.eval(&[], &mut Constant(0.0)).expect("eval")
    }

    #[test]
    fn precedence_matches_python() {
        assert_eq!(eval("1 + 2 * 3"), 7.0);
        assert_eq!(eval("-2**2"), -4.0);
        assert_eq!(eval("2**3**2"), 512.0);
        assert_eq!(eval("2**-1"), 0.5);
        assert_eq!(eval("(1 + 2) * 3 % 4"), 1.0);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
        assert_eq!(eval("math.floor(2.7) + max(1, 5, 3)"), 7.0);
    }

    #[test]
    fn assignment_target_is_split_off() {
        let mut scope = Scope::new();
        scope.bind("A");
        let parsed = parse("B = 2*A + noise()", &scope, &mut HookOrdinals::default());
        assert_eq!(parsed.target.as_deref(), Some("B"));
        let value = parsed
            .expr
            .eval(&[Some(3.0)], &mut Constant(0.5))
            .expect("eval");
        assert_eq!(value, 6.5);
    }

    #[test]
    fn hook_ordinals_continue_across_equations() {
        let scope = Scope::new();
        let mut ordinals = HookOrdinals::default();
        let first = parse("data() + coef() * noise()", &scope, &mut ordinals);
        let second = parse("noise() + coef()", &scope, &mut ordinals);

        let first: Vec<(HookKind, usize)> =
            first.hooks.iter().map(|h| (h.kind, h.ordinal)).collect();
        let second: Vec<(HookKind, usize)> =
            second.hooks.iter().map(|h| (h.kind, h.ordinal)).collect();
        assert_eq!(
            first,
            vec![(HookKind::Data, 0), (HookKind::Coef, 0), (HookKind::Noise, 1)]
        );
        assert_eq!(second, vec![(HookKind::Noise, 2), (HookKind::Coef, 1)]);
        assert_eq!(ordinals, HookOrdinals { noise: 3, coef: 2 });
    }

    #[test]
    fn hook_spans_cover_the_call() {
        let source = "B = 2*A + noise( )";
        let parsed = parse(source, &Scope::new(), &mut HookOrdinals::default());
        let span = parsed.hooks[0].span;
        assert_eq!(&source[span.start..span.end], "noise( )");
    }

    #[test]
    fn failed_parse_does_not_consume_ordinals() {
        let source = "noise() + coef(1)";
        let tokens = tokenize(source).expect("tokenize");
        let mut ordinals = HookOrdinals::default();
        let err = parse_equation(source, &tokens, &Scope::new(), &mut ordinals)
            .expect_err("coef takes no arguments");
        assert!(err.message.contains("takes no arguments"));
        assert_eq!(ordinals, HookOrdinals::default());
    }

    #[test]
    fn reports_syntax_errors() {
        let cases = [
            ("2 *", "unexpected end"),
            ("(1 + 2", "unclosed"),
            ("foo(1)", "unknown function"),
            ("atan2(1)", "argument"),
            ("A B", "unexpected token"),
            ("os.system(1)", "attribute access"),
            ("", "empty equation"),
        ];
        for (source, needle) in cases {
            let tokens = tokenize(source).expect("tokenize");
            let err = parse_equation(source, &tokens, &Scope::new(), &mut HookOrdinals::default())
                .expect_err(source);
            assert!(
                err.message.contains(needle),
                "{source}: '{}' does not mention '{needle}'",
                err.message
            );
        }
    }

    #[test]
    fn unknown_names_resolve_without_slots() {
        let parsed = parse("C + 1", &Scope::new(), &mut HookOrdinals::default());
        let err = parsed
            .expr
            .eval(&[], &mut Constant(0.0))
            .expect_err("C is undefined");
        assert_eq!(err, EvalError::UndefinedVariable("C".to_string()));
    }
}
