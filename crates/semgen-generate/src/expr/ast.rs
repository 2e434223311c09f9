use super::error::EvalError;
use super::functions::{MathFunction, power};

/// Byte range inside the equation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn to(self, other: Span) -> Span {
        Span::new(self.start, other.end)
    }
}

/// Parameter hooks callable from equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Sample from a randomly chosen noise distribution.
    Noise,
    /// Randomly drawn coefficient.
    Coef,
    /// Noise shifted by the configured data offset.
    Data,
}

impl HookKind {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "noise" => Some(Self::Noise),
            "coef" => Some(Self::Coef),
            "data" => Some(Self::Data),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Noise => "noise",
            Self::Coef => "coef",
            Self::Data => "data",
        }
    }
}

/// One occurrence of a hook call inside the model.
///
/// `ordinal` is the occurrence index within a full evaluation pass: `noise()`
/// and `data()` share one sequence, `coef()` has its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookSite {
    pub kind: HookKind,
    pub ordinal: usize,
    pub span: Span,
}

/// Supplies values for hook calls during evaluation.
pub trait Hooks {
    fn draw(&mut self, site: &HookSite) -> Result<f64, EvalError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

/// Compiled expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Reference to a model variable; `slot` is `None` for unknown names.
    Variable { name: String, slot: Option<usize> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Call { function: MathFunction, args: Vec<Expr> },
    Hook(HookSite),
}

impl Expr {
    /// Evaluate left to right against the current sample's bindings.
    pub fn eval<H>(&self, env: &[Option<f64>], hooks: &mut H) -> Result<f64, EvalError>
    where
        H: Hooks + ?Sized,
    {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Variable { name, slot } => (*slot)
                .and_then(|slot| env.get(slot).copied().flatten())
                .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
            Expr::Unary { op, operand } => {
                let value = operand.eval(env, hooks)?;
                Ok(match op {
                    UnaryOp::Neg => -value,
                    UnaryOp::Pos => value,
                })
            }
            Expr::Binary { op, left, right } => {
                let left = left.eval(env, hooks)?;
                let right = right.eval(env, hooks)?;
                apply_binary(*op, left, right)
            }
            Expr::Call { function, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(arg.eval(env, hooks)?);
                }
                function.apply(&values)
            }
            Expr::Hook(site) => hooks.draw(site),
        }
    }
}

impl Expr {
    /// Names of the variables this expression reads, in evaluation order.
    pub fn referenced_variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Variable { name, .. } => names.push(name.as_str()),
            Expr::Unary { operand, .. } => operand.collect_variables(names),
            Expr::Binary { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
            Expr::Number(_) | Expr::Hook(_) => {}
        }
    }
}

fn apply_binary(op: BinaryOp, left: f64, right: f64) -> Result<f64, EvalError> {
    match op {
        BinaryOp::Add => Ok(left + right),
        BinaryOp::Sub => Ok(left - right),
        BinaryOp::Mul => Ok(left * right),
        BinaryOp::Div if right == 0.0 => Err(EvalError::DivisionByZero),
        BinaryOp::Div => Ok(left / right),
        BinaryOp::Rem if right == 0.0 => Err(EvalError::DivisionByZero),
        // Floored modulo: the result takes the sign of the divisor.
        BinaryOp::Rem => Ok(left - right * (left / right).floor()),
        BinaryOp::Pow => power(left, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<HookKind>);

    impl Hooks for Fixed {
        fn draw(&mut self, site: &HookSite) -> Result<f64, EvalError> {
            self.0.push(site.kind);
            Ok(match site.kind {
                HookKind::Noise => 0.5,
                HookKind::Coef => 2.0,
                HookKind::Data => 1.5,
            })
        }
    }

    fn hook(kind: HookKind, ordinal: usize) -> Box<Expr> {
        Box::new(Expr::Hook(HookSite {
            kind,
            ordinal,
            span: Span::new(0, 0),
        }))
    }

    #[test]
    fn evaluates_hooks_left_to_right() {
        let expr = Expr::Binary {
            op: BinaryOp::Add,
            left: Box::new(Expr::Binary {
                op: BinaryOp::Mul,
                left: hook(HookKind::Coef, 0),
                right: Box::new(Expr::Variable {
                    name: "A".to_string(),
                    slot: Some(0),
                }),
            }),
            right: hook(HookKind::Noise, 0),
        };
        let mut hooks = Fixed(Vec::new());
        let value = expr.eval(&[Some(3.0)], &mut hooks).expect("eval");
        assert_eq!(value, 6.5);
        assert_eq!(hooks.0, vec![HookKind::Coef, HookKind::Noise]);
    }

    #[test]
    fn unbound_variable_is_undefined() {
        let expr = Expr::Variable {
            name: "B".to_string(),
            slot: Some(1),
        };
        let mut hooks = Fixed(Vec::new());
        assert_eq!(
            expr.eval(&[Some(1.0), None], &mut hooks),
            Err(EvalError::UndefinedVariable("B".to_string()))
        );
    }

    #[test]
    fn modulo_follows_divisor_sign() {
        assert_eq!(apply_binary(BinaryOp::Rem, -7.0, 3.0), Ok(2.0));
        assert_eq!(apply_binary(BinaryOp::Rem, 7.0, -3.0), Ok(-2.0));
        assert_eq!(
            apply_binary(BinaryOp::Div, 1.0, 0.0),
            Err(EvalError::DivisionByZero)
        );
    }
}
