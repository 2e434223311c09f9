use super::error::EvalError;

/// Functions available to equation authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFunction {
    Abs,
    Sqrt,
    Exp,
    Log,
    Log10,
    Log2,
    Log1p,
    Expm1,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sinh,
    Cosh,
    Tanh,
    Pow,
    Min,
    Max,
    Floor,
    Ceil,
    Round,
    Trunc,
    Hypot,
    Degrees,
    Radians,
}

impl MathFunction {
    pub fn lookup(name: &str) -> Option<Self> {
        let function = match name {
            "abs" | "fabs" => Self::Abs,
            "sqrt" => Self::Sqrt,
            "exp" => Self::Exp,
            "log" => Self::Log,
            "log10" => Self::Log10,
            "log2" => Self::Log2,
            "log1p" => Self::Log1p,
            "expm1" => Self::Expm1,
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "atan2" => Self::Atan2,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "pow" => Self::Pow,
            "min" => Self::Min,
            "max" => Self::Max,
            "floor" => Self::Floor,
            "ceil" => Self::Ceil,
            "round" => Self::Round,
            "trunc" => Self::Trunc,
            "hypot" => Self::Hypot,
            "degrees" => Self::Degrees,
            "radians" => Self::Radians,
            _ => return None,
        };
        Some(function)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Abs => "abs",
            Self::Sqrt => "sqrt",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Log10 => "log10",
            Self::Log2 => "log2",
            Self::Log1p => "log1p",
            Self::Expm1 => "expm1",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Atan2 => "atan2",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Pow => "pow",
            Self::Min => "min",
            Self::Max => "max",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
            Self::Trunc => "trunc",
            Self::Hypot => "hypot",
            Self::Degrees => "degrees",
            Self::Radians => "radians",
        }
    }

    /// Accepted argument counts, inclusive; `None` means unbounded.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Self::Log => (1, Some(2)),
            Self::Atan2 | Self::Pow | Self::Hypot => (2, Some(2)),
            Self::Min | Self::Max => (1, None),
            _ => (1, Some(1)),
        }
    }

    pub fn accepts(self, count: usize) -> bool {
        let (min, max) = self.arity();
        count >= min && max.is_none_or(|max| count <= max)
    }

    /// Apply the function; NaN or infinite results from finite input are errors.
    pub fn apply(self, args: &[f64]) -> Result<f64, EvalError> {
        let x = args.first().copied().unwrap_or(f64::NAN);
        let y = args.get(1).copied().unwrap_or(f64::NAN);
        let value = match self {
            Self::Abs => x.abs(),
            Self::Sqrt => x.sqrt(),
            Self::Exp => x.exp(),
            Self::Log if args.len() == 2 => {
                if x <= 0.0 || y <= 0.0 || y == 1.0 {
                    return Err(EvalError::MathDomain { function: "log" });
                }
                x.ln() / y.ln()
            }
            Self::Log => {
                if x <= 0.0 {
                    return Err(EvalError::MathDomain { function: "log" });
                }
                x.ln()
            }
            Self::Log10 | Self::Log2 if x <= 0.0 => {
                return Err(EvalError::MathDomain {
                    function: self.name(),
                });
            }
            Self::Log10 => x.log10(),
            Self::Log2 => x.log2(),
            Self::Log1p if x <= -1.0 => {
                return Err(EvalError::MathDomain { function: "log1p" });
            }
            Self::Log1p => x.ln_1p(),
            Self::Expm1 => x.exp_m1(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Asin => x.asin(),
            Self::Acos => x.acos(),
            Self::Atan => x.atan(),
            Self::Atan2 => x.atan2(y),
            Self::Sinh => x.sinh(),
            Self::Cosh => x.cosh(),
            Self::Tanh => x.tanh(),
            Self::Pow => power(x, y)?,
            Self::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Floor => x.floor(),
            Self::Ceil => x.ceil(),
            // Ties go to the even neighbour.
            Self::Round => x.round_ties_even(),
            Self::Trunc => x.trunc(),
            Self::Hypot => x.hypot(y),
            Self::Degrees => x.to_degrees(),
            Self::Radians => x.to_radians(),
        };
        check_result(self.name(), args, value)
    }
}

/// `base ** exponent` with the same failure modes as the math functions.
pub(crate) fn power(base: f64, exponent: f64) -> Result<f64, EvalError> {
    if base == 0.0 && exponent < 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    check_result("pow", &[base, exponent], base.powf(exponent))
}

fn check_result(function: &'static str, args: &[f64], value: f64) -> Result<f64, EvalError> {
    let finite_input = args.iter().all(|arg| arg.is_finite());
    if finite_input && value.is_nan() {
        return Err(EvalError::MathDomain { function });
    }
    if finite_input && value.is_infinite() {
        return Err(EvalError::Overflow { function });
    }
    Ok(value)
}
