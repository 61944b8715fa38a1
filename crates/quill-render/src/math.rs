//! Math operator identities and their operand bounds.

use crate::error::DocumentError;

/// A math operator applied to the operands of an [`Element::MathOp`](crate::Element::MathOp).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MathOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equals,
    NotEquals,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Approx,
    And,
    Or,
    ElementOf,
    Subset,
    Union,
    Intersection,
    Modulo,
    Assign,
    /// `−x`
    Negate,
    /// `¬x`
    Not,
    /// `x!`
    Factorial,
    Parentheses,
    Brackets,
    Braces,
    Floor,
    Ceil,
    /// `{a, b, …}`, possibly empty.
    Set,
    /// `(a, b, …)`, possibly empty.
    Tuple,
    /// Numerator over denominator.
    Fraction,
    /// Base and exponent.
    Power,
    /// Square root of the single operand.
    Sqrt,
    /// Index and radicand.
    Root,
    /// Lower limit, upper limit and body.
    Sum,
    /// Lower limit, upper limit and body.
    Product,
    /// Function name followed by its arguments.
    Function,
    /// Absolute value.
    Abs,
}

impl MathOperator {
    /// Inclusive bounds on the number of operands.
    #[must_use]
    pub const fn operand_bounds(self) -> (usize, usize) {
        match self {
            Self::Add
            | Self::Subtract
            | Self::Multiply
            | Self::Divide
            | Self::Equals
            | Self::NotEquals
            | Self::Less
            | Self::LessOrEqual
            | Self::Greater
            | Self::GreaterOrEqual
            | Self::Approx
            | Self::And
            | Self::Or
            | Self::Union
            | Self::Intersection => (2, usize::MAX),
            Self::ElementOf
            | Self::Subset
            | Self::Modulo
            | Self::Assign
            | Self::Fraction
            | Self::Power
            | Self::Root => (2, 2),
            Self::Negate
            | Self::Not
            | Self::Factorial
            | Self::Parentheses
            | Self::Brackets
            | Self::Braces
            | Self::Floor
            | Self::Ceil
            | Self::Sqrt
            | Self::Abs => (1, 1),
            Self::Set | Self::Tuple => (0, usize::MAX),
            Self::Sum | Self::Product => (3, 3),
            Self::Function => (1, usize::MAX),
        }
    }

    /// Fail unless `count` operands are acceptable.
    pub(crate) fn check_operands(self, count: usize) -> Result<(), DocumentError> {
        let (min, max) = self.operand_bounds();
        if (min..=max).contains(&count) {
            Ok(())
        } else {
            Err(DocumentError::OperandCount {
                operator: self,
                found: count,
                min,
                max,
            })
        }
    }

    /// Plain-text symbol used when math is flattened into attribute text.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract | Self::Negate => "\u{2212}",
            Self::Multiply => "\u{b7}",
            Self::Divide | Self::Fraction => "/",
            Self::Equals => "=",
            Self::NotEquals => "\u{2260}",
            Self::Less => "<",
            Self::LessOrEqual => "\u{2264}",
            Self::Greater => ">",
            Self::GreaterOrEqual => "\u{2265}",
            Self::Approx => "\u{2248}",
            Self::And => "\u{2227}",
            Self::Or => "\u{2228}",
            Self::ElementOf => "\u{2208}",
            Self::Subset => "\u{2286}",
            Self::Union => "\u{222a}",
            Self::Intersection => "\u{2229}",
            Self::Modulo => "mod",
            Self::Assign => "\u{2190}",
            Self::Not => "\u{ac}",
            Self::Factorial => "!",
            Self::Power => "^",
            Self::Sqrt | Self::Root => "\u{221a}",
            Self::Sum => "\u{2211}",
            Self::Product => "\u{220f}",
            Self::Parentheses
            | Self::Brackets
            | Self::Braces
            | Self::Floor
            | Self::Ceil
            | Self::Set
            | Self::Tuple
            | Self::Function
            | Self::Abs => "",
        }
    }

    /// Flatten checked operands into plain text, keeping prefix, suffix and
    /// bracket forms.
    pub(crate) fn plain_text(self, operands: &[String]) -> String {
        let list = || operands.join(", ");
        match (self, operands) {
            (Self::Negate | Self::Not | Self::Sqrt, [x]) => format!("{}{x}", self.symbol()),
            (Self::Factorial, [x]) => format!("{x}!"),
            (Self::Parentheses, [x]) => format!("({x})"),
            (Self::Brackets, [x]) => format!("[{x}]"),
            (Self::Braces, [x]) => format!("{{{x}}}"),
            (Self::Floor, [x]) => format!("\u{230a}{x}\u{230b}"),
            (Self::Ceil, [x]) => format!("\u{2308}{x}\u{2309}"),
            (Self::Abs, [x]) => format!("|{x}|"),
            (Self::Set, _) => format!("{{{}}}", list()),
            (Self::Tuple, _) => format!("({})", list()),
            (Self::Function, [name, args @ ..]) => format!("{name}({})", args.join(", ")),
            (Self::Root, [index, radicand]) => format!("{index}\u{221a}{radicand}"),
            (Self::Power, [base, exponent]) => format!("{base}^{exponent}"),
            (Self::Sum | Self::Product, [lower, upper, body]) => {
                format!("{}_{lower}^{upper} {body}", self.symbol())
            }
            _ => operands.join(&format!(" {} ", self.symbol())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn flat(op: MathOperator, operands: &[&str]) -> String {
        let operands: Vec<String> = operands.iter().map(|&o| o.to_owned()).collect();
        op.plain_text(&operands)
    }

    #[test]
    fn test_binary_operator_bounds() {
        assert!(MathOperator::Fraction.check_operands(2).is_ok());
        assert!(MathOperator::Fraction.check_operands(1).is_err());
        assert!(MathOperator::Fraction.check_operands(3).is_err());
    }

    #[test]
    fn test_variadic_infix() {
        assert!(MathOperator::Add.check_operands(5).is_ok());
        assert!(MathOperator::Add.check_operands(1).is_err());
    }

    #[test]
    fn test_empty_set_is_allowed() {
        assert!(MathOperator::Set.check_operands(0).is_ok());
        assert!(MathOperator::Function.check_operands(0).is_err());
    }

    #[test]
    fn test_error_reports_bounds() {
        let err = MathOperator::Sum.check_operands(2).unwrap_err();
        match err {
            DocumentError::OperandCount {
                operator,
                found,
                min,
                max,
            } => {
                assert_eq!(operator, MathOperator::Sum);
                assert_eq!((found, min, max), (2, 3, 3));
            }
            other => panic!("expected OperandCount, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_text_keeps_unary_and_bracket_forms() {
        assert_eq!(flat(MathOperator::Negate, &["x"]), "\u{2212}x");
        assert_eq!(flat(MathOperator::Not, &["p"]), "\u{ac}p");
        assert_eq!(flat(MathOperator::Factorial, &["n"]), "n!");
        assert_eq!(flat(MathOperator::Sqrt, &["2"]), "\u{221a}2");
        assert_eq!(flat(MathOperator::Parentheses, &["a + b"]), "(a + b)");
        assert_eq!(flat(MathOperator::Abs, &["x"]), "|x|");
        assert_eq!(flat(MathOperator::Floor, &["x"]), "\u{230a}x\u{230b}");
        assert_eq!(flat(MathOperator::Set, &[]), "{}");
        assert_eq!(flat(MathOperator::Tuple, &["a", "b"]), "(a, b)");
        assert_eq!(flat(MathOperator::Function, &["f", "x", "y"]), "f(x, y)");
    }

    #[test]
    fn test_plain_text_infix_and_limits() {
        assert_eq!(flat(MathOperator::Add, &["a", "b", "c"]), "a + b + c");
        assert_eq!(flat(MathOperator::Fraction, &["1", "2"]), "1 / 2");
        assert_eq!(flat(MathOperator::Power, &["x", "2"]), "x^2");
        assert_eq!(flat(MathOperator::Root, &["3", "x"]), "3\u{221a}x");
        assert_eq!(
            flat(MathOperator::Sum, &["i=1", "n", "i"]),
            "\u{2211}_i=1^n i"
        );
    }
}
