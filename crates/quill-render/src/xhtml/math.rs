//! Operator layouts as nested XHTML tables.

use std::fmt::Write;

use crate::math::MathOperator;

/// Layout strategy for one family of operators.
trait Layout: Sync {
    fn render(&self, operands: &[String], out: &mut String);
}

/// Operands joined by a separator between a prefix and a suffix.
struct Infix {
    prefix: &'static str,
    separator: &'static str,
    suffix: &'static str,
}

impl Layout for Infix {
    fn render(&self, operands: &[String], out: &mut String) {
        out.push_str(self.prefix);
        for (i, operand) in operands.iter().enumerate() {
            if i > 0 {
                out.push_str(self.separator);
            }
            out.push_str(operand);
        }
        out.push_str(self.suffix);
    }
}

const fn infix(separator: &'static str) -> Infix {
    Infix {
        prefix: "",
        separator,
        suffix: "",
    }
}

const fn bracket(prefix: &'static str, suffix: &'static str) -> Infix {
    Infix {
        prefix,
        separator: ", ",
        suffix,
    }
}

struct Fraction;

impl Layout for Fraction {
    fn render(&self, operands: &[String], out: &mut String) {
        let [top, bottom] = operands else { return };
        write!(
            out,
            r#"<table class="math fraction"><tr><td class="fractionTop">{top}</td></tr><tr><td class="fractionBottom">{bottom}</td></tr></table>"#
        )
        .unwrap();
    }
}

struct Power;

impl Layout for Power {
    fn render(&self, operands: &[String], out: &mut String) {
        let [base, exponent] = operands else { return };
        write!(
            out,
            r#"<table class="math power"><tr><td class="base" rowspan="2">{base}</td><td class="exponent">{exponent}</td></tr><tr><td></td></tr></table>"#
        )
        .unwrap();
    }
}

struct Sqrt;

impl Layout for Sqrt {
    fn render(&self, operands: &[String], out: &mut String) {
        let [radicand] = operands else { return };
        write!(
            out,
            r#"<table class="math sqrt"><tr><td class="radical">&#x221A;</td><td class="radicand">{radicand}</td></tr></table>"#
        )
        .unwrap();
    }
}

struct Root;

impl Layout for Root {
    fn render(&self, operands: &[String], out: &mut String) {
        let [index, radicand] = operands else { return };
        write!(
            out,
            r#"<table class="math root"><tr><td class="rootIndex">{index}</td><td class="radical">&#x221A;</td><td class="radicand">{radicand}</td></tr></table>"#
        )
        .unwrap();
    }
}

/// Sum and product: upper limit, symbol with body, lower limit.
struct BigOperator {
    symbol: &'static str,
}

impl Layout for BigOperator {
    fn render(&self, operands: &[String], out: &mut String) {
        let [lower, upper, body] = operands else { return };
        write!(
            out,
            r#"<table class="math bigOperator"><tr><td class="limit">{upper}</td><td></td></tr><tr><td class="bigOperator">{}</td><td>{body}</td></tr><tr><td class="limit">{lower}</td><td></td></tr></table>"#,
            self.symbol
        )
        .unwrap();
    }
}

struct Function;

impl Layout for Function {
    fn render(&self, operands: &[String], out: &mut String) {
        let Some((name, args)) = operands.split_first() else {
            return;
        };
        out.push_str(name);
        bracket("(", ")").render(args, out);
    }
}

struct Abs;

impl Layout for Abs {
    fn render(&self, operands: &[String], out: &mut String) {
        let [value] = operands else { return };
        write!(
            out,
            r#"<table class="math abs"><tr><td class="bar">|</td><td>{value}</td><td class="bar">|</td></tr></table>"#
        )
        .unwrap();
    }
}

static ADD: Infix = infix(" + ");
static SUBTRACT: Infix = infix(" \u{2212} ");
static MULTIPLY: Infix = infix(" \u{b7} ");
static DIVIDE: Infix = infix("/");
static EQUALS: Infix = infix(" = ");
static NOT_EQUALS: Infix = infix(" \u{2260} ");
static LESS: Infix = infix(" &lt; ");
static LESS_OR_EQUAL: Infix = infix(" \u{2264} ");
static GREATER: Infix = infix(" &gt; ");
static GREATER_OR_EQUAL: Infix = infix(" \u{2265} ");
static APPROX: Infix = infix(" \u{2248} ");
static AND: Infix = infix(" \u{2227} ");
static OR: Infix = infix(" \u{2228} ");
static ELEMENT_OF: Infix = infix(" \u{2208} ");
static SUBSET: Infix = infix(" \u{2286} ");
static UNION: Infix = infix(" \u{222a} ");
static INTERSECTION: Infix = infix(" \u{2229} ");
static MODULO: Infix = infix(" mod ");
static ASSIGN: Infix = infix(" \u{2190} ");
static NEGATE: Infix = bracket("\u{2212}", "");
static NOT: Infix = bracket("\u{ac}", "");
static FACTORIAL: Infix = bracket("", "!");
static PARENTHESES: Infix = bracket("(", ")");
static BRACKETS: Infix = bracket("[", "]");
static BRACES: Infix = bracket("{", "}");
static FLOOR: Infix = bracket("\u{230a}", "\u{230b}");
static CEIL: Infix = bracket("\u{2308}", "\u{2309}");
static SET: Infix = bracket("{", "}");
static TUPLE: Infix = bracket("(", ")");
static SUM: BigOperator = BigOperator { symbol: "\u{2211}" };
static PRODUCT: BigOperator = BigOperator { symbol: "\u{220f}" };

fn layout_for(op: MathOperator) -> &'static dyn Layout {
    match op {
        MathOperator::Add => &ADD,
        MathOperator::Subtract => &SUBTRACT,
        MathOperator::Multiply => &MULTIPLY,
        MathOperator::Divide => &DIVIDE,
        MathOperator::Equals => &EQUALS,
        MathOperator::NotEquals => &NOT_EQUALS,
        MathOperator::Less => &LESS,
        MathOperator::LessOrEqual => &LESS_OR_EQUAL,
        MathOperator::Greater => &GREATER,
        MathOperator::GreaterOrEqual => &GREATER_OR_EQUAL,
        MathOperator::Approx => &APPROX,
        MathOperator::And => &AND,
        MathOperator::Or => &OR,
        MathOperator::ElementOf => &ELEMENT_OF,
        MathOperator::Subset => &SUBSET,
        MathOperator::Union => &UNION,
        MathOperator::Intersection => &INTERSECTION,
        MathOperator::Modulo => &MODULO,
        MathOperator::Assign => &ASSIGN,
        MathOperator::Negate => &NEGATE,
        MathOperator::Not => &NOT,
        MathOperator::Factorial => &FACTORIAL,
        MathOperator::Parentheses => &PARENTHESES,
        MathOperator::Brackets => &BRACKETS,
        MathOperator::Braces => &BRACES,
        MathOperator::Floor => &FLOOR,
        MathOperator::Ceil => &CEIL,
        MathOperator::Set => &SET,
        MathOperator::Tuple => &TUPLE,
        MathOperator::Fraction => &Fraction,
        MathOperator::Power => &Power,
        MathOperator::Sqrt => &Sqrt,
        MathOperator::Root => &Root,
        MathOperator::Sum => &SUM,
        MathOperator::Product => &PRODUCT,
        MathOperator::Function => &Function,
        MathOperator::Abs => &Abs,
    }
}

/// Render `op` applied to already rendered `operands`.
pub(crate) fn render_operator(op: MathOperator, operands: &[String], out: &mut String) {
    layout_for(op).render(operands, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(op: MathOperator, operands: &[&str]) -> String {
        let operands: Vec<String> = operands.iter().map(|s| (*s).to_owned()).collect();
        let mut out = String::new();
        render_operator(op, &operands, &mut out);
        out
    }

    #[test]
    fn test_infix() {
        assert_eq!(render(MathOperator::Add, &["a", "b", "c"]), "a + b + c");
        assert_eq!(render(MathOperator::Less, &["x", "y"]), "x &lt; y");
        assert_eq!(render(MathOperator::Modulo, &["7", "3"]), "7 mod 3");
    }

    #[test]
    fn test_prefix_and_suffix() {
        assert_eq!(render(MathOperator::Negate, &["x"]), "\u{2212}x");
        assert_eq!(render(MathOperator::Factorial, &["n"]), "n!");
        assert_eq!(render(MathOperator::Floor, &["x"]), "\u{230a}x\u{230b}");
    }

    #[test]
    fn test_collections() {
        assert_eq!(render(MathOperator::Set, &["a", "b"]), "{a, b}");
        assert_eq!(render(MathOperator::Set, &[]), "{}");
        assert_eq!(render(MathOperator::Tuple, &["1", "2", "3"]), "(1, 2, 3)");
    }

    #[test]
    fn test_function() {
        assert_eq!(render(MathOperator::Function, &["f", "x", "y"]), "f(x, y)");
        assert_eq!(render(MathOperator::Function, &["g"]), "g()");
    }

    #[test]
    fn test_fraction_stacks_rows() {
        let out = render(MathOperator::Fraction, &["1", "n"]);
        assert_eq!(
            out,
            r#"<table class="math fraction"><tr><td class="fractionTop">1</td></tr><tr><td class="fractionBottom">n</td></tr></table>"#
        );
    }

    #[test]
    fn test_power_spans_base() {
        let out = render(MathOperator::Power, &["x", "2"]);
        assert!(out.contains(r#"<td class="base" rowspan="2">x</td><td class="exponent">2</td>"#));
    }

    #[test]
    fn test_sum_has_three_rows() {
        let out = render(MathOperator::Sum, &["i=1", "n", "i"]);
        assert_eq!(out.matches("<tr>").count(), 3);
        let upper = out.find(">n<").unwrap();
        let lower = out.find(">i=1<").unwrap();
        assert!(upper < lower);
        assert!(out.contains("\u{2211}"));
    }

    #[test]
    fn test_root_places_index_first() {
        let out = render(MathOperator::Root, &["3", "x"]);
        let index = out.find("rootIndex").unwrap();
        let radicand = out.find("radicand").unwrap();
        assert!(index < radicand);
    }

    #[test]
    fn test_abs_is_single_row() {
        let out = render(MathOperator::Abs, &["x"]);
        assert_eq!(out.matches("<tr>").count(), 1);
        assert_eq!(out.matches('|').count(), 2);
    }
}
