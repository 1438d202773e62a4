//! Parse pest pairs into formula AST nodes
//!
//! Custom measurement names carry a leading `@`, which the grammar does not
//! accept in identifiers. They are rewritten to `__custom__name` before the
//! formula reaches pest.

use std::collections::BTreeMap;

use pest::Parser;
use pest::Span;
use pest::error::InputLocation;
use pest::iterators::Pair;

use crate::ast::*;
use crate::errors::SyntaxError;
use crate::{FormulaParser, Rule};

/// Marks a custom measurement name in formulas and measurement tables.
pub const CUSTOM_SIGIL: char = '@';

/// Replaces [`CUSTOM_SIGIL`] in canonical symbol names.
pub const CUSTOM_PREFIX: &str = "__custom__";

/// Canonical symbol name for a measurement display name.
///
/// `@hip_depth` becomes `__custom__hip_depth`; standard names are unchanged.
pub fn canonical_name(display: &str) -> String {
    match display.strip_prefix(CUSTOM_SIGIL) {
        Some(rest) => format!("{CUSTOM_PREFIX}{rest}"),
        None => display.to_string(),
    }
}

/// A formula with custom names rewritten, plus the mapping back to display names.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub text: String,
    /// canonical name -> name as written
    pub display_names: BTreeMap<String, String>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replace every `@name` occurrence with its canonical identifier.
///
/// A sigil that does not start a token, or is not followed by an identifier
/// character, is left alone so the parser reports it where it stands.
pub fn rewrite_custom_names(formula: &str) -> Rewrite {
    let mut text = String::with_capacity(formula.len());
    let mut display_names = BTreeMap::new();
    let mut chars = formula.char_indices().peekable();
    let mut previous: Option<char> = None;

    while let Some((start, c)) = chars.next() {
        let starts_name = c == CUSTOM_SIGIL
            && !previous.is_some_and(is_ident_char)
            && chars.peek().is_some_and(|&(_, next)| is_ident_char(next));
        previous = Some(c);
        if !starts_name {
            text.push(c);
            continue;
        }
        let mut end = start + c.len_utf8();
        while let Some(&(i, next)) = chars.peek() {
            if !is_ident_char(next) {
                break;
            }
            end = i + next.len_utf8();
            previous = Some(next);
            chars.next();
        }
        let display = &formula[start..end];
        let canonical = canonical_name(display);
        text.push_str(&canonical);
        display_names.insert(canonical, display.to_string());
    }

    Rewrite {
        text,
        display_names,
    }
}

/// Parse formula source into an AST, returning the rewrite it was parsed from.
pub fn parse_formula(formula: &str) -> Result<(Expr, Rewrite), SyntaxError> {
    let rewrite = rewrite_custom_names(formula);
    let builder = Builder {
        formula,
        text: &rewrite.text,
    };

    let mut pairs = FormulaParser::parse(Rule::formula, &rewrite.text)
        .map_err(|e| builder.pest_error(e))?;

    let formula_pair = pairs
        .next()
        .ok_or_else(|| builder.error(0, rewrite.text.len(), "empty formula"))?;
    let span = formula_pair.as_span();
    let expr_pair = builder.expect(formula_pair.into_inner().next(), span)?;
    let expr = builder.expr(expr_pair)?;
    Ok((expr, rewrite))
}

struct Builder<'a> {
    formula: &'a str,
    text: &'a str,
}

impl Builder<'_> {
    fn error(&self, start: usize, len: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            formula: self.formula.to_string(),
            message: message.into(),
            parsed_text: self.text.to_string(),
            span: (start, len).into(),
        }
    }

    fn pest_error(&self, e: pest::error::Error<Rule>) -> SyntaxError {
        let (start, len) = match e.location {
            InputLocation::Pos(p) => (p, 0),
            InputLocation::Span((s, end)) => (s, end - s),
        };
        let e = e.renamed_rules(|rule| {
            match rule {
                Rule::expr | Rule::term | Rule::factor | Rule::primary => "expression",
                Rule::add_op | Rule::mul_op => "operator",
                Rule::NUMBER => "number",
                Rule::IDENT => "name",
                Rule::args => "arguments",
                Rule::EOI => "end of formula",
                _ => "token",
            }
            .to_string()
        });
        self.error(start, len, e.variant.message())
    }

    /// Grammar-guaranteed child; a missing one means the tree is malformed.
    fn expect<'i>(&self, pair: Option<Pair<'i, Rule>>, parent: Span<'_>) -> Result<Pair<'i, Rule>, SyntaxError> {
        pair.ok_or_else(|| self.error(parent.start(), parent.end() - parent.start(), "incomplete expression"))
    }

    fn expr(&self, pair: Pair<'_, Rule>) -> Result<Expr, SyntaxError> {
        // expr = term ~ (add_op ~ term)*
        let span = pair.as_span();
        let mut inner = pair.into_inner();
        let mut result = self.term(self.expect(inner.next(), span)?)?;

        while let Some(op_pair) = inner.next() {
            let op = match op_pair.as_str() {
                "+" => BinaryOp::Add,
                "-" => BinaryOp::Sub,
                other => {
                    let s = op_pair.as_span();
                    return Err(self.error(s.start(), other.len(), format!("unexpected operator `{other}`")));
                }
            };
            let rhs = self.term(self.expect(inner.next(), span)?)?;
            result = Expr::Binary(Box::new(result), op, Box::new(rhs));
        }

        Ok(result)
    }

    fn term(&self, pair: Pair<'_, Rule>) -> Result<Expr, SyntaxError> {
        // term = factor ~ (mul_op ~ factor)*
        let span = pair.as_span();
        let mut inner = pair.into_inner();
        let mut result = self.factor(self.expect(inner.next(), span)?)?;

        while let Some(op_pair) = inner.next() {
            let op = match op_pair.as_str() {
                "*" => BinaryOp::Mul,
                "/" => BinaryOp::Div,
                other => {
                    let s = op_pair.as_span();
                    return Err(self.error(s.start(), other.len(), format!("unexpected operator `{other}`")));
                }
            };
            let rhs = self.factor(self.expect(inner.next(), span)?)?;
            result = Expr::Binary(Box::new(result), op, Box::new(rhs));
        }

        Ok(result)
    }

    fn factor(&self, pair: Pair<'_, Rule>) -> Result<Expr, SyntaxError> {
        // factor = prefix* ~ primary
        let mut prefixes = Vec::new();
        let mut primary = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::prefix => prefixes.push(if inner.as_str() == "-" {
                    UnaryOp::Neg
                } else {
                    UnaryOp::Pos
                }),
                _ => primary = Some(self.primary(inner)?),
            }
        }
        let mut result = primary.ok_or_else(|| self.error(0, self.text.len(), "missing operand"))?;
        // The prefix closest to the operand binds first.
        for op in prefixes.into_iter().rev() {
            result = Expr::Unary(op, Box::new(result));
        }
        Ok(result)
    }

    fn primary(&self, pair: Pair<'_, Rule>) -> Result<Expr, SyntaxError> {
        let span = pair.as_span();
        let first = self.expect(pair.into_inner().next(), span)?;
        match first.as_rule() {
            Rule::expr => self.expr(first),
            Rule::func_call => self.func_call(first),
            Rule::NUMBER => Ok(Expr::Literal(first.as_str().to_string())),
            Rule::IDENT => Ok(Expr::Symbol(first.as_str().to_string())),
            rule => Err(self.error(span.start(), span.end() - span.start(), format!("unexpected {rule:?}"))),
        }
    }

    fn func_call(&self, pair: Pair<'_, Rule>) -> Result<Expr, SyntaxError> {
        // func_call = IDENT ~ "(" ~ args? ~ ")"
        let span = pair.as_span();
        let mut inner = pair.into_inner();
        let name_pair = self.expect(inner.next(), span)?;
        let name = name_pair.as_str();
        let name_span = name_pair.as_span();

        let function = Function::from_name(name).ok_or_else(|| {
            self.error(name_span.start(), name.len(), format!("unknown function `{name}`"))
        })?;

        let mut args = Vec::new();
        if let Some(args_pair) = inner.next() {
            for arg in args_pair.into_inner() {
                args.push(self.expr(arg)?);
            }
        }

        if args.len() != function.arity() {
            return Err(self.error(
                span.start(),
                span.end() - span.start(),
                format!(
                    "`{name}` takes {} argument{}, found {}",
                    function.arity(),
                    if function.arity() == 1 { "" } else { "s" },
                    args.len()
                ),
            ));
        }

        Ok(Expr::Call(function, args))
    }
}
