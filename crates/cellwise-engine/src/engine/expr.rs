//! Flat arithmetic over numeric literals and cell references.
//!
//! A formula body such as `A1+2*B3` is split on the four binary operators.
//! Multiplication and division are folded first, then addition and
//! subtraction, both left to right. There are no parentheses and no unary
//! operators.

use super::cell_ref::CellRef;
use super::resolve::{Resolved, Resolver, SheetSource};
use super::value::{EvalValue, FormulaError, parse_number};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn from_char(c: char) -> Option<Op> {
        match c {
            '+' => Some(Op::Add),
            '-' => Some(Op::Sub),
            '*' => Some(Op::Mul),
            '/' => Some(Op::Div),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Token<'a> {
    Operand(&'a str),
    Op(Op),
}

/// Split a formula body into trimmed operands and operators.
/// Blank fragments (e.g. between two adjacent operators) are dropped.
pub(crate) fn tokenize(body: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (idx, c) in body.char_indices() {
        if let Some(op) = Op::from_char(c) {
            push_operand(&mut tokens, &body[start..idx]);
            tokens.push(Token::Op(op));
            start = idx + c.len_utf8();
        }
    }
    push_operand(&mut tokens, &body[start..]);
    tokens
}

fn push_operand<'a>(tokens: &mut Vec<Token<'a>>, fragment: &'a str) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        tokens.push(Token::Operand(fragment));
    }
}

/// Separate an operand/operator chain, rejecting anything that does not
/// strictly alternate starting and ending with an operand.
fn split_chain<'a>(tokens: &[Token<'a>]) -> Option<(Vec<&'a str>, Vec<Op>)> {
    let mut operands = Vec::with_capacity(tokens.len() / 2 + 1);
    let mut ops = Vec::with_capacity(tokens.len() / 2);
    for (idx, token) in tokens.iter().enumerate() {
        match (idx % 2, token) {
            (0, Token::Operand(s)) => operands.push(*s),
            (1, Token::Op(op)) => ops.push(*op),
            _ => return None,
        }
    }
    if operands.len() == ops.len() + 1 {
        Some((operands, ops))
    } else {
        None
    }
}

/// Evaluate a formula body (without the leading `=`).
pub(crate) fn evaluate_expression<S: SheetSource + ?Sized>(
    resolver: &mut Resolver<'_, S>,
    body: &str,
) -> Resolved {
    let tokens = tokenize(body);
    if tokens.is_empty() {
        return EvalValue::Number(0.0).into();
    }
    let Some((operands, ops)) = split_chain(&tokens) else {
        return FormulaError::Error.into();
    };

    let mut values = Vec::with_capacity(operands.len());
    for token in operands {
        match resolve_operand(resolver, token) {
            Ok(n) => values.push(n),
            Err(failed) => return failed,
        }
    }
    EvalValue::from(fold(&values, &ops)).into()
}

fn resolve_operand<S: SheetSource + ?Sized>(
    resolver: &mut Resolver<'_, S>,
    token: &str,
) -> Result<f64, Resolved> {
    if let Some(n) = parse_number(token) {
        return Ok(n);
    }
    let at = CellRef::parse(token).ok_or(FormulaError::Ref)?;
    let resolved = resolver.resolve(at);
    if resolved.cycle.is_some() {
        // This cell sits on the loop being unwound.
        return Err(resolved);
    }
    Ok(resolved.value.as_number()?)
}

/// Apply `ops` between `values` with `*`/`/` binding tighter than `+`/`-`.
/// `values` must hold exactly one more entry than `ops`.
pub(crate) fn fold(values: &[f64], ops: &[Op]) -> Result<f64, FormulaError> {
    let (&first, rest) = values.split_first().ok_or(FormulaError::Error)?;

    let mut terms = vec![first];
    let mut additive = Vec::new();
    for (&op, &rhs) in ops.iter().zip(rest) {
        match op {
            Op::Mul | Op::Div => {
                let last = terms.last_mut().ok_or(FormulaError::Error)?;
                if op == Op::Mul {
                    *last *= rhs;
                } else if rhs == 0.0 {
                    return Err(FormulaError::DivZero);
                } else {
                    *last /= rhs;
                }
            }
            Op::Add | Op::Sub => {
                additive.push(op);
                terms.push(rhs);
            }
        }
    }

    let mut acc = terms[0];
    for (op, term) in additive.into_iter().zip(&terms[1..]) {
        match op {
            Op::Sub => acc -= term,
            _ => acc += term,
        }
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_trims_operands() {
        assert_eq!(
            tokenize(" A1 + 2 *b3 "),
            vec![
                Token::Operand("A1"),
                Token::Op(Op::Add),
                Token::Operand("2"),
                Token::Op(Op::Mul),
                Token::Operand("b3"),
            ]
        );
    }

    #[test]
    fn test_tokenize_drops_blank_fragments() {
        assert_eq!(tokenize("-5"), vec![Token::Op(Op::Sub), Token::Operand("5")]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_split_chain_rejects_malformed() {
        assert!(split_chain(&tokenize("-5")).is_none());
        assert!(split_chain(&tokenize("5+")).is_none());
        assert!(split_chain(&tokenize("5+*2")).is_none());
        assert!(split_chain(&tokenize("5 6")).is_some());
        let (operands, ops) = split_chain(&tokenize("1+2*3")).unwrap();
        assert_eq!(operands, vec!["1", "2", "3"]);
        assert_eq!(ops, vec![Op::Add, Op::Mul]);
    }

    #[test]
    fn test_fold_precedence() {
        assert_eq!(fold(&[2.0, 3.0, 4.0], &[Op::Add, Op::Mul]), Ok(14.0));
        assert_eq!(fold(&[10.0, 2.0, 3.0], &[Op::Sub, Op::Sub]), Ok(5.0));
        assert_eq!(fold(&[8.0, 4.0, 2.0], &[Op::Div, Op::Div]), Ok(1.0));
        assert_eq!(
            fold(&[1.0, 6.0, 3.0, 2.0], &[Op::Sub, Op::Div, Op::Mul]),
            Ok(-3.0)
        );
    }

    #[test]
    fn test_fold_division_by_zero_short_circuits() {
        assert_eq!(fold(&[1.0, 0.0], &[Op::Div]), Err(FormulaError::DivZero));
        assert_eq!(
            fold(&[0.0, 5.0, 0.0], &[Op::Div, Op::Div]),
            Err(FormulaError::DivZero)
        );
        assert_eq!(fold(&[0.0, 5.0], &[Op::Div]), Ok(0.0));
    }
}
