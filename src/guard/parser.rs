//! Guard grammar, parsed with `nom` into an unchecked [`Syntax`] tree.
//!
//! ```text
//! or      := and (("or" | "||") and)*
//! and     := cmp (("and" | "&&") cmp)*
//! cmp     := unary (cmp_op unary)?
//! unary   := ("not" | "!") unary | primary
//! primary := number | "true" | "false" | string | ident "(" args ")"
//!          | ident | "(" or ")"
//! ```
//!
//! Keywords are case-insensitive. A bare `=` is equality, never assignment.
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{all_consuming, map, map_res, not, opt, recognize, value, verify},
    error::Error,
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

use super::ast::CmpOp;

#[derive(Debug, Clone, PartialEq)]
pub enum Syntax {
    Bool(bool),
    Number(f64),
    Str(String),
    Ident(String),
    Call { func: String, args: Vec<Syntax> },
    Not(Box<Syntax>),
    And(Box<Syntax>, Box<Syntax>),
    Or(Box<Syntax>, Box<Syntax>),
    Cmp(CmpOp, Box<Syntax>, Box<Syntax>),
}

/// Failure position and the unparsed remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub offset: usize,
    pub rest: String,
}

pub fn parse(source: &str) -> Result<Syntax, ParseFailure> {
    match all_consuming(ws(or_expr)).parse(source) {
        Ok((_, syntax)) => Ok(syntax),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(ParseFailure {
            offset: source.len() - e.input.len(),
            rest: e.input.to_owned(),
        }),
        Err(nom::Err::Incomplete(_)) => Err(ParseFailure {
            offset: source.len(),
            rest: String::new(),
        }),
    }
}

fn ws<'a, O, P>(inner: P) -> impl Parser<&'a str, Output = O, Error = Error<&'a str>>
where
    P: Parser<&'a str, Output = O, Error = Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

fn identifier(i: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(i)
}

fn keyword<'a>(kw: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = Error<&'a str>> {
    verify(identifier, move |word: &str| word.eq_ignore_ascii_case(kw))
}

/// A number may not run straight into a word, so `1and` is rejected.
fn number(i: &str) -> IResult<&str, f64> {
    map_res(
        terminated(
            recognize((opt(char('-')), digit1, opt(pair(char('.'), digit1)))),
            not(satisfy(|c| c.is_ascii_alphanumeric() || c == '_')),
        ),
        |s: &str| s.parse::<f64>(),
    )
    .parse(i)
}

fn string_literal(i: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
    ))
    .parse(i)
}

fn bool_literal(i: &str) -> IResult<&str, Syntax> {
    alt((
        value(Syntax::Bool(true), keyword("true")),
        value(Syntax::Bool(false), keyword("false")),
    ))
    .parse(i)
}

fn call(i: &str) -> IResult<&str, Syntax> {
    let (i, func) = identifier(i)?;
    let (i, _) = ws(char('(')).parse(i)?;
    let (i, args) = separated_list0(ws(char(',')), or_expr).parse(i)?;
    let (i, _) = ws(char(')')).parse(i)?;
    Ok((
        i,
        Syntax::Call {
            func: func.to_owned(),
            args,
        },
    ))
}

fn primary(i: &str) -> IResult<&str, Syntax> {
    ws(alt((
        map(number, Syntax::Number),
        bool_literal,
        map(string_literal, |s: &str| Syntax::Str(s.to_owned())),
        call,
        map(identifier, |s: &str| Syntax::Ident(s.to_owned())),
        delimited(char('('), or_expr, char(')')),
    )))
    .parse(i)
}

fn not_op(i: &str) -> IResult<&str, &str> {
    alt((keyword("not"), terminated(tag("!"), not(char('='))))).parse(i)
}

fn unary(i: &str) -> IResult<&str, Syntax> {
    alt((
        map(preceded(ws(not_op), unary), |e| Syntax::Not(Box::new(e))),
        primary,
    ))
    .parse(i)
}

fn cmp_op(i: &str) -> IResult<&str, CmpOp> {
    alt((
        value(CmpOp::Ge, tag(">=")),
        value(CmpOp::Le, tag("<=")),
        value(CmpOp::Ne, tag("<>")),
        value(CmpOp::Ne, tag("!==")),
        value(CmpOp::Ne, tag("!=")),
        value(CmpOp::Eq, tag("===")),
        value(CmpOp::Eq, tag("==")),
        value(CmpOp::Eq, tag("=")),
        value(CmpOp::Gt, tag(">")),
        value(CmpOp::Lt, tag("<")),
    ))
    .parse(i)
}

fn cmp_expr(i: &str) -> IResult<&str, Syntax> {
    let (i, lhs) = unary(i)?;
    let (i, rhs) = opt(pair(ws(cmp_op), unary)).parse(i)?;
    let expr = match rhs {
        Some((op, rhs)) => Syntax::Cmp(op, Box::new(lhs), Box::new(rhs)),
        None => lhs,
    };
    Ok((i, expr))
}

fn and_expr(i: &str) -> IResult<&str, Syntax> {
    let (i, first) = cmp_expr(i)?;
    let (i, rest) = many0(preceded(ws(alt((tag("&&"), keyword("and")))), cmp_expr)).parse(i)?;
    let expr = rest
        .into_iter()
        .fold(first, |acc, rhs| Syntax::And(Box::new(acc), Box::new(rhs)));
    Ok((i, expr))
}

fn or_expr(i: &str) -> IResult<&str, Syntax> {
    let (i, first) = and_expr(i)?;
    let (i, rest) = many0(preceded(ws(alt((tag("||"), keyword("or")))), and_expr)).parse(i)?;
    let expr = rest
        .into_iter()
        .fold(first, |acc, rhs| Syntax::Or(Box::new(acc), Box::new(rhs)));
    Ok((i, expr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Syntax> {
        Box::new(Syntax::Ident(name.to_owned()))
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let parsed = parse("a or b AND c").unwrap();
        assert_eq!(
            parsed,
            Syntax::Or(ident("a"), Box::new(Syntax::And(ident("b"), ident("c"))))
        );
    }

    #[test]
    fn bare_equals_is_equality() {
        let parsed = parse("x = 3").unwrap();
        assert_eq!(
            parsed,
            Syntax::Cmp(CmpOp::Eq, ident("x"), Box::new(Syntax::Number(3.0)))
        );
    }

    #[test]
    fn not_keyword_and_bang() {
        assert_eq!(parse("NOT done").unwrap(), Syntax::Not(ident("done")));
        assert_eq!(parse("!done").unwrap(), Syntax::Not(ident("done")));
        assert_eq!(
            parse("not(a) and b").unwrap(),
            Syntax::And(Box::new(Syntax::Not(ident("a"))), ident("b"))
        );
    }

    #[test]
    fn edge_call_with_quoted_argument() {
        let parsed = parse("rt('y') and x").unwrap();
        assert_eq!(
            parsed,
            Syntax::And(
                Box::new(Syntax::Call {
                    func: "rt".into(),
                    args: vec![Syntax::Str("y".into())],
                }),
                ident("x")
            )
        );
        assert!(matches!(
            parse("ft(\"y\")").unwrap(),
            Syntax::Call { ref func, .. } if func == "ft"
        ));
    }

    #[test]
    fn negative_and_decimal_numbers() {
        assert_eq!(
            parse("x > -1.5").unwrap(),
            Syntax::Cmp(CmpOp::Gt, ident("x"), Box::new(Syntax::Number(-1.5)))
        );
    }

    #[test]
    fn keyword_prefix_is_an_identifier() {
        assert_eq!(parse("order").unwrap(), Syntax::Ident("order".into()));
        assert_eq!(parse("android").unwrap(), Syntax::Ident("android".into()));
    }

    #[test]
    fn keyword_needs_a_boundary_after_a_number() {
        assert!(parse("x>=1and y").is_err());
        assert!(parse("x>=1 or y").is_ok());
        assert_eq!(
            parse("(x>=1)and y").unwrap(),
            Syntax::And(
                Box::new(Syntax::Cmp(CmpOp::Ge, ident("x"), Box::new(Syntax::Number(1.0)))),
                ident("y")
            )
        );
    }

    #[test]
    fn reports_offset_of_trailing_garbage() {
        let failure = parse("x > 2 )").unwrap_err();
        assert_eq!(failure.rest, ")");
        assert_eq!(failure.offset, 6);
    }

    #[test]
    fn unbalanced_parenthesis_fails() {
        assert!(parse("(a and b").is_err());
        assert!(parse("a and").is_err());
        assert!(parse("").is_err());
    }
}
