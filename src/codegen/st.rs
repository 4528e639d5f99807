//! Structured-text rendering of guards, arc conditions and time literals.
use std::time::Duration;

use crate::guard::{EdgeKind, Expr};
use crate::net::data::{ArcKind, PlaceType};
use crate::net::structure::{Arc, Place};

/// Name of the trigger block watching `input`, e.g. `rt_start`.
pub fn trigger_name(kind: EdgeKind, input: &str) -> String {
    format!("{}_{}", kind.call_name(), input)
}

/// Function block type of a trigger.
pub fn trigger_type(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Rising => "R_TRIG",
        EdgeKind::Falling => "F_TRIG",
    }
}

/// `T#1S500MS`; milliseconds are rounded, zero parts omitted.
pub fn time_literal(delay: Duration) -> String {
    let total_ms = (delay.as_secs_f64() * 1000.0).round() as u64;
    let (secs, millis) = (total_ms / 1000, total_ms % 1000);
    let mut literal = String::from("T#");
    if secs > 0 {
        literal.push_str(&format!("{secs}S"));
    }
    if millis > 0 || secs == 0 {
        literal.push_str(&format!("{millis}MS"));
    }
    literal
}

fn number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn is_binary(expr: &Expr) -> bool {
    matches!(expr, Expr::And(..) | Expr::Or(..) | Expr::Cmp(..))
}

fn operand(expr: &Expr, wrap: bool) -> String {
    let text = expression(expr);
    if wrap { format!("({text})") } else { text }
}

/// Renders a checked guard expression; edge calls become `<trigger>.Q`.
pub fn expression(expr: &Expr) -> String {
    match expr {
        Expr::Bool(true) => "TRUE".to_owned(),
        Expr::Bool(false) => "FALSE".to_owned(),
        Expr::Number(n) => number(*n),
        Expr::Input { name, .. } => name.clone(),
        Expr::Edge { kind, name, .. } => format!("{}.Q", trigger_name(*kind, name)),
        Expr::Not(inner) => format!("NOT {}", operand(inner, is_binary(inner))),
        Expr::And(lhs, rhs) => format!(
            "{} AND {}",
            operand(lhs, matches!(**lhs, Expr::Or(..))),
            operand(rhs, matches!(**rhs, Expr::Or(..) | Expr::And(..)))
        ),
        Expr::Or(lhs, rhs) => format!(
            "{} OR {}",
            expression(lhs),
            operand(rhs, matches!(**rhs, Expr::Or(..)))
        ),
        Expr::Cmp(op, lhs, rhs) => format!(
            "{} {} {}",
            operand(lhs, is_binary(lhs)),
            op.as_st(),
            operand(rhs, is_binary(rhs))
        ),
    }
}

/// Source-text enabling condition of one arc; `None` for output arcs into
/// INT places, which never block.
pub fn arc_condition(arc: &Arc, place: &Place) -> Option<String> {
    let unit = place.place_type == PlaceType::Bool || arc.weight == 1;
    let name = &place.name;
    match arc.kind {
        ArcKind::Input | ArcKind::Test if unit => Some(name.clone()),
        ArcKind::Input | ArcKind::Test => Some(format!("{name} >= {}", arc.weight)),
        ArcKind::Inhibitor if unit => Some(format!("NOT {name}")),
        ArcKind::Inhibitor => Some(format!("{name} < {}", arc.weight)),
        ArcKind::Output => match place.place_type {
            PlaceType::Bool => Some(format!("NOT {name}")),
            PlaceType::Int => None,
        },
    }
}

/// Assignment performed by an input or output arc when its transition fires.
pub fn arc_effect(arc: &Arc, place: &Place) -> String {
    let name = &place.name;
    let consumes = arc.kind == ArcKind::Input;
    match place.place_type {
        PlaceType::Int if consumes => format!("{name} := {name} - {};", arc.weight),
        PlaceType::Int => format!("{name} := {name} + {};", arc.weight),
        PlaceType::Bool if consumes => format!("{name} := FALSE;"),
        PlaceType::Bool => format!("{name} := TRUE;"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::Guard;
    use crate::net::ids::{PlaceId, TransitionId};

    fn render(guard: &str, inputs: &[&str]) -> String {
        let guard = Guard::compile(Some(guard), inputs).unwrap();
        expression(guard.expr().unwrap())
    }

    fn arc(kind: ArcKind, weight: u64) -> Arc {
        Arc {
            key: "A".into(),
            place: PlaceId::new(0),
            transition: TransitionId::new(0),
            kind,
            weight,
        }
    }

    #[test]
    fn time_literals() {
        assert_eq!(time_literal(Duration::from_secs(2)), "T#2S");
        assert_eq!(time_literal(Duration::from_millis(500)), "T#500MS");
        assert_eq!(time_literal(Duration::from_millis(1500)), "T#1S500MS");
        assert_eq!(time_literal(Duration::from_micros(1_999_600)), "T#2S");
        assert_eq!(time_literal(Duration::from_micros(300)), "T#0MS");
    }

    #[test]
    fn guards_use_st_operators() {
        assert_eq!(render("a && !b", &["a", "b"]), "a AND NOT b");
        assert_eq!(render("x == 3 || x != 4", &["x"]), "x = 3 OR x <> 4");
        assert_eq!(render("rt('start') and level >= 2.5", &["start", "level"]), "rt_start.Q AND level >= 2.5");
        assert_eq!(render("not (a or b)", &["a", "b"]), "NOT (a OR b)");
        assert_eq!(render("(a or b) and c", &["a", "b", "c"]), "(a OR b) AND c");
        assert_eq!(render("a and (b and c)", &["a", "b", "c"]), "a AND (b AND c)");
        assert_eq!(render("true", &[]), "TRUE");
    }

    #[test]
    fn arc_conditions() {
        let int = Place::new("P", "p", PlaceType::Int, 0);
        let flag = Place::new("B", "b", PlaceType::Bool, 0);
        assert_eq!(arc_condition(&arc(ArcKind::Input, 1), &int).as_deref(), Some("p"));
        assert_eq!(arc_condition(&arc(ArcKind::Test, 3), &int).as_deref(), Some("p >= 3"));
        assert_eq!(arc_condition(&arc(ArcKind::Inhibitor, 1), &int).as_deref(), Some("NOT p"));
        assert_eq!(arc_condition(&arc(ArcKind::Inhibitor, 2), &int).as_deref(), Some("p < 2"));
        assert_eq!(arc_condition(&arc(ArcKind::Output, 4), &int), None);
        assert_eq!(arc_condition(&arc(ArcKind::Output, 1), &flag).as_deref(), Some("NOT b"));
        assert_eq!(arc_condition(&arc(ArcKind::Input, 2), &flag).as_deref(), Some("b"));
    }

    #[test]
    fn arc_effects() {
        let int = Place::new("P", "p", PlaceType::Int, 0);
        let flag = Place::new("B", "b", PlaceType::Bool, 0);
        assert_eq!(arc_effect(&arc(ArcKind::Input, 2), &int), "p := p - 2;");
        assert_eq!(arc_effect(&arc(ArcKind::Output, 1), &int), "p := p + 1;");
        assert_eq!(arc_effect(&arc(ArcKind::Input, 1), &flag), "b := FALSE;");
        assert_eq!(arc_effect(&arc(ArcKind::Output, 1), &flag), "b := TRUE;");
    }
}
