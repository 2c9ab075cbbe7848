//! Resolved operand values, attribute-path walking and comparison semantics.

use std::cmp::Ordering;

use serde_json::Value as Json;
use threatlens_core::{Diagram, Element, Relation};

use super::ast::{CompareOp, Literal};
use super::error::EvalError;

/// The element under evaluation plus the graph its relations point into.
#[derive(Debug, Clone, Copy)]
pub struct ElementContext<'a> {
    pub diagram: &'a Diagram,
    pub element: &'a Element,
}

impl<'a> ElementContext<'a> {
    pub fn new(diagram: &'a Diagram, element: &'a Element) -> Self {
        Self { diagram, element }
    }
}

/// A resolved operand.
///
/// Arrays are always normalized into [`Value::List`] (flattened), so
/// [`Value::Json`] never holds a JSON array.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A path segment that does not exist.
    Undefined,
    Json(Json),
    /// Another diagram element, by id.
    Element(String),
    /// The `attached` object of an element, by id.
    Relations(String),
    List(Vec<Value>),
}

impl Value {
    pub fn from_json(json: Json) -> Self {
        match json {
            Json::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match Value::from_json(item) {
                        Value::List(inner) => out.extend(inner),
                        other => out.push(other),
                    }
                }
                Value::List(out)
            }
            other => Value::Json(other),
        }
    }

    pub fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::String(s) => Value::Json(Json::String(s.clone())),
            Literal::Bool(b) => Value::Json(Json::Bool(*b)),
            Literal::Number(n) => serde_json::Number::from_f64(*n)
                .map(|n| Value::Json(Json::Number(n)))
                .unwrap_or(Value::Undefined),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Follow a dotted path from this value.
    pub fn walk(self, segments: &[String], ctx: &ElementContext<'_>) -> Value {
        segments
            .iter()
            .fold(self, |current, segment| current.step(segment, ctx))
    }

    fn step(self, segment: &str, ctx: &ElementContext<'_>) -> Value {
        match self {
            Value::Undefined => Value::Undefined,
            Value::Json(Json::Object(mut map)) => map
                .remove(segment)
                .map(Value::from_json)
                .unwrap_or(Value::Undefined),
            Value::Json(_) => Value::Undefined,
            Value::Element(id) => match ctx.diagram.get(&id) {
                Some(element) => element_field(element, segment),
                None => Value::Undefined,
            },
            Value::Relations(id) => ctx
                .diagram
                .get(&id)
                .and_then(|element| element.attached.get(segment))
                .map(relation_value)
                .unwrap_or(Value::Undefined),
            Value::List(items) => {
                let mut out = Vec::new();
                for item in items {
                    match item.step(segment, ctx) {
                        Value::Undefined => {}
                        Value::List(inner) => out.extend(inner),
                        other => out.push(other),
                    }
                }
                Value::List(out)
            }
        }
    }
}

/// Resolve `$.a.b.c` against the element in context.
pub fn resolve_path(segments: &[String], ctx: &ElementContext<'_>) -> Value {
    match segments.split_first() {
        None => Value::Element(ctx.element.id.clone()),
        Some((first, rest)) => element_field(ctx.element, first).walk(rest, ctx),
    }
}

fn element_field(element: &Element, segment: &str) -> Value {
    match segment {
        "id" => Value::Json(Json::String(element.id.clone())),
        "metadata" => serde_json::to_value(&element.metadata)
            .map(Value::from_json)
            .unwrap_or(Value::Undefined),
        "attached" => Value::Relations(element.id.clone()),
        key => element
            .attribute(key)
            .cloned()
            .map(Value::from_json)
            .unwrap_or(Value::Undefined),
    }
}

fn relation_value(relation: &Relation) -> Value {
    match relation {
        Relation::One(id) => Value::Element(id.clone()),
        Relation::Many(ids) => Value::List(ids.iter().cloned().map(Value::Element).collect()),
    }
}

/// Compare two resolved operands with existential semantics over arrays.
pub fn compare(left: &Value, op: CompareOp, right: &Value) -> Result<bool, EvalError> {
    match (left, right) {
        (Value::List(_), Value::List(_)) => Err(EvalError::BothArrays),
        (Value::List(items), other) => Ok(items.iter().any(|item| compare_scalar(item, op, other))),
        (other, Value::List(items)) => Ok(items.iter().any(|item| compare_scalar(other, op, item))),
        _ => Ok(compare_scalar(left, op, right)),
    }
}

fn compare_scalar(left: &Value, op: CompareOp, right: &Value) -> bool {
    if left.is_undefined() || right.is_undefined() {
        return false;
    }
    match op {
        CompareOp::Eq => strict_eq(left, right),
        CompareOp::Ne => !strict_eq(left, right),
        CompareOp::Lt => ordering(left, right) == Some(Ordering::Less),
        CompareOp::Le => matches!(ordering(left, right), Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => ordering(left, right) == Some(Ordering::Greater),
        CompareOp::Ge => matches!(
            ordering(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
    }
}

/// Same type and same value; numbers compare by value regardless of
/// integer/float representation.
fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Json(Json::Number(a)), Value::Json(Json::Number(b))) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

/// Lexicographic when both sides are strings, numeric otherwise.
fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Value::Json(Json::String(a)), Value::Json(Json::String(b))) = (left, right) {
        return Some(a.cmp(b));
    }
    to_number(left).partial_cmp(&to_number(right))
}

fn to_number(value: &Value) -> f64 {
    match value {
        Value::Json(Json::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Value::Json(Json::Bool(b)) => f64::from(u8::from(*b)),
        Value::Json(Json::Null) => 0.0,
        Value::Json(Json::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else if is_numeric(trimmed) {
                trimmed.parse().unwrap_or(f64::NAN)
            } else {
                f64::NAN
            }
        }
        _ => f64::NAN,
    }
}

/// `-?digits(.digits)?`; rejects the `inf`/`nan` spellings `f64::from_str` allows.
fn is_numeric(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && fraction.map_or(true, digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn s(v: &str) -> Value {
        Value::Json(json!(v))
    }

    fn n(v: f64) -> Value {
        Value::from_literal(&Literal::Number(v))
    }

    fn int(v: i64) -> Value {
        Value::Json(json!(v))
    }

    fn diagram() -> Diagram {
        Diagram::from_json(
            r#"{"elements": [
                {"id": "z1", "metadata": {"element": "zone", "shape": "sz"},
                 "trust": 2, "attached": {"entities": ["e1", "e2"]}},
                {"id": "e1", "metadata": {"element": "entity", "shape": "se1"},
                 "trust": 1, "tags": ["a", ["b", "c"]], "attached": {"zone": "z1"}},
                {"id": "e2", "metadata": {"element": "entity", "shape": "se2"},
                 "trust": 3, "attached": {"zone": "z1"}}
            ]}"#,
        )
        .unwrap()
    }

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(str::to_string).collect()
    }

    #[test]
    fn walks_attributes_and_relations() {
        let d = diagram();
        let e1 = d.get("e1").unwrap();
        let ctx = ElementContext::new(&d, e1);

        assert_eq!(resolve_path(&path("trust"), &ctx), int(1));
        assert_eq!(resolve_path(&path("attached.zone.trust"), &ctx), int(2));
        assert_eq!(resolve_path(&path("metadata.shape"), &ctx), s("se1"));
        assert_eq!(resolve_path(&path("id"), &ctx), s("e1"));
        assert_eq!(
            resolve_path(&path("attached.zone.attached.entities.trust"), &ctx),
            Value::List(vec![int(1), int(3)])
        );
    }

    #[test]
    fn absent_segments_are_undefined() {
        let d = diagram();
        let ctx = ElementContext::new(&d, d.get("e2").unwrap());
        assert!(resolve_path(&path("ssl.isSSL"), &ctx).is_undefined());
        assert!(resolve_path(&path("trust.deeper"), &ctx).is_undefined());
        assert!(resolve_path(&path("attached.process.name"), &ctx).is_undefined());
    }

    #[test]
    fn nested_arrays_flatten() {
        let d = diagram();
        let ctx = ElementContext::new(&d, d.get("e1").unwrap());
        assert_eq!(
            resolve_path(&path("tags"), &ctx),
            Value::List(vec![s("a"), s("b"), s("c")])
        );
    }

    #[test]
    fn string_and_numeric_ordering() {
        assert!(compare(&s("apple"), CompareOp::Lt, &s("banana")).unwrap());
        assert!(compare(&n(5.0), CompareOp::Lt, &n(10.0)).unwrap());
        assert!(compare(&s("10"), CompareOp::Lt, &s("9")).unwrap());
        assert!(compare(&s("10"), CompareOp::Gt, &n(9.0)).unwrap());
        assert!(!compare(&s("abc"), CompareOp::Lt, &n(9.0)).unwrap());
        assert!(!compare(&s("abc"), CompareOp::Ge, &n(9.0)).unwrap());
        assert!(compare(&Value::Json(json!(true)), CompareOp::Ge, &n(1.0)).unwrap());
        assert!(compare(&s("-2.5"), CompareOp::Lt, &n(0.0)).unwrap());
    }

    #[test]
    fn float_keywords_are_not_numeric() {
        for text in ["inf", "infinity", "Infinity", "NaN", "-inf", "1e9", "+5", ".5"] {
            assert!(!compare(&s(text), CompareOp::Gt, &n(5.0)).unwrap(), "{text}");
            assert!(!compare(&s(text), CompareOp::Lt, &n(5.0)).unwrap(), "{text}");
        }
    }

    #[test]
    fn equality_is_strict() {
        assert!(!compare(&n(1.0), CompareOp::Eq, &s("1")).unwrap());
        assert!(compare(&n(1.0), CompareOp::Ne, &s("1")).unwrap());
        assert!(compare(&int(1), CompareOp::Eq, &n(1.0)).unwrap());
        assert!(compare(&Value::Json(json!(false)), CompareOp::Eq, &Value::Json(json!(false))).unwrap());
    }

    #[test]
    fn undefined_never_matches() {
        for op in [CompareOp::Eq, CompareOp::Ne, CompareOp::Lt, CompareOp::Ge] {
            assert!(!compare(&Value::Undefined, op, &n(1.0)).unwrap());
        }
    }

    #[test]
    fn arrays_are_existential() {
        let trusts = Value::List(vec![n(1.0), n(3.0)]);
        assert!(compare(&trusts, CompareOp::Eq, &n(3.0)).unwrap());
        assert!(!compare(&trusts, CompareOp::Eq, &n(5.0)).unwrap());
        assert!(compare(&n(2.0), CompareOp::Lt, &trusts).unwrap());
        assert!(!compare(&Value::List(vec![]), CompareOp::Ne, &n(1.0)).unwrap());
        assert_eq!(
            compare(&trusts, CompareOp::Eq, &trusts.clone()),
            Err(EvalError::BothArrays)
        );
    }
}
