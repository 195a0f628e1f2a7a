//! Bounded value serializer
//!
//! Turns protocol values and previews into readable text. Pure and total:
//! never fails, never allocates beyond the configured bounds, and stops
//! descending once the depth counter passes `max_depth`.

use super::Limits;
use crate::constants::{
    DEPTH_SENTINEL, FUNCTION_PLACEHOLDER, OVERFLOW_MARKER, SYMBOL_PLACEHOLDER, TRUNCATION_SUFFIX,
};
use crate::protocol::{scalar_text, Preview, PreviewProperty, ProtocolValue};
use serde_json::Value;

/// Serialize a value at the given nesting depth
///
/// `None` is an absent value and renders as `undefined`.
pub fn serialize(value: Option<&ProtocolValue>, depth: usize, limits: &Limits) -> String {
    if depth > limits.max_depth {
        return DEPTH_SENTINEL.to_owned();
    }

    let Some(value) = value else {
        return "undefined".to_owned();
    };

    match value {
        ProtocolValue::Undefined => "undefined".to_owned(),
        ProtocolValue::Null => "null".to_owned(),
        ProtocolValue::String(s) => truncate(s, limits.max_string_len),
        ProtocolValue::Number(text) => text.clone(),
        ProtocolValue::Boolean(b) => b.to_string(),
        ProtocolValue::Symbol { description } => description
            .clone()
            .unwrap_or_else(|| SYMBOL_PLACEHOLDER.to_owned()),
        ProtocolValue::Function { description } => description
            .clone()
            .unwrap_or_else(|| FUNCTION_PLACEHOLDER.to_owned()),
        ProtocolValue::Structured {
            preview: Some(preview),
            ..
        } => serialize_preview(preview, depth, limits),
        ProtocolValue::Structured {
            kind, description, ..
        } => description
            .clone()
            .unwrap_or_else(|| format!("[{}]", kind)),
    }
}

/// Serialize a preview; nested previews are rendered at `depth + 1`
pub fn serialize_preview(preview: &Preview, depth: usize, limits: &Limits) -> String {
    if depth > limits.max_depth {
        return DEPTH_SENTINEL.to_owned();
    }

    if is_array_like(preview) {
        serialize_array(preview, depth, limits)
    } else {
        serialize_object(preview, depth, limits)
    }
}

fn is_array_like(preview: &Preview) -> bool {
    matches!(preview.subtype.as_deref(), Some("array") | Some("typedarray"))
}

/// Elements in order, capped client-side regardless of the `overflow` flag
fn serialize_array(preview: &Preview, depth: usize, limits: &Limits) -> String {
    let items: Vec<String> = preview
        .properties
        .iter()
        .take(limits.max_array_items)
        .map(|prop| match &prop.value_preview {
            Some(nested) => serialize_preview(nested, depth + 1, limits),
            None => raw_scalar(prop),
        })
        .collect();

    let suffix = if preview.properties.len() > limits.max_array_items {
        OVERFLOW_MARKER
    } else {
        ""
    };

    format!("[{}{}]", items.join(", "), suffix)
}

/// All reported properties as `name: value`; only depth bounds this path
fn serialize_object(preview: &Preview, depth: usize, limits: &Limits) -> String {
    let pairs: Vec<String> = preview
        .properties
        .iter()
        .map(|prop| {
            let value = match &prop.value_preview {
                Some(nested) => serialize_preview(nested, depth + 1, limits),
                None => literal_scalar(prop),
            };
            format!("{}: {}", prop.name, value)
        })
        .collect();

    let suffix = if preview.overflow { OVERFLOW_MARKER } else { "" };

    format!("{{{}{}}}", pairs.join(", "), suffix)
}

/// Array element text: value as-is, or the property type when no value
fn raw_scalar(prop: &PreviewProperty) -> String {
    match &prop.value {
        Some(value) => scalar_text(value),
        None => type_text(prop),
    }
}

/// Object property text: strings quoted and escaped, other scalars bare
fn literal_scalar(prop: &PreviewProperty) -> String {
    match (&prop.value, prop.kind.as_deref()) {
        (Some(Value::String(s)), None | Some("string")) => Value::String(s.clone()).to_string(),
        (Some(value), _) => scalar_text(value),
        (None, _) => type_text(prop),
    }
}

fn type_text(prop: &PreviewProperty) -> String {
    prop.kind.clone().unwrap_or_else(|| "undefined".to_owned())
}

/// Cut `s` to `max_len` characters, marking the cut
pub fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}{}", &s[..idx], TRUNCATION_SUFFIX),
        None => s.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn limits() -> Limits {
        Limits::default()
    }

    fn scalar(name: &str, kind: &str, value: Value) -> PreviewProperty {
        PreviewProperty {
            name: name.into(),
            kind: Some(kind.into()),
            value: Some(value),
            ..Default::default()
        }
    }

    fn nested(name: &str, preview: Preview) -> PreviewProperty {
        PreviewProperty {
            name: name.into(),
            kind: Some("object".into()),
            value_preview: Some(Box::new(preview)),
            ..Default::default()
        }
    }

    fn array(properties: Vec<PreviewProperty>) -> Preview {
        Preview {
            kind: Some("object".into()),
            subtype: Some("array".into()),
            properties,
            ..Default::default()
        }
    }

    fn object(properties: Vec<PreviewProperty>) -> Preview {
        Preview {
            kind: Some("object".into()),
            properties,
            ..Default::default()
        }
    }

    fn structured(preview: Option<Preview>) -> ProtocolValue {
        ProtocolValue::Structured {
            kind: "object".into(),
            subtype: None,
            description: None,
            preview,
        }
    }

    /// Objects nested `levels` deep, innermost holding `leaf: 1`
    fn deep_object(levels: usize) -> Preview {
        let mut preview = object(vec![scalar("leaf", "number", Value::from(1))]);
        for _ in 0..levels {
            preview = object(vec![nested("child", preview)]);
        }
        preview
    }

    #[test]
    fn test_absent_and_null() {
        assert_eq!(serialize(None, 0, &limits()), "undefined");
        assert_eq!(serialize(Some(&ProtocolValue::Null), 0, &limits()), "null");
        assert_eq!(
            serialize(Some(&ProtocolValue::Undefined), 0, &limits()),
            "undefined"
        );
    }

    #[test]
    fn test_primitives() {
        let l = limits();
        assert_eq!(
            serialize(Some(&ProtocolValue::String("boom".into())), 0, &l),
            "boom"
        );
        assert_eq!(
            serialize(Some(&ProtocolValue::Number("3.5".into())), 0, &l),
            "3.5"
        );
        assert_eq!(serialize(Some(&ProtocolValue::Boolean(true)), 0, &l), "true");
    }

    #[test]
    fn test_symbol_and_function_placeholders() {
        let l = limits();
        assert_eq!(
            serialize(Some(&ProtocolValue::Symbol { description: None }), 0, &l),
            SYMBOL_PLACEHOLDER
        );
        assert_eq!(
            serialize(
                Some(&ProtocolValue::Symbol {
                    description: Some("Symbol(id)".into())
                }),
                0,
                &l
            ),
            "Symbol(id)"
        );
        assert_eq!(
            serialize(Some(&ProtocolValue::Function { description: None }), 0, &l),
            FUNCTION_PLACEHOLDER
        );
    }

    #[test]
    fn test_structured_without_preview() {
        let l = limits();
        assert_eq!(serialize(Some(&structured(None)), 0, &l), "[object]");

        let described = ProtocolValue::Structured {
            kind: "object".into(),
            subtype: Some("regexp".into()),
            description: Some("/a+/g".into()),
            preview: None,
        };
        assert_eq!(serialize(Some(&described), 0, &l), "/a+/g");
    }

    #[test]
    fn test_array_scenario() {
        let preview = array(vec![
            PreviewProperty {
                value: Some(Value::from(1)),
                ..Default::default()
            },
            PreviewProperty {
                value: Some(Value::from(2)),
                ..Default::default()
            },
        ]);
        assert_eq!(
            serialize(Some(&structured(Some(preview))), 0, &limits()),
            "[1, 2]"
        );
    }

    #[test]
    fn test_array_strings_are_raw() {
        let preview = array(vec![
            scalar("0", "string", Value::from("a")),
            scalar("1", "string", Value::from("b")),
        ]);
        assert_eq!(serialize_preview(&preview, 0, &limits()), "[a, b]");
    }

    #[test]
    fn test_array_cap_ignores_overflow_flag() {
        let l = limits();
        let props: Vec<_> = (0..l.max_array_items + 5)
            .map(|i| scalar(&i.to_string(), "number", Value::from(i)))
            .collect();
        let mut preview = array(props);
        preview.overflow = false;

        let text = serialize_preview(&preview, 0, &l);
        assert!(text.ends_with(", ...]"));
        let inner = &text[1..text.len() - OVERFLOW_MARKER.len() - 1];
        assert_eq!(inner.split(", ").count(), l.max_array_items);

        // Overflow flag alone does not add the marker to arrays
        let mut short = array(vec![scalar("0", "number", Value::from(1))]);
        short.overflow = true;
        assert_eq!(serialize_preview(&short, 0, &l), "[1]");
    }

    #[test]
    fn test_object_quotes_strings() {
        let preview = object(vec![
            scalar("name", "string", Value::from("say \"hi\"")),
            scalar("count", "number", Value::from("3")),
            scalar("ok", "boolean", Value::from("true")),
        ]);
        assert_eq!(
            serialize_preview(&preview, 0, &limits()),
            r#"{name: "say \"hi\"", count: 3, ok: true}"#
        );
    }

    #[test]
    fn test_object_has_no_property_cap() {
        let l = limits();
        let props: Vec<_> = (0..l.max_array_items * 2)
            .map(|i| scalar(&format!("k{}", i), "number", Value::from(i)))
            .collect();
        let text = serialize_preview(&object(props), 0, &l);
        assert_eq!(text.matches(": ").count(), l.max_array_items * 2);
        assert!(!text.contains(OVERFLOW_MARKER));
    }

    #[test]
    fn test_object_overflow_marker() {
        let mut preview = object(vec![scalar("a", "number", Value::from(1))]);
        preview.overflow = true;
        assert_eq!(serialize_preview(&preview, 0, &limits()), "{a: 1, ...}");
    }

    #[test]
    fn test_property_without_value_renders_type() {
        let preview = object(vec![PreviewProperty {
            name: "get".into(),
            kind: Some("accessor".into()),
            ..Default::default()
        }]);
        assert_eq!(serialize_preview(&preview, 0, &limits()), "{get: accessor}");
    }

    #[test]
    fn test_nested_object_and_array() {
        let inner = array(vec![
            scalar("0", "number", Value::from(1)),
            scalar("1", "string", Value::from("x")),
        ]);
        let preview = object(vec![nested("list", inner)]);
        assert_eq!(serialize_preview(&preview, 0, &limits()), "{list: [1, x]}");
    }

    #[test]
    fn test_depth_sentinel_at_top() {
        let l = limits();
        let value = ProtocolValue::String("never read".into());
        assert_eq!(serialize(Some(&value), l.max_depth + 1, &l), DEPTH_SENTINEL);
        assert_eq!(
            serialize_preview(&deep_object(3), l.max_depth + 1, &l),
            DEPTH_SENTINEL
        );
    }

    #[test]
    fn test_depth_bound_stops_descent() {
        let l = limits();
        // Far deeper than the bound; only max_depth + 1 levels may be rendered.
        let text = serialize_preview(&deep_object(500), 0, &l);

        assert!(text.contains(DEPTH_SENTINEL));
        assert!(!text.contains("leaf"));
        assert_eq!(text.matches("child: ").count(), l.max_depth + 1);
    }

    #[test]
    fn test_depth_within_bound_renders_leaf() {
        let l = limits();
        let text = serialize_preview(&deep_object(l.max_depth), 0, &l);
        assert!(text.contains("leaf: 1"));
        assert!(!text.contains(DEPTH_SENTINEL));
    }

    #[test]
    fn test_custom_limits() {
        let l = Limits {
            max_depth: 1,
            max_string_len: 3,
            max_array_items: 2,
        };
        assert_eq!(
            serialize(Some(&ProtocolValue::String("abcdef".into())), 0, &l),
            format!("abc{}", TRUNCATION_SUFFIX)
        );
        assert_eq!(
            serialize_preview(&deep_object(3), 0, &l),
            format!("{{child: {{child: {}}}}}", DEPTH_SENTINEL)
        );
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("héllo", 2), format!("hé{}", TRUNCATION_SUFFIX));
        assert_eq!(truncate("héllo", 5), "héllo");
        assert_eq!(truncate("", 0), "");
    }

    proptest! {
        #[test]
        fn prop_long_strings_truncated(extra in 1usize..200, ch in proptest::char::any()) {
            let l = limits();
            let s: String = std::iter::repeat(ch).take(l.max_string_len + extra).collect();
            let out = serialize(Some(&ProtocolValue::String(s)), 0, &l);

            prop_assert!(out.ends_with(TRUNCATION_SUFFIX));
            prop_assert_eq!(
                out.chars().count(),
                l.max_string_len + TRUNCATION_SUFFIX.chars().count()
            );
        }

        #[test]
        fn prop_short_strings_untouched(s in ".{0,64}") {
            let out = serialize(Some(&ProtocolValue::String(s.clone())), 0, &limits());
            prop_assert_eq!(out, s);
        }
    }
}
