//! Remote-debugging protocol types
//!
//! Wire shapes of the `Runtime` domain objects carried by console events,
//! plus `ProtocolValue`, the tagged view the serializer works on.
//!
//! Every field is optional on the wire. Missing or mistyped fields fall back
//! to defaults so that a malformed event still produces a log line.

use serde::Deserialize;
use serde_json::Value;

// =============================================================================
// Wire types
// =============================================================================

/// Mirror object describing one value in the inspected target
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteObject {
    #[serde(rename = "type")]
    pub kind: String,
    pub subtype: Option<String>,
    pub class_name: Option<String>,
    pub value: Option<Value>,
    pub unserializable_value: Option<String>,
    pub description: Option<String>,
    pub preview: Option<Preview>,
}

/// Bounded structural snapshot of an object's properties
///
/// Previews only describe a value at capture time. Nothing guarantees the
/// nesting is finite in practice, so consumers must bound their traversal.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preview {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub subtype: Option<String>,
    pub description: Option<String>,
    /// More properties exist than were included
    pub overflow: bool,
    pub properties: Vec<PreviewProperty>,
}

/// One property of a `Preview`: either an inline scalar or a nested preview
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreviewProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub subtype: Option<String>,
    pub value: Option<Value>,
    pub value_preview: Option<Box<Preview>>,
}

/// Call stack attached to a console call (innermost frame first)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StackTrace {
    pub description: Option<String>,
    pub call_frames: Vec<CallFrame>,
}

/// One stack frame; line and column are 0-based on the wire
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallFrame {
    pub function_name: String,
    pub script_id: Option<String>,
    pub url: String,
    pub line_number: u64,
    pub column_number: u64,
}

/// Parameters of a `Runtime.consoleAPICalled` event
#[derive(Debug, Clone, Default)]
pub struct ConsoleApiCalled {
    /// Console method (`log`, `error`, `warning`, ...)
    pub kind: Option<String>,
    /// Arguments; `None` marks an argument that could not be decoded
    pub args: Vec<Option<RemoteObject>>,
    pub stack_trace: Option<StackTrace>,
}

impl ConsoleApiCalled {
    /// Decode event parameters field by field
    ///
    /// A field that does not decode is treated as absent instead of
    /// rejecting the whole event.
    pub fn from_params(params: &Value) -> Self {
        let kind = params
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let args = params
            .get("args")
            .and_then(Value::as_array)
            .map(|args| {
                args.iter()
                    .map(|arg| RemoteObject::deserialize(arg).ok())
                    .collect()
            })
            .unwrap_or_default();

        let stack_trace = params
            .get("stackTrace")
            .and_then(|trace| StackTrace::deserialize(trace).ok());

        Self {
            kind,
            args,
            stack_trace,
        }
    }
}

// =============================================================================
// Tagged value view
// =============================================================================

/// One captured value as reported by the target
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolValue {
    String(String),
    /// Canonical text of a number (or bigint / unserializable number)
    Number(String),
    Boolean(bool),
    Undefined,
    Null,
    Symbol {
        description: Option<String>,
    },
    Function {
        description: Option<String>,
    },
    /// Object-like value, optionally with a structural preview
    Structured {
        kind: String,
        subtype: Option<String>,
        description: Option<String>,
        preview: Option<Preview>,
    },
}

impl From<RemoteObject> for ProtocolValue {
    fn from(obj: RemoteObject) -> Self {
        match obj.kind.as_str() {
            "string" => Self::String(match obj.value {
                Some(Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => String::new(),
            }),
            "number" | "bigint" => Self::Number(
                obj.unserializable_value
                    .or_else(|| obj.value.as_ref().map(scalar_text))
                    .unwrap_or_else(|| "undefined".to_owned()),
            ),
            "boolean" => match obj.value.as_ref().and_then(Value::as_bool) {
                Some(b) => Self::Boolean(b),
                None => Self::Undefined,
            },
            "undefined" => Self::Undefined,
            "symbol" => Self::Symbol {
                description: obj.description,
            },
            "function" => Self::Function {
                description: obj.description,
            },
            _ if obj.subtype.as_deref() == Some("null") => Self::Null,
            _ => Self::Structured {
                kind: obj.kind,
                subtype: obj.subtype,
                description: obj.description,
                preview: obj.preview,
            },
        }
    }
}

/// Plain text of a JSON scalar (strings unquoted)
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
