use serde_json::Value;

/// A reply as produced by a [`RemoteConnection`](crate::RemoteConnection).
///
/// `Bulk` carries text the store serialized (usually JSON); every other
/// variant is already structured.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Nil,
    Status(String),
    Integer(i64),
    Bulk(String),
    Array(Vec<Reply>),
    /// A connection that parses JSON itself hands the value over directly.
    Json(Value),
}

impl Reply {
    pub fn ok() -> Self {
        Self::Status("OK".into())
    }

    /// Serialize `value` into a bulk reply.
    pub fn bulk_json(value: &Value) -> Self {
        Self::Bulk(value.to_string())
    }

    pub fn is_structured(&self) -> bool {
        !matches!(self, Self::Bulk(_))
    }

    /// Normalize into a JSON value.
    ///
    /// Structured replies convert as-is. Bulk text is decoded as JSON and
    /// falls back to the raw text when it is not JSON; decoding never fails.
    pub fn into_value(self) -> Value {
        match self {
            Self::Bulk(text) => decode_text(text),
            structured => structured.into_plain_value(),
        }
    }

    /// Structural conversion without decoding any text.
    ///
    /// Array elements go through this, so key lists and similar text
    /// elements stay strings.
    pub fn into_plain_value(self) -> Value {
        match self {
            Self::Nil => Value::Null,
            Self::Status(text) | Self::Bulk(text) => Value::String(text),
            Self::Integer(n) => Value::from(n),
            Self::Array(items) => {
                Value::Array(items.into_iter().map(Reply::into_plain_value).collect())
            }
            Self::Json(value) => value,
        }
    }
}

/// Decode JSON text, returning the raw text as a string when it is not JSON.
pub fn decode_text(text: String) -> Value {
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => Value::String(text),
    }
}
