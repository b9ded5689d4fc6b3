//! JSON codec for stored documents.

use std::io::{BufReader, Read};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::{Error, Object};

/// Encodes values as UTF-8 JSON text and decodes them back.
///
/// Decoding consumes the whole input as exactly one value. Anything but
/// whitespace after that value is an error, so a torn or concatenated write
/// is never mistaken for a valid document.
///
/// # Example
///
/// ```rust
/// use dirb_json_store::JsonCodec;
/// use serde_json::json;
///
/// let codec = JsonCodec::default();
/// let value = json!({"title": "Dune", "tags": ["<sf>", "&"]});
///
/// let bytes = codec.encode(&value).unwrap();
/// assert_eq!(codec.decode_slice(&bytes).unwrap(), value);
///
/// assert!(codec.decode_slice(b"{} {}").is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// A codec that indents its output with tabs.
    pub fn pretty() -> Self {
        JsonCodec { pretty: true }
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    /// Encode `value`, followed by a newline.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        if self.pretty {
            let formatter = PrettyFormatter::with_indent(b"\t");
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            value.serialize(&mut ser)
        } else {
            serde_json::to_writer(&mut buf, value)
        }
        .map_err(Error::Encode)?;
        buf.push(b'\n');
        Ok(buf)
    }

    /// Decode exactly one value from `src`.
    pub fn decode(&self, src: impl Read) -> Result<Value, Error> {
        let mut de = serde_json::Deserializer::from_reader(BufReader::new(src));
        let value = Value::deserialize(&mut de).map_err(|source| content_error(source, false))?;
        de.end().map_err(|source| content_error(source, true))?;
        Ok(value)
    }

    pub fn decode_slice(&self, bytes: &[u8]) -> Result<Value, Error> {
        self.decode(bytes)
    }

    /// As [`JsonCodec::decode`], additionally requiring an object.
    pub fn decode_object(&self, src: impl Read) -> Result<Object, Error> {
        into_object(self.decode(src)?)
    }

    pub fn decode_object_slice(&self, bytes: &[u8]) -> Result<Object, Error> {
        self.decode_object(bytes)
    }
}

// Read failures are not content problems, whichever stage they hit.
fn content_error(source: serde_json::Error, after_value: bool) -> Error {
    if source.is_io() {
        Error::Read { key: None, source }
    } else if after_value {
        Error::TrailingInput { key: None, source }
    } else {
        Error::Malformed { key: None, source }
    }
}

/// Unwrap an object, or report what was found instead.
pub fn into_object(value: Value) -> Result<Object, Error> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::NotAnObject {
            key: None,
            found: type_name(&other),
        }),
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
