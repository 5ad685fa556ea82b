// ==============================================================================
// negotiate.rs - Content Negotiation
// ==============================================================================
// Description: Accept header handling and JSON/XML rendering of responses
// Author: Matt Barham
// Created: 2026-10-17
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================

use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub const MIME_JSON: &str = "application/json";
pub const MIME_XML: &str = "application/xml";
const MIME_ANY: &str = "*/*";

/// Root element of XML documents
const XML_ROOT: &str = "response";

/// Element used for array entries and keys that are not valid XML names
const XML_ITEM: &str = "item";

#[derive(Error, Debug)]
pub enum NegotiationError {
    #[error("Missing Accept header")]
    MissingAccept,

    #[error("Only one Accept value is supported, got {0}")]
    MultipleAccept(usize),

    #[error("Unsupported Accept value '{0}', expected application/json, application/xml or */*")]
    Unsupported(String),

    #[error("Failed to render response: {0}")]
    Render(String),
}

/// Response representation chosen from the Accept header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Json,
    Xml,
}

impl Representation {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Representation::Json => MIME_JSON,
            Representation::Xml => MIME_XML,
        }
    }
}

/// A rendered body and its content type
#[derive(Debug)]
pub struct Rendered {
    pub body: String,
    pub mime_type: &'static str,
}

/// Pick a representation from the raw Accept header values
///
/// Exactly one value is allowed and it is matched verbatim: a single header
/// carrying `application/json,application/xml` is rejected, not split.
pub fn select_representation<'a>(
    accept: impl IntoIterator<Item = &'a str>,
) -> Result<Representation, NegotiationError> {
    let values: Vec<&str> = accept.into_iter().collect();

    match values.as_slice() {
        [] => Err(NegotiationError::MissingAccept),
        [MIME_JSON] | [MIME_ANY] => Ok(Representation::Json),
        [MIME_XML] => Ok(Representation::Xml),
        [other] => Err(NegotiationError::Unsupported(other.to_string())),
        many => Err(NegotiationError::MultipleAccept(many.len())),
    }
}

/// Select a representation and render `payload` in it
pub fn negotiate<'a, T: Serialize>(
    accept: impl IntoIterator<Item = &'a str>,
    payload: &T,
) -> Result<Rendered, NegotiationError> {
    let representation = select_representation(accept)?;
    render(representation, payload)
}

pub fn render<T: Serialize>(
    representation: Representation,
    payload: &T,
) -> Result<Rendered, NegotiationError> {
    let body = match representation {
        Representation::Json => serde_json::to_string(payload).map_err(render_error)?,
        Representation::Xml => {
            let value = serde_json::to_value(payload).map_err(render_error)?;
            to_xml(&value)?
        }
    };

    Ok(Rendered {
        body,
        mime_type: representation.mime_type(),
    })
}

/// Render a JSON value as an XML document, one element per object key
pub fn to_xml(value: &Value) -> Result<String, NegotiationError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(render_error)?;
    write_element(&mut writer, XML_ROOT, value)?;

    String::from_utf8(writer.into_inner()).map_err(render_error)
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &Value,
) -> Result<(), NegotiationError> {
    let start = if is_xml_name(name) {
        BytesStart::new(name)
    } else {
        // Row indices ("0", "1", ...) cannot be element names
        let mut start = BytesStart::new(XML_ITEM);
        start.push_attribute(("key", name));
        start
    };

    if value.is_null() {
        return writer.write_event(Event::Empty(start)).map_err(render_error);
    }

    writer
        .write_event(Event::Start(start.borrow()))
        .map_err(render_error)?;

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                write_element(writer, key, child)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                write_element(writer, XML_ITEM, item)?;
            }
        }
        Value::String(text) => {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(render_error)?;
        }
        scalar => {
            let text = scalar.to_string();
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(render_error)?;
        }
    }

    writer
        .write_event(Event::End(start.to_end()))
        .map_err(render_error)
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !name.to_ascii_lowercase().starts_with("xml")
}

fn render_error(err: impl std::fmt::Display) -> NegotiationError {
    NegotiationError::Render(err.to_string())
}
