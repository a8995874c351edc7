// PAN-OS response envelope handling
//
// Every API answer is `<response status="success|error" code="N">...`.
// Typed payloads are pulled out of `<result>` with serde; free-form text
// (`<msg>`, job `<details>`) is collected line by line with the event
// reader because the device mixes plain text, `<line>` children and CDATA.

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::Error;

/// Attribute-only view of the `<response>` root.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(rename = "@status")]
    pub status: String,
    #[serde(rename = "@code", default)]
    pub code: Option<String>,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// `<response>` with a typed `<result>` body.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Response<T> {
    #[serde(default)]
    pub result: Option<T>,
}

/// Parse just the envelope attributes.
pub(crate) fn parse_envelope(body: &str) -> Result<Envelope, Error> {
    quick_xml::de::from_str(body).map_err(|e| deserialization(&e.to_string(), body))
}

/// Deserialize the `<result>` element of a successful response.
pub(crate) fn parse_result<T: DeserializeOwned>(body: &str) -> Result<Option<T>, Error> {
    let response: Response<T> =
        quick_xml::de::from_str(body).map_err(|e| deserialization(&e.to_string(), body))?;
    Ok(response.result)
}

/// Turn an error envelope into `Error::Api` with the device's own text.
pub(crate) fn api_error(envelope: &Envelope, body: &str) -> Error {
    let lines = collect_lines(body, "msg");
    let message = if lines.is_empty() {
        match &envelope.code {
            Some(code) => format!("request failed with code {code}"),
            None => "request failed".to_string(),
        }
    } else {
        lines.join("; ")
    };
    Error::Api {
        code: envelope.code.clone(),
        message,
    }
}

/// Collect the text content of every `element` in `xml`.
///
/// Each `<line>` child becomes its own entry; text directly inside the
/// element (no `<line>` children) becomes a single entry. Empty entries
/// are dropped.
pub fn collect_lines(xml: &str, element: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let target = element.as_bytes();
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if depth > 0 {
                    depth += 1;
                    if e.name().as_ref() == b"line" {
                        flush(&mut current, &mut lines);
                    }
                } else if e.name().as_ref() == target {
                    depth = 1;
                }
            }
            Ok(Event::End(e)) => {
                if depth > 0 {
                    if e.name().as_ref() == b"line" {
                        flush(&mut current, &mut lines);
                    }
                    depth -= 1;
                    if depth == 0 {
                        flush(&mut current, &mut lines);
                    }
                }
            }
            Ok(Event::Text(text)) if depth > 0 => {
                if let Ok(text) = text.unescape() {
                    push_text(&mut current, &text);
                }
            }
            Ok(Event::CData(data)) if depth > 0 => {
                push_text(&mut current, &String::from_utf8_lossy(&data));
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    lines
}

fn push_text(current: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !current.is_empty() {
        current.push(' ');
    }
    current.push_str(text);
}

fn flush(current: &mut String, lines: &mut Vec<String>) {
    if !current.is_empty() {
        lines.push(std::mem::take(current));
    }
}

fn deserialization(message: &str, body: &str) -> Error {
    Error::Deserialization {
        message: format!("{message} (body preview: {:?})", preview(body)),
        body: body.to_string(),
    }
}

/// First 200 characters of a body, for logs and error messages.
pub(crate) fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
