//! Minimal XML extraction for AWS query and REST responses.

use crate::error::ProviderError;
use quick_xml::events::Event;
use quick_xml::Reader;

#[cfg(test)]
#[path = "xml_tests.rs"]
mod tests;

/// Text content of every element with the given name, in document order
///
/// Elements are matched by local name at any depth. Empty elements
/// contribute nothing.
pub fn element_texts(xml: &str, element: &[u8]) -> Result<Vec<String>, ProviderError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut values = Vec::new();
    let mut inside = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == element => inside = true,
            Ok(Event::End(ref e)) if e.local_name().as_ref() == element => inside = false,
            Ok(Event::Text(e)) if inside => {
                let text = e.unescape().map_err(|e| {
                    ProviderError::SerializationError(format!("Failed to parse XML: {}", e))
                })?;
                values.push(text.into_owned());
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProviderError::SerializationError(format!(
                    "XML parsing error: {}",
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(values)
}

/// First value of `element`, ignoring malformed documents
pub fn first_element_text(xml: &str, element: &[u8]) -> Option<String> {
    element_texts(xml, element)
        .ok()
        .and_then(|values| values.into_iter().next())
}
