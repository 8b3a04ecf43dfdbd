//! Well-formedness check for cleaned SVG
//!
//! Streams the document through quick-xml and rejects anything a browser's
//! XML parser would reject, plus documents whose single root is not `svg`.

use super::ValidationError;
use crate::core::constants::svg::{ANIMATION_ELEMENTS, ROOT};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// Facts gathered while validating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub element_count: usize,
    pub animation_count: usize,
}

/// Validate `doc` as a well-formed XML document with an `<svg>` root
pub fn validate_svg(doc: &str) -> Result<DocumentStats, ValidationError> {
    check_references(doc)?;

    let mut reader = Reader::from_str(doc);
    let mut stats = DocumentStats::default();
    let mut depth = 0usize;
    let mut root_seen = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                open_element(e, depth, &mut root_seen, &mut stats)?;
                depth += 1;
            }
            Ok(Event::Empty(ref e)) => {
                open_element(e, depth, &mut root_seen, &mut stats)?;
            }
            Ok(Event::End(ref e)) => {
                if depth == 0 {
                    return Err(ValidationError::Malformed {
                        position: reader.buffer_position() as u64,
                        message: format!(
                            "unexpected end tag </{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        ),
                    });
                }
                depth -= 1;
            }
            Ok(Event::Text(ref e)) => {
                if depth == 0 && !e.iter().all(u8::is_ascii_whitespace) {
                    return Err(ValidationError::ContentOutsideRoot);
                }
            }
            Ok(Event::CData(_)) => {
                if depth == 0 {
                    return Err(ValidationError::ContentOutsideRoot);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ValidationError::Malformed {
                    position: reader.error_position() as u64,
                    message: e.to_string(),
                });
            }
            _ => {}
        }
    }

    if !root_seen {
        return Err(ValidationError::NoMarkup);
    }
    if depth > 0 {
        return Err(ValidationError::Unclosed(depth));
    }
    Ok(stats)
}

fn open_element(
    e: &BytesStart<'_>,
    depth: usize,
    root_seen: &mut bool,
    stats: &mut DocumentStats,
) -> Result<(), ValidationError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

    if depth == 0 {
        if *root_seen {
            return Err(ValidationError::MultipleRoots);
        }
        let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        if local != ROOT {
            return Err(ValidationError::UnexpectedRoot(name));
        }
        *root_seen = true;
    }

    for attr in e.attributes() {
        let attr = attr.map_err(|err| ValidationError::InvalidAttribute {
            element: name.clone(),
            message: err.to_string(),
        })?;
        if attr.value.contains(&b'<') {
            return Err(ValidationError::InvalidAttribute {
                element: name.clone(),
                message: format!(
                    "'<' in value of {}",
                    String::from_utf8_lossy(attr.key.as_ref())
                ),
            });
        }
    }

    stats.element_count += 1;
    let local = e.local_name();
    if ANIMATION_ELEMENTS
        .iter()
        .any(|anim| anim.as_bytes() == local.as_ref())
    {
        stats.animation_count += 1;
    }
    Ok(())
}

/// Every `&` must start a predefined entity or a character reference
///
/// Comments and CDATA sections are skipped since `&` is literal there.
fn check_references(doc: &str) -> Result<(), ValidationError> {
    let mut cursor = 0;
    while let Some(found) = doc[cursor..].find(['&', '<']) {
        let at = cursor + found;
        let rest = &doc[at..];

        if rest.starts_with("<!--") {
            cursor = skip_past(doc, at, "-->");
            continue;
        }
        if rest.starts_with("<![CDATA[") {
            cursor = skip_past(doc, at, "]]>");
            continue;
        }
        if rest.starts_with('<') {
            cursor = at + 1;
            continue;
        }

        let reference = rest
            .find(';')
            .map(|end| &rest[..=end])
            .filter(|r| is_valid_reference(r))
            .ok_or_else(|| ValidationError::InvalidReference {
                position: at as u64,
                reference: rest.chars().take(12).collect(),
            })?;
        cursor = at + reference.len();
    }
    Ok(())
}

fn skip_past(doc: &str, at: usize, terminator: &str) -> usize {
    doc[at..]
        .find(terminator)
        .map(|end| at + end + terminator.len())
        .unwrap_or(doc.len())
}

fn is_valid_reference(reference: &str) -> bool {
    let body = &reference[1..reference.len() - 1];
    match body {
        "amp" | "lt" | "gt" | "quot" | "apos" => true,
        _ => {
            if let Some(hex) = body.strip_prefix("#x") {
                !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit())
            } else if let Some(dec) = body.strip_prefix('#') {
                !dec.is_empty() && dec.chars().all(|c| c.is_ascii_digit())
            } else {
                false
            }
        }
    }
}
