//! Turning a raw transport response into a typed [`ProcessingStep`].

use regex::Regex;
use std::sync::LazyLock;

use super::error::EdocError;
use super::step::{ProcessingStep, RawResponse};
use super::xml::{Element, FromXml};

static SOAP_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:[\w.\-]+:)?Body(?:\s[^>]*)?>(.*?)</(?:[\w.\-]+:)?Body\s*>")
        .unwrap_or_else(|e| panic!("SOAP body pattern: {e}"))
});

/// Build a step from a request and whatever the transport returned.
///
/// For [`RawResponse::Http`] a non-2xx status is an error. A 2xx body is
/// searched for the SOAP `Body`; the operation result element inside it is
/// unwrapped to its first child, or to the deeper element named
/// `R::ROOT` when the first child is only a wrapper. A body with no SOAP
/// envelope leaves the parsed response unset.
///
/// For [`RawResponse::Decoded`] the string is parsed directly; an absent or
/// empty string leaves the parsed response unset.
pub fn interpret<R: FromXml>(
    operation: &str,
    request_root: Element,
    request_xml: String,
    raw: RawResponse,
) -> Result<ProcessingStep<R>, EdocError> {
    let parsed = match &raw {
        RawResponse::Http { status, body } => {
            if !(200..300).contains(status) {
                return Err(EdocError::Http {
                    status: *status,
                    body: body.clone(),
                });
            }
            parse_soap_body::<R>(body)?
        }
        RawResponse::Decoded(text) => parse_decoded::<R>(text.as_deref())?,
    };
    tracing::trace!(operation, parsed = parsed.is_some(), "response interpreted");
    Ok(ProcessingStep::new(
        operation,
        request_root,
        request_xml,
        raw,
        parsed,
    ))
}

/// Content of the first SOAP `Body` element, if any.
pub fn soap_body(envelope: &str) -> Option<&str> {
    SOAP_BODY
        .captures(envelope)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn parse_soap_body<R: FromXml>(envelope: &str) -> Result<Option<R>, EdocError> {
    let Some(body) = soap_body(envelope) else {
        return Ok(None);
    };
    if body.trim().is_empty() {
        return Ok(None);
    }
    let result = Element::parse(body)?;
    let selected = select(&result, R::ROOT);
    Ok(Some(R::from_element(&unescape_payload(selected, R::ROOT)?)))
}

fn parse_decoded<R: FromXml>(text: Option<&str>) -> Result<Option<R>, EdocError> {
    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return Ok(None);
    };
    let root = Element::parse(text)?;
    let selected = match root.local_name() == R::ROOT {
        true => &root,
        false => root.descendant(R::ROOT).unwrap_or(&root),
    };
    Ok(Some(R::from_element(selected)))
}

/// Pick the response element out of an operation result wrapper.
fn select<'a>(result: &'a Element, root: &str) -> &'a Element {
    if result.local_name() == root {
        return result;
    }
    let first = result.elements().next().unwrap_or(result);
    if first.local_name() == root {
        return first;
    }
    result.descendant(root).unwrap_or(first)
}

/// Providers that return the response document as escaped text inside the
/// result element get it re-parsed here.
fn unescape_payload(selected: &Element, root: &str) -> Result<Element, EdocError> {
    if selected.local_name() == root || selected.has_element_children() {
        return Ok(selected.clone());
    }
    let text = selected.text_content();
    if !text.trim_start().starts_with('<') {
        return Ok(selected.clone());
    }
    let inner = Element::parse(&text)?;
    if inner.local_name() == root {
        return Ok(inner);
    }
    Ok(inner.descendant(root).cloned().unwrap_or(inner))
}
