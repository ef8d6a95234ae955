//! # SVG Codec
//!
//! Baking binds the `openbadges` prefix on the root element and appends the
//! credential as the root's last child:
//!
//! ```xml
//! <svg xmlns="http://www.w3.org/2000/svg" xmlns:openbadges="https://purl.imsglobal.org/spec/ob/v3p0">
//!   ...
//!   <openbadges:credential>{"@context":...}</openbadges:credential>
//! </svg>
//! ```
//!
//! The document is first walked in full with `quick-xml` to prove it is
//! well-formed and to record byte offsets (root start tag, root end tag,
//! every earlier payload element). The edit is then a splice into the
//! original text, so whitespace, comments, entity spelling and attribute
//! quoting elsewhere in the file stay byte-identical.
//!
//! A payload element is a `credential` in [`OPENBADGES_NAMESPACE`] or an
//! Open Badges 2.0 `assertion` carrying a `verify` attribute, under any
//! prefix and at any depth. Baking removes all of them before appending the
//! new one, so extraction (first payload in document order) always sees the
//! credential that was baked last.

use ob_core::OPENBADGES_NAMESPACE;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::BakeError;

/// Prefix bound to the Open Badges namespace in baked output.
pub const OPENBADGES_PREFIX: &str = "openbadges";

/// Namespace of OB 2.0 baked assertions.
pub const OB2_BAKING_NAMESPACE: &str = "http://openbadges.org";

/// What an SVG carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvgPayload {
    /// Text content of a credential or assertion element.
    Embedded(String),
    /// An OB2 assertion element with only a `verify` URL.
    HostedUrl(String),
}

/// Byte offsets recorded during the well-formedness pass.
#[derive(Debug)]
struct Layout {
    /// Start tag of the root, `<svg ...>` or `<svg .../>`.
    root_tag: (usize, usize),
    root_self_closing: bool,
    /// Offset of the root's `</svg>`.
    root_close: Option<usize>,
    /// `xmlns:*` declarations on the root, prefix to URI.
    root_bindings: Vec<(String, String)>,
    /// Outermost payload elements, in document order.
    payloads: Vec<(usize, usize)>,
}

fn position(reader: &NsReader<&[u8]>) -> Result<usize, BakeError> {
    usize::try_from(reader.buffer_position())
        .map_err(|_| BakeError::InvalidSvgContent("document too large".into()))
}

fn xml_error(e: impl std::fmt::Display) -> BakeError {
    BakeError::InvalidSvgContent(e.to_string())
}

fn is_ob_namespace(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == OPENBADGES_NAMESPACE.as_bytes())
}

fn is_ob2_namespace(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri))
        if *uri == OB2_BAKING_NAMESPACE.as_bytes() || *uri == OPENBADGES_NAMESPACE.as_bytes())
}

fn xmlns_bindings(start: &BytesStart<'_>) -> Result<Vec<(String, String)>, BakeError> {
    let mut out = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(xml_error)?;
        if let Some(prefix) = attr.key.as_ref().strip_prefix(b"xmlns:") {
            let value = attr.unescape_value().map_err(xml_error)?;
            out.push((String::from_utf8_lossy(prefix).into_owned(), value.into_owned()));
        }
    }
    Ok(out)
}

/// Walk the whole document once, failing on any well-formedness error.
fn analyze(svg: &str) -> Result<Layout, BakeError> {
    let mut reader = NsReader::from_str(svg);
    reader.config_mut().check_end_names = true;

    let mut depth = 0usize;
    let mut layout: Option<Layout> = None;
    let mut root_closed = false;
    // Start offset and depth of the payload element being skipped over.
    let mut open_payload: Option<(usize, usize)> = None;

    loop {
        let before = position(&reader)?;
        let (ns, event) = reader.read_resolved_event().map_err(xml_error)?;
        let is_payload = match &event {
            Event::Start(e) | Event::Empty(e) => payload_element(&ns, e)?.is_some(),
            _ => false,
        };
        let after = position(&reader)?;
        match event {
            Event::Start(e) => {
                if depth == 0 {
                    if root_closed || layout.is_some() {
                        return Err(BakeError::InvalidSvgContent("multiple root elements".into()));
                    }
                    if e.local_name().as_ref() != b"svg" {
                        return Err(BakeError::NoSvgRootElement);
                    }
                    layout = Some(Layout {
                        root_tag: (before, after),
                        root_self_closing: false,
                        root_close: None,
                        root_bindings: xmlns_bindings(&e)?,
                        payloads: Vec::new(),
                    });
                } else if open_payload.is_none() && is_payload {
                    open_payload = Some((before, depth));
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| BakeError::InvalidSvgContent("unexpected end tag".into()))?;
                match depth {
                    0 => {
                        root_closed = true;
                        if let Some(l) = layout.as_mut() {
                            l.root_close = Some(before);
                        }
                    }
                    d => {
                        if let Some((start, _)) = open_payload.filter(|&(_, at)| at == d) {
                            open_payload = None;
                            if let Some(l) = layout.as_mut() {
                                l.payloads.push((start, after));
                            }
                        }
                    }
                }
            }
            Event::Empty(e) => {
                if depth == 0 {
                    if root_closed || layout.is_some() {
                        return Err(BakeError::InvalidSvgContent("multiple root elements".into()));
                    }
                    if e.local_name().as_ref() != b"svg" {
                        return Err(BakeError::NoSvgRootElement);
                    }
                    root_closed = true;
                    layout = Some(Layout {
                        root_tag: (before, after),
                        root_self_closing: true,
                        root_close: None,
                        root_bindings: xmlns_bindings(&e)?,
                        payloads: Vec::new(),
                    });
                } else if open_payload.is_none() && is_payload {
                    if let Some(l) = layout.as_mut() {
                        l.payloads.push((before, after));
                    }
                }
            }
            Event::Text(t) if depth == 0 => {
                if !t.iter().all(u8::is_ascii_whitespace) {
                    return Err(BakeError::InvalidSvgContent(format!(
                        "text outside the root element at offset {before}"
                    )));
                }
            }
            Event::CData(_) if depth == 0 => {
                return Err(BakeError::InvalidSvgContent("CDATA outside the root element".into()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        return Err(BakeError::InvalidSvgContent(format!("{depth} unclosed element(s) at end of document")));
    }
    layout.ok_or(BakeError::NoSvgRootElement)
}

/// Rewrite the root start tag with an extra `xmlns:{prefix}` attribute.
fn with_binding(tag: &str, self_closing: bool, prefix: &str, uri: &str) -> String {
    let body = if self_closing {
        tag.trim_end_matches('>').trim_end_matches('/').trim_end()
    } else {
        tag.trim_end_matches('>')
    };
    let attr = format!(" xmlns:{prefix}=\"{}\"", escape(uri));
    let close = if self_closing { "/>" } else { ">" };
    format!("{body}{attr}{close}")
}

/// Declare `xmlns:{prefix}="{uri}"` on the root `<svg>` element.
///
/// A prefix the root already declares is left alone.
pub fn add_namespace(svg: &str, prefix: &str, uri: &str) -> Result<String, BakeError> {
    let layout = analyze(svg)?;
    if layout.root_bindings.iter().any(|(p, _)| p == prefix) {
        return Ok(svg.to_string());
    }
    let (start, end) = layout.root_tag;
    let tag = with_binding(&svg[start..end], layout.root_self_closing, prefix, uri);
    Ok(format!("{}{tag}{}", &svg[..start], &svg[end..]))
}

/// Embed `text` in `svg`, removing every existing payload element.
pub fn bake(svg: &[u8], text: &str) -> Result<Vec<u8>, BakeError> {
    let svg = std::str::from_utf8(svg).map_err(|e| BakeError::InvalidSvgContent(format!("not UTF-8: {e}")))?;
    let layout = analyze(svg)?;

    let needs_binding = match layout.root_bindings.iter().find(|(p, _)| p == OPENBADGES_PREFIX) {
        None => true,
        Some((_, uri)) if uri == OPENBADGES_NAMESPACE => false,
        Some((_, uri)) => {
            return Err(BakeError::InvalidSvgContent(format!(
                "prefix {OPENBADGES_PREFIX} is already bound to {uri}"
            )))
        }
    };

    let element = format!(
        "<{OPENBADGES_PREFIX}:credential>{}</{OPENBADGES_PREFIX}:credential>",
        partial_escape(text)
    );
    let (tag_start, tag_end) = layout.root_tag;
    let root_tag = &svg[tag_start..tag_end];
    let mut out = String::with_capacity(svg.len() + element.len() + 80);
    out.push_str(&svg[..tag_start]);

    if layout.root_self_closing {
        let opened = if needs_binding {
            with_binding(root_tag, true, OPENBADGES_PREFIX, OPENBADGES_NAMESPACE)
        } else {
            root_tag.to_string()
        };
        let opened = match opened.strip_suffix("/>") {
            Some(body) => format!("{}>", body.trim_end()),
            None => opened,
        };
        let name = root_name(root_tag);
        out.push_str(&opened);
        out.push_str(&element);
        out.push_str(&format!("</{name}>"));
        out.push_str(&svg[tag_end..]);
    } else {
        let close = layout
            .root_close
            .ok_or_else(|| BakeError::InvalidSvgContent("root element is not closed".into()))?;
        if needs_binding {
            out.push_str(&with_binding(root_tag, false, OPENBADGES_PREFIX, OPENBADGES_NAMESPACE));
        } else {
            out.push_str(root_tag);
        }
        let mut cursor = tag_end;
        for &(start, end) in &layout.payloads {
            out.push_str(&svg[cursor..start]);
            cursor = end;
        }
        out.push_str(&svg[cursor..close]);
        out.push_str(&element);
        out.push_str(&svg[close..]);
    }

    tracing::debug!(
        removed = layout.payloads.len(),
        bound_prefix = needs_binding,
        payload_bytes = text.len(),
        "baked SVG"
    );
    Ok(out.into_bytes())
}

/// Qualified name of the root element as written (`svg` or `x:svg`).
fn root_name(tag: &str) -> &str {
    let body = tag.trim_start_matches('<');
    let end = body
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(body.len());
    &body[..end]
}

/// Extract the embedded payload, if any.
pub fn extract(svg: &[u8]) -> Result<Option<SvgPayload>, BakeError> {
    let svg = std::str::from_utf8(svg).map_err(|e| BakeError::InvalidSvgContent(format!("not UTF-8: {e}")))?;
    analyze(svg)?;

    let mut reader = NsReader::from_str(svg);
    let mut capture: Option<(String, Option<String>)> = None;
    let mut nesting = 0usize;

    loop {
        let (ns, event) = reader.read_resolved_event().map_err(xml_error)?;
        match event {
            Event::Start(e) => {
                if capture.is_some() {
                    nesting += 1;
                } else if let Some(verify) = payload_element(&ns, &e)? {
                    capture = Some((String::new(), verify));
                    nesting = 0;
                }
            }
            Event::Empty(e) if capture.is_none() => {
                if let Some(verify) = payload_element(&ns, &e)? {
                    return Ok(Some(match verify {
                        Some(url) => SvgPayload::HostedUrl(url),
                        None => SvgPayload::Embedded(String::new()),
                    }));
                }
            }
            Event::Text(t) => {
                if let Some((buf, _)) = capture.as_mut() {
                    buf.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(c) => {
                if let Some((buf, _)) = capture.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) if nesting > 0 => nesting -= 1,
            Event::End(_) => {
                if let Some((text, verify)) = capture.take() {
                    let trimmed = text.trim();
                    return Ok(Some(match verify {
                        Some(url) if trimmed.is_empty() => SvgPayload::HostedUrl(url),
                        _ => SvgPayload::Embedded(trimmed.to_string()),
                    }));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(None)
}

/// `Some(verify)` if this element carries a payload. `verify` is the OB2
/// hosted URL for assertion elements.
fn payload_element(ns: &ResolveResult<'_>, e: &BytesStart<'_>) -> Result<Option<Option<String>>, BakeError> {
    let local = e.local_name();
    if local.as_ref() == b"credential" && is_ob_namespace(ns) {
        return Ok(Some(None));
    }
    if local.as_ref() == b"assertion" && is_ob2_namespace(ns) {
        if let Some(attr) = e.try_get_attribute("verify").map_err(xml_error)? {
            let url = attr.unescape_value().map_err(xml_error)?.into_owned();
            return Ok(Some(Some(url)));
        }
    }
    Ok(None)
}
