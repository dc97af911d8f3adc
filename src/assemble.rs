//! Document assembly: inlined CSS + content → XHTML → SVG `foreignObject` → data URI.

use crate::{Dimensions, Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use scraper::{ElementRef, Html, Node};

pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
pub const SVG_DATA_URI_PREFIX: &str = "data:image/svg+xml;base64,";

// HTML elements that never have content and serialize as `<name ... />`
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Wrap `<style>css</style>` followed by the content fragment in an
/// XHTML-namespaced `<div>`, serialized as well-formed XML.
///
/// The fragment goes through the HTML5 parser first, so unclosed tags and bare
/// attributes come out closed and quoted.
pub fn xhtml_fragment(css: &str, html: &str) -> String {
    let mut out = String::with_capacity(css.len() + html.len() + 96);
    out.push_str("<div xmlns=\"");
    out.push_str(XHTML_NS);
    out.push_str("\"><style>");
    escape_text(&mut out, css);
    out.push_str("</style>");

    let fragment = Html::parse_fragment(html);
    write_children(&mut out, fragment.root_element(), XHTML_NS);

    out.push_str("</div>");
    out
}

/// Embed serialized XHTML in an SVG document of the given size
pub fn svg_document(xhtml: &str, dims: Dimensions) -> String {
    format!(
        "<svg xmlns='{ns}' width='{w}' height='{h}'><g transform='translate(0, 0) rotate(0)'><foreignObject x='0' y='0' width='{ow}' height='{oh}'>{body}</foreignObject></g></svg>",
        ns = SVG_NS,
        w = dims.width,
        h = dims.height,
        ow = dims.object_width,
        oh = dims.object_height,
        body = xhtml,
    )
}

/// Base64-encode an SVG document as a `data:image/svg+xml;base64,` URI
pub fn svg_data_uri(svg: &str) -> String {
    format!("{}{}", SVG_DATA_URI_PREFIX, STANDARD.encode(svg.as_bytes()))
}

/// Split a base64 data URI into its MIME type and decoded payload
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::Decode("not a data URI".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::Decode("data URI has no payload separator".into()))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| Error::Decode("only base64 data URIs are supported".into()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| Error::Decode(format!("invalid base64 payload: {}", e)))?;
    Ok((mime.to_string(), bytes))
}

fn write_children(out: &mut String, parent: ElementRef<'_>, parent_ns: &str) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => escape_text(out, text),
            Node::Comment(comment) => {
                out.push_str("<!--");
                escape_comment(out, comment);
                out.push_str("-->");
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    write_element(out, el, parent_ns);
                }
            }
            _ => {}
        }
    }
}

fn write_element(out: &mut String, el: ElementRef<'_>, parent_ns: &str) {
    let element = el.value();
    let name = element.name();
    let ns: &str = &element.name.ns;

    out.push('<');
    out.push_str(name);
    if !ns.is_empty() && ns != parent_ns {
        out.push_str(" xmlns=\"");
        out.push_str(ns);
        out.push('"');
    }

    // The namespace declaration above replaces any `xmlns` in the source
    let mut attrs: Vec<(String, &str)> = Vec::with_capacity(element.attrs.len());
    for (name, value) in element.attrs.iter() {
        let prefix = name.prefix.as_deref().unwrap_or("");
        let local: &str = &name.local;
        if prefix.is_empty() && local == "xmlns" {
            continue;
        }
        let qualified = if prefix.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", prefix, local)
        };
        attrs.push((qualified, &**value));
    }
    let uses_xlink = attrs.iter().any(|(n, _)| n.starts_with("xlink:"));
    if uses_xlink && !attrs.iter().any(|(n, _)| n == "xmlns:xlink") {
        attrs.push(("xmlns:xlink".to_string(), XLINK_NS));
    }
    // Attribute storage is unordered; sort for stable output
    attrs.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    for (attr, value) in attrs {
        out.push(' ');
        out.push_str(&attr);
        out.push_str("=\"");
        escape_attr(out, value);
        out.push('"');
    }

    let empty = el.children().next().is_none();
    let html_element = ns == XHTML_NS;
    if empty && (!html_element || VOID_ELEMENTS.contains(&name)) {
        out.push_str(" />");
        return;
    }

    out.push('>');
    write_children(out, el, ns);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

// XML comments may not contain `--` or end with `-`
fn escape_comment(out: &mut String, text: &str) {
    let mut prev = None;
    for c in text.chars() {
        if c == '-' && prev == Some('-') {
            out.push(' ');
        }
        out.push(c);
        prev = Some(c);
    }
    if prev == Some('-') {
        out.push(' ');
    }
}

fn escape_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
