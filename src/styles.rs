//! Collect a style source from a full HTML page.
//!
//! The renderer never reads styles from ambient state; callers that want the
//! styles of an existing page extract them here and pass them in explicitly.

use crate::fetch::{fetch_all, ResourceFetcher};
use crate::{Error, Result};
use log::debug;
use scraper::{Html, Selector};

/// A stylesheet referenced by a page, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleRef {
    /// Text of a `<style>` element
    Inline(String),
    /// `href` of a `<link rel="stylesheet">` element
    Linked(String),
}

/// Find `<style>` and `<link rel="stylesheet">` elements in document order.
///
/// `rel` is a case-insensitive token list, so `rel="Preload StyleSheet"` counts.
pub fn document_styles(html: &str) -> Result<Vec<StyleRef>> {
    let document = Html::parse_document(html);
    let sel = Selector::parse("style, link[rel~=\"stylesheet\" i]")
        .map_err(|e| Error::InitializationError(format!("invalid style selector: {:?}", e)))?;

    let mut refs = Vec::new();
    for node in document.select(&sel) {
        match node.value().name() {
            "style" => {
                let txt = node.text().collect::<String>();
                if !txt.trim().is_empty() {
                    refs.push(StyleRef::Inline(txt));
                }
            }
            _ => {
                if let Some(href) = node.value().attr("href") {
                    refs.push(StyleRef::Linked(href.to_string()));
                }
            }
        }
    }
    Ok(refs)
}

/// Turn style references into rule texts, fetching linked sheets concurrently
pub async fn load_styles<F>(refs: &[StyleRef], fetcher: &F, concurrency: usize) -> Result<Vec<String>>
where
    F: ResourceFetcher + ?Sized,
{
    let hrefs: Vec<String> = refs
        .iter()
        .filter_map(|r| match r {
            StyleRef::Linked(href) => Some(href.clone()),
            StyleRef::Inline(_) => None,
        })
        .collect();
    debug!("loading {} linked stylesheet(s)", hrefs.len());

    let mut fetched = fetch_all(fetcher, &hrefs, concurrency).await?.into_iter();
    let mut styles = Vec::with_capacity(refs.len());
    for r in refs {
        match r {
            StyleRef::Inline(text) => styles.push(text.clone()),
            StyleRef::Linked(_) => {
                if let Some(resource) = fetched.next() {
                    styles.push(resource.text());
                }
            }
        }
    }
    Ok(styles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;

    const PAGE: &str = r#"<html><head>
        <style>body{color:red}</style>
        <link rel="stylesheet" href="/a.css">
        <link rel="icon" href="/favicon.ico">
        <style>   </style>
        </head><body><style>p{margin:0}</style></body></html>"#;

    #[test]
    fn finds_styles_in_document_order() {
        let refs = document_styles(PAGE).unwrap();
        assert_eq!(
            refs,
            vec![
                StyleRef::Inline("body{color:red}".into()),
                StyleRef::Linked("/a.css".into()),
                StyleRef::Inline("p{margin:0}".into()),
            ]
        );
    }

    #[tokio::test]
    async fn linked_sheets_are_fetched_in_place() {
        let refs = document_styles(PAGE).unwrap();
        let fetcher = StaticFetcher::new().with("/a.css", "text/css", b"a{color:blue}".to_vec());
        let styles = load_styles(&refs, &fetcher, 0).await.unwrap();
        assert_eq!(styles, vec!["body{color:red}", "a{color:blue}", "p{margin:0}"]);
    }

    #[test]
    fn rel_is_matched_as_case_insensitive_token() {
        let page = r#"<head>
            <link rel="Stylesheet" href="/upper.css">
            <link rel="preload stylesheet" href="/list.css">
            <link rel="stylesheets" href="/not.css">
            <link rel="alternate" href="/alt.css">
            </head>"#;
        let refs = document_styles(page).unwrap();
        assert_eq!(
            refs,
            vec![StyleRef::Linked("/upper.css".into()), StyleRef::Linked("/list.css".into())]
        );
    }
}
