// HTML cleaning for LLM consumption.
// Strips non-content markup, keeps only hrefs (made absolute), drops empty elements.

use std::sync::LazyLock;

use lol_html::{RewriteStrSettings, doc_comments, element, rewrite_str};
use regex::{Captures, Regex};
use url::Url;

use crate::error::{Result, ScoutError};

/// Tags removed together with their content.
const STRIPPED_TAGS: [&str; 13] = [
    "script", "style", "img", "svg", "noscript", "iframe", "link", "meta", "picture", "br", "hr",
    "input", "wbr",
];

/// An element whose content is only whitespace (non-breaking space entities included),
/// with matching open and close names.
static EMPTY_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"<([a-zA-Z][a-zA-Z0-9-]*)(?:\s[^<>]*)?>(?:\s|&nbsp;|&#160;|&#[xX]0*[aA]0;)*</([a-zA-Z][a-zA-Z0-9-]*)\s*>",
    )
    .expect("valid empty element pattern")
});

/// Clean a page so that only visible text and links remain.
pub fn clean_html(html: &str, base_url: &str) -> Result<String> {
    let base = Url::parse(base_url).ok();

    let mut handlers = STRIPPED_TAGS
        .iter()
        .map(|tag| {
            element!(*tag, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect::<Vec<_>>();

    handlers.push(element!("*", |el| {
        let names: Vec<String> = el
            .attributes()
            .iter()
            .map(|attr| attr.name())
            .filter(|name| name != "href")
            .collect();
        for name in names {
            el.remove_attribute(&name);
        }

        if let Some(href) = el.get_attribute("href") {
            if let Some(absolute) = absolutize(base.as_ref(), &href) {
                el.set_attribute("href", &absolute)?;
            }
        }
        Ok(())
    }));

    let rewritten = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            document_content_handlers: vec![doc_comments!(|c| {
                c.remove();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| ScoutError::Html(e.to_string()))?;

    Ok(remove_empty_elements(&rewritten))
}

/// Resolve an href against the page URL. Leaves it alone if it cannot be joined.
fn absolutize(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    match base {
        Some(base) => base.join(href).ok().map(String::from),
        None => Url::parse(href).ok().map(String::from),
    }
}

/// Repeatedly drop elements without visible text until the document is stable.
fn remove_empty_elements(html: &str) -> String {
    let mut current = html.to_string();
    loop {
        let next = EMPTY_ELEMENT
            .replace_all(&current, |caps: &Captures| {
                if caps[1].eq_ignore_ascii_case(&caps[2]) {
                    String::new()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned();

        if next == current {
            return next;
        }
        current = next;
    }
}
