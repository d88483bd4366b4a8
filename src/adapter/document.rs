//! Shared helpers for reading parsed HTML documents
//!
//! Adapters are declarative: they name selectors and these helpers do the
//! walking. Everything here is synchronous and works on a borrowed
//! [`Html`], which must never be held across an await point.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Parses a selector, logging instead of panicking on invalid syntax
pub fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::error!(selector = css, error = ?e, "Invalid CSS selector");
            None
        }
    }
}

/// All elements matching `css`, in document order
pub fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match parse_selector(css) {
        Some(selector) => document.select(&selector).collect(),
        None => Vec::new(),
    }
}

/// First element matching `css`
pub fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = parse_selector(css)?;
    document.select(&selector).next()
}

/// First element matched by the first selector in `fallbacks` that matches anything
pub fn select_first_of<'a>(document: &'a Html, fallbacks: &[&str]) -> Option<ElementRef<'a>> {
    fallbacks.iter().find_map(|css| select_first(document, css))
}

/// Elements under `element` matching `css`
pub fn select_within<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match parse_selector(css) {
        Some(selector) => element.select(&selector).collect(),
        None => Vec::new(),
    }
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element with whitespace collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Text of an element, skipping everything nested inside `excluded` tags
pub fn text_without(element: ElementRef<'_>, excluded: &str) -> String {
    let mut text = String::new();

    for node in element.descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };

        let hidden = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != element.id())
            .any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map_or(false, |el| el.name() == excluded)
            });

        if !hidden {
            text.push_str(fragment);
        }
    }

    collapse_whitespace(&text)
}

/// Trimmed attribute value, empty when absent
pub fn attr(element: ElementRef<'_>, name: &str) -> String {
    element
        .value()
        .attr(name)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// Resolves an href against the page URL
///
/// Returns None for links that cannot lead to an article:
/// - javascript:, mailto:, tel: and data: schemes
/// - fragment-only links
/// - anything that is not http(s) after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}

/// Resolved hrefs of every element matching `css`, in document order
pub fn collect_links(document: &Html, css: &str, base_url: &Url) -> Vec<String> {
    select_all(document, css)
        .into_iter()
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Lower-case, dash-separated form of a display name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_resolve_relative_link() {
        assert_eq!(
            resolve_link("/other", &base_url()),
            Some("https://example.com/other".to_string())
        );
        assert_eq!(
            resolve_link("other", &base_url()),
            Some("https://example.com/other".to_string())
        );
    }

    #[test]
    fn test_resolve_absolute_link() {
        assert_eq!(
            resolve_link("  https://other.com/page ", &base_url()),
            Some("https://other.com/page".to_string())
        );
    }

    #[test]
    fn test_skip_non_article_links() {
        for href in [
            "",
            "#section",
            "javascript:void(0)",
            "mailto:redaksi@example.com",
            "tel:+62211234",
            "data:text/html,<h1>x</h1>",
            "ftp://example.com/file",
        ] {
            assert_eq!(resolve_link(href, &base_url()), None, "{}", href);
        }
    }

    #[test]
    fn test_collect_links_keeps_document_order() {
        let html = Html::parse_document(
            r#"<html><body>
                <a class="item" href="/b">B</a>
                <a class="item" href="javascript:void(0)">x</a>
                <a class="other" href="/skip">skip</a>
                <a class="item" href="https://other.com/a">A</a>
                <a class="item">no href</a>
            </body></html>"#,
        );

        let links = collect_links(&html, "a.item", &base_url());
        assert_eq!(
            links,
            vec!["https://example.com/b", "https://other.com/a"]
        );
    }

    #[test]
    fn test_element_text_collapses_whitespace() {
        let html = Html::parse_document(
            "<html><body><p>  Harga   <b>emas</b>\n naik </p></body></html>",
        );
        let p = select_first(&html, "p").unwrap();
        assert_eq!(element_text(p), "Harga emas naik");
    }

    #[test]
    fn test_text_without_nested_tag() {
        let html = Html::parse_document(
            r#"<html><body><div class="author">Budi Santoso <span>- detikNews</span></div></body></html>"#,
        );
        let div = select_first(&html, "div.author").unwrap();
        assert_eq!(text_without(div, "span"), "Budi Santoso");
        assert_eq!(element_text(div), "Budi Santoso - detikNews");
    }

    #[test]
    fn test_select_first_of_uses_fallbacks() {
        let html = Html::parse_document("<html><body><h1>Judul</h1></body></html>");
        let title = select_first_of(&html, &["h1.detail__title", "h1"]).unwrap();
        assert_eq!(element_text(title), "Judul");
        assert!(select_first_of(&html, &["h2", "h3"]).is_none());
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let html = Html::parse_document("<html><body><p>x</p></body></html>");
        assert!(select_all(&html, "p[").is_empty());
        assert!(select_first(&html, ":::").is_none());
    }

    #[test]
    fn test_attr_defaults_to_empty() {
        let html = Html::parse_document(r#"<html><body><img src=" /a.jpg "></body></html>"#);
        let img = select_first(&html, "img").unwrap();
        assert_eq!(attr(img, "src"), "/a.jpg");
        assert_eq!(attr(img, "alt"), "");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Ekonomi"), "ekonomi");
        assert_eq!(slugify("  Market & Finansial "), "market-finansial");
        assert_eq!(slugify("Sepak Bola"), "sepak-bola");
        assert_eq!(slugify("---"), "");
    }
}
