//! Declarative article extraction rules
//!
//! Each adapter describes where its article fields live as an
//! [`ArticleRules`] value; [`extract_article`] applies those rules to a
//! parsed document. A field only produces an extraction warning when the
//! rules declare it, so a site without an editor credit never warns about one.

use crate::adapter::document::{
    attr, element_text, resolve_link, select_all, select_first, select_first_of, select_within,
    text_without,
};
use crate::output::{fields, ArticleImage, ArticleRecord};
use crate::ExtractError;
use scraper::Html;
use url::Url;

/// Where author and editor credits are found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Byline {
    /// The site has no byline
    None,

    /// Author is the text of the first match, minus any nested `strip` tags
    Author {
        selector: &'static str,
        strip: Option<&'static str>,
    },

    /// Author is every match joined with ", "
    Joined(&'static str),

    /// Each matched item starts with a label naming the author or the editor
    Labeled {
        item: &'static str,
        author_label: &'static str,
        editor_label: &'static str,
    },
}

/// Cover image location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRule {
    pub img: &'static str,
    pub caption: Option<&'static str>,
}

/// Selector set for one site's article pages
#[derive(Debug, Clone, Copy)]
pub struct ArticleRules {
    /// Tried in order; the first that matches wins
    pub title: &'static [&'static str],
    pub publish_date: &'static [&'static str],
    /// Applied to the raw date text before it is stored
    pub date_cleanup: Option<fn(&str) -> String>,
    pub byline: Byline,
    pub tags: Option<&'static str>,
    /// Article body containers; a page matching none is not an article
    pub content: &'static [&'static str],
    pub paragraph: &'static str,
    /// Paragraphs with fewer characters are dropped
    pub min_paragraph_chars: usize,
    pub image: Option<ImageRule>,
}

impl ArticleRules {
    /// Rules with a body container and title only
    pub const fn minimal(content: &'static [&'static str]) -> Self {
        Self {
            title: &["h1"],
            publish_date: &[],
            date_cleanup: None,
            byline: Byline::None,
            tags: None,
            content,
            paragraph: "p",
            min_paragraph_chars: 1,
            image: None,
        }
    }
}

/// Extracts an article record from a parsed document
///
/// # Errors
///
/// `ExtractError::MalformedDocument` when no content container matches.
/// Every other missing field becomes an empty value plus a warning.
pub fn extract_article(
    rules: &ArticleRules,
    document: &Html,
    url: &str,
) -> Result<ArticleRecord, ExtractError> {
    let body = select_first_of(document, rules.content).ok_or_else(|| {
        ExtractError::MalformedDocument(format!(
            "no article body matching {}",
            rules.content.join(", ")
        ))
    })?;

    let mut record = ArticleRecord::new(url);

    record.content = select_within(body, rules.paragraph)
        .into_iter()
        .map(element_text)
        .filter(|p| !p.is_empty() && p.chars().count() >= rules.min_paragraph_chars)
        .collect();
    if record.content.is_empty() {
        record.warn(fields::CONTENT);
    }

    record.title = first_text(document, rules.title);
    if record.title.is_empty() {
        record.warn(fields::TITLE);
    }

    if !rules.publish_date.is_empty() {
        let raw = first_text(document, rules.publish_date);
        record.publish_date = match rules.date_cleanup {
            Some(cleanup) if !raw.is_empty() => cleanup(&raw),
            _ => raw,
        };
        if record.publish_date.is_empty() {
            record.warn(fields::PUBLISH_DATE);
        }
    }

    apply_byline(&rules.byline, document, &mut record);

    if let Some(css) = rules.tags {
        record.tags = select_all(document, css)
            .into_iter()
            .map(element_text)
            .filter(|tag| !tag.is_empty())
            .collect();
        if record.tags.is_empty() {
            record.warn(fields::TAGS);
        }
    }

    if let Some(rule) = rules.image {
        match extract_image(&rule, document, url) {
            Some(image) => record.images.push(image),
            None => record.warn(fields::IMAGES),
        }
    }

    Ok(record)
}

fn first_text(document: &Html, fallbacks: &[&str]) -> String {
    select_first_of(document, fallbacks)
        .map(element_text)
        .unwrap_or_default()
}

fn apply_byline(byline: &Byline, document: &Html, record: &mut ArticleRecord) {
    match *byline {
        Byline::None => {}
        Byline::Author { selector, strip } => {
            record.author = select_first(document, selector)
                .map(|el| match strip {
                    Some(tag) => text_without(el, tag),
                    None => element_text(el),
                })
                .unwrap_or_default();
            if record.author.is_empty() {
                record.warn(fields::AUTHOR);
            }
        }
        Byline::Joined(selector) => {
            record.author = select_all(document, selector)
                .into_iter()
                .map(|el| element_text(el).trim_end_matches(',').trim().to_string())
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            if record.author.is_empty() {
                record.warn(fields::AUTHOR);
            }
        }
        Byline::Labeled {
            item,
            author_label,
            editor_label,
        } => {
            for element in select_all(document, item) {
                let text = element_text(element);
                if let Some(name) = text.strip_prefix(author_label) {
                    record.author = name.trim().to_string();
                } else if let Some(name) = text.strip_prefix(editor_label) {
                    record.editor = name.trim().to_string();
                }
            }
            if record.author.is_empty() {
                record.warn(fields::AUTHOR);
            }
            if record.editor.is_empty() {
                record.warn(fields::EDITOR);
            }
        }
    }
}

fn extract_image(rule: &ImageRule, document: &Html, url: &str) -> Option<ArticleImage> {
    let img = select_first(document, rule.img)?;
    let src = attr(img, "src");
    if src.is_empty() {
        return None;
    }

    let src = match Url::parse(url) {
        Ok(base) => resolve_link(&src, &base).unwrap_or(src),
        Err(_) => src,
    };

    let caption = rule
        .caption
        .and_then(|css| select_first(document, css))
        .map(element_text)
        .unwrap_or_default();

    Some(ArticleImage {
        url: src,
        alt: attr(img, "alt"),
        caption,
    })
}
