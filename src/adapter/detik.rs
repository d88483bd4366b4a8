use crate::adapter::document::{
    collect_links, element_text, resolve_link, select_all, select_first, select_within, slugify,
};
use crate::adapter::rules::{ArticleRules, Byline};
use crate::adapter::{root, Category, Site, SiteAdapter};
use crate::ExtractError;
use scraper::Html;
use url::Url;

const CATEGORY_NAV: &str = "nav.static-nav";
const ARTICLE_LINKS: &str = "a.media__link";
const PAGINATION_LINKS: &str = "div.pagination a[href]";

const RULES: ArticleRules = ArticleRules {
    title: &["h1.detail__title", "h1"],
    publish_date: &["div.detail__date"],
    date_cleanup: None,
    byline: Byline::Author {
        selector: "div.detail__author",
        strip: Some("span"),
    },
    tags: Some("div.nav a.nav__item"),
    content: &["div.detail__body-text", "div.text--detail"],
    paragraph: "p",
    min_paragraph_chars: 1,
    image: None,
};

/// Adapter for detik.com
///
/// Every kanal has its own `/indeks` page, so a category's id is the absolute
/// URL of that page. Dates are `MM/DD/YYYY` and sent percent-encoded.
#[derive(Debug, Clone)]
pub struct Detik {
    base: Url,
}

impl Detik {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

fn encode_date(date_filter: &str) -> String {
    url::form_urlencoded::byte_serialize(date_filter.as_bytes()).collect()
}

impl SiteAdapter for Detik {
    fn site(&self) -> Site {
        Site::Detik
    }

    fn base_url(&self) -> &Url {
        &self.base
    }

    fn category_index_url(&self) -> String {
        format!("{}/indeks", root(&self.base))
    }

    fn parse_categories(
        &self,
        document: &Html,
        page_url: &Url,
    ) -> Result<Vec<Category>, ExtractError> {
        let nav = select_first(document, CATEGORY_NAV)
            .ok_or_else(|| ExtractError::MissingAnchor(CATEGORY_NAV.to_string()))?;

        let categories = select_within(nav, "a[href$='/indeks']")
            .into_iter()
            .filter_map(|link| {
                let kanal = resolve_link(link.value().attr("href")?, page_url)?;
                let name = element_text(link);
                if name.is_empty() {
                    return None;
                }
                Some(Category::new(kanal, name.clone(), slugify(&name)))
            })
            .collect();

        Ok(categories)
    }

    fn build_page_url(&self, category: &Category, date_filter: &str, page: u32) -> String {
        format!("{}?page={}&date={}", category.id, page, encode_date(date_filter))
    }

    fn extract_links(&self, document: &Html, page_url: &Url) -> Vec<String> {
        collect_links(document, ARTICLE_LINKS, page_url)
    }

    /// Largest `page=` value in the pagination bar, or 1 when there is none
    fn max_page_hint(&self, document: &Html) -> Option<u32> {
        let max = select_all(document, PAGINATION_LINKS)
            .into_iter()
            .filter_map(|link| link.value().attr("href"))
            .filter_map(|href| self.base.join(href).ok())
            .filter_map(|url| {
                url.query_pairs()
                    .find(|(key, _)| key == "page")
                    .and_then(|(_, value)| value.parse::<u32>().ok())
            })
            .max()
            .unwrap_or(1);

        Some(max.max(1))
    }

    fn article_rules(&self) -> &ArticleRules {
        &RULES
    }
}
