use crate::adapter::document::{attr, collect_links, element_text, select_first, select_within};
use crate::adapter::rules::{ArticleRules, Byline, ImageRule};
use crate::adapter::{root, Category, Site, SiteAdapter};
use crate::ExtractError;
use scraper::Html;
use std::collections::HashSet;
use url::Url;

const SITE_SELECT: &str = "select.form__select.dropdown_sites";
const ARTICLE_ITEMS: &str = "div.articleItem";
const ARTICLE_LINKS: &str = "div.articleItem a.article-link";

/// Date lines read "Kompas.com - 23/07/2025, 10:00 WIB"
fn date_after_dash(raw: &str) -> String {
    match raw.split_once('-') {
        Some((_, rest)) => rest.trim().to_string(),
        None => raw.trim().to_string(),
    }
}

const RULES: ArticleRules = ArticleRules {
    title: &["h1.read__title", "title"],
    publish_date: &[".read__time"],
    date_cleanup: Some(date_after_dash),
    byline: Byline::Joined(".credit-title-nameEditor"),
    tags: Some("ul.tag__article__wrap li a"),
    content: &[".read__content"],
    paragraph: "p",
    min_paragraph_chars: 1,
    image: Some(ImageRule {
        img: ".cover-photo img",
        caption: None,
    }),
};

/// Adapter for indeks.kompas.com
///
/// Categories are the options of the site dropdown. There is no page count;
/// pagination ends at the first page without article items.
#[derive(Debug, Clone)]
pub struct Kompas {
    base: Url,
}

impl Kompas {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl SiteAdapter for Kompas {
    fn site(&self) -> Site {
        Site::Kompas
    }

    fn base_url(&self) -> &Url {
        &self.base
    }

    fn category_index_url(&self) -> String {
        format!("{}/", root(&self.base))
    }

    fn parse_categories(
        &self,
        document: &Html,
        _page_url: &Url,
    ) -> Result<Vec<Category>, ExtractError> {
        let select = select_first(document, SITE_SELECT)
            .ok_or_else(|| ExtractError::MissingAnchor(SITE_SELECT.to_string()))?;

        let mut seen = HashSet::new();
        let categories = select_within(select, "option")
            .into_iter()
            .filter_map(|option| {
                let value = attr(option, "value");
                if value.is_empty() || value == "all" || !seen.insert(value.clone()) {
                    return None;
                }
                let name = match element_text(option) {
                    text if text.is_empty() => value.clone(),
                    text => text,
                };
                Some(Category::new(value.clone(), name, value))
            })
            .collect();

        Ok(categories)
    }

    fn build_page_url(&self, category: &Category, date_filter: &str, page: u32) -> String {
        format!(
            "{}/?site={}&date={}&page={}",
            root(&self.base),
            category.id,
            date_filter,
            page
        )
    }

    fn extract_links(&self, document: &Html, page_url: &Url) -> Vec<String> {
        collect_links(document, ARTICLE_LINKS, page_url)
    }

    /// An item without a usable link still means the day continues
    fn is_empty_listing(&self, document: &Html, _links: &[String]) -> bool {
        select_first(document, ARTICLE_ITEMS).is_none()
    }

    fn article_rules(&self) -> &ArticleRules {
        &RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> Kompas {
        Kompas::new(Url::parse("https://indeks.kompas.com/").unwrap())
    }

    #[test]
    fn test_parse_categories_dedups_and_skips_all() {
        let html = Html::parse_document(
            r#"<html><body><select class="form__select dropdown_sites">
                <option value="all">Semua</option>
                <option value="news">News</option>
                <option value="money">Money</option>
                <option value="news">News</option>
                <option value="">-</option>
            </select></body></html>"#,
        );
        let page = Url::parse("https://indeks.kompas.com/").unwrap();

        let categories = adapter().parse_categories(&html, &page).unwrap();

        assert_eq!(
            categories,
            vec![
                Category::new("news", "News", "news"),
                Category::new("money", "Money", "money"),
            ]
        );
    }

    #[test]
    fn test_parse_categories_without_dropdown() {
        let html = Html::parse_document("<html><body><select></select></body></html>");
        let page = Url::parse("https://indeks.kompas.com/").unwrap();
        assert!(matches!(
            adapter().parse_categories(&html, &page),
            Err(ExtractError::MissingAnchor(_))
        ));
    }

    #[test]
    fn test_build_page_url() {
        let category = Category::new("news", "News", "news");
        assert_eq!(
            adapter().build_page_url(&category, "2025-07-23", 1),
            "https://indeks.kompas.com/?site=news&date=2025-07-23&page=1"
        );
    }

    #[test]
    fn test_links_without_hint() {
        let html = Html::parse_document(
            r#"<html><body>
                <div class="articleItem"><a class="article-link" href="https://nasional.kompas.com/read/2025/07/23/1">A</a></div>
                <div class="articleItem"><a class="article-link" href="https://money.kompas.com/read/2025/07/23/2">B</a></div>
                <div class="sidebar"><a class="article-link" href="https://kompas.com/popular">C</a></div>
            </body></html>"#,
        );
        let page = Url::parse("https://indeks.kompas.com/?site=news&page=1").unwrap();

        assert_eq!(adapter().extract_links(&html, &page).len(), 2);
        assert_eq!(adapter().max_page_hint(&html), None);
    }

    #[test]
    fn test_items_without_links_are_not_an_empty_listing() {
        let page = Url::parse("https://indeks.kompas.com/?site=news&page=2").unwrap();
        let linkless = Html::parse_document(
            r#"<html><body><div class="articleItem"><span>Video</span></div></body></html>"#,
        );
        let links = adapter().extract_links(&linkless, &page);
        assert!(links.is_empty());
        assert!(!adapter().is_empty_listing(&linkless, &links));

        let blank = Html::parse_document("<html><body><p>Tidak ada berita</p></body></html>");
        assert!(adapter().is_empty_listing(&blank, &[]));
    }

    #[test]
    fn test_extract_article() {
        let html = Html::parse_document(
            r#"<html><head><title>Harga Beras Naik</title></head><body>
                <div class="read__time">Kompas.com - 23/07/2025, 10:00 WIB</div>
                <div class="credit"><span class="credit-title-nameEditor">Rina,</span>
                <span class="credit-title-nameEditor">Dedi</span></div>
                <div class="cover-photo"><img src="https://asset.kompas.com/a.jpg" alt="Beras"></div>
                <div class="read__content"><p>Harga beras naik lagi.</p></div>
            </body></html>"#,
        );

        let article = adapter()
            .extract_article(&html, "https://money.kompas.com/read/2025/07/23/1")
            .unwrap();

        assert_eq!(article.title, "Harga Beras Naik");
        assert_eq!(article.publish_date, "23/07/2025, 10:00 WIB");
        assert_eq!(article.author, "Rina, Dedi");
        assert_eq!(article.images[0].url, "https://asset.kompas.com/a.jpg");
        assert_eq!(article.images[0].caption, "");
        assert!(article.has_warning("tags"));
        assert!(!article.has_warning("images"));
    }
}
