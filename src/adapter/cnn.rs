use crate::adapter::document::{attr, collect_links, element_text, select_first, select_within};
use crate::adapter::rules::{ArticleRules, Byline};
use crate::adapter::{root, Category, Site, SiteAdapter};
use crate::ExtractError;
use scraper::Html;
use url::Url;

const KANAL_SELECT: &str = "select#kanalOption";
const ARTICLE_LINKS: &str = "a.flex.group.items-center.gap-4";

const RULES: ArticleRules = ArticleRules {
    title: &["h1.text-\\[28px\\]", "h1"],
    publish_date: &["div.text-cnn_grey"],
    date_cleanup: None,
    byline: Byline::None,
    tags: Some("div.flex.flex-wrap.gap-3 a"),
    content: &["div.detail-text"],
    paragraph: "p",
    min_paragraph_chars: 1,
    image: None,
};

/// Adapter for cnnindonesia.com
#[derive(Debug, Clone)]
pub struct CnnIndonesia {
    base: Url,
}

impl CnnIndonesia {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl SiteAdapter for CnnIndonesia {
    fn site(&self) -> Site {
        Site::CnnIndonesia
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
        _page_url: &Url,
    ) -> Result<Vec<Category>, ExtractError> {
        let select = select_first(document, KANAL_SELECT)
            .ok_or_else(|| ExtractError::MissingAnchor(KANAL_SELECT.to_string()))?;

        let categories = select_within(select, "option")
            .into_iter()
            .filter_map(|option| {
                let slug = attr(option, "data-label");
                let id = attr(option, "value");
                if slug.is_empty() || id.is_empty() {
                    return None;
                }
                let name = match element_text(option) {
                    text if text.is_empty() => slug.clone(),
                    text => text,
                };
                Some(Category::new(id, name, slug))
            })
            .collect();

        Ok(categories)
    }

    fn build_page_url(&self, category: &Category, date_filter: &str, page: u32) -> String {
        format!(
            "{}/{}/indeks/{}?date={}&page={}",
            root(&self.base),
            category.slug,
            category.id,
            date_filter,
            page
        )
    }

    fn extract_links(&self, document: &Html, page_url: &Url) -> Vec<String> {
        collect_links(document, ARTICLE_LINKS, page_url)
    }

    fn article_rules(&self) -> &ArticleRules {
        &RULES
    }
}
