use crate::adapter::document::{attr, collect_links, element_text, select_first, select_within};
use crate::adapter::rules::{ArticleRules, Byline};
use crate::adapter::{root, Category, Site, SiteAdapter};
use crate::ExtractError;
use scraper::Html;
use url::Url;

const KANAL_SELECT: &str = "select[onchange='articleKanalHandle(this)']";
const ARTICLE_LINKS: &str = "article a";

const RULES: ArticleRules = ArticleRules {
    title: &["h1"],
    publish_date: &["div.text-cm.text-gray"],
    date_cleanup: None,
    byline: Byline::Author {
        selector: "div.mb-1.text-base.font-semibold",
        strip: None,
    },
    tags: Some("section.px-4.py-4.stretch.bg-white a"),
    content: &["div.detail-text"],
    paragraph: "p",
    min_paragraph_chars: 1,
    image: None,
};

/// Adapter for cnbcindonesia.com
///
/// Kanal options carry `slug/id` values; listing pages live under
/// `/{slug}/indeks/{id}` and take `YYYY/MM/DD` dates.
#[derive(Debug, Clone)]
pub struct CnbcIndonesia {
    base: Url,
}

impl CnbcIndonesia {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

impl SiteAdapter for CnbcIndonesia {
    fn site(&self) -> Site {
        Site::CnbcIndonesia
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
                let value = attr(option, "value");
                let (slug, id) = value.split_once('/')?;
                if slug.is_empty() || id.is_empty() {
                    return None;
                }
                Some(Category::new(id, element_text(option), slug))
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

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> CnbcIndonesia {
        CnbcIndonesia::new(Url::parse("https://www.cnbcindonesia.com").unwrap())
    }

    #[test]
    fn test_parse_categories() {
        let html = Html::parse_document(
            r#"<html><body><select onchange="articleKanalHandle(this)">
                <option value="">Semua Kanal</option>
                <option value="news/3">News</option>
                <option value="market/5">Market</option>
            </select></body></html>"#,
        );
        let page = Url::parse("https://www.cnbcindonesia.com/indeks").unwrap();

        let categories = adapter().parse_categories(&html, &page).unwrap();

        assert_eq!(
            categories,
            vec![
                Category::new("3", "News", "news"),
                Category::new("5", "Market", "market"),
            ]
        );
    }

    #[test]
    fn test_build_page_url() {
        let category = Category::new("5", "Market", "market");
        assert_eq!(
            adapter().build_page_url(&category, "2025/07/28", 4),
            "https://www.cnbcindonesia.com/market/indeks/5?date=2025/07/28&page=4"
        );
    }

    #[test]
    fn test_extract_article() {
        let html = Html::parse_document(
            r#"<html><body>
                <h1>IHSG Ditutup Menguat</h1>
                <div class="text-cm text-gray">28 July 2025 16:05</div>
                <div class="mb-1 text-base font-semibold">Tim Riset CNBC</div>
                <div class="detail-text"><p>IHSG naik 1%.</p></div>
            </body></html>"#,
        );

        let article = adapter()
            .extract_article(&html, "https://www.cnbcindonesia.com/market/2025/1")
            .unwrap();

        assert_eq!(article.title, "IHSG Ditutup Menguat");
        assert_eq!(article.publish_date, "28 July 2025 16:05");
        assert_eq!(article.author, "Tim Riset CNBC");
        assert!(article.has_warning("tags"));
    }
}
