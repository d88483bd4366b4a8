use crate::adapter::document::{
    attr, collect_links, element_text, select_all, select_first, select_within, slugify,
};
use crate::adapter::rules::{ArticleRules, Byline, ImageRule};
use crate::adapter::{root, Category, Site, SiteAdapter};
use crate::ExtractError;
use scraper::Html;
use url::Url;

const CATEGORY_LABELS: &str = "label.indeks-radio";
const ARTICLE_LINKS: &str = "a.artLink";
const TOTAL_PAGE: &str = "#total_page";

const RULES: ArticleRules = ArticleRules {
    title: &["h1.detailsTitleCaption"],
    publish_date: &["div.detailsAttributeDates"],
    date_cleanup: None,
    byline: Byline::Labeled {
        item: "div.detailsAuthor div.detailsAuthorItem",
        author_label: "Penulis :",
        editor_label: "Editor :",
    },
    tags: Some("ul.detailsTagList a.detailsTagLink"),
    content: &["article.detailsContent"],
    paragraph: "p",
    min_paragraph_chars: 21,
    image: Some(ImageRule {
        img: "figure.detailsCoverImg img",
        caption: Some("figcaption.detailsImgCaption"),
    }),
};

/// Adapter for bisnis.com
///
/// Categories are radio buttons whose `onclick` handler carries the numeric
/// category id. Listing pages publish their total page count in a hidden input.
#[derive(Debug, Clone)]
pub struct Bisnis {
    base: Url,
}

impl Bisnis {
    pub fn new(base: Url) -> Self {
        Self { base }
    }
}

/// Pulls the value of `categoryId=` out of an onclick handler
fn category_id_from_onclick(onclick: &str) -> Option<&str> {
    let (_, rest) = onclick.split_once("categoryId=")?;
    let id = rest
        .split(|c: char| c == '\'' || c == '"' || c == '&' || c == ')')
        .next()?
        .trim();
    (!id.is_empty()).then_some(id)
}

impl SiteAdapter for Bisnis {
    fn site(&self) -> Site {
        Site::Bisnis
    }

    fn base_url(&self) -> &Url {
        &self.base
    }

    fn category_index_url(&self) -> String {
        format!("{}/index", root(&self.base))
    }

    fn parse_categories(
        &self,
        document: &Html,
        _page_url: &Url,
    ) -> Result<Vec<Category>, ExtractError> {
        let labels = select_all(document, CATEGORY_LABELS);
        if labels.is_empty() {
            return Err(ExtractError::MissingAnchor(CATEGORY_LABELS.to_string()));
        }

        let categories = labels
            .into_iter()
            .filter_map(|label| {
                let input = select_within(label, "input").into_iter().next()?;
                let onclick = input.value().attr("onclick")?;
                let id = category_id_from_onclick(onclick)?;
                let name = element_text(label);
                Some(Category::new(id, name.clone(), slugify(&name)))
            })
            .collect();

        Ok(categories)
    }

    fn build_page_url(&self, category: &Category, date_filter: &str, page: u32) -> String {
        format!(
            "{}/index?categoryId={}&type=indeks&date={}&page={}",
            root(&self.base),
            category.id,
            date_filter,
            page
        )
    }

    fn extract_links(&self, document: &Html, page_url: &Url) -> Vec<String> {
        collect_links(document, ARTICLE_LINKS, page_url)
    }

    fn max_page_hint(&self, document: &Html) -> Option<u32> {
        let input = select_first(document, TOTAL_PAGE)?;
        attr(input, "value").parse::<u32>().ok().filter(|n| *n > 0)
    }

    fn article_rules(&self) -> &ArticleRules {
        &RULES
    }
}
