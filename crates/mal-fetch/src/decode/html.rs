//! HTML pages.

use scraper::{Html, Selector};

/// A parsed page plus the body it came from.
///
/// Scrapers query `document` with CSS selectors and fall back to text
/// matching on `body` for markup the selectors cannot reach. `Html` is not
/// `Send`; drop the page before the next `.await` in `Send` futures.
#[derive(Debug)]
pub struct HtmlPage {
    pub document: Html,
    pub body: String,
}

impl HtmlPage {
    /// Parse a body. HTML parsing recovers from any markup error.
    pub fn parse(body: String) -> Self {
        let document = Html::parse_document(&body);
        Self { document, body }
    }

    /// Trimmed contents of `<title>`
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_body_and_document() {
        let body = "<html><head><title>\n  someone's Profile - MyAnimeList.net\n</title></head>\
                    <body><span class=\"user-status-data\">Male</span></body></html>"
            .to_string();
        let page = HtmlPage::parse(body.clone());

        assert_eq!(page.body, body);
        assert_eq!(
            page.title().as_deref(),
            Some("someone's Profile - MyAnimeList.net")
        );

        let selector = Selector::parse("span.user-status-data").unwrap();
        let gender: String = page.document.select(&selector).next().unwrap().text().collect();
        assert_eq!(gender, "Male");
    }

    #[test]
    fn test_broken_markup_still_parses() {
        let page = HtmlPage::parse("<div><p>unclosed <b>tags".to_string());
        assert!(page.title().is_none());
        assert!(page.body.contains("unclosed"));
    }
}
