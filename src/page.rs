use crate::extract::{ScanMode, extract_fragments};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

/// JSON fragments gathered from every script element of one page.
#[derive(Debug, Default, PartialEq)]
pub struct PageJson {
    pub scripts: usize,
    pub fragments: Vec<Value>,
}

impl PageJson {

    /// Parses `html` leniently and scans the text of each `<script>`
    /// in document order. `src` attributes are not followed.
    /// Empty objects are left out of the collection.
    pub fn from_html(html: &str, mode: ScanMode) -> Self {
        let document = Html::parse_document(html);
        let script_selector = Selector::parse("script").unwrap();

        let mut page = PageJson::default();

        for script in document.select(&script_selector) {
            page.scripts += 1;

            let text: String = script.text().collect();
            let found = extract_fragments(&text, mode);

            debug!(script = page.scripts, fragments = found.len(), "scanned script");

            page.fragments.extend(found.into_iter().filter(|value| !is_empty_object(value)));
        }

        page
    }
}

/// Convenience wrapper returning only the Result Collection.
pub fn collect_page_json(html: &str, mode: ScanMode) -> Vec<Value> {
    PageJson::from_html(html, mode).fragments
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(|map| map.is_empty())
}
