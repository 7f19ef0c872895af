pub mod dom;
pub mod extract;
pub mod infobox;
pub mod sections;

use scraper::Html;

use extract::ExtractedData;

/// Parse one page and run the full extraction pass. Pure and synchronous;
/// safe to call concurrently on independent pages.
pub fn process_page(url: &str, html: &str) -> ExtractedData {
    let doc = Html::parse_document(html);
    extract::extract_all(url, &doc)
}

/// Single-page boundary: a panic while extracting is logged and becomes the
/// null-record sentinel, so one broken page never aborts a batch.
pub fn try_process(url: &str, html: &str) -> Option<ExtractedData> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| process_page(url, html)))
        .map_err(|_| tracing::error!("Extraction panicked for {}, page skipped", url))
        .ok()
}
