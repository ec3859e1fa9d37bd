// src/services/sources.rs

//! Notice feed adapters.
//!
//! Every adapter yields the same [`RawNotice`] shape; the rest of the run
//! does not know where notices came from.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{RawNotice, SourceConfig};
use crate::utils::http::fetch_text;
use crate::utils::resolve_url;

/// A source of raw notices.
#[async_trait]
pub trait NoticeSource: Send + Sync {
    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;

    /// Fetch the current batch of notices.
    async fn fetch(&self) -> Result<Vec<RawNotice>>;
}

/// The Federal Register notices table on the BIS site.
///
/// Rows are `table tbody tr`. Cells, in order: publication date, effective
/// date, (unused), citation, title, and a document link.
pub struct FederalRegisterTable {
    client: Client,
    config: SourceConfig,
}

const ROW_SELECTOR: &str = "table tbody tr";
const CELL_SELECTOR: &str = "td";
const LINK_SELECTOR: &str = "a";

/// Rows with fewer cells are layout rows, not notices.
const MIN_CELLS: usize = 5;

impl FederalRegisterTable {
    pub fn new(client: Client, config: SourceConfig) -> Self {
        Self { client, config }
    }

    /// Parse notices out of the table page.
    pub fn parse_table(&self, html: &str, base: &Url) -> Result<Vec<RawNotice>> {
        let row_sel = parse_selector(ROW_SELECTOR)?;
        let cell_sel = parse_selector(CELL_SELECTOR)?;
        let link_sel = parse_selector(LINK_SELECTOR)?;

        let document = Html::parse_document(html);
        let mut notices = Vec::new();

        for row in document.select(&row_sel) {
            let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
            if cells.len() < MIN_CELLS {
                continue;
            }

            let url = cells
                .get(5)
                .and_then(|cell| cell.select(&link_sel).next())
                .and_then(|a| a.value().attr("href"))
                .map(|href| resolve_url(base, href.trim()))
                .unwrap_or_default();

            notices.push(RawNotice {
                source: self.config.name.clone(),
                publication_date_raw: cell_text(&cells[0]),
                effective_date_raw: cell_text(&cells[1]),
                citation: cell_text(&cells[3]),
                title: cell_text(&cells[4]),
                url,
            });
        }

        Ok(notices)
    }
}

#[async_trait]
impl NoticeSource for FederalRegisterTable {
    fn describe(&self) -> String {
        self.config.feed_url.clone()
    }

    async fn fetch(&self) -> Result<Vec<RawNotice>> {
        let base = Url::parse(&self.config.feed_url)?;
        let html = fetch_text(&self.client, base.as_str()).await?;
        let notices = self.parse_table(&html, &base)?;
        if notices.is_empty() {
            log::warn!("No notice rows found at {}", base);
        }
        Ok(notices)
    }
}

/// Notices from a JSON array on disk.
///
/// Records without a `source` are tagged with the configured source name.
pub struct FileSource {
    path: PathBuf,
    source_name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, source_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source_name: source_name.into(),
        }
    }
}

#[async_trait]
impl NoticeSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<RawNotice>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| AppError::fetch(self.path.display().to_string(), e))?;
        let mut notices: Vec<RawNotice> = serde_json::from_slice(&bytes)?;
        for notice in &mut notices {
            if notice.source.trim().is_empty() {
                notice.source = self.source_name.clone();
            }
        }
        Ok(notices)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| AppError::selector(selector, e))
}

/// Cell text with whitespace runs collapsed.
fn cell_text(cell: &ElementRef) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FEED_URL: &str = "https://www.bis.gov/news-updates/federal-register-notices";

    const TABLE_HTML: &str = r#"
        <html><body>
        <table>
          <thead>
            <tr><th>Published</th><th>Effective</th><th>Type</th><th>Citation</th><th>Title</th><th>PDF</th></tr>
          </thead>
          <tbody>
            <tr>
              <td>01/15/2025</td><td>01/15/2025</td><td>Rule</td>
              <td>90 FR 4544</td>
              <td>  Framework for Artificial
                  Intelligence Diffusion </td>
              <td><a href="/media/documents/2025-00636.pdf">PDF</a></td>
            </tr>
            <tr><td colspan="4">Page 1 of 3</td></tr>
            <tr>
              <td>12/05/2024</td><td>12/02/2024</td><td>Rule</td>
              <td>89 FR 96790</td>
              <td>Additions to the Entity List</td>
            </tr>
          </tbody>
        </table>
        </body></html>
    "#;

    fn table_source() -> FederalRegisterTable {
        FederalRegisterTable::new(Client::new(), SourceConfig::default())
    }

    #[test]
    fn test_parse_table() {
        let base = Url::parse(FEED_URL).unwrap();
        let notices = table_source().parse_table(TABLE_HTML, &base).unwrap();

        assert_eq!(notices.len(), 2);
        let first = &notices[0];
        assert_eq!(first.source, "BIS Federal Register");
        assert_eq!(first.publication_date_raw, "01/15/2025");
        assert_eq!(first.citation, "90 FR 4544");
        assert_eq!(first.title, "Framework for Artificial Intelligence Diffusion");
        assert_eq!(
            first.url,
            "https://www.bis.gov/media/documents/2025-00636.pdf"
        );
    }

    #[test]
    fn test_row_without_link_has_empty_url() {
        let base = Url::parse(FEED_URL).unwrap();
        let notices = table_source().parse_table(TABLE_HTML, &base).unwrap();
        assert_eq!(notices[1].effective_date_raw, "12/02/2024");
        assert_eq!(notices[1].url, "");
    }

    #[test]
    fn test_page_without_table() {
        let base = Url::parse(FEED_URL).unwrap();
        let notices = table_source()
            .parse_table("<html><p>Maintenance</p></html>", &base)
            .unwrap();
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn test_file_source_fills_source_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notices.json");
        std::fs::write(
            &path,
            r#"[
                {"source": "", "title": "Entity List additions", "url": "https://a.gov/1.pdf"},
                {"source": "Manual", "title": "Corrections", "publication_date_raw": "2025-01-02"}
            ]"#,
        )
        .unwrap();

        let notices = FileSource::new(&path, "BIS Federal Register")
            .fetch()
            .await
            .unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].source, "BIS Federal Register");
        assert_eq!(notices[1].source, "Manual");
        assert_eq!(notices[1].url, "");
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = FileSource::new(tmp.path().join("none.json"), "x")
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
    }
}
