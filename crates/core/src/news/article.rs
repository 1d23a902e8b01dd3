use crate::config::Settings;
use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Body containers tried in order before falling back to every `<p>` on the page.
const BODY_SELECTORS: [&str; 4] = [
    r#"div[data-test="caas-body"]"#,
    r#"div[data-test="article-body"]"#,
    "div.bodyItems-wrapper",
    "article",
];

#[derive(Debug, Clone)]
pub struct ArticleFetcher {
    http: reqwest::Client,
}

impl ArticleFetcher {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.article_timeout_secs))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .context("failed to build article http client")?;
        Ok(Self { http })
    }

    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("article request failed: {url}"))?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!("article fetch returned HTTP {status}: {url}");
        }

        res.text().await.context("failed to read article body")
    }

    /// Fetches `url` and returns its readable paragraph text.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let html = self.fetch_html(url).await?;
        extract_main_text(&html)
    }
}

fn paragraphs(root: ElementRef<'_>, p: &Selector) -> String {
    root.select(p)
        .map(|el| {
            el.text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Paragraph text of the main article body, one paragraph per line.
pub fn extract_main_text(html: &str) -> Result<String> {
    let doc = Html::parse_document(html);
    let p = Selector::parse("p").map_err(|e| anyhow::anyhow!("invalid selector p: {e}"))?;

    for css in BODY_SELECTORS {
        let sel = Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid selector {css}: {e}"))?;
        if let Some(body) = doc.select(&sel).next() {
            return Ok(paragraphs(body, &p));
        }
    }

    Ok(paragraphs(doc.root_element(), &p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_article_body_container() {
        let html = r#"
<html><body>
  <p>Cookie banner</p>
  <div data-test="caas-body">
    <p>Acme Corp raised its   full-year outlook.</p>
    <p></p>
    <p>Shares jumped <b>8%</b> in early trading.</p>
  </div>
</body></html>"#;
        let text = extract_main_text(html).unwrap();
        assert_eq!(
            text,
            "Acme Corp raised its full-year outlook.\nShares jumped 8% in early trading."
        );
    }

    #[test]
    fn earlier_selector_wins_over_article_tag() {
        let html = r#"
<article><p>Teaser</p></article>
<div class="bodyItems-wrapper"><p>Full story</p></div>"#;
        assert_eq!(extract_main_text(html).unwrap(), "Full story");
    }

    #[test]
    fn falls_back_to_all_paragraphs() {
        let html = "<html><body><p>One</p><div><p>Two</p></div></body></html>";
        assert_eq!(extract_main_text(html).unwrap(), "One\nTwo");
    }

    #[test]
    fn page_without_paragraphs_is_empty() {
        assert_eq!(
            extract_main_text("<html><body><div>Just a div</div></body></html>").unwrap(),
            ""
        );
    }
}
