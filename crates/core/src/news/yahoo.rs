use crate::config::Settings;
use crate::domain::news::{NewsItem, NewsSection};
use crate::news::NewsSource;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

const CLIENT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) OptionsNewsMCP/0.1";

/// Scrapes the news and press-release streams of Yahoo Finance quote pages.
#[derive(Debug, Clone)]
pub struct YahooNewsScraper {
    http: reqwest::Client,
    base_url: String,
}

impl YahooNewsScraper {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.yahoo_timeout_secs))
            .build()
            .context("failed to build Yahoo news http client")?;

        Ok(Self {
            http,
            base_url: settings.yahoo_web_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        headers
    }
}

#[async_trait::async_trait]
impl NewsSource for YahooNewsScraper {
    fn source_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch_section(
        &self,
        ticker: &str,
        section: NewsSection,
        count: usize,
    ) -> Result<Vec<NewsItem>> {
        let symbol = ticker.trim().to_uppercase();
        let url = format!("{}/quote/{}/{}/", self.base_url, symbol, section.as_path());
        tracing::info!(%symbol, section = section.as_path(), "scraping quote page");

        let res = self
            .http
            .get(&url)
            .headers(Self::headers())
            .send()
            .await
            .with_context(|| format!("failed to fetch Yahoo Finance {} page", section.as_path()))?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!(
                "failed to fetch Yahoo Finance {} page: HTTP {status}",
                section.as_path()
            );
        }

        let html = res
            .text()
            .await
            .context("failed to read Yahoo Finance page body")?;

        let items = parse_news_stream(&html, count, &self.base_url)?;
        if items.is_empty() {
            tracing::warn!(%symbol, section = section.as_path(), "no stories found in news stream");
        }
        Ok(items)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid selector {css}: {e}"))
}

fn collapsed_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `"ACCESS Newswire • 7h ago"` → publisher and relative time. Without a
/// bullet the whole text is the publisher.
pub fn split_publishing(text: &str) -> (Option<String>, Option<String>) {
    let non_empty = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());
    match text.split_once('•') {
        Some((before, after)) => (non_empty(before), non_empty(after)),
        None => (non_empty(text), None),
    }
}

/// Extracts up to `count` stories from a quote page. Missing containers
/// yield an empty list.
pub fn parse_news_stream(html: &str, count: usize, base_url: &str) -> Result<Vec<NewsItem>> {
    let stream_sel = selector(r#"[data-testid="news-stream"]"#)?;
    let list_sel = selector("ul.stream-items")?;
    let story_sel = selector("li.stream-item.story-item")?;
    let content_sel = selector("div.content")?;
    let link_sel = selector("a.subtle-link")?;
    let publishing_sel = selector("div.footer div.publishing")?;

    let doc = Html::parse_document(html);
    let mut items = Vec::new();

    let Some(stream) = doc.select(&stream_sel).next() else {
        tracing::debug!("page has no news-stream container");
        return Ok(items);
    };
    let Some(list) = stream.select(&list_sel).next() else {
        tracing::debug!("news-stream has no stream-items list");
        return Ok(items);
    };

    for story in list.select(&story_sel) {
        if items.len() >= count {
            break;
        }
        let Some(content) = story.select(&content_sel).next() else {
            continue;
        };
        let Some(link) = content.select(&link_sel).next() else {
            continue;
        };

        let title = collapsed_text(link);
        if title.is_empty() {
            continue;
        }

        let href = link.value().attr("href").unwrap_or_default();
        let link = if href.starts_with('/') {
            format!("{base_url}{href}")
        } else {
            href.to_string()
        };

        let (publisher, relative_time) = content
            .select(&publishing_sel)
            .next()
            .map(|p| split_publishing(&collapsed_text(p)))
            .unwrap_or((None, None));

        items.push(NewsItem {
            title,
            publisher,
            relative_time,
            link,
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://finance.yahoo.com";

    const PAGE: &str = r#"
<html><body>
<div data-testid="news-stream">
  <ul class="stream-items">
    <li class="stream-item story-item">
      <div class="content">
        <a class="subtle-link" href="/news/acme-beats-estimates-120000.html">
          <h3>Acme beats estimates</h3>
        </a>
        <div class="footer">
          <div class="publishing yf-m1e6lz">
            ACCESS Newswire
            <i aria-hidden="true">•</i>
            7h ago
          </div>
        </div>
      </div>
    </li>
    <li class="stream-item ad-item">
      <div class="content"><a class="subtle-link" href="/ad">Sponsored</a></div>
    </li>
    <li class="stream-item story-item">
      <div class="content">
        <a class="subtle-link" href="https://www.example.com/acme-recall">Acme issues recall</a>
        <div class="footer"><div class="publishing">Reuters</div></div>
      </div>
    </li>
    <li class="stream-item story-item">
      <div class="content"><a class="subtle-link" href="/empty">   </a></div>
    </li>
    <li class="stream-item story-item">
      <div class="content"><a class="subtle-link" href="/news/third.html">Third story</a></div>
    </li>
  </ul>
</div>
</body></html>
"#;

    #[test]
    fn parses_stories_in_page_order() {
        let items = parse_news_stream(PAGE, 10, BASE).unwrap();
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].title, "Acme beats estimates");
        assert_eq!(
            items[0].link,
            "https://finance.yahoo.com/news/acme-beats-estimates-120000.html"
        );
        assert_eq!(items[0].publisher.as_deref(), Some("ACCESS Newswire"));
        assert_eq!(items[0].relative_time.as_deref(), Some("7h ago"));

        assert_eq!(items[1].link, "https://www.example.com/acme-recall");
        assert_eq!(items[1].publisher.as_deref(), Some("Reuters"));
        assert_eq!(items[1].relative_time, None);

        assert_eq!(items[2].title, "Third story");
        assert_eq!(items[2].publisher, None);
    }

    #[test]
    fn stops_after_count() {
        let items = parse_news_stream(PAGE, 1, BASE).unwrap();
        assert_eq!(items.len(), 1);
        assert!(parse_news_stream(PAGE, 0, BASE).unwrap().is_empty());
    }

    #[test]
    fn missing_stream_is_empty() {
        let html = r#"<html><body><ul class="stream-items"><li class="stream-item story-item"></li></ul></body></html>"#;
        assert!(parse_news_stream(html, 5, BASE).unwrap().is_empty());

        let no_list = r#"<div data-testid="news-stream"><p>nothing</p></div>"#;
        assert!(parse_news_stream(no_list, 5, BASE).unwrap().is_empty());
    }

    #[test]
    fn publishing_line_split() {
        assert_eq!(
            split_publishing("Business Wire • 2d ago"),
            (Some("Business Wire".to_string()), Some("2d ago".to_string()))
        );
        assert_eq!(
            split_publishing("Zacks"),
            (Some("Zacks".to_string()), None)
        );
        assert_eq!(split_publishing(" • "), (None, None));
    }
}
