//! URL metadata fetching
//!
//! Fetches title, description and preview image when adding bookmarks.

use anyhow::Result;
use reqwest::Url;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

/// Metadata extracted from a URL
#[derive(Debug, Clone, Default)]
pub struct UrlMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Fetch timeout in seconds
const FETCH_TIMEOUT: u64 = 10;

/// Fetch metadata from a URL (async)
///
/// Returns empty metadata on failure (graceful degradation).
pub async fn fetch_metadata(url: &str) -> UrlMetadata {
    match fetch_metadata_inner(url).await {
        Ok(metadata) => metadata,
        Err(e) => {
            debug!(url, error = %e, "Metadata fetch failed");
            UrlMetadata::default()
        }
    }
}

/// Inner fetch function that can fail
async fn fetch_metadata_inner(url: &str) -> Result<UrlMetadata> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT))
        .user_agent("Mozilla/5.0 (compatible; Bingemark/1.0)")
        .build()?;

    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Ok(UrlMetadata::default());
    }

    let base = response.url().clone();
    let html = response.text().await?;
    Ok(parse_metadata(&html, Some(&base)))
}

/// Parse metadata from HTML content
///
/// Relative image URLs are resolved against `base` when given.
fn parse_metadata(html: &str, base: Option<&Url>) -> UrlMetadata {
    let document = Html::parse_document(html);

    UrlMetadata {
        title: extract_title(&document),
        description: extract_description(&document),
        image_url: extract_image(&document).map(|image| resolve(&image, base)),
    }
}

/// Extract title from HTML
fn extract_title(document: &Html) -> Option<String> {
    // Try og:title first
    if let Some(og_title) = extract_meta_content(document, "og:title") {
        return Some(og_title);
    }

    // Fall back to <title> tag
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extract description from HTML
fn extract_description(document: &Html) -> Option<String> {
    extract_meta_content(document, "og:description")
        .or_else(|| extract_meta_content(document, "description"))
}

/// Extract preview image from HTML
fn extract_image(document: &Html) -> Option<String> {
    extract_meta_content(document, "og:image")
        .or_else(|| extract_meta_content(document, "twitter:image"))
}

fn resolve(image: &str, base: Option<&Url>) -> String {
    match base.and_then(|base| base.join(image).ok()) {
        Some(url) => url.to_string(),
        None => image.to_string(),
    }
}

/// Extract content from a meta tag by property or name
fn extract_meta_content(document: &Html, property: &str) -> Option<String> {
    ["property", "name"].iter().find_map(|attr| {
        let selector = Selector::parse(&format!(r#"meta[{}="{}"]"#, attr, property)).ok()?;
        document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata_basic() {
        let html = r#"
            <!DOCTYPE html>
            <html>
            <head>
                <title>Test Page</title>
                <meta name="description" content="A test description">
            </head>
            <body></body>
            </html>
        "#;

        let metadata = parse_metadata(html, None);
        assert_eq!(metadata.title, Some("Test Page".to_string()));
        assert_eq!(metadata.description, Some("A test description".to_string()));
        assert!(metadata.image_url.is_none());
    }

    #[test]
    fn test_parse_metadata_opengraph() {
        let html = r#"
            <!DOCTYPE html>
            <html>
            <head>
                <title>Fallback Title</title>
                <meta name="description" content="Fallback description">
                <meta property="og:title" content="OG Title">
                <meta property="og:description" content="OG Description">
                <meta property="og:image" content="https://cdn.example/cover.png">
            </head>
            <body></body>
            </html>
        "#;

        let metadata = parse_metadata(html, None);
        // OG takes precedence
        assert_eq!(metadata.title, Some("OG Title".to_string()));
        assert_eq!(metadata.description, Some("OG Description".to_string()));
        assert_eq!(
            metadata.image_url,
            Some("https://cdn.example/cover.png".to_string())
        );
    }

    #[test]
    fn test_parse_metadata_twitter_image_relative() {
        let html = r#"<html><head>
            <meta name="twitter:image" content="/img/card.jpg">
        </head></html>"#;

        let base = Url::parse("https://blog.example/posts/1").unwrap();
        let metadata = parse_metadata(html, Some(&base));
        assert_eq!(
            metadata.image_url,
            Some("https://blog.example/img/card.jpg".to_string())
        );
    }

    #[test]
    fn test_parse_metadata_empty() {
        let html = "<html><head></head><body></body></html>";
        let metadata = parse_metadata(html, None);
        assert!(metadata.title.is_none());
        assert!(metadata.description.is_none());
        assert!(metadata.image_url.is_none());
    }
}
