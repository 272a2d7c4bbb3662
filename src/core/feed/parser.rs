use feed_rs::model::Entry;
use serde::Deserialize;

use super::types::{FeedFormat, ParsedEntry, ParsedFeed};
use crate::core::page::RenderedEntry;

#[derive(Debug, thiserror::Error)]
pub enum FeedParseError {
    #[error("feed payload is empty")]
    EmptyPayload,
    #[error("xml feed parse error: {0}")]
    Xml(#[from] feed_rs::parser::ParseFeedError),
    #[error("json feed parse error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct JsonFeed {
    title: Option<String>,
    #[serde(default)]
    items: Vec<JsonFeedItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonFeedItem {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    summary: Option<String>,
    content_text: Option<String>,
    content_html: Option<String>,
    date_published: Option<String>,
}

/// Dispatches on the first non-whitespace byte: `{` means JSON Feed,
/// anything else goes through the XML parser.
pub fn parse_feed_bytes(raw: &[u8]) -> Result<ParsedFeed, FeedParseError> {
    let trimmed = trim_leading_ascii_whitespace(raw);
    if trimmed.is_empty() {
        return Err(FeedParseError::EmptyPayload);
    }
    if trimmed[0] == b'{' {
        return parse_json_feed(trimmed);
    }
    parse_xml_feed(trimmed)
}

/// Renders parsed entries to the HTML the feed container holds. Summary
/// markup is flattened to plain text before it is re-escaped, so nested
/// tags from the source feed never leak into the container.
pub fn render_entries(feed: &ParsedFeed) -> Vec<RenderedEntry> {
    feed.entries.iter().map(render_entry).collect()
}

fn render_entry(entry: &ParsedEntry) -> RenderedEntry {
    let mut html = String::from("<article class=\"entry\">");
    html.push_str("<h2>");
    html.push_str(&escape_html(&entry.title));
    html.push_str("</h2>");
    if let Some(summary) = &entry.summary {
        let text = html2text::from_read(summary.as_bytes(), 80);
        let text = text.trim();
        if !text.is_empty() {
            html.push_str("<p>");
            html.push_str(&escape_html(text));
            html.push_str("</p>");
        }
    }
    if !entry.link.trim().is_empty() {
        html.push_str("<a href=\"");
        html.push_str(&escape_html(&entry.link));
        html.push_str("\">Read more</a>");
    }
    html.push_str("</article>");

    RenderedEntry {
        title: entry.title.clone(),
        html,
    }
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for character in input.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn parse_xml_feed(raw: &[u8]) -> Result<ParsedFeed, FeedParseError> {
    let feed = feed_rs::parser::parse(raw)?;
    let title = feed
        .title
        .as_ref()
        .map(|text| text.content.clone())
        .unwrap_or_else(|| "Untitled Feed".to_string());
    let entries = feed.entries.iter().map(entry_from_xml).collect();

    Ok(ParsedFeed {
        format: FeedFormat::XmlFeed,
        title,
        entries,
    })
}

fn parse_json_feed(raw: &[u8]) -> Result<ParsedFeed, FeedParseError> {
    let feed: JsonFeed = serde_json::from_slice(raw)?;
    let title = feed.title.unwrap_or_else(|| "Untitled Feed".to_string());
    let entries = feed
        .items
        .into_iter()
        .map(|item| ParsedEntry {
            id: item
                .id
                .or_else(|| item.url.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            title: item.title.unwrap_or_else(|| "Untitled Entry".to_string()),
            link: item.url.unwrap_or_default(),
            summary: item.summary.or(item.content_html).or(item.content_text),
            published_at: item.date_published,
        })
        .collect();

    Ok(ParsedFeed {
        format: FeedFormat::JsonFeed,
        title,
        entries,
    })
}

fn entry_from_xml(entry: &Entry) -> ParsedEntry {
    let id = if entry.id.trim().is_empty() {
        entry
            .links
            .first()
            .map(|link| link.href.clone())
            .unwrap_or_else(|| "unknown".to_string())
    } else {
        entry.id.clone()
    };
    let title = entry
        .title
        .as_ref()
        .map(|text| text.content.clone())
        .unwrap_or_else(|| "Untitled Entry".to_string());
    let link = entry
        .links
        .first()
        .map(|entry_link| entry_link.href.clone())
        .unwrap_or_default();
    let summary = entry
        .summary
        .as_ref()
        .map(|text| text.content.clone())
        .or_else(|| entry.content.as_ref().and_then(|content| content.body.clone()));
    let published_at = entry
        .published
        .or(entry.updated)
        .map(|timestamp| timestamp.to_rfc3339());

    ParsedEntry {
        id,
        title,
        link,
        summary,
        published_at,
    }
}

fn trim_leading_ascii_whitespace(raw: &[u8]) -> &[u8] {
    let mut index = 0;
    while index < raw.len() && raw[index].is_ascii_whitespace() {
        index += 1;
    }
    &raw[index..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rss_fixture() {
        let xml = include_bytes!("../../../fixtures/udacity-blog.rss.xml");
        let parsed = parse_feed_bytes(xml).expect("rss fixture must parse");

        assert_eq!(parsed.format, FeedFormat::XmlFeed);
        assert_eq!(parsed.title, "Udacity Blog");
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].title, "Intro to Feed Readers");
    }

    #[test]
    fn parses_json_feed_fixture() {
        let json = include_bytes!("../../../fixtures/sample.jsonfeed.json");
        let parsed = parse_feed_bytes(json).expect("json feed must parse");

        assert_eq!(parsed.format, FeedFormat::JsonFeed);
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].title, "First entry");
        assert_eq!(
            parsed.entries[1].summary.as_deref(),
            Some("<p>Full show notes with <strong>markup</strong>.</p>")
        );
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(matches!(
            parse_feed_bytes(b"   \n "),
            Err(FeedParseError::EmptyPayload)
        ));
    }

    #[test]
    fn rendered_entries_carry_the_entry_class_and_flattened_summary() {
        let xml = include_bytes!("../../../fixtures/udacity-blog.rss.xml");
        let parsed = parse_feed_bytes(xml).expect("rss fixture must parse");
        let rendered = render_entries(&parsed);

        assert_eq!(rendered.len(), 2);
        let first = &rendered[0];
        assert!(first.html.starts_with("<article class=\"entry\">"));
        assert!(first.html.contains("<h2>Intro to Feed Readers</h2>"));
        // Source markup was flattened, so no nested <em> survives.
        assert!(!first.html.contains("<em>"));
        assert!(first.html.contains("why"));
    }

    #[test]
    fn rendering_escapes_markup_in_titles() {
        let feed = ParsedFeed {
            format: FeedFormat::XmlFeed,
            title: "Feed".to_string(),
            entries: vec![ParsedEntry {
                id: "1".to_string(),
                title: "<script>alert(1)</script>".to_string(),
                link: String::new(),
                summary: None,
                published_at: None,
            }],
        };
        let rendered = render_entries(&feed);
        assert!(rendered[0].html.contains("&lt;script&gt;"));
        assert!(!rendered[0].html.contains("<script>"));
    }
}
