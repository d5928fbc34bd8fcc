//! RSS feed parsing into [`TrendRecord`]s.

use marketmind_core::TrendRecord;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::TrendsError;

/// Parse an RSS XML feed into trend records tagged with `category`.
///
/// Extracts `<item>` elements, pulling `<title>` and `<description>`. HTML in
/// descriptions is stripped; an item with no description reuses its title.
/// Items without a title are skipped. Stops after `max_items` records.
/// Records are numbered `"1"`, `"2"`, ... in feed order.
///
/// # Errors
///
/// Returns [`TrendsError::Xml`] if the XML is malformed.
pub fn parse_trend_feed(
    xml: &str,
    category: &str,
    max_items: usize,
) -> Result<Vec<TrendRecord>, TrendsError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut in_item = false;
    let mut in_description = false;
    let mut current_tag = String::new();
    let mut title = String::new();
    let mut description = String::new();

    loop {
        if records.len() >= max_items {
            break;
        }
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "item" {
                    in_item = true;
                    in_description = false;
                    title.clear();
                    description.clear();
                } else if name == "description" && in_item {
                    in_description = true;
                }
                current_tag = name;
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "description" {
                    in_description = false;
                }
                if name == "item" && in_item {
                    in_item = false;
                    let trend_title = title.trim().to_string();
                    if trend_title.is_empty() {
                        continue;
                    }
                    let cleaned = strip_html(&description);
                    let trend_description = if cleaned.is_empty() {
                        trend_title.clone()
                    } else {
                        cleaned
                    };
                    records.push(TrendRecord {
                        trend_id: (records.len() + 1).to_string(),
                        trend_title,
                        trend_description,
                        trend_category: category.to_string(),
                        search_volume: None,
                    });
                }
            }
            Ok(Event::Text(e)) => {
                if in_item {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    if in_description {
                        if !description.is_empty() {
                            description.push(' ');
                        }
                        description.push_str(&text);
                    } else if current_tag == "title" {
                        title = text;
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if in_item {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    if in_description {
                        description = text;
                    } else if current_tag == "title" {
                        title = text;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TrendsError::Xml(e)),
            _ => {}
        }
    }

    Ok(records)
}

/// Strip HTML tags from a string and normalize whitespace.
pub fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.replace("&nbsp;", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Technology - Google News</title>
    <item>
      <title>Robot Vacuum Maps Entire Museum - Tech Daily</title>
      <link>https://example.com/robot-vacuum</link>
      <description>&lt;a href="https://example.com/robot-vacuum"&gt;Robot Vacuum Maps Entire Museum&lt;/a&gt;&amp;nbsp;&amp;nbsp;&lt;font color="#6f6f6f"&gt;Tech Daily&lt;/font&gt;</description>
    </item>
    <item>
      <title>Solar Kite Breaks Altitude Record</title>
      <link>https://example.com/solar-kite</link>
    </item>
    <item>
      <title><![CDATA[Smart Fridge Orders Pizza]]></title>
      <description><![CDATA[<p>The fridge <b>really</b> wanted pizza.</p>]]></description>
    </item>
  </channel>
</rss>"##;

    #[test]
    fn parses_items_into_trend_records() {
        let trends = parse_trend_feed(SAMPLE_RSS, "Technology", 25).expect("valid RSS");
        assert_eq!(trends.len(), 3);
        assert_eq!(trends[0].trend_id, "1");
        assert_eq!(
            trends[0].trend_title,
            "Robot Vacuum Maps Entire Museum - Tech Daily"
        );
        assert_eq!(
            trends[0].trend_description,
            "Robot Vacuum Maps Entire Museum Tech Daily"
        );
        assert_eq!(trends[0].trend_category, "Technology");
        assert!(trends[0].search_volume.is_none());
    }

    #[test]
    fn missing_description_falls_back_to_title() {
        let trends = parse_trend_feed(SAMPLE_RSS, "Technology", 25).unwrap();
        assert_eq!(trends[1].trend_description, trends[1].trend_title);
    }

    #[test]
    fn cdata_fields_are_read_and_stripped() {
        let trends = parse_trend_feed(SAMPLE_RSS, "Technology", 25).unwrap();
        assert_eq!(trends[2].trend_title, "Smart Fridge Orders Pizza");
        assert_eq!(trends[2].trend_description, "The fridge really wanted pizza.");
    }

    #[test]
    fn stops_at_max_items() {
        let trends = parse_trend_feed(SAMPLE_RSS, "Technology", 2).unwrap();
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[1].trend_id, "2");
    }

    #[test]
    fn empty_feed_returns_empty_vec() {
        let xml = r#"<?xml version="1.0"?><rss version="2.0"><channel></channel></rss>"#;
        assert!(parse_trend_feed(xml, "World", 10).unwrap().is_empty());
    }

    #[test]
    fn mismatched_tags_return_xml_error() {
        let xml = "<rss><channel><item><title>Oops</channel></rss>";
        let result = parse_trend_feed(xml, "World", 10);
        assert!(matches!(result, Err(TrendsError::Xml(_))));
    }

    #[test]
    fn strip_html_collapses_whitespace() {
        assert_eq!(strip_html("<b>Hello</b>&nbsp;<i>world</i>  !"), "Hello world !");
        assert_eq!(strip_html("plain"), "plain");
    }
}
