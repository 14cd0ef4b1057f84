//! Turns a fetched wiki page into the markdown body and classification facts
//! the store persists. Mission logs are routed to the dedicated log parser;
//! everything else goes through plain-text extraction with a raw-wikitext
//! fallback and, when parsed HTML is available, infobox extraction.

use std::collections::HashSet;

use elsie_category::page_type::classify_from_categories;
use elsie_category::{categories_indicate_log, fleet::find_ship_mention, PageType};
use elsie_wiki::{CombinedPageData, ParsedHtml, WikiSection};
use scraper::{ElementRef, Html, Selector};

use crate::error::{ContentError, Result};
use crate::log_parser::render_log;
use crate::types::ProcessedPage;
use crate::wikitext::{collapse_blank_runs, wikitext_to_markdown};

const SKIP_SECTION_NAMES: &[&str] = &["references", "external links", "see also"];
const STRIP_CONTAINER_SELECTOR: &str =
    "table.infobox, aside.portable-infobox, .navbox, .toc, #toc, .mw-editsection, sup.reference, script, style";
const FALLBACK_TEXT_SELECTOR: &str = "p, div, li, dd, td";
const NAVIGATION_MARKERS: &[&str] = &["jump to navigation", "jump to search", "edit section", "retrieved from"];
const META_PREFIXES: &[&str] = &["category:", "file:", "template:"];

/// Build a `ProcessedPage` from a combined query result, optionally enriched
/// with `action=parse` output for infobox extraction. `parsed_html` is only
/// consulted for non-log pages — log pages are reconstructed from raw
/// wikitext, where the `[DOIC]`/speaker markup the parser needs actually
/// lives.
pub fn process_page(page: &CombinedPageData, parsed_html: Option<&ParsedHtml>) -> Result<ProcessedPage> {
    if page.extract.trim().is_empty() && page.raw_wikitext.trim().is_empty() {
        return Err(ContentError::Empty);
    }

    let page_type = classify_from_categories(&page.categories);
    let ship = find_ship_mention(&page.title);

    let content = if categories_indicate_log(&page.categories) || page_type == PageType::MissionLog {
        render_log(&page.title, &page.raw_wikitext, ship.as_deref())
    } else {
        format_general_page(page, parsed_html)
    };

    Ok(ProcessedPage {
        title: page.title.clone(),
        page_type,
        ship,
        content,
        categories: page.categories.clone(),
    })
}

fn format_general_page(page: &CombinedPageData, parsed_html: Option<&ParsedHtml>) -> String {
    let body = match parsed_html {
        Some(parsed) => format_from_html(page, parsed),
        None => wikitext_to_markdown(&page.raw_wikitext),
    };
    collapse_blank_runs(&format!("**{}**\n\n{}", page.title, body.trim()))
}

/// Implements the structured-extraction decision tree: an optional Summary
/// drawn from the plain-text extract, an optional Information block from an
/// infobox, an optional Overview from the lead paragraph, then one
/// sub-section per declared heading (skipping references/external
/// links/see also). If that yields under 200 characters the whole thing is
/// abandoned in favor of a blunter aggregate of every paragraph-like element
/// on the page.
fn format_from_html(page: &CombinedPageData, parsed: &ParsedHtml) -> String {
    let mut blocks = Vec::new();

    let summary = page.extract.trim();
    if summary.chars().count() >= 20 {
        blocks.push(format!("## Summary\n\n{summary}"));
    }

    if let Some(info) = information_block(&parsed.html) {
        blocks.push(info);
    }

    if let Some(overview) = overview_block(&parsed.html) {
        blocks.push(overview);
    }

    for section in &parsed.sections {
        let name = section.heading.trim().to_lowercase();
        if SKIP_SECTION_NAMES.contains(&name.as_str()) {
            continue;
        }
        if let Some(section_body) = section_body_text(&parsed.html, &section.anchor) {
            let level = (section.level as usize).max(2);
            blocks.push(format!("{} {}\n\n{}", "#".repeat(level), section.heading.trim(), section_body));
        }
    }

    let structured = blocks.join("\n\n");
    if structured.chars().count() >= 200 {
        return structured;
    }

    let fallback = aggregate_fallback_text(&parsed.html);
    if fallback.chars().count() > structured.chars().count() {
        fallback
    } else {
        structured
    }
}

fn information_block(html: &str) -> Option<String> {
    let fields = extract_infobox_fields(html);
    if fields.is_empty() {
        return None;
    }
    let mut block = String::from("## Information\n\n");
    for (key, value) in &fields {
        block.push_str(&format!("- {key}: {value}\n"));
    }
    Some(block.trim_end().to_string())
}

/// The first leading paragraph-like block (≥20 chars, not navigation chrome)
/// once infoboxes, navboxes and the table of contents are stripped out.
fn overview_block(html: &str) -> Option<String> {
    let document = Html::parse_fragment(html);
    let strip_selector = Selector::parse(STRIP_CONTAINER_SELECTOR).ok()?;
    let skip_ids: HashSet<_> = document
        .select(&strip_selector)
        .flat_map(|el| el.descendants().map(|n| n.id()))
        .collect();

    let p_selector = Selector::parse("p, div").ok()?;
    for el in document.select(&p_selector) {
        if skip_ids.contains(&el.id()) {
            continue;
        }
        let text: String = el.text().collect();
        let text = text.trim();
        if text.chars().count() >= 20 && !is_navigation_like(text) {
            return Some(format!("## Overview\n\n{text}"));
        }
    }
    None
}

/// The body of one declared section: every sibling of its heading, up to
/// (not including) the next heading.
fn section_body_text(html: &str, anchor: &str) -> Option<String> {
    let document = Html::parse_fragment(html);
    let anchor_el = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().attr("id") == Some(anchor))?;

    let heading_el = if is_heading_tag(anchor_el.value().name()) {
        anchor_el
    } else {
        ElementRef::wrap(anchor_el.parent()?)?
    };

    let mut text = String::new();
    for sibling in heading_el.next_siblings() {
        let Some(el) = ElementRef::wrap(sibling) else { continue };
        if is_heading_tag(el.value().name()) {
            break;
        }
        let fragment: String = el.text().collect();
        let fragment = fragment.trim();
        if !fragment.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(fragment);
        }
    }

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn is_heading_tag(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

/// The <200-char fallback: every paragraph/list/table-cell element with
/// real text, minus navigation chrome and bare Category:/File:/Template:
/// references.
fn aggregate_fallback_text(html: &str) -> String {
    let document = Html::parse_fragment(html);
    let Ok(selector) = Selector::parse(FALLBACK_TEXT_SELECTOR) else {
        return String::new();
    };

    let mut lines = Vec::new();
    for el in document.select(&selector) {
        let text: String = el.text().collect();
        let text = text.trim();
        if text.chars().count() < 15 {
            continue;
        }
        if is_navigation_like(text) || has_meta_prefix(text) {
            continue;
        }
        lines.push(text.to_string());
    }
    lines.join("\n")
}

fn is_navigation_like(text: &str) -> bool {
    let lower = text.to_lowercase();
    NAVIGATION_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn has_meta_prefix(text: &str) -> bool {
    let lower = text.to_lowercase();
    META_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

/// Pull `label: value` pairs out of a portable-infobox or classic
/// `table.infobox`, in document order, skipping rows with no text on
/// either side.
fn extract_infobox_fields(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_fragment(html);
    let row_selector = Selector::parse("table.infobox tr, .portable-infobox .pi-item").unwrap();
    let label_selector = Selector::parse("th, .pi-data-label").unwrap();
    let value_selector = Selector::parse("td, .pi-data-value").unwrap();

    let mut fields = Vec::new();
    for row in document.select(&row_selector) {
        let label = row
            .select(&label_selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string());
        let value = row
            .select(&value_selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string());

        if let (Some(label), Some(value)) = (label, value) {
            if !label.is_empty() && !value.is_empty() {
                fields.push((label, value));
            }
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str, extract: &str, wikitext: &str, categories: &[&str]) -> CombinedPageData {
        CombinedPageData {
            title: title.to_string(),
            page_id: 1,
            extract: extract.to_string(),
            raw_wikitext: wikitext.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            canonical_url: String::new(),
            touched: None,
            lastrevid: None,
            page_exists: true,
        }
    }

    #[test]
    fn empty_page_is_an_error() {
        let p = page("Empty", "", "", &[]);
        assert!(matches!(process_page(&p, None), Err(ContentError::Empty)));
    }

    #[test]
    fn log_category_routes_to_log_parser() {
        let p = page(
            "USS Stardancer Mission Log 12",
            "",
            "[Maeve] \"Report.\"",
            &["Stardancer Logs"],
        );
        let processed = process_page(&p, None).unwrap();
        assert_eq!(processed.page_type, PageType::MissionLog);
        assert_eq!(processed.ship.as_deref(), Some("Stardancer"));
        assert!(processed.content.contains("Maeve Blaine: \"Report.\""));
    }

    #[test]
    fn general_page_builds_structured_sections_from_parsed_html() {
        let html = r#"
            <p id="lead">Earth is the homeworld of humanity and the capital world of the United Federation of Planets.</p>
            <h2 id="History">History</h2>
            <p>Earth was unified under a single planetary government after First Contact with the Vulcans.</p>
        "#;
        let parsed = ParsedHtml {
            html: html.to_string(),
            sections: vec![WikiSection {
                anchor: "History".to_string(),
                heading: "History".to_string(),
                level: 2,
            }],
            display_title: "Earth".to_string(),
        };
        let p = page(
            "Earth",
            "Earth is the homeworld of humanity and the capital world of the United Federation of Planets.",
            "",
            &["Locations"],
        );
        let processed = process_page(&p, Some(&parsed)).unwrap();
        assert!(processed.content.contains("## Summary"));
        assert!(processed.content.contains("Earth is the homeworld of humanity"));
        assert!(processed.content.contains("## Overview"));
        assert!(processed.content.contains("## History"));
        assert!(processed.content.contains("unified under a single planetary government"));
    }

    #[test]
    fn general_page_falls_back_to_wikitext_when_html_unavailable() {
        let p = page(
            "Earth",
            "",
            "'''Earth''' is a planet with plenty of room to spare.",
            &["Locations"],
        );
        let processed = process_page(&p, None).unwrap();
        assert!(processed.content.contains("Earth is a planet with plenty of room to spare."));
        assert!(!processed.content.contains("'''"));
    }

    #[test]
    fn infobox_fields_are_extracted_from_parsed_html() {
        let html = r#"<table class="infobox"><tr><th>Registry</th><td>NCC-78654</td></tr></table>"#;
        let parsed = ParsedHtml {
            html: html.to_string(),
            sections: vec![],
            display_title: "USS Stardancer".to_string(),
        };
        let p = page("USS Stardancer", "A Rhode Island-class starship.", "", &["Starships"]);
        let processed = process_page(&p, Some(&parsed)).unwrap();
        assert!(processed.content.contains("Registry: NCC-78654"));
    }
}
