//! Best-effort wikitext → markdown conversion, used only when a page's
//! plain-text extract is empty and the raw source has to carry the whole
//! formatting job itself.

use once_cell::sync::Lazy;
use regex::Regex;

static TEMPLATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{\{[^{}]*\}\}").unwrap());
static FILE_OR_CATEGORY_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[\[\s*(?:File|Image|Category)\s*:[^\]]*\]\]").unwrap());
static EXTERNAL_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[https?://\S+\s+([^\]]+)\]").unwrap());
static PIPED_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[[^\]|]*\|([^\]]*)\]\]").unwrap());
static PLAIN_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\]]*)\]\]").unwrap());
static QUOTE_MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"'{2,5}").unwrap());
static BARE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(={1,4})\s*(.*?)\s*=+\s*$").unwrap());
static REF_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<ref[^>]*>.*?</ref>|<ref[^>]*/>").unwrap());
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Drop templates, file/image/category links and references; convert the
/// remaining link and heading markup into plain text/markdown; then keep
/// only lines that read as real prose (≥10 chars, not a bullet or
/// definition line). Templates can nest, so template removal is applied
/// repeatedly until a pass makes no further change — fine for the shallow
/// nesting real pages use, not a general-purpose wikitext parser.
pub fn wikitext_to_markdown(wikitext: &str) -> String {
    let mut text = wikitext.to_string();

    loop {
        let replaced = TEMPLATE.replace_all(&text, "").to_string();
        if replaced == text {
            break;
        }
        text = replaced;
    }

    text = REF_TAG.replace_all(&text, "").to_string();
    text = FILE_OR_CATEGORY_LINK.replace_all(&text, "").to_string();
    text = EXTERNAL_LINK.replace_all(&text, "$1").to_string();
    text = PIPED_LINK.replace_all(&text, "$1").to_string();
    text = PLAIN_LINK.replace_all(&text, "$1").to_string();
    text = QUOTE_MARKUP.replace_all(&text, "").to_string();
    text = BARE_TAG.replace_all(&text, "").to_string();
    text = HEADING
        .replace_all(&text, |caps: &regex::Captures| {
            let level = caps[1].len().clamp(1, 4);
            format!("{} {}", "#".repeat(level), &caps[2])
        })
        .to_string();

    let kept: Vec<&str> = text.lines().filter(|line| keep_wikitext_line(line)).collect();
    collapse_blank_runs(kept.join("\n").trim())
}

fn keep_wikitext_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return true;
    }
    let is_bullet_or_definition = trimmed.starts_with('*') || trimmed.starts_with(';') || trimmed.starts_with(':');
    trimmed.chars().count() >= 10 && !is_bullet_or_definition
}

/// Collapses runs of 3+ newlines to exactly 2 and trims. Applied both at the
/// end of raw-wikitext conversion and, separately, to the whole document
/// `ContentProcessor` assembles from parsed HTML.
pub fn collapse_blank_runs(text: &str) -> String {
    BLANK_RUN.replace_all(text.trim(), "\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_templates_and_refs() {
        let input = "Intro {{infobox|a=1}} text<ref>cite</ref> more.";
        assert_eq!(wikitext_to_markdown(input), "Intro  text more.");
    }

    #[test]
    fn converts_piped_and_plain_links() {
        assert_eq!(
            wikitext_to_markdown("See [[USS Stardancer|the ship]] and [[Earth]]."),
            "See the ship and Earth."
        );
    }

    #[test]
    fn strips_bold_and_italic_markup_and_converts_headings() {
        let input = "== History ==\n'''Bold text here''' and ''italic text here''.";
        assert_eq!(
            wikitext_to_markdown(input),
            "## History\nBold text here and italic text here."
        );
    }

    #[test]
    fn collapses_excess_blank_lines() {
        let input = "Paragraph one is here.\n\n\n\n\nParagraph two follows.";
        assert_eq!(
            wikitext_to_markdown(input),
            "Paragraph one is here.\n\nParagraph two follows."
        );
    }

    #[test]
    fn drops_file_and_category_links_entirely() {
        let input = "See the starship. [[File:Stardancer.png|thumb]] [[Category:Starships]]";
        let result = wikitext_to_markdown(input);
        assert!(!result.contains("File:"));
        assert!(!result.contains("Category:"));
    }

    #[test]
    fn converts_external_link_to_display_text() {
        let input = "Read the full mission report here.\n[https://example.com/log Full Report]";
        let result = wikitext_to_markdown(input);
        assert!(result.contains("Full Report"));
        assert!(!result.contains("https://"));
    }

    #[test]
    fn short_lines_and_bullets_are_dropped() {
        let input = "This is a proper paragraph with real content.\nshort\n* a bullet point line\n; a definition term";
        let result = wikitext_to_markdown(input);
        assert!(result.contains("This is a proper paragraph with real content."));
        assert!(!result.contains("short"));
        assert!(!result.contains("bullet"));
        assert!(!result.contains("definition term"));
    }

    #[test]
    fn strips_bare_html_tags() {
        let input = "This paragraph has <b>raw</b> html tags inside it.";
        assert_eq!(
            wikitext_to_markdown(input),
            "This paragraph has raw html tags inside it."
        );
    }
}
