//! Splits oversized page content into parts for storage, never breaking a
//! word. Tries the highest-level structural boundary first: level-2
//! headings, then level-3, then paragraphs, then sentences. Only once none
//! of those can make a piece small enough does it fall back to packing
//! whole words.

use once_cell::sync::Lazy;
use regex::Regex;

static HEADING2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## ").unwrap());
static HEADING3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### ").unwrap());

/// Split `content` into parts of at most `max_chars` characters each. A
/// single part is returned unchanged when it already fits.
pub fn chunk_content(content: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 || content.chars().count() <= max_chars {
        return vec![content.to_string()];
    }

    let units = split_into_units(content, max_chars);
    pack_units(&units, max_chars)
}

fn split_into_units(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    for splitter in [split_on_heading2 as fn(&str) -> Vec<String>, split_on_heading3, split_on_paragraph, split_on_sentence] {
        let pieces = splitter(text);
        if pieces.len() > 1 {
            return pieces
                .into_iter()
                .flat_map(|p| split_into_units(&p, max_chars))
                .collect();
        }
    }

    split_on_words(text, max_chars)
}

/// Greedily concatenate adjacent units back together up to `max_chars`, so a
/// heading split that produced many tiny sections doesn't become many tiny
/// parts when they'd comfortably fit together.
fn pack_units(units: &[String], max_chars: usize) -> Vec<String> {
    let mut packed = Vec::new();
    let mut current = String::new();

    for unit in units {
        if !current.is_empty() && current.chars().count() + unit.chars().count() > max_chars {
            packed.push(std::mem::take(&mut current));
        }
        current.push_str(unit);
    }
    if !current.is_empty() {
        packed.push(current);
    }
    if packed.is_empty() {
        packed.push(String::new());
    }
    packed
}

fn split_on_heading2(text: &str) -> Vec<String> {
    split_on_regex_starts(text, &HEADING2)
}

fn split_on_heading3(text: &str) -> Vec<String> {
    split_on_regex_starts(text, &HEADING3)
}

fn split_on_regex_starts(text: &str, re: &Regex) -> Vec<String> {
    let mut starts: Vec<usize> = re.find_iter(text).map(|m| m.start()).collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }
    starts.dedup();
    starts.push(text.len());

    starts
        .windows(2)
        .map(|w| text[w[0]..w[1]].to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Splits on blank lines, keeping the `\n\n` separator attached to the end
/// of the preceding paragraph so pieces remain exact contiguous slices of
/// the original text.
fn split_on_paragraph(text: &str) -> Vec<String> {
    const SEP: &str = "\n\n";
    let mut pieces = Vec::new();
    let mut last = 0;
    let mut search_from = 0;
    while let Some(pos) = text[search_from..].find(SEP) {
        let end = search_from + pos + SEP.len();
        pieces.push(text[last..end].to_string());
        last = end;
        search_from = end;
    }
    pieces.push(text[last..].to_string());
    pieces.retain(|s| !s.is_empty());
    pieces
}

fn split_on_sentence(text: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut last = 0;
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            let after = i + c.len_utf8();
            let next_is_boundary = text[after..].chars().next().map(|n| n.is_whitespace()).unwrap_or(true);
            if next_is_boundary {
                result.push(text[last..after].to_string());
                last = after;
            }
        }
    }
    if last < text.len() {
        result.push(text[last..].to_string());
    }
    result
}

/// Last-resort splitter: cuts only at word boundaries, so every returned
/// piece remains an exact contiguous slice of `text` (never mid-word) that
/// can be reassembled or re-packed by simple concatenation.
fn split_on_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut word_starts = Vec::new();
    let mut in_word = false;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            word_starts.push(i);
            in_word = true;
        }
    }
    if word_starts.len() <= 1 {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut chunk_start = 0;
    for &word_start in &word_starts[1..] {
        if text[chunk_start..word_start].chars().count() > max_chars {
            chunks.push(text[chunk_start..word_start].to_string());
            chunk_start = word_start;
        }
    }
    chunks.push(text[chunk_start..].to_string());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_under_limit_is_not_split() {
        let chunks = chunk_content("short", 100);
        assert_eq!(chunks, vec!["short".to_string()]);
    }

    #[test]
    fn splits_on_level2_headings_when_available() {
        let content = format!("## A\n{}\n## B\n{}", "x".repeat(40), "y".repeat(40));
        let chunks = chunk_content(&content, 50);
        assert!(chunks.len() >= 2);
        assert!(chunks[0].starts_with("## A"));
    }

    #[test]
    fn never_splits_mid_word() {
        let content = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = chunk_content(content, 20);
        for chunk in &chunks {
            for word in chunk.split_whitespace() {
                assert!(content.contains(word));
            }
        }
        assert_eq!(chunks.concat(), content);
    }

    #[test]
    fn falls_back_through_paragraphs_then_sentences() {
        let content = format!(
            "{} {}\n\n{} {}",
            "One sentence here.",
            "Another one follows.",
            "Third sentence now.",
            "Fourth and final."
        );
        let chunks = chunk_content(&content, 40);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40 || !chunk.contains(' '));
        }
    }
}
