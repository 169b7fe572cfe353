//! Output formatting for search results and index statistics

use fastngram::{IndexStats, RowId};
use memchr::memmem;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// One confirmed match, or one raw candidate
#[derive(Debug, Serialize)]
pub struct RowMatch<'a> {
    pub row: RowId,
    pub line: usize,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
struct SearchReport<'a> {
    query: &'a str,
    index_only: bool,
    candidates: usize,
    matches: &'a [RowMatch<'a>],
}

fn color_choice() -> ColorChoice {
    if io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Print matches as `line:text` with the query highlighted
pub fn print_matches(matches: &[RowMatch<'_>], query: &str) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice());

    for m in matches {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        write!(stdout, "{}", m.line)?;
        stdout.reset()?;
        write!(stdout, ":")?;

        match match_span(m.text, query) {
            Some((start, end)) => {
                write!(stdout, "{}", &m.text[..start])?;
                stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
                write!(stdout, "{}", &m.text[start..end])?;
                stdout.reset()?;
                writeln!(stdout, "{}", &m.text[end..])?;
            }
            None => writeln!(stdout, "{}", m.text)?,
        }
    }

    Ok(())
}

/// Print the search outcome as a single JSON document
pub fn print_json_matches(
    matches: &[RowMatch<'_>],
    query: &str,
    index_only: bool,
    candidates: usize,
) -> io::Result<()> {
    let report = SearchReport {
        query,
        index_only,
        candidates,
        matches,
    };
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report)?;
    writeln!(stdout)
}

pub fn print_stats(stats: &IndexStats) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice());

    stdout.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(stdout, "Index ({} backend)", stats.store.backend)?;
    stdout.reset()?;

    writeln!(stdout, "  N-gram size:    {}", stats.ngram_size)?;
    writeln!(stdout, "  Bits per char:  {}", stats.bits_per_char)?;
    writeln!(stdout, "  Terms:          {}", stats.terms)?;
    writeln!(stdout, "  Postings:       {}", stats.store.postings)?;
    if let Some(pages) = stats.store.pages {
        writeln!(stdout, "  Pages:          {}", pages)?;
    }
    if let Some(slots) = stats.store.slots_used {
        writeln!(stdout, "  Slots used:     {}", slots)?;
    }
    writeln!(
        stdout,
        "  Memory:         {:.1} KB",
        stats.store.memory_bytes as f64 / 1024.0
    )?;

    Ok(())
}

pub fn print_json_stats(stats: &IndexStats) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, stats)?;
    writeln!(stdout)
}

/// Byte span of the first case-insensitive occurrence of `query`.
///
/// Only reported when lowercasing keeps byte offsets stable.
fn match_span(text: &str, query: &str) -> Option<(usize, usize)> {
    let lower = text.to_lowercase();
    if lower.len() != text.len() || query.is_empty() {
        return None;
    }
    let needle = query.to_lowercase();
    let start = memmem::find(lower.as_bytes(), needle.as_bytes())?;
    let end = start + needle.len();
    (text.is_char_boundary(start) && text.is_char_boundary(end)).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_span() {
        assert_eq!(match_span("A quick brown fox", "QUICK"), Some((2, 7)));
        assert_eq!(match_span("foxhound", "cat"), None);
        assert_eq!(match_span("anything", ""), None);
    }

    #[test]
    fn test_report_json() {
        let matches = [RowMatch {
            row: 4,
            line: 5,
            text: "Few more foxes here",
        }];
        let report = SearchReport {
            query: "fox",
            index_only: false,
            candidates: 3,
            matches: &matches,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""row":4"#));
        assert!(json.contains(r#""text":"Few more foxes here""#));
    }
}
