//! Plain-text → `Page` (spec.md §4.4): same regex set as the HTML
//! extractor, applied to normalised plaintext directly.

use super::patterns::{CALL_NO, CAP, FISCAL_YEAR, RATE, TARGET_LABELS};
use crate::models::page::DEFAULT_TITLE;
use crate::models::Page;
use crate::norm::{clip, norm_ws, SUMMARY_CLIP_LIMIT};

pub fn extract_from_text(url: &str, text: &str) -> Page {
    let normalised = norm_ws(Some(text));

    let title = text
        .lines()
        .map(str::trim)
        .map(|line| norm_ws(Some(line)))
        .find(|line| {
            let len = line.chars().count();
            (8..=80).contains(&len)
        })
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let fiscal_year = capture(&FISCAL_YEAR, &normalised);
    let call_no = capture(&CALL_NO, &normalised);
    let rate = capture(&RATE, &normalised);
    let cap = capture(&CAP, &normalised);

    let mut target: Option<String> = None;
    let mut cost_items: Option<String> = None;
    for (_, re, is_cost_items) in TARGET_LABELS.iter() {
        if let Some(m) = re.captures(text) {
            let value = norm_ws(Some(&m[1]));
            if *is_cost_items {
                cost_items.get_or_insert(value);
            } else {
                target.get_or_insert(value);
            }
        }
    }

    Page {
        url: url.to_string(),
        title,
        summary: clip(Some(&normalised), SUMMARY_CLIP_LIMIT).unwrap_or_default(),
        rate,
        cap,
        target,
        cost_items,
        deadline: None,
        fiscal_year,
        call_no,
        scheme_type: None,
        period_from: None,
        period_to: None,
    }
}

fn capture(re: &regex::Regex, text: &str) -> Option<String> {
    let caps = re.captures(text)?;
    let matched = caps.get(1).or_else(|| caps.get(0))?;
    Some(norm_ws(Some(matched.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_line_within_length_bounds_as_title() {
        let text = "ab\n令和6年度 第3回 ○○補助金のお知らせです\n補助率: 1/2";
        let page = extract_from_text("https://allowed.example/t.txt", text);
        assert_eq!(page.title, "令和6年度 第3回 ○○補助金のお知らせです");
    }

    #[test]
    fn falls_back_to_default_title_when_no_line_fits() {
        let page = extract_from_text("https://allowed.example/t.txt", "x\ny\nz");
        assert_eq!(page.title, DEFAULT_TITLE);
    }

    #[test]
    fn summary_is_clipped_normalised_full_text() {
        let long = "あ".repeat(900);
        let page = extract_from_text("https://allowed.example/t.txt", &long);
        assert_eq!(page.summary.chars().count(), SUMMARY_CLIP_LIMIT);
    }
}
