//! HTML → `Page` (spec.md §4.4), grounded on
//! `original_source/lib/extractors.py::extract_from_html` translated into
//! the `scraper` crate's selector idiom.

use scraper::{Html, Selector};

use super::patterns::{CALL_NO, CAP, FISCAL_YEAR, RATE, TARGET_LABELS};
use crate::models::page::DEFAULT_TITLE;
use crate::models::Page;
use crate::norm::{clip, norm_ws, SUMMARY_CLIP_LIMIT};

pub fn extract_from_html(url: &str, html: &str) -> Page {
    let doc = Html::parse_document(html);

    let title_sel = Selector::parse("title").unwrap();
    let og_title_sel = Selector::parse(r#"meta[property="og:title"]"#).unwrap();
    let twitter_title_sel = Selector::parse(r#"meta[name="twitter:title"]"#).unwrap();
    let desc_sel = Selector::parse(r#"meta[name="description"]"#).unwrap();
    let og_desc_sel = Selector::parse(r#"meta[property="og:description"]"#).unwrap();
    let p_sel = Selector::parse("p").unwrap();

    let title_text = doc
        .select(&title_sel)
        .next()
        .map(|e| norm_ws(Some(&e.text().collect::<String>())))
        .filter(|s| !s.is_empty())
        .or_else(|| meta_content(&doc, &og_title_sel))
        .or_else(|| meta_content(&doc, &twitter_title_sel));

    let mut summary = meta_content(&doc, &desc_sel)
        .or_else(|| meta_content(&doc, &og_desc_sel))
        .unwrap_or_default();
    if summary.is_empty() {
        if let Some(p) = doc.select(&p_sel).next() {
            summary = norm_ws(Some(&p.text().collect::<Vec<_>>().join(" ")));
        }
    }

    let title = match title_text {
        Some(t) if !t.is_empty() => t,
        _ => {
            let clipped = summary.chars().take(40).collect::<String>();
            if clipped.is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                clipped
            }
        }
    };

    let raw_flattened = doc.root_element().text().collect::<Vec<_>>().join(" ");
    let flattened = norm_ws(Some(&raw_flattened));

    let fiscal_year = first_capture_or_whole(&FISCAL_YEAR, &flattened);
    let call_no = first_capture_or_whole(&CALL_NO, &flattened);
    let rate = first_capture_or_whole(&RATE, &flattened);
    let cap = first_capture_or_whole(&CAP, &flattened);

    // TARGET_LABELS patterns terminate on a literal `\n`, which `norm_ws`
    // has already collapsed out of `flattened` — match against the raw,
    // pre-normalisation text instead and norm_ws only the captured group.
    let mut target: Option<String> = None;
    let mut cost_items: Option<String> = None;
    for (_, re, is_cost_items) in TARGET_LABELS.iter() {
        if let Some(m) = re.captures(&raw_flattened) {
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
        summary: clip(Some(&summary), SUMMARY_CLIP_LIMIT).unwrap_or_default(),
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

fn meta_content(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .and_then(|e| e.value().attr("content"))
        .map(|c| norm_ws(Some(c)))
        .filter(|s| !s.is_empty())
}

fn first_capture_or_whole(re: &regex::Regex, text: &str) -> Option<String> {
    let caps = re.captures(text)?;
    let matched = caps.get(1).or_else(|| caps.get(0))?;
    Some(norm_ws(Some(matched.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_fiscal_year_call_no_rate_and_cap() {
        let html = r#"
            <html><head><title>令和6年度 第3回 ○○補助金</title></head>
            <body><p>補助率: 2/3 上限: 1,000万円</p></body></html>
        "#;
        let page = extract_from_html("https://allowed.example/p", html);
        assert_eq!(page.title, "令和6年度 第3回 ○○補助金");
        assert_eq!(page.fiscal_year.as_deref(), Some("令和6年度"));
        assert_eq!(page.call_no.as_deref(), Some("3"));
        assert_eq!(page.rate.as_deref(), Some("2/3"));
        assert_eq!(page.cap.as_deref(), Some("1,000万円"));
    }

    #[test]
    fn falls_back_to_default_title_when_nothing_is_found() {
        let page = extract_from_html("https://allowed.example/empty", "<html><body></body></html>");
        assert_eq!(page.title, DEFAULT_TITLE);
    }

    #[test]
    fn og_description_backs_up_missing_meta_description() {
        let html = r#"
            <html><head>
                <title>T</title>
                <meta property="og:description" content="概要です">
            </head><body></body></html>
        "#;
        let page = extract_from_html("https://allowed.example/og", html);
        assert_eq!(page.summary, "概要です");
    }

    #[test]
    fn earlier_target_label_match_is_not_overwritten_by_a_later_one() {
        let html = "<html><body><p>対象経費 設備費\n対象者 中小企業\n</p></body></html>";
        let page = extract_from_html("https://allowed.example/t", html);
        assert_eq!(page.cost_items.as_deref(), Some("設備費"));
        assert_eq!(page.target.as_deref(), Some("中小企業"));
    }
}
