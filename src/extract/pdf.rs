//! PDF-name fallback (spec.md §4.4 `pdf_row`): no body parsing, just a
//! title derived from the filename and a fixed placeholder summary.

use crate::models::Page;

const UNPARSED_PLACEHOLDER: &str = "PDF（本文未解析）";

pub fn pdf_row(url: &str) -> Page {
    let base = url
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .split('?')
        .next()
        .unwrap_or(url);
    let stem = base.strip_suffix(".pdf").or_else(|| base.strip_suffix(".PDF")).unwrap_or(base);

    Page {
        url: url.to_string(),
        title: format!("{stem} (PDF)"),
        summary: UNPARSED_PLACEHOLDER.to_string(),
        ..Page::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_title_from_filename_stem() {
        let page = pdf_row("https://h/x/abc-def.pdf");
        assert_eq!(page.title, "abc-def (PDF)");
        assert_eq!(page.summary, UNPARSED_PLACEHOLDER);
    }

    #[test]
    fn strips_query_string_before_deriving_stem() {
        let page = pdf_row("https://h/x/report.pdf?download=1");
        assert_eq!(page.title, "report (PDF)");
    }

    #[test]
    fn all_other_fields_are_null() {
        let page = pdf_row("https://h/x/a.pdf");
        assert_eq!(page.rate, None);
        assert_eq!(page.fiscal_year, None);
    }
}
