//! Shared regex set for the HTML and text extractors (spec.md §4.4),
//! grounded on `original_source/lib/extractors.py`'s pattern set, with the
//! `20NN年度` alternative spec.md adds alongside `令和…年度`.

use std::sync::LazyLock;

use regex::Regex;

pub static FISCAL_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(令和\s*[0-9０-９]+年度|20[0-9]{2}年度)").unwrap());

pub static CALL_NO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"第\s*([0-9０-９]+)\s*回").unwrap());

pub static RATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"補助率[\s:：]*([0-9０-９]+ ?%?)").unwrap());

pub static CAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"上限[\s:：]*([0-9０-９,，]+ ?(?:円|万円|億円)?)").unwrap());

/// `(label, regex, is_cost_items)` in match-priority order (spec.md §4.4).
/// A later label does not overwrite an earlier non-null assignment for the
/// same field (spec.md §4.4 resolves the ambiguity left by
/// `original_source/lib/extractors.py`, where a later match can clobber an
/// earlier one).
pub static TARGET_LABELS: LazyLock<[(&str, Regex, bool); 3]> = LazyLock::new(|| {
    [
        ("対象経費", Regex::new(r"対象経費[\s:：]*(.+?)\n").unwrap(), true),
        ("対象者", Regex::new(r"対象者[\s:：]*(.+?)\n").unwrap(), false),
        ("対象", Regex::new(r"対象[\s:：]*(.+?)\n").unwrap(), false),
    ]
});
