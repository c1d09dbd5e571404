// @generated-looking schema — hand-maintained to match `repository::ensure_schema`.
//
// Kept in sync with the SQL in `repository::bootstrap` by hand.

diesel::table! {
    pages (url) {
        url -> Text,
        title -> Text,
        summary -> Text,
        rate -> Nullable<Text>,
        cap -> Nullable<Text>,
        target -> Nullable<Text>,
        cost_items -> Nullable<Text>,
        deadline -> Nullable<Text>,
        fiscal_year -> Nullable<Text>,
        call_no -> Nullable<Text>,
        scheme_type -> Nullable<Text>,
        period_from -> Nullable<Text>,
        period_to -> Nullable<Text>,
        content_hash -> Text,
        last_fetched -> Timestamptz,
    }
}

diesel::table! {
    http_cache (url) {
        url -> Text,
        etag -> Nullable<Text>,
        last_modified -> Nullable<Text>,
        last_status -> Integer,
        last_checked_at -> Timestamptz,
        last_changed_at -> Timestamptz,
    }
}

diesel::table! {
    fetch_log (id) {
        id -> Int8,
        url -> Text,
        status -> Text,
        took_ms -> Integer,
        error -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    api_quota (month, api) {
        month -> Text,
        api -> Text,
        used -> Integer,
        quota_limit -> Integer,
    }
}
