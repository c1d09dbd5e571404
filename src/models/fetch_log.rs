//! `fetch_log.status` enumeration.

/// Status tag for a `fetch_log` row. Mirrors spec.md §3's enumerated set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Ok,
    NotModified,
    Skip,
    Ng,
    List,
    Seed,
}

impl FetchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchStatus::Ok => "ok",
            FetchStatus::NotModified => "304",
            FetchStatus::Skip => "skip",
            FetchStatus::Ng => "ng",
            FetchStatus::List => "list",
            FetchStatus::Seed => "seed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "ok" => FetchStatus::Ok,
            "304" => FetchStatus::NotModified,
            "skip" => FetchStatus::Skip,
            "ng" => FetchStatus::Ng,
            "list" => FetchStatus::List,
            "seed" => FetchStatus::Seed,
            _ => return None,
        })
    }
}

impl std::fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for status in [
            FetchStatus::Ok,
            FetchStatus::NotModified,
            FetchStatus::Skip,
            FetchStatus::Ng,
            FetchStatus::List,
            FetchStatus::Seed,
        ] {
            assert_eq!(FetchStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_status_is_none() {
        assert_eq!(FetchStatus::from_str("bogus"), None);
    }
}
