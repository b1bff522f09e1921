pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Normalizes a service base URL to end with a single `/`, matching the form
/// the WOUDC service advertises in its own links.
pub(crate) fn normalize_base_url(url: &str) -> String {
    format!("{}/", url.trim().trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urljoin_handles_slashes() {
        assert_eq!(
            urljoin("https://api.woudc.org/", "collections/stations/items"),
            "https://api.woudc.org/collections/stations/items"
        );
        assert_eq!(
            urljoin("https://api.woudc.org", "/collections"),
            "https://api.woudc.org/collections"
        );
    }

    #[test]
    fn urljoin_passes_absolute_urls_through() {
        assert_eq!(
            urljoin("https://api.woudc.org/", "https://elsewhere.example/x"),
            "https://elsewhere.example/x"
        );
    }

    #[test]
    fn normalize_appends_exactly_one_slash() {
        assert_eq!(
            normalize_base_url("https://api.woudc.org"),
            "https://api.woudc.org/"
        );
        assert_eq!(
            normalize_base_url("https://api.woudc.org//"),
            "https://api.woudc.org/"
        );
        assert_eq!(
            normalize_base_url(" https://api.woudc.org/ "),
            "https://api.woudc.org/"
        );
    }
}
