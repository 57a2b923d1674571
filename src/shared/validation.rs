use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for document type codes
    /// Must be lowercase alphanumeric with hyphens
    /// - Valid: "passport", "residence-permit", "visa2"
    /// - Invalid: "-visa", "visa-", "visa--copy", "Visa", "visa_copy"
    pub static ref CODE_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

/// Whether a web link is an absolute http(s) URL with a host
pub fn is_http_url(raw: &str) -> bool {
    reqwest::Url::parse(raw.trim())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_regex_valid() {
        assert!(CODE_REGEX.is_match("passport"));
        assert!(CODE_REGEX.is_match("residence-permit"));
        assert!(CODE_REGEX.is_match("visa2"));
    }

    #[test]
    fn test_code_regex_invalid() {
        assert!(!CODE_REGEX.is_match("-visa")); // starts with hyphen
        assert!(!CODE_REGEX.is_match("visa-")); // ends with hyphen
        assert!(!CODE_REGEX.is_match("visa--copy")); // double hyphen
        assert!(!CODE_REGEX.is_match("Visa")); // uppercase
        assert!(!CODE_REGEX.is_match("visa_copy")); // underscore
        assert!(!CODE_REGEX.is_match("")); // empty
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://drive.example.edu/share/abc"));
        assert!(is_http_url("http://example.com"));
        assert!(!is_http_url("ftp://example.com/file"));
        assert!(!is_http_url("not a url"));
        assert!(!is_http_url(""));
    }
}
