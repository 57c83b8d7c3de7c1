//! URL utilities for endpoint validation and safe logging
//!
//! Source endpoints often embed credentials or signed tokens, so every URL
//! that reaches a log line goes through [`UrlUtils::obfuscate_credentials`].

use url::Url;

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Parse an endpoint and require an HTTP or HTTPS scheme
    pub fn parse_http_endpoint(url: &str) -> Result<Url, String> {
        let parsed = Url::parse(url.trim()).map_err(|e| format!("invalid URL '{}': {e}", Self::obfuscate_credentials(url)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(format!(
                "unsupported scheme '{other}' in '{}', expected http or https",
                Self::obfuscate_credentials(url)
            )),
        }
    }

    /// Obfuscate credentials in URLs for safe logging
    ///
    /// Handles `user:pass@host` authority credentials and sensitive query
    /// parameters such as `password`, `token` or `rlkey`.
    ///
    /// ```rust
    /// use m3u_aggregator::utils::url::UrlUtils;
    ///
    /// assert_eq!(
    ///     UrlUtils::obfuscate_credentials("http://example.com/get.php?username=bob&password=secret"),
    ///     "http://example.com/get.php?username=****&password=****"
    /// );
    /// ```
    pub fn obfuscate_credentials(url: &str) -> String {
        use regex::Regex;

        let mut obfuscated = url.to_string();

        if let Ok(parsed) = Url::parse(url) {
            if !parsed.username().is_empty() || parsed.password().is_some() {
                let mut new_url = parsed.clone();
                let _ = new_url.set_username("****");
                let _ = new_url.set_password(Some("****"));
                obfuscated = new_url.to_string();
            }
        }

        let sensitive_params = [
            "username", "password", "user", "pass", "pwd", "passwd", "token", "key", "rlkey",
        ];

        for param in &sensitive_params {
            let pattern = format!(r"(?i)([?&]{}=)[^&]*", regex::escape(param));
            if let Ok(re) = Regex::new(&pattern) {
                obfuscated = re.replace_all(&obfuscated, "${1}****").to_string();
            }
        }

        obfuscated
    }
}
