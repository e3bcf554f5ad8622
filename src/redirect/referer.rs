//! Referer origin extraction

use url::Url;

/// Reduce a `Referer` value to `scheme://authority`
///
/// The result is sliced from the raw value, so case and explicit ports are
/// kept as sent. Returns `None` for values with whitespace, control
/// characters or backslashes, relative references, URLs without an authority
/// and anything that fails to parse.
pub fn referer_origin(referer: &str) -> Option<String> {
    if referer.is_empty()
        || referer
            .chars()
            .any(|c| c.is_ascii_whitespace() || c.is_ascii_control() || c == '\\')
    {
        return None;
    }

    let url = Url::parse(referer).ok()?;
    if !url.host_str().is_some_and(|host| !host.is_empty()) {
        return None;
    }

    let scheme_end = referer.find("://")?;
    if !referer[..scheme_end].eq_ignore_ascii_case(url.scheme()) {
        return None;
    }

    let authority_start = scheme_end + "://".len();
    let authority_end = referer[authority_start..]
        .find(['/', '?', '#'])
        .map_or(referer.len(), |len| authority_start + len);
    if authority_end == authority_start {
        return None;
    }

    Some(referer[..authority_end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_and_host() {
        assert_eq!(
            referer_origin("http://ref.com/page"),
            Some("http://ref.com".to_string())
        );
        assert_eq!(
            referer_origin("http://ref.com"),
            Some("http://ref.com".to_string())
        );
        assert_eq!(
            referer_origin("http://ref.com?q=1"),
            Some("http://ref.com".to_string())
        );
    }

    #[test]
    fn test_keeps_port_and_userinfo() {
        assert_eq!(
            referer_origin("https://user@ref.com:8443/a/b?c=d#e"),
            Some("https://user@ref.com:8443".to_string())
        );
    }

    #[test]
    fn test_default_port_kept() {
        assert_eq!(
            referer_origin("http://ref.com:80/page"),
            Some("http://ref.com:80".to_string())
        );
    }

    #[test]
    fn test_case_kept() {
        assert_eq!(
            referer_origin("HTTP://Ref.COM/x"),
            Some("HTTP://Ref.COM".to_string())
        );
    }

    #[test]
    fn test_rejects_unusable_values() {
        assert_eq!(referer_origin(""), None);
        assert_eq!(referer_origin("   "), None);
        assert_eq!(referer_origin(" http://ref.com/page"), None);
        assert_eq!(referer_origin("http://ref.com/page "), None);
        assert_eq!(referer_origin("http://ref.com/a b"), None);
        assert_eq!(referer_origin("http:\\\\ref.com\\x"), None);
        assert_eq!(referer_origin("http:ref.com"), None);
        assert_eq!(referer_origin("/relative/path"), None);
        assert_eq!(referer_origin("not a url"), None);
        assert_eq!(referer_origin("mailto:someone@example.com"), None);
        assert_eq!(referer_origin("http://[::1"), None);
    }
}
