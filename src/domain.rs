use url::{Host, Url};

/// Label used when a URL has no usable host.
pub const DEFAULT_DOMAIN: &str = "default_domain";

/// Derives the short domain label of a URL: the second-to-last
/// segment of its hostname (`https://api.example.com/x` gives `example`).
///
/// Single-segment hosts such as `localhost` give the host itself, and
/// IP literals give the address with separators replaced by `_`.
pub fn domain_label(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return DEFAULT_DOMAIN.to_string();
    };

    match parsed.host() {
        Some(Host::Domain(host)) => {
            // `Url` stores IDN hosts as punycode; label them as written.
            let (unicode, _) = idna::domain_to_unicode(host);
            label_from_host(&unicode)
        }
        Some(Host::Ipv4(ip)) => ip.to_string().replace('.', "_"),
        Some(Host::Ipv6(ip)) => ip.to_string().replace(':', "_"),
        None => DEFAULT_DOMAIN.to_string(),
    }
}

fn label_from_host(host: &str) -> String {
    let segments: Vec<&str> = host
        .trim_end_matches('.')
        .split('.')
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        [] => DEFAULT_DOMAIN.to_string(),
        [only] => only.to_lowercase(),
        [.., label, _suffix] => label.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_to_last_segment() {
        assert_eq!(domain_label("https://api.example.com/x"), "example");
        assert_eq!(domain_label("https://example.com"), "example");
        assert_eq!(domain_label("http://a.b.c.shop.co/path?q=1"), "shop");
    }

    #[test]
    fn host_is_lowercased() {
        assert_eq!(domain_label("https://WWW.Example.ORG/"), "example");
    }

    #[test]
    fn malformed_urls_fall_back() {
        assert_eq!(domain_label("not a url"), DEFAULT_DOMAIN);
        assert_eq!(domain_label("example.com/page"), DEFAULT_DOMAIN);
        assert_eq!(domain_label(""), DEFAULT_DOMAIN);
        assert_eq!(domain_label("mailto:someone@example.com"), DEFAULT_DOMAIN);
    }

    #[test]
    fn single_segment_host_is_kept() {
        assert_eq!(domain_label("http://localhost:8080/api"), "localhost");
    }

    #[test]
    fn internationalized_hosts_keep_unicode_label() {
        assert_eq!(domain_label("https://bücher.de/katalog"), "bücher");
        assert_eq!(domain_label("https://www.xn--bcher-kva.de/"), "bücher");
    }

    #[test]
    fn trailing_root_dot_is_ignored() {
        assert_eq!(domain_label("https://www.example.com./"), "example");
    }

    #[test]
    fn ip_hosts_become_path_safe() {
        assert_eq!(domain_label("http://127.0.0.1:3000/"), "127_0_0_1");
        assert_eq!(domain_label("http://[::1]/"), "__1");
    }
}
