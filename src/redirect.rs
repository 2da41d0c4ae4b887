use std::net::IpAddr;

pub const CALLBACK_PATH: &str = "/callback";

/// Derives the OAuth redirect URI from the inbound request's Host header.
///
/// Called fresh on every request in both the index and callback handlers so
/// multi-host deployments get a URI matching whatever name the browser used;
/// the two legs of one flow then agree byte for byte as long as the browser
/// keeps talking to the same host. Loopback hosts get `http`, everything
/// else `https`.
pub fn derive_redirect_uri(host: &str) -> String {
    let scheme = if is_loopback(host) { "http" } else { "https" };
    format!("{scheme}://{host}{CALLBACK_PATH}")
}

fn is_loopback(host: &str) -> bool {
    let name = strip_port(host);
    if name.eq_ignore_ascii_case("localhost") {
        return true;
    }
    name.trim_matches(['[', ']'])
        .parse::<IpAddr>()
        .map(|addr| addr.is_loopback())
        .unwrap_or(false)
}

/// Splits off a trailing `:port`, leaving bracketed IPv6 literals intact.
fn strip_port(host: &str) -> &str {
    if let Some(end) = host.rfind(']') {
        return &host[..=end];
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::derive_redirect_uri;

    #[test]
    fn loopback_hosts_use_http() {
        assert_eq!(
            derive_redirect_uri("127.0.0.1:5555"),
            "http://127.0.0.1:5555/callback"
        );
        assert_eq!(
            derive_redirect_uri("localhost:5555"),
            "http://localhost:5555/callback"
        );
        assert_eq!(derive_redirect_uri("[::1]:5555"), "http://[::1]:5555/callback");
        assert_eq!(derive_redirect_uri("127.0.0.1"), "http://127.0.0.1/callback");
    }

    #[test]
    fn public_hosts_use_https() {
        assert_eq!(
            derive_redirect_uri("connect.example.com"),
            "https://connect.example.com/callback"
        );
        assert_eq!(
            derive_redirect_uri("connect.example.com:8443"),
            "https://connect.example.com:8443/callback"
        );
        assert_eq!(derive_redirect_uri("10.0.0.7"), "https://10.0.0.7/callback");
    }

    #[test]
    fn host_changes_propagate_to_the_uri() {
        assert_ne!(
            derive_redirect_uri("a.example.com"),
            derive_redirect_uri("b.example.com")
        );
    }
}
