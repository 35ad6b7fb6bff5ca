use axum::http::HeaderMap;

pub const REAL_IP_HEADER: &str = "x-real-ip";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Originating client address. Proxy headers win over the socket address
/// because the service usually sits behind a reverse proxy.
pub fn resolve_client_ip(headers: &HeaderMap, remote_addr: Option<&str>) -> Option<String> {
    header(headers, REAL_IP_HEADER)
        .or_else(|| header(headers, FORWARDED_FOR_HEADER))
        .or(remote_addr.filter(|a| !a.is_empty()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use {super::*, axum::http::HeaderValue};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn real_ip_header_wins() {
        let h = headers(&[("x-real-ip", "1.1.1.1"), ("x-forwarded-for", "3.3.3.3")]);
        assert_eq!(
            resolve_client_ip(&h, Some("2.2.2.2")).as_deref(),
            Some("1.1.1.1")
        );
    }

    #[test]
    fn forwarded_for_before_remote_address() {
        let h = headers(&[("x-forwarded-for", "3.3.3.3, 10.0.0.1")]);
        assert_eq!(
            resolve_client_ip(&h, Some("2.2.2.2")).as_deref(),
            Some("3.3.3.3, 10.0.0.1")
        );
    }

    #[test]
    fn falls_back_to_remote_address() {
        assert_eq!(
            resolve_client_ip(&HeaderMap::new(), Some("2.2.2.2")).as_deref(),
            Some("2.2.2.2")
        );
    }

    #[test]
    fn nothing_resolvable() {
        assert_eq!(resolve_client_ip(&HeaderMap::new(), None), None);
        let h = headers(&[("x-real-ip", "")]);
        assert_eq!(resolve_client_ip(&h, None), None);
    }
}
