/// Prefix `https://` when the URL carries no http(s) scheme
pub fn ensure_scheme(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Host portion of a URL: everything after `//` up to the first `/`.
///
/// This is also the default company name, so it must stay deterministic.
pub fn host_component(url: &str) -> String {
    let after_scheme = url.split_once("//").map(|(_, rest)| rest).unwrap_or(url);
    after_scheme
        .split('/')
        .next()
        .unwrap_or(after_scheme)
        .to_string()
}

/// Host suitable for DNS resolution (no userinfo, port, query or fragment)
pub fn resolvable_host(url: &str) -> String {
    let authority = host_component(url);
    let authority = authority
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or(authority);

    // Bracketed IPv6 literal, optionally with a port
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest).to_string();
    }

    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
            name.to_string()
        }
        _ => host.to_string(),
    }
}

/// Knowledge-base page key for a company name
pub fn canonical_key(company: &str, separator: &str) -> String {
    company.replace(' ', separator)
}
