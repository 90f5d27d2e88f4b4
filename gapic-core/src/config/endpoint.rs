const GOOGLE_DOMAIN: &str = ".googleapis.com";
const DEFAULT_PORT: u16 = 443;

/// Derives the mutual TLS variant of a Google API endpoint.
///
/// * `x.googleapis.com` becomes `x.mtls.googleapis.com`
/// * `x.sandbox.googleapis.com` becomes `x.mtls.sandbox.googleapis.com`
///
/// Endpoints that are already mTLS endpoints, or that are not under `googleapis.com`, are
/// returned unchanged.
pub fn default_mtls_endpoint(endpoint: &str) -> String {
    let Some(dot) = endpoint.find('.').filter(|&i| i > 0) else {
        return endpoint.to_string();
    };

    let rest = &endpoint[dot..];
    let (is_mtls, rest) = match rest.strip_prefix(".mtls") {
        Some(rest) => (true, rest),
        None => (false, rest),
    };
    let (is_sandbox, rest) = match rest.strip_prefix(".sandbox") {
        Some(rest) => (true, rest),
        None => (false, rest),
    };

    if is_mtls || !rest.starts_with(GOOGLE_DOMAIN) {
        return endpoint.to_string();
    }

    if is_sandbox {
        endpoint.replace("sandbox.googleapis.com", "mtls.sandbox.googleapis.com")
    } else {
        endpoint.replace(GOOGLE_DOMAIN, ".mtls.googleapis.com")
    }
}

/// Turns an endpoint host into the URI a channel connects to.
///
/// Hosts without a scheme are reached over TLS and default to port 443. Hosts carrying a
/// scheme are used verbatim, which is how plain-text local emulators are addressed.
pub fn endpoint_uri(host: &str) -> String {
    if host.contains("://") {
        return host.to_string();
    }

    if has_port(host) {
        format!("https://{host}")
    } else {
        format!("https://{host}:{DEFAULT_PORT}")
    }
}

fn has_port(host: &str) -> bool {
    host.rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}
