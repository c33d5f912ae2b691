use std::net::{IpAddr, SocketAddr};

use actix_web::{http::header::HOST, web, HttpRequest};

use crate::configuration::SecuritySettings;

const SUSPICIOUS_AGENT_PATTERNS: [&str; 8] = [
    "bot", "crawler", "spider", "scraper", "curl", "wget", "python-requests", "postman"
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenial{
    UnauthorizedIp,
    UnauthorizedDomain,
    MissingSecret
}

impl AccessDenial {
    pub fn event_type(&self) -> &'static str{
        match self {
            AccessDenial::UnauthorizedIp => "unauthorized_ip_access",
            AccessDenial::UnauthorizedDomain => "unauthorized_domain_access",
            AccessDenial::MissingSecret => "missing_secret_config"
        }
    }

    pub fn reason(&self) -> &'static str{
        match self {
            AccessDenial::UnauthorizedIp => "Unauthorized IP address",
            AccessDenial::UnauthorizedDomain => "Unauthorized domain",
            AccessDenial::MissingSecret => "Admin portal not properly configured"
        }
    }
}

/// Network level rules for the admin surface. An empty allowlist admits
/// everyone outside production and no one inside it.
#[derive(Debug, Clone)]
pub struct AccessPolicy{
    allowed_ips: Vec<String>,
    allowed_domains: Vec<String>,
    secret_configured: bool,
    production: bool,
    trusted_proxies: Vec<IpAddr>
}

impl AccessPolicy {
    pub fn new(allowed_ips: Vec<String>, allowed_domains: Vec<String>, secret_configured: bool, production: bool) -> Self{
        AccessPolicy{
            allowed_ips: normalize(allowed_ips),
            allowed_domains: normalize(allowed_domains),
            secret_configured,
            production,
            trusted_proxies: Vec::new()
        }
    }

    /// Peers whose `X-Forwarded-For` header is believed. Entries that are not
    /// IP addresses are ignored with a warning.
    pub fn with_trusted_proxies(mut self, proxies: &[String]) -> Self{
        self.trusted_proxies = proxies.iter()
            .filter_map(|proxy| match proxy.trim().parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    tracing::warn!(proxy = %proxy, "Ignoring trusted proxy that is not an IP address");
                    None
                }
            })
            .collect();
        self
    }

    pub fn from_settings(settings: &SecuritySettings) -> Self{
        Self::new(
            settings.allowed_ips.clone(),
            settings.allowed_domains.clone(),
            settings.portal_secret.is_some(),
            settings.production
        )
        .with_trusted_proxies(&settings.trusted_proxies)
    }

    /// Address of the client behind the connection. The socket peer is the
    /// answer unless it is a trusted proxy, in which case the right-most
    /// `X-Forwarded-For` hop that is not itself a trusted proxy is used.
    pub fn client_ip(&self, peer: Option<SocketAddr>, forwarded_for: Option<&str>) -> Option<IpAddr>{
        let peer = peer?.ip();
        if !self.trusted_proxies.contains(&peer) {
            return Some(peer);
        }

        let Some(forwarded_for) = forwarded_for else {
            return Some(peer);
        };
        let mut hops = Vec::new();
        for hop in forwarded_for.split(',') {
            match parse_ip(hop) {
                Some(ip) => hops.push(ip),
                None => {
                    tracing::warn!(forwarded_for, "Malformed X-Forwarded-For from trusted proxy");
                    return Some(peer);
                }
            }
        }

        Some(
            hops.into_iter()
                .rev()
                .find(|hop| !self.trusted_proxies.contains(hop))
                .unwrap_or(peer)
        )
    }

    pub fn is_ip_allowed(&self, ip: Option<&str>) -> bool{
        if self.allowed_ips.is_empty() {
            if self.production {
                tracing::warn!("No IP allowlist configured in production");
            }
            return !self.production;
        }

        let Some(ip) = ip.map(client_ip) else {
            return self.allowed_ips.iter().any(|allowed| allowed == "*");
        };
        self.allowed_ips.iter().any(|allowed| allowed == "*" || *allowed == ip)
    }

    pub fn is_domain_allowed(&self, host: &str) -> bool{
        if self.allowed_domains.is_empty() {
            if self.production {
                tracing::warn!("No domain allowlist configured in production");
            }
            return !self.production;
        }

        let hostname = hostname(host).to_ascii_lowercase();
        self.allowed_domains.iter().any(|domain| {
            domain == "*"
                || hostname == *domain
                || hostname.strip_suffix(domain.as_str()).is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    pub fn check(&self, ip: Option<&str>, host: &str) -> Result<(), AccessDenial>{
        if !self.is_ip_allowed(ip) {
            return Err(AccessDenial::UnauthorizedIp);
        }
        if !self.is_domain_allowed(host) {
            return Err(AccessDenial::UnauthorizedDomain);
        }
        if self.production && !self.secret_configured {
            return Err(AccessDenial::MissingSecret);
        }
        Ok(())
    }
}

/// Client address of a request, resolved through the [`AccessPolicy`] in app
/// data. Without a policy only the socket peer is used.
pub fn request_client_ip(req: &HttpRequest) -> Option<String>{
    let forwarded_for = req.headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok());

    let ip = match req.app_data::<web::Data<AccessPolicy>>() {
        Some(policy) => policy.client_ip(req.peer_addr(), forwarded_for),
        None => req.peer_addr().map(|addr| addr.ip())
    };
    ip.map(|ip| ip.to_string())
}

/// Host the request was addressed to, from the `Host` header only
pub fn request_host(req: &HttpRequest) -> String{
    req.headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| req.app_config().host().to_owned())
}

pub fn is_suspicious_user_agent(user_agent: &str) -> bool{
    let user_agent = user_agent.to_ascii_lowercase();
    SUSPICIOUS_AGENT_PATTERNS.iter().any(|pattern| user_agent.contains(pattern))
}

fn normalize(entries: Vec<String>) -> Vec<String>{
    entries.into_iter()
        .map(|entry| entry.trim().to_ascii_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

// Accepts "1.2.3.4", "1.2.3.4:5678" and "[::1]:5678"
fn client_ip(addr: &str) -> String{
    if let Ok(socket) = addr.parse::<SocketAddr>() {
        return socket.ip().to_string();
    }
    match addr.parse::<IpAddr>() {
        Ok(ip) => ip.to_string(),
        Err(_) => addr.trim().to_string()
    }
}

fn parse_ip(hop: &str) -> Option<IpAddr>{
    let hop = hop.trim();
    hop.parse::<IpAddr>()
        .ok()
        .or_else(|| hop.parse::<SocketAddr>().ok().map(|socket| socket.ip()))
}

fn hostname(host: &str) -> &str{
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    host.split(':').next().unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(ips: &[&str], domains: &[&str], production: bool) -> AccessPolicy{
        AccessPolicy::new(
            ips.iter().map(|s| s.to_string()).collect(),
            domains.iter().map(|s| s.to_string()).collect(),
            true,
            production
        )
    }

    #[test]
    fn empty_allowlists_allow_in_development_and_deny_in_production(){
        assert!(policy(&[], &[], false).check(Some("1.2.3.4"), "admin.local").is_ok());
        assert_eq!(policy(&[], &[], true).check(Some("1.2.3.4"), "admin.local"), Err(AccessDenial::UnauthorizedIp));
    }

    #[test]
    fn ip_allowlist_matches_exact_addresses_and_wildcard(){
        let single = policy(&["10.0.0.1"], &[], false);
        assert!(single.is_ip_allowed(Some("10.0.0.1")));
        assert!(single.is_ip_allowed(Some("10.0.0.1:40000")));
        assert!(!single.is_ip_allowed(Some("10.0.0.2")));
        assert!(!single.is_ip_allowed(None));

        assert!(policy(&["*"], &[], true).is_ip_allowed(Some("8.8.8.8")));
    }

    #[test]
    fn domain_allowlist_accepts_subdomains_but_not_lookalikes(){
        let policy = policy(&[], &["bazaar.co.ke"], false);
        assert!(policy.is_domain_allowed("bazaar.co.ke"));
        assert!(policy.is_domain_allowed("admin.bazaar.co.ke:8443"));
        assert!(!policy.is_domain_allowed("evilbazaar.co.ke"));
        assert!(!policy.is_domain_allowed("bazaar.co.ke.evil.com"));
    }

    #[test]
    fn production_without_portal_secret_is_denied(){
        let policy = AccessPolicy::new(vec!["*".into()], vec!["*".into()], false, true);
        assert_eq!(policy.check(Some("1.1.1.1"), "anything"), Err(AccessDenial::MissingSecret));
    }

    fn peer(addr: &str) -> Option<SocketAddr>{
        Some(SocketAddr::new(addr.parse().unwrap(), 45000))
    }

    #[test]
    fn forwarded_header_from_an_untrusted_peer_is_ignored(){
        let policy = policy(&["10.0.0.1"], &[], false);
        let ip = policy.client_ip(peer("127.0.0.1"), Some("10.0.0.1"));

        assert_eq!(ip, Some("127.0.0.1".parse().unwrap()));
        assert!(!policy.is_ip_allowed(ip.map(|ip| ip.to_string()).as_deref()));
    }

    #[test]
    fn trusted_proxy_hands_over_the_nearest_untrusted_hop(){
        let policy = policy(&[], &[], false)
            .with_trusted_proxies(&["10.0.0.5".into(), "10.0.0.6".into(), "not-an-ip".into()]);

        assert_eq!(
            policy.client_ip(peer("10.0.0.5"), Some("6.6.6.6, 203.0.113.7, 10.0.0.6")),
            Some("203.0.113.7".parse().unwrap())
        );
        assert_eq!(policy.client_ip(peer("10.0.0.5"), None), Some("10.0.0.5".parse().unwrap()));
        assert_eq!(policy.client_ip(peer("10.0.0.5"), Some("garbage")), Some("10.0.0.5".parse().unwrap()));
        assert_eq!(policy.client_ip(None, Some("203.0.113.7")), None);
    }

    #[test]
    fn tooling_user_agents_are_flagged(){
        assert!(is_suspicious_user_agent("curl/8.4.0"));
        assert!(is_suspicious_user_agent("Mozilla/5.0 (compatible; Googlebot/2.1)"));
        assert!(!is_suspicious_user_agent("Mozilla/5.0 (X11; Linux x86_64) Firefox/130.0"));
    }
}
