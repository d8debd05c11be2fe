//! HTTPS transport backed by ureq.

use std::fs;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ureq::tls::{Certificate, PemItem, RootCerts, TlsConfig};

use crate::backend::Transport;
use crate::error::{Error, Result};
use crate::types::{Method, Request, TransportConfig, YANG_JSON};

/// Transport that issues RESTCONF requests to `https://<host>/restconf<path>`.
///
/// # Example
///
/// ```no_run
/// use restconf::backend::http::HttpTransport;
/// use restconf::backend::Transport;
/// use restconf::{Request, TransportConfig};
///
/// let transport = HttpTransport::new(&TransportConfig::new("admin", "secret")).unwrap();
/// let body = transport
///     .send("10.0.0.1", &Request::fetch("/data/Cisco-IOS-XE-native:native/vlan"))
///     .unwrap();
/// println!("{}", body.unwrap_or_default());
/// ```
pub struct HttpTransport {
    agent: ureq::Agent,
    authorization: String,
}

impl HttpTransport {
    /// Build a transport from credentials and client settings.
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut tls = TlsConfig::builder().disable_verification(config.insecure);
        if let Some(ca_file) = &config.ca_file {
            let pem = fs::read(ca_file).map_err(|e| Error::io(ca_file, e))?;
            tls = tls.root_certs(RootCerts::new_with_certs(&parse_certificates(&pem)?));
        }

        let mut builder = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .tls_config(tls.build());

        if let Some(url) = &config.proxy_url {
            let url = proxy_url_with_credentials(url, config.proxy_credentials.as_deref());
            let proxy = ureq::Proxy::new(&url).map_err(|e| Error::Client(e.to_string()))?;
            builder = builder.proxy(Some(proxy));
        }

        Ok(Self {
            agent: ureq::Agent::new_with_config(builder.build()),
            authorization: basic_auth(&config.username, &config.password),
        })
    }

    /// Full URL for `path` on `host`.
    #[must_use]
    pub fn url(host: &str, path: &str) -> String {
        format!("https://{host}/restconf{path}")
    }
}

impl Transport for HttpTransport {
    fn send(&self, host: &str, request: &Request) -> Result<Option<String>> {
        let url = Self::url(host, &request.path);
        let fail = |e: ureq::Error| Error::from_ureq(host, request.method, &request.path, e);
        let payload = request.payload.as_deref().unwrap_or_default().as_bytes();
        let auth = self.authorization.as_str();

        match request.method {
            Method::Fetch => {
                let mut response = self
                    .agent
                    .get(&url)
                    .header("Authorization", auth)
                    .header("Accept", YANG_JSON)
                    .call()
                    .map_err(fail)?;
                let body = response.body_mut().read_to_string().map_err(fail)?;
                Ok(Some(body))
            }
            Method::Patch => {
                self.agent
                    .patch(&url)
                    .header("Authorization", auth)
                    .header("Accept", YANG_JSON)
                    .header("Content-Type", YANG_JSON)
                    .send(payload)
                    .map_err(fail)?;
                Ok(None)
            }
            Method::Replace => {
                self.agent
                    .put(&url)
                    .header("Authorization", auth)
                    .header("Accept", YANG_JSON)
                    .header("Content-Type", YANG_JSON)
                    .send(payload)
                    .map_err(fail)?;
                Ok(None)
            }
            Method::Delete => {
                self.agent
                    .delete(&url)
                    .header("Authorization", auth)
                    .header("Accept", YANG_JSON)
                    .call()
                    .map_err(fail)?;
                Ok(None)
            }
        }
    }
}

/// `Authorization` header value for HTTP basic auth.
fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Splice `user:pass` into a proxy URL after its scheme.
fn proxy_url_with_credentials(url: &str, credentials: Option<&str>) -> String {
    match credentials.filter(|c| !c.is_empty()) {
        Some(creds) => match url.split_once("://") {
            Some((scheme, rest)) => format!("{scheme}://{creds}@{rest}"),
            None => format!("{creds}@{url}"),
        },
        None => url.to_string(),
    }
}

fn parse_certificates(pem: &[u8]) -> Result<Vec<Certificate<'static>>> {
    let mut certs = Vec::new();
    for item in ureq::tls::parse_pem(pem) {
        let item = item.map_err(|e| Error::Client(format!("invalid CA bundle: {e}")))?;
        if let PemItem::Certificate(cert) = item {
            certs.push(cert.to_owned());
        }
    }
    if certs.is_empty() {
        return Err(Error::Client("CA bundle contains no certificates".to_string()));
    }
    Ok(certs)
}
