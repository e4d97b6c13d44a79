//! Outbound-request engine: performs an HTTP request described in text
//!
//! The input file uses a small line-oriented format:
//!
//! ```text
//! POST https://example.org/users
//! ?page=1
//! &size=10
//! content-type: application/json
//!
//! {"name": "alice"}
//! ```
//!
//! The first line is `METHOD URL` or a bare URL (GET). Lines starting with
//! `?` or `&` continue the query string. Header lines follow until the
//! first blank line, and everything after it is the body.

use log::info;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HOST};
use reqwest::{Method, Url};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use super::{fail, Execution, Request};
use crate::config::Config;
use crate::errors::{self, Error, ExecError};
use crate::execution::LimitedWriter;

/// Deadline for the whole outbound request
const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Response body ceiling when the command declares none
const DEFAULT_MAX_BODY: usize = 1 << 20;

/// A parsed request description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSpec {
    pub method: Method,
    pub url: Url,
    /// Host as written, with the port when one was given explicitly
    pub host: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Sends HTTP requests to allowed hosts
pub struct Http {
    hosts: Arc<HashMap<String, String>>,
    max_body: usize,
}

impl Http {
    pub fn new(cfg: &Config, sandbox: &str, command: &str) -> errors::Result<Self> {
        if cfg.http.hosts.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "{} {}: http engine requires at least one allowed host",
                sandbox, command
            )));
        }
        let step_limit = cfg
            .command(sandbox, command)
            .and_then(|cmd| cmd.steps.first())
            .map(|step| step.max_output)
            .or_else(|| cfg.step_defaults.as_ref().map(|step| step.max_output))
            .unwrap_or(0);
        let max_body = if step_limit > 0 {
            step_limit
        } else {
            DEFAULT_MAX_BODY
        };
        Ok(Self {
            hosts: Arc::new(cfg.http.hosts.clone()),
            max_body,
        })
    }

    /// Send the request described by the first file and render the response
    pub fn exec(&self, req: &Request) -> Execution {
        let mut spec = match parse(req.files.first()) {
            Ok(spec) => spec,
            Err(err) => return fail(&req.id, err),
        };
        if let Err(err) = self.translate_host(&spec.host, &mut spec.url) {
            return fail(&req.id, err);
        }

        info!("{}: {} {}", req.id, spec.method, spec.url);
        match self.send(spec) {
            Ok(stdout) => Execution::success(&req.id, stdout, String::new()),
            Err(err) => fail(&req.id, err),
        }
    }

    /// Point `url` at the backend of an allowed `host`
    pub fn translate_host(&self, host: &str, url: &mut Url) -> Result<(), ExecError> {
        let target = self
            .hosts
            .get(host)
            .filter(|target| !target.is_empty())
            .ok_or_else(|| ExecError::HostNotAllowed(host.to_string()))?;
        set_host(url, target).map_err(|reason| {
            ExecError::execution("translate host", io::Error::new(io::ErrorKind::InvalidInput, reason))
        })
    }

    fn send(&self, spec: HttpSpec) -> Result<String, ExecError> {
        let mut builder = client()?.request(spec.method, spec.url);
        // the backend sees the requested host, not its own address
        if !spec.headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("host")) {
            builder = builder.header(HOST, spec.host);
        }
        for (name, value) in spec.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = spec.body {
            builder = builder.body(body);
        }
        let mut resp = builder
            .send()
            .map_err(|e| ExecError::Request(e.to_string()))?;

        let mut body = LimitedWriter::new(Vec::new(), self.max_body);
        io::copy(&mut resp, &mut body).map_err(|e| ExecError::execution("read response", e))?;
        Ok(render(&resp, &body.into_inner()))
    }
}

/// Shared client, created on first use outside of any async runtime
fn client() -> Result<&'static Client, ExecError> {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    if let Some(client) = CLIENT.get() {
        return Ok(client);
    }
    let client = Client::builder()
        .timeout(CLIENT_TIMEOUT)
        .build()
        .map_err(|e| ExecError::execution("create http client", e))?;
    Ok(CLIENT.get_or_init(|| client))
}

/// Parse a request description
pub fn parse(text: &str) -> Result<HttpSpec, ExecError> {
    let mut lines = text.split('\n').peekable();

    let first = lines.next().unwrap_or_default();
    let fields: Vec<&str> = first.split_whitespace().collect();
    let (method, url) = match fields.as_slice() {
        [] => return Err(ExecError::Spec("empty request".to_string())),
        [url] => ("GET", *url),
        [method, url, ..] => (*method, *url),
    };
    let method = Method::from_bytes(method.as_bytes())
        .map_err(|_| ExecError::Spec(format!("invalid method: {}", method)))?;

    let mut url = url.to_string();
    while let Some(&line) = lines.peek() {
        let line = line.trim();
        if !(line.starts_with('?') || line.starts_with('&')) {
            break;
        }
        url.push_str(line);
        lines.next();
    }
    let parsed = Url::parse(&url).map_err(|e| ExecError::Spec(format!("invalid url: {}", e)))?;
    let host = host_with_port(&url, &parsed);
    let url = parsed;

    let mut headers = Vec::new();
    for line in lines.by_ref() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let rest: Vec<&str> = lines.collect();
    let body = if rest.is_empty() {
        None
    } else {
        Some(rest.join("\n"))
    };

    Ok(HttpSpec {
        method,
        url,
        host,
        headers,
        body,
    })
}

/// Response as text: status line, headers, then the body after a blank line
fn render(resp: &Response, body: &[u8]) -> String {
    let status = resp.status();
    let mut text = format!(
        "{:?} {} {}\n",
        resp.version(),
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    );
    text.push_str(&render_headers(resp.headers()));
    if !body.is_empty() {
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(body));
    }
    text
}

fn render_headers(headers: &HeaderMap) -> String {
    let mut text = String::new();
    for name in headers.keys() {
        let value = headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default();
        text.push_str(&format!("{}: {}\n", title_case(name.as_str()), value));
    }
    text
}

/// `content-type` -> `Content-Type`
fn title_case(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(c) => c.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// `host[:port]` of a url. The port is kept whenever `raw` spells it out,
/// even when it is the scheme default that `Url` drops.
fn host_with_port(raw: &str, url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port().map(|p| p.to_string()).or_else(|| explicit_port(raw)) {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

fn explicit_port(raw: &str) -> Option<String> {
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let authority = authority.rsplit_once('@').map_or(authority, |(_, a)| a);
    let port = match authority.rsplit_once(']') {
        Some((_, tail)) => tail.strip_prefix(':')?,
        None => authority.rsplit_once(':')?.1,
    };
    if port.is_empty() {
        None
    } else {
        Some(port.to_string())
    }
}

/// Replace host and port with `target` (`host` or `host:port`)
fn set_host(url: &mut Url, target: &str) -> Result<(), String> {
    let (host, port) = match target.rsplit_once(':') {
        Some((host, port)) => {
            let port: u16 = port
                .parse()
                .map_err(|_| format!("invalid port in {}", target))?;
            (host, Some(port))
        }
        None => (target, None),
    };
    url.set_host(Some(host))
        .map_err(|e| format!("invalid host {}: {}", target, e))?;
    url.set_port(port)
        .map_err(|_| format!("cannot set port of {}", url))
}
