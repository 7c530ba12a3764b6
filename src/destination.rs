//! Destination resolution
//!
//! Turns what the user typed into a validated [`EndpointDescriptor`]:
//! 1. Default the scheme to `ssh://` when none is given
//! 2. Parse as a URI
//! 3. Apply an explicit `--socket-path` override to the URI path
//! 4. Run the structural checks for the scheme (ssh, unix, tcp)
//!
//! Unknown schemes are accepted with a warning and no validation.

use std::borrow::Cow;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::warn;
use url::Url;

use crate::error::ConnectionError;
use crate::probe::{PathKind, PathProbe};
use crate::registry::Destination;

/// Default SSH port when neither the destination nor `--port` give one
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Bytes escaped when a filesystem path is written into a URI path.
/// `%` is included so a literal percent survives the decode in [`decoded_path`].
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Transport discriminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheme {
    Ssh,
    Unix,
    Tcp,
    /// Passed through without validation
    Other(String),
}

impl Scheme {
    pub fn parse(scheme: &str) -> Self {
        match scheme {
            "ssh" => Scheme::Ssh,
            "unix" => Scheme::Unix,
            "tcp" => Scheme::Tcp,
            other => Scheme::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Scheme::Ssh => "ssh",
            Scheme::Unix => "unix",
            Scheme::Tcp => "tcp",
            Scheme::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options that accompany a destination.
///
/// `Some` means the user supplied the flag explicitly; several checks
/// depend on that rather than on the value.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// `--port`
    pub port: Option<u16>,
    /// `--identity`
    pub identity: Option<String>,
    /// `--socket-path`
    pub socket_path: Option<String>,
    /// `--default`
    pub make_default: bool,
}

/// A validated, scheme-typed remote target
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    scheme: Scheme,
    uri: Url,
    identity: Option<String>,
    make_default: bool,
}

impl EndpointDescriptor {
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn user(&self) -> Option<&str> {
        Some(self.uri.username()).filter(|u| !u.is_empty())
    }

    pub fn host(&self) -> Option<&str> {
        self.uri.host_str().filter(|h| !h.is_empty())
    }

    pub fn port(&self) -> Option<u16> {
        self.uri.port()
    }

    /// Filesystem path (percent-decoded)
    pub fn path(&self) -> Cow<'_, str> {
        decoded_path(&self.uri)
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn make_default(&self) -> bool {
        self.make_default
    }

    /// Registry record for this endpoint
    pub fn to_destination(&self) -> Destination {
        Destination {
            uri: self.uri.to_string(),
            identity: self.identity.clone(),
        }
    }
}

fn scheme_prefix() -> &'static regex::Regex {
    static SCHEME_PREFIX: OnceLock<regex::Regex> = OnceLock::new();
    SCHEME_PREFIX.get_or_init(|| {
        regex::Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("scheme pattern is valid")
    })
}

/// URI path as the filesystem sees it
fn decoded_path(uri: &Url) -> Cow<'_, str> {
    percent_decode_str(uri.path()).decode_utf8_lossy()
}

/// Prefix `ssh://` unless the destination already names a scheme.
pub fn with_default_scheme(raw: &str) -> String {
    if scheme_prefix().is_match(raw) {
        raw.to_string()
    } else {
        format!("ssh://{}", raw)
    }
}

/// Default the scheme and parse the result as a URI.
pub fn parse_destination(raw: &str) -> Result<Url, ConnectionError> {
    let dest = with_default_scheme(raw);
    Url::parse(&dest)
        .map_err(|e| ConnectionError::InvalidDestination(format!("{:?}: {}", dest, e)))
}

/// Resolve a destination string into a validated endpoint.
pub fn resolve(
    raw: &str,
    options: &ResolveOptions,
    probe: &dyn PathProbe,
) -> Result<EndpointDescriptor, ConnectionError> {
    let mut uri = parse_destination(raw)?;

    if let Some(socket_path) = &options.socket_path {
        let encoded = utf8_percent_encode(socket_path, PATH_ESCAPE).to_string();
        uri.set_path(&encoded);
    }

    let scheme = Scheme::parse(uri.scheme());
    match &scheme {
        Scheme::Ssh => {}
        Scheme::Unix => validate_unix(&uri, options, probe)?,
        Scheme::Tcp => validate_tcp(&mut uri, options)?,
        Scheme::Other(name) => {
            warn!(scheme = %name, "Unknown scheme, no validation provided");
        }
    }

    Ok(EndpointDescriptor {
        scheme,
        uri,
        identity: options.identity.clone(),
        make_default: options.make_default,
    })
}

fn validate_unix(
    uri: &Url,
    options: &ResolveOptions,
    probe: &dyn PathProbe,
) -> Result<(), ConnectionError> {
    if options.identity.is_some() {
        return Err(ConnectionError::UnsupportedOption(
            "--identity not supported for unix scheme".to_string(),
        ));
    }

    let path = decoded_path(uri);
    let path = path.as_ref();
    match probe.stat(Path::new(path)) {
        Ok(PathKind::Socket) => Ok(()),
        Ok(PathKind::Other) => Err(ConnectionError::InvalidDestination(format!(
            "{:?} exists and is not a unix domain socket",
            path
        ))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path, "{:?} does not exist", path);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!(path = %path, "You do not have permission to read {:?}", path);
            Ok(())
        }
        Err(e) => Err(ConnectionError::filesystem(path, e)),
    }
}

fn validate_tcp(uri: &mut Url, options: &ResolveOptions) -> Result<(), ConnectionError> {
    if options.socket_path.is_some() {
        return Err(ConnectionError::UnsupportedOption(
            "--socket-path not supported for tcp scheme".to_string(),
        ));
    }
    if options.identity.is_some() {
        return Err(ConnectionError::UnsupportedOption(
            "--identity not supported for tcp scheme".to_string(),
        ));
    }

    if uri.port().is_none() {
        if let Some(port) = options.port {
            uri.set_port(Some(port)).map_err(|_| {
                ConnectionError::InvalidDestination(format!("cannot set port on {:?}", uri.as_str()))
            })?;
        }
    }
    if uri.port().is_none() {
        return Err(ConnectionError::InvalidDestination(
            "tcp scheme requires a port either via --port or in destination URL".to_string(),
        ));
    }
    Ok(())
}
