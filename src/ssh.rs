//! SSH connection setup
//!
//! Fills in what an `ssh://` destination leaves out (user, port and remote
//! socket path) and records the connection. No connection to the remote host
//! is made; the remote socket path is derived from the user instead of being
//! queried.

use tracing::{info, warn};

use crate::destination::{EndpointDescriptor, DEFAULT_SSH_PORT};
use crate::error::ConnectionError;
use crate::registry::{Destination, Registry};

/// Rootful service socket on the remote host
pub const ROOT_SOCKET_PATH: &str = "/run/podman/podman.sock";

/// Everything needed to record one ssh connection
#[derive(Debug, Clone, Copy)]
pub struct SshCreateOptions<'a> {
    pub name: &'a str,
    pub endpoint: &'a EndpointDescriptor,
    /// `--port`, used when the destination has no port of its own
    pub port: Option<u16>,
}

/// Completes and records `ssh` destinations
pub trait ConnectionSetup {
    fn create(
        &self,
        options: &SshCreateOptions<'_>,
        registry: &mut Registry,
    ) -> Result<(), ConnectionError>;
}

/// Setup that works from local knowledge only
#[derive(Debug, Clone, Default)]
pub struct OfflineSshSetup {
    local_user: Option<String>,
    local_uid: Option<u32>,
}

impl OfflineSshSetup {
    pub fn new(local_user: Option<String>, local_uid: Option<u32>) -> Self {
        Self {
            local_user,
            local_uid,
        }
    }

    /// Take the local user and uid from the running process
    pub fn from_env() -> Self {
        let local_user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok()
            .filter(|u| !u.is_empty());
        Self::new(local_user, current_uid())
    }

    fn default_socket_path(&self, user: &str) -> Option<String> {
        if user == "root" {
            return Some(ROOT_SOCKET_PATH.to_string());
        }
        if self.local_user.as_deref() == Some(user) {
            if let Some(uid) = self.local_uid {
                return Some(format!("/run/user/{}/podman/podman.sock", uid));
            }
        }
        None
    }
}

impl ConnectionSetup for OfflineSshSetup {
    fn create(
        &self,
        options: &SshCreateOptions<'_>,
        registry: &mut Registry,
    ) -> Result<(), ConnectionError> {
        let endpoint = options.endpoint;
        let invalid = |msg: &str| ConnectionError::InvalidDestination(msg.to_string());

        if endpoint.host().is_none() {
            return Err(invalid("ssh destination requires a host"));
        }

        let user = match endpoint.user() {
            Some(user) => user.to_string(),
            None => self
                .local_user
                .clone()
                .ok_or_else(|| invalid("no user in destination and local user is unknown"))?,
        };
        let port = endpoint
            .port()
            .or(options.port)
            .unwrap_or(DEFAULT_SSH_PORT);

        let mut uri = endpoint.uri().clone();
        uri.set_username(&user)
            .map_err(|_| invalid("cannot set user on ssh destination"))?;
        uri.set_port(Some(port))
            .map_err(|_| invalid("cannot set port on ssh destination"))?;

        if matches!(&*endpoint.path(), "" | "/") {
            match self.default_socket_path(&user) {
                Some(path) => uri.set_path(&path),
                None => {
                    warn!(
                        connection = %options.name,
                        user = %user,
                        "Remote socket path unknown for this user, set it with --socket-path"
                    );
                }
            }
        }

        info!(connection = %options.name, uri = %uri, "Recording ssh connection");

        let destination = Destination {
            uri: uri.to_string(),
            identity: endpoint.identity().map(str::to_string),
        };
        registry.upsert(options.name, destination, endpoint.make_default());
        Ok(())
    }
}

#[cfg(unix)]
fn current_uid() -> Option<u32> {
    // SAFETY: getuid has no preconditions and cannot fail
    Some(unsafe { libc::getuid() })
}

#[cfg(not(unix))]
fn current_uid() -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::{resolve, ResolveOptions};
    use crate::probe::OsProbe;

    fn setup() -> OfflineSshSetup {
        OfflineSshSetup::new(Some("me".to_string()), Some(1000))
    }

    fn record(
        dest: &str,
        resolve_options: ResolveOptions,
        registry: &mut Registry,
    ) -> Result<(), ConnectionError> {
        let endpoint = resolve(dest, &resolve_options, &OsProbe).unwrap();
        let options = SshCreateOptions {
            name: "conn",
            endpoint: &endpoint,
            port: resolve_options.port,
        };
        setup().create(&options, registry)
    }

    #[test]
    fn test_root_gets_rootful_socket() {
        let mut registry = Registry::new();
        record("root@server.fubar.com", ResolveOptions::default(), &mut registry).unwrap();

        assert_eq!(
            registry.get("conn").unwrap().uri,
            "ssh://root@server.fubar.com:22/run/podman/podman.sock"
        );
        assert_eq!(registry.active_service, "conn");
    }

    #[test]
    fn test_local_user_defaults() {
        let mut registry = Registry::new();
        record("laptop", ResolveOptions::default(), &mut registry).unwrap();

        assert_eq!(
            registry.get("conn").unwrap().uri,
            "ssh://me@laptop:22/run/user/1000/podman/podman.sock"
        );
    }

    #[test]
    fn test_port_override_used_only_without_uri_port() {
        let options = ResolveOptions {
            port: Some(2222),
            ..Default::default()
        };
        let mut registry = Registry::new();
        record("root@h", options.clone(), &mut registry).unwrap();
        assert_eq!(
            registry.get("conn").unwrap().uri,
            "ssh://root@h:2222/run/podman/podman.sock"
        );

        record("ssh://root@h:2200", options, &mut registry).unwrap();
        assert_eq!(
            registry.get("conn").unwrap().uri,
            "ssh://root@h:2200/run/podman/podman.sock"
        );
    }

    #[test]
    fn test_explicit_path_and_identity_kept() {
        let options = ResolveOptions {
            identity: Some("/home/me/.ssh/dev_rsa".to_string()),
            socket_path: Some("/tmp/engine.sock".to_string()),
            ..Default::default()
        };
        let mut registry = Registry::new();
        record("other@h", options, &mut registry).unwrap();

        let dest = registry.get("conn").unwrap();
        assert_eq!(dest.uri, "ssh://other@h:22/tmp/engine.sock");
        assert_eq!(dest.identity.as_deref(), Some("/home/me/.ssh/dev_rsa"));
    }

    #[test]
    fn test_unknown_remote_user_leaves_path_empty() {
        let mut registry = Registry::new();
        record("other@h", ResolveOptions::default(), &mut registry).unwrap();
        assert_eq!(registry.get("conn").unwrap().uri, "ssh://other@h:22");
    }

    #[test]
    fn test_missing_host_rejected() {
        let mut registry = Registry::new();
        let err = record("ssh:///run/engine.sock", ResolveOptions::default(), &mut registry)
            .unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidDestination(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_local_user() {
        let endpoint = resolve("h", &ResolveOptions::default(), &OsProbe).unwrap();
        let options = SshCreateOptions {
            name: "conn",
            endpoint: &endpoint,
            port: None,
        };
        let err = OfflineSshSetup::default()
            .create(&options, &mut Registry::new())
            .unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidDestination(_)));
    }

    #[test]
    fn test_default_flag_moves_active() {
        let mut registry = Registry::new();
        registry.upsert("first", Destination::new("tcp://a:1"), false);

        let options = ResolveOptions {
            make_default: true,
            ..Default::default()
        };
        record("root@h", options, &mut registry).unwrap();
        assert_eq!(registry.active_service, "conn");
    }
}
