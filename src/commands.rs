//! Connection commands
//!
//! `connection add` validates a destination and records it; `context create`
//! accepts the Docker-compatible `--docker host=...` form and records it
//! without scheme validation. Both load the registry, update it in memory and
//! write it back once.

use tracing::info;

use crate::destination::{parse_destination, resolve, ResolveOptions, Scheme};
use crate::error::ConnectionError;
use crate::probe::PathProbe;
use crate::registry::Destination;
use crate::ssh::{ConnectionSetup, SshCreateOptions};
use crate::store::RegistryStore;
use crate::translate::translate;

/// Collaborators used by [`add_connection`]
pub struct AddContext<'a> {
    pub probe: &'a dyn PathProbe,
    pub ssh: &'a dyn ConnectionSetup,
    pub store: &'a dyn RegistryStore,
}

/// Validate `destination` and record it as `name`.
pub fn add_connection(
    name: &str,
    destination: &str,
    options: &ResolveOptions,
    ctx: &AddContext<'_>,
) -> Result<(), ConnectionError> {
    let endpoint = resolve(destination, options, ctx.probe)?;
    let mut registry = ctx.store.load()?;

    match endpoint.scheme() {
        Scheme::Ssh => {
            let ssh_options = SshCreateOptions {
                name,
                endpoint: &endpoint,
                port: options.port,
            };
            ctx.ssh.create(&ssh_options, &mut registry)?;
        }
        scheme => {
            info!(connection = %name, scheme = %scheme, uri = %endpoint.uri(), "Recording connection");
            registry.upsert(name, endpoint.to_destination(), endpoint.make_default());
        }
    }

    ctx.store.write(&registry)?;
    Ok(())
}

/// Record a Docker-style context as connection `name`.
pub fn create_context(
    name: &str,
    docker: &str,
    store: &dyn RegistryStore,
) -> Result<(), ConnectionError> {
    let destination = translate(docker)?;
    let uri = parse_destination(&destination)?;

    let mut registry = store.load()?;
    info!(connection = %name, uri = %uri, "Recording context");
    registry.upsert(name, Destination::new(uri.to_string()), false);
    store.write(&registry)?;
    Ok(())
}
