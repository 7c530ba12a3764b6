//! connection-registry - named remote service destinations for a container engine client
//!
//! ## Destinations
//!
//! ```text
//! [user@]hostname                        defaults to ssh
//! ssh://[user@]hostname[:port][/path]    socket path derived if not given
//! tcp://hostname:port                    not secured
//! unix:///absolute/path
//! host=tcp://hostname:port               Docker context form (--docker)
//! ```
//!
//! ## Flow
//!
//! - [`translate()`] turns the Docker `host=...` form into a destination
//! - [`destination::resolve`] defaults the scheme, parses and validates
//! - [`Registry::upsert`] records it; the first connection becomes active
//! - [`store::RegistryStore`] persists the registry

pub mod commands;
pub mod destination;
pub mod error;
pub mod probe;
pub mod registry;
pub mod ssh;
pub mod store;
pub mod translate;

pub use commands::{add_connection, create_context, AddContext};
pub use destination::{resolve, EndpointDescriptor, ResolveOptions, Scheme};
pub use error::ConnectionError;
pub use probe::{OsProbe, PathKind, PathProbe};
pub use registry::{Destination, Registry};
pub use ssh::{ConnectionSetup, OfflineSshSetup, SshCreateOptions};
pub use store::{default_registry_path, RegistryStore, StoreError, TomlStore};
pub use translate::translate;
