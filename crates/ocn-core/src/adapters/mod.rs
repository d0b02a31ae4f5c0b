//! Concrete port implementations: in-memory stores for directory and proxy
//! state, a JSON-file registry, and the reqwest-backed dispatcher.

pub mod file_registry;
pub mod http_dispatcher;
pub mod memory_directory;
pub mod memory_proxy;

pub use file_registry::{FileRegistry, RegistryEntry};
pub use http_dispatcher::ReqwestDispatcher;
pub use memory_directory::InMemoryDirectory;
pub use memory_proxy::InMemoryProxyStore;
