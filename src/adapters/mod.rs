// Adapters layer: concrete implementations for external systems (definition
// files on disk, the hosted model, the HTTP surface).

pub mod anthropic;
pub mod fs_source;
pub mod http;
