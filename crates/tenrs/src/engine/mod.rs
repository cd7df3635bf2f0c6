//! Execution-engine collaborator contract.
//!
//! Everything the dispatch layer knows about the engine lives in
//! [`spec`]: dtypes, devices, operation descriptors, and the [`spec::Engine`]
//! trait itself. The engine's internals (kernels, graph construction,
//! differentiation bookkeeping) are deliberately out of scope.

pub mod spec;

pub use spec::{Engine, EngineError, EngineResult};
