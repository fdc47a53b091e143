//! `opal-pipeline` caches fixed-function pipeline state on top of the
//! stateless command facility exposed by `opal-gpu`.
//!
//! The device requires every register to be re-issued explicitly and has no
//! notion of multiple rendering contexts. This crate provides:
//! - [`RenderState`]: one logical context's cached configuration, mutated
//!   through narrow setters that skip redundant hardware writes.
//! - [`ContextRegistry`]: owns the command sink and all live contexts,
//!   designates the single active one, and resynchronizes the device in full
//!   when the active context changes.
//! - [`ShaderObject`]: a compiled-program wrapper with per-stage uniform
//!   caches that can be written while the shader is not active; deferred
//!   writes are flushed in order when the shader is bound.
//!
//! Everything here is single-threaded by construction; the only shared
//! resource is the registry's "active" handle, which is read and written
//! only through the registry's own API.

mod registry;
mod shader;
mod state;

pub use registry::{ActiveContext, ContextId, ContextRegistry};
pub use shader::{ProgramMetadata, ShaderObject, StageMetadata};
pub use state::{ContextPreset, RenderState};
