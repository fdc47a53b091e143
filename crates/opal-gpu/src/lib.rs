//! `opal-gpu` is the device-facing half of the opal stack.
//!
//! It defines:
//! - The value vocabulary of the fixed-function registers ([`types`]).
//! - The command submission boundary ([`CommandSink`]) plus a recording
//!   implementation used by tests and diagnostics.
//! - Vertex attribute/buffer layout descriptors ([`AttrLayout`],
//!   [`BufferLayout`]).
//! - The linear/block-tiled pixel layout converter ([`tiling`]).
//! - The device-visible memory heap and the physical/virtual region table
//!   ([`dmem`]).

mod attr;
mod cmd;
mod types;

pub mod dmem;
pub mod tiling;

pub use attr::{AttrEntry, AttrFormat, AttrLayout, BufferBinding, BufferLayout};
pub use cmd::{Command, CommandSink, NullSink, RecordingSink};
pub use types::{
    BlendConfig, BlendEquation, BlendFactor, CompareFunc, EarlyDepthFunc, Face, FragmentOpMode,
    HwCullMode, LogicOp, ProgramHandle, Rect, ScissorMode, Stage, StencilOp, TextureHandle,
    Winding, WriteMask, BOOL_UNIFORM_SLOTS, FLOAT_UNIFORM_BLOCK_ROWS, INT_UNIFORM_SLOTS,
    TEXTURE_UNITS,
};
