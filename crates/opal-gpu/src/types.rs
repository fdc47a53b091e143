use std::fmt;

use bitflags::bitflags;

/// Number of fixed-function texture units on the device.
pub const TEXTURE_UNITS: usize = 3;

/// Integer-vector uniform slots available per shader stage.
pub const INT_UNIFORM_SLOTS: usize = 4;

/// Boolean uniform slots available per shader stage.
pub const BOOL_UNIFORM_SLOTS: usize = 2;

/// Largest number of contiguous float-uniform rows a single block write can
/// carry. The uniform-upload instruction cannot address more rows per call.
pub const FLOAT_UNIFORM_BLOCK_ROWS: usize = 4;

/// Opaque reference to a texture owned by a higher-level object. The state
/// layer only tracks which handle is bound to which unit; it never frees one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Opaque handle to a compiled shader program produced by the external
/// program loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Programmable stages of the device. The fragment pipeline is fixed
/// function; only these two stages carry uniform tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Geometry,
}

impl Stage {
    pub const COUNT: usize = 2;
    pub const ALL: [Stage; 2] = [Stage::Vertex, Stage::Geometry];

    pub fn index(self) -> usize {
        match self {
            Stage::Vertex => 0,
            Stage::Geometry => 1,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Vertex => "vertex",
            Stage::Geometry => "geometry",
        })
    }
}

/// Integer pixel rectangle used for viewports and scissor regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const ZERO: Self = Self {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Which faces a caller asks to cull.
///
/// This is the *logical* input; the hardware register only understands
/// windings (see [`HwCullMode`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

/// Winding that defines a front-facing triangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winding {
    Cw,
    Ccw,
}

/// Value of the hardware cull register. `Front`/`Back` name which winding is
/// discarded relative to the rasterizer's fixed convention, not the caller's
/// notion of front and back faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HwCullMode {
    None,
    Front,
    Back,
}

/// Comparison functions shared by the depth, stencil and alpha tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareFunc {
    Never,
    Always,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

/// Functions accepted by the early depth unit. The early test supports only
/// ordered comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EarlyDepthFunc {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Invert,
    Increment,
    Decrement,
    IncrementWrap,
    DecrementWrap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
}

/// Framebuffer logic operations. Mutually exclusive with blending in the
/// device's output-merge stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicOp {
    Clear,
    And,
    AndReverse,
    Copy,
    AndInverted,
    Noop,
    Xor,
    Or,
    Nor,
    Equiv,
    Invert,
    OrReverse,
    CopyInverted,
    OrInverted,
    Nand,
    Set,
}

/// Scissor behaviour: `Exclude` discards fragments inside the rect,
/// `Include` discards fragments outside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScissorMode {
    Disabled,
    Exclude,
    Include,
}

/// Fragment-operation mode of the output-merge stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentOpMode {
    Default,
    Gas,
    Shadow,
}

bitflags! {
    /// The combined write-mask register. One register multiplexes the depth
    /// write and all four color-channel writes; there is no way to address
    /// them individually in hardware.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct WriteMask: u8 {
        const RED = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE = 1 << 2;
        const ALPHA = 1 << 3;
        const DEPTH = 1 << 4;

        const COLOR = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits() | Self::ALPHA.bits();
        const ALL = Self::COLOR.bits() | Self::DEPTH.bits();
    }
}

/// Full parameter set of the hardware blend command.
///
/// The device has no short form: every blend write carries both equations and
/// all four factors, even when the alpha pipe just mirrors the color pipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlendConfig {
    pub color_eq: BlendEquation,
    pub alpha_eq: BlendEquation,
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl BlendConfig {
    /// Neutral configuration producing unblended output. Issued whenever the
    /// merge stage must be in blend mode but blending is logically disabled.
    pub const PASSTHROUGH: Self = Self {
        color_eq: BlendEquation::Add,
        alpha_eq: BlendEquation::Add,
        src_color: BlendFactor::One,
        dst_color: BlendFactor::Zero,
        src_alpha: BlendFactor::One,
        dst_alpha: BlendFactor::Zero,
    };
}
