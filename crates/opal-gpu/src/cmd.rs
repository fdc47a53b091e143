//! The command submission boundary.
//!
//! The device's command facility is stateless from the caller's point of
//! view: it performs no redundant-write elimination and expects every
//! register to be re-issued explicitly. [`CommandSink`] models that facility
//! as one method per discrete hardware command; the state layer above is the
//! only place where caching happens.

use crate::attr::{AttrLayout, BufferLayout};
use crate::types::{
    BlendConfig, CompareFunc, EarlyDepthFunc, FragmentOpMode, HwCullMode, LogicOp, ProgramHandle,
    Rect, ScissorMode, Stage, StencilOp, TextureHandle, WriteMask,
};

/// The sole side-effecting boundary of this layer.
///
/// Implementations submit each call to the hardware (or record it, see
/// [`RecordingSink`]). Callers must assume every method reaches the device;
/// no implementation is allowed to skip writes it believes are redundant.
pub trait CommandSink {
    fn set_cull_mode(&mut self, mode: HwCullMode);
    fn set_depth_map(&mut self, enabled: bool, scale: f32, offset: f32);
    fn set_scissor(&mut self, mode: ScissorMode, rect: Rect);
    fn set_alpha_test(&mut self, enabled: bool, func: CompareFunc, reference: u8);
    fn set_stencil_test(
        &mut self,
        enabled: bool,
        func: CompareFunc,
        reference: u8,
        input_mask: u8,
        write_mask: u8,
    );
    fn set_stencil_ops(&mut self, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp);
    fn set_depth_test(&mut self, enabled: bool, func: CompareFunc);
    fn set_write_mask(&mut self, mask: WriteMask);
    fn set_early_depth_test(&mut self, enabled: bool, func: EarlyDepthFunc, clear_value: u32);
    fn set_blend(&mut self, config: BlendConfig);
    fn set_blend_color(&mut self, color: [u8; 4]);
    fn set_logic_op(&mut self, op: LogicOp);
    fn set_fragment_op_mode(&mut self, mode: FragmentOpMode);
    fn set_viewport(&mut self, rect: Rect);
    fn bind_texture(&mut self, unit: u8, texture: Option<TextureHandle>);
    fn bind_program(&mut self, program: ProgramHandle);
    fn bind_vertex_layout(&mut self, attrs: &AttrLayout, buffers: &BufferLayout);
    /// Batched float-uniform write covering up to four contiguous vec4 rows.
    fn write_float_block(&mut self, stage: Stage, base_slot: u8, rows: &[[f32; 4]]);
    /// Single-row float-uniform write.
    fn write_float_row(&mut self, stage: Stage, slot: u8, row: [f32; 4]);
    fn write_int_uniform(&mut self, stage: Stage, slot: u8, value: [i32; 4]);
    fn write_bool_uniform(&mut self, stage: Stage, slot: u8, value: bool);
}

/// Value-level form of one hardware command, as captured by [`RecordingSink`].
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    CullMode(HwCullMode),
    DepthMap {
        enabled: bool,
        scale: f32,
        offset: f32,
    },
    Scissor {
        mode: ScissorMode,
        rect: Rect,
    },
    AlphaTest {
        enabled: bool,
        func: CompareFunc,
        reference: u8,
    },
    StencilTest {
        enabled: bool,
        func: CompareFunc,
        reference: u8,
        input_mask: u8,
        write_mask: u8,
    },
    StencilOps {
        fail: StencilOp,
        depth_fail: StencilOp,
        pass: StencilOp,
    },
    DepthTest {
        enabled: bool,
        func: CompareFunc,
    },
    WriteMask(WriteMask),
    EarlyDepthTest {
        enabled: bool,
        func: EarlyDepthFunc,
        clear_value: u32,
    },
    Blend(BlendConfig),
    BlendColor([u8; 4]),
    LogicOp(LogicOp),
    FragmentOpMode(FragmentOpMode),
    Viewport(Rect),
    BindTexture {
        unit: u8,
        texture: Option<TextureHandle>,
    },
    BindProgram(ProgramHandle),
    BindVertexLayout {
        attrs: AttrLayout,
        buffers: BufferLayout,
    },
    FloatBlock {
        stage: Stage,
        base_slot: u8,
        rows: Vec<[f32; 4]>,
    },
    FloatRow {
        stage: Stage,
        slot: u8,
        row: [f32; 4],
    },
    IntUniform {
        stage: Stage,
        slot: u8,
        value: [i32; 4],
    },
    BoolUniform {
        stage: Stage,
        slot: u8,
        value: bool,
    },
}

/// A [`CommandSink`] that appends every command to a vector.
///
/// The test suites assert against the captured stream; it is also handy for
/// dumping what a frame would have submitted.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: Vec<Command>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drains the captured stream, leaving the sink empty.
    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl CommandSink for RecordingSink {
    fn set_cull_mode(&mut self, mode: HwCullMode) {
        self.commands.push(Command::CullMode(mode));
    }

    fn set_depth_map(&mut self, enabled: bool, scale: f32, offset: f32) {
        self.commands.push(Command::DepthMap {
            enabled,
            scale,
            offset,
        });
    }

    fn set_scissor(&mut self, mode: ScissorMode, rect: Rect) {
        self.commands.push(Command::Scissor { mode, rect });
    }

    fn set_alpha_test(&mut self, enabled: bool, func: CompareFunc, reference: u8) {
        self.commands.push(Command::AlphaTest {
            enabled,
            func,
            reference,
        });
    }

    fn set_stencil_test(
        &mut self,
        enabled: bool,
        func: CompareFunc,
        reference: u8,
        input_mask: u8,
        write_mask: u8,
    ) {
        self.commands.push(Command::StencilTest {
            enabled,
            func,
            reference,
            input_mask,
            write_mask,
        });
    }

    fn set_stencil_ops(&mut self, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) {
        self.commands.push(Command::StencilOps {
            fail,
            depth_fail,
            pass,
        });
    }

    fn set_depth_test(&mut self, enabled: bool, func: CompareFunc) {
        self.commands.push(Command::DepthTest { enabled, func });
    }

    fn set_write_mask(&mut self, mask: WriteMask) {
        self.commands.push(Command::WriteMask(mask));
    }

    fn set_early_depth_test(&mut self, enabled: bool, func: EarlyDepthFunc, clear_value: u32) {
        self.commands.push(Command::EarlyDepthTest {
            enabled,
            func,
            clear_value,
        });
    }

    fn set_blend(&mut self, config: BlendConfig) {
        self.commands.push(Command::Blend(config));
    }

    fn set_blend_color(&mut self, color: [u8; 4]) {
        self.commands.push(Command::BlendColor(color));
    }

    fn set_logic_op(&mut self, op: LogicOp) {
        self.commands.push(Command::LogicOp(op));
    }

    fn set_fragment_op_mode(&mut self, mode: FragmentOpMode) {
        self.commands.push(Command::FragmentOpMode(mode));
    }

    fn set_viewport(&mut self, rect: Rect) {
        self.commands.push(Command::Viewport(rect));
    }

    fn bind_texture(&mut self, unit: u8, texture: Option<TextureHandle>) {
        self.commands.push(Command::BindTexture { unit, texture });
    }

    fn bind_program(&mut self, program: ProgramHandle) {
        self.commands.push(Command::BindProgram(program));
    }

    fn bind_vertex_layout(&mut self, attrs: &AttrLayout, buffers: &BufferLayout) {
        self.commands.push(Command::BindVertexLayout {
            attrs: attrs.clone(),
            buffers: buffers.clone(),
        });
    }

    fn write_float_block(&mut self, stage: Stage, base_slot: u8, rows: &[[f32; 4]]) {
        self.commands.push(Command::FloatBlock {
            stage,
            base_slot,
            rows: rows.to_vec(),
        });
    }

    fn write_float_row(&mut self, stage: Stage, slot: u8, row: [f32; 4]) {
        self.commands.push(Command::FloatRow { stage, slot, row });
    }

    fn write_int_uniform(&mut self, stage: Stage, slot: u8, value: [i32; 4]) {
        self.commands.push(Command::IntUniform { stage, slot, value });
    }

    fn write_bool_uniform(&mut self, stage: Stage, slot: u8, value: bool) {
        self.commands.push(Command::BoolUniform { stage, slot, value });
    }
}

/// A [`CommandSink`] that discards everything. Useful when a caller wants the
/// cache bookkeeping without a live device.
#[derive(Debug, Default)]
pub struct NullSink;

impl CommandSink for NullSink {
    fn set_cull_mode(&mut self, _mode: HwCullMode) {}
    fn set_depth_map(&mut self, _enabled: bool, _scale: f32, _offset: f32) {}
    fn set_scissor(&mut self, _mode: ScissorMode, _rect: Rect) {}
    fn set_alpha_test(&mut self, _enabled: bool, _func: CompareFunc, _reference: u8) {}
    fn set_stencil_test(
        &mut self,
        _enabled: bool,
        _func: CompareFunc,
        _reference: u8,
        _input_mask: u8,
        _write_mask: u8,
    ) {
    }
    fn set_stencil_ops(&mut self, _fail: StencilOp, _depth_fail: StencilOp, _pass: StencilOp) {}
    fn set_depth_test(&mut self, _enabled: bool, _func: CompareFunc) {}
    fn set_write_mask(&mut self, _mask: WriteMask) {}
    fn set_early_depth_test(&mut self, _enabled: bool, _func: EarlyDepthFunc, _clear_value: u32) {}
    fn set_blend(&mut self, _config: BlendConfig) {}
    fn set_blend_color(&mut self, _color: [u8; 4]) {}
    fn set_logic_op(&mut self, _op: LogicOp) {}
    fn set_fragment_op_mode(&mut self, _mode: FragmentOpMode) {}
    fn set_viewport(&mut self, _rect: Rect) {}
    fn bind_texture(&mut self, _unit: u8, _texture: Option<TextureHandle>) {}
    fn bind_program(&mut self, _program: ProgramHandle) {}
    fn bind_vertex_layout(&mut self, _attrs: &AttrLayout, _buffers: &BufferLayout) {}
    fn write_float_block(&mut self, _stage: Stage, _base_slot: u8, _rows: &[[f32; 4]]) {}
    fn write_float_row(&mut self, _stage: Stage, _slot: u8, _row: [f32; 4]) {}
    fn write_int_uniform(&mut self, _stage: Stage, _slot: u8, _value: [i32; 4]) {}
    fn write_bool_uniform(&mut self, _stage: Stage, _slot: u8, _value: bool) {}
}
