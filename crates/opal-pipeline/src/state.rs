//! One rendering context's cached pipeline configuration.
//!
//! Every setter follows the same contract: compare the requested values to
//! the cache and return without side effects when nothing changed; otherwise
//! update the cache, recompute any derived register value, and issue exactly
//! the hardware commands that register needs. The cache is authoritative
//! only while the context is active; an inactive context's fields may
//! diverge from the device until [`RenderState::apply_all`] replays them.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use opal_gpu::{
    AttrLayout, BlendConfig, BlendEquation, BlendFactor, BufferLayout, CommandSink, CompareFunc,
    EarlyDepthFunc, Face, FragmentOpMode, HwCullMode, LogicOp, ProgramHandle, Rect, ScissorMode,
    StencilOp, TextureHandle, Winding, WriteMask, TEXTURE_UNITS,
};
use tracing::debug;

use crate::shader::{drain_deferred, ShaderObject, ShaderShared};

/// Initial state set for a freshly created context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextPreset {
    /// Device conventions: back-face culling, depth test `Greater`,
    /// alpha blending enabled.
    Native,
    /// Defaults of the emulated fixed-function API: every test and blend
    /// stage disabled, depth func `Less`.
    Compat,
}

#[derive(Clone, Copy)]
struct CullState {
    enabled: bool,
    face: Face,
    front: Winding,
    /// Derived register value; the hardware only understands windings.
    hw: HwCullMode,
}

impl CullState {
    fn derived(&self) -> HwCullMode {
        if !self.enabled {
            return HwCullMode::None;
        }
        if (self.face == Face::Front) != (self.front == Winding::Ccw) {
            HwCullMode::Back
        } else {
            HwCullMode::Front
        }
    }
}

#[derive(Clone, Copy)]
struct DepthMapState {
    enabled: bool,
    range_near: f32,
    range_far: f32,
    w_scale: f32,
    offset_enabled: bool,
    offset_units: f32,
    // Derived register values.
    scale: f32,
    offset: f32,
}

impl DepthMapState {
    fn derived(&self) -> (f32, f32) {
        let (scale, mut offset) = if self.w_scale != 0.0 {
            (-self.w_scale, 0.0)
        } else {
            (self.range_near - self.range_far, self.range_near)
        };
        if self.offset_enabled && self.offset_units != 0.0 {
            // Units are expressed over the 24-bit depth range.
            offset += self.offset_units / 16_777_215.0;
        }
        (scale, offset)
    }
}

#[derive(Clone, Copy)]
struct ScissorState {
    mode: ScissorMode,
    rect: Rect,
}

#[derive(Clone, Copy)]
struct AlphaTestState {
    enabled: bool,
    func: CompareFunc,
    reference: u8,
}

#[derive(Clone, Copy)]
struct StencilState {
    enabled: bool,
    func: CompareFunc,
    reference: u8,
    input_mask: u8,
    write_mask: u8,
    fail: StencilOp,
    depth_fail: StencilOp,
    pass: StencilOp,
}

#[derive(Clone, Copy)]
struct DepthState {
    test_enabled: bool,
    func: CompareFunc,
    /// Requested combined mask. The depth bit is forced off in the register
    /// while depth testing is disabled: the device cannot write depth
    /// without testing it.
    write_mask: WriteMask,
}

#[derive(Clone, Copy)]
struct EarlyDepthState {
    enabled: bool,
    func: EarlyDepthFunc,
    clear_value: u32,
}

#[derive(Clone, Copy)]
struct BlendState {
    enabled: bool,
    config: BlendConfig,
    four_component: bool,
    color: [u8; 4],
}

#[derive(Clone, Copy)]
struct LogicOpState {
    enabled: bool,
    op: LogicOp,
}

/// The shader binding a context replays on resync. Layouts are copied here
/// because they are private to the shader-object instance that was bound,
/// which may since have changed or gone away.
#[derive(Clone)]
pub(crate) struct BoundShader {
    pub(crate) shared: Weak<RefCell<ShaderShared>>,
    pub(crate) program: ProgramHandle,
    pub(crate) attrs: AttrLayout,
    pub(crate) buffers: BufferLayout,
}

/// Cached fixed-function configuration of one logical rendering context.
#[derive(Clone)]
pub struct RenderState {
    cull: CullState,
    depth_map: DepthMapState,
    scissor: ScissorState,
    alpha: AlphaTestState,
    stencil: StencilState,
    depth: DepthState,
    early_depth: EarlyDepthState,
    blend: BlendState,
    logic: LogicOpState,
    fragment_op: FragmentOpMode,
    viewport: Rect,
    textures: [Option<TextureHandle>; TEXTURE_UNITS],
    shader: Option<BoundShader>,
}

impl RenderState {
    pub fn new(preset: ContextPreset) -> Self {
        let mut state = match preset {
            ContextPreset::Native => Self::native_defaults(),
            ContextPreset::Compat => Self::compat_defaults(),
        };
        state.cull.hw = state.cull.derived();
        let (scale, offset) = state.depth_map.derived();
        state.depth_map.scale = scale;
        state.depth_map.offset = offset;
        state
    }

    fn native_defaults() -> Self {
        Self {
            cull: CullState {
                enabled: true,
                face: Face::Back,
                front: Winding::Ccw,
                hw: HwCullMode::None,
            },
            depth_map: DepthMapState {
                enabled: true,
                range_near: 0.0,
                range_far: 1.0,
                w_scale: 0.0,
                offset_enabled: false,
                offset_units: 0.0,
                scale: 0.0,
                offset: 0.0,
            },
            scissor: ScissorState {
                mode: ScissorMode::Disabled,
                rect: Rect::ZERO,
            },
            alpha: AlphaTestState {
                enabled: false,
                func: CompareFunc::Always,
                reference: 0,
            },
            stencil: StencilState {
                enabled: false,
                func: CompareFunc::Always,
                reference: 0,
                input_mask: 0xFF,
                write_mask: 0xFF,
                fail: StencilOp::Keep,
                depth_fail: StencilOp::Keep,
                pass: StencilOp::Keep,
            },
            depth: DepthState {
                test_enabled: true,
                func: CompareFunc::Greater,
                write_mask: WriteMask::ALL,
            },
            early_depth: EarlyDepthState {
                enabled: false,
                func: EarlyDepthFunc::GreaterEqual,
                clear_value: 0,
            },
            blend: BlendState {
                enabled: true,
                config: BlendConfig {
                    color_eq: BlendEquation::Add,
                    alpha_eq: BlendEquation::Add,
                    src_color: BlendFactor::SrcAlpha,
                    dst_color: BlendFactor::OneMinusSrcAlpha,
                    src_alpha: BlendFactor::SrcAlpha,
                    dst_alpha: BlendFactor::OneMinusSrcAlpha,
                },
                four_component: false,
                color: [0; 4],
            },
            logic: LogicOpState {
                enabled: false,
                op: LogicOp::Copy,
            },
            fragment_op: FragmentOpMode::Default,
            viewport: Rect::ZERO,
            textures: [None; TEXTURE_UNITS],
            shader: None,
        }
    }

    fn compat_defaults() -> Self {
        let mut state = Self::native_defaults();
        state.cull.enabled = false;
        state.depth_map.enabled = false;
        state.depth.test_enabled = false;
        state.depth.func = CompareFunc::Less;
        state.blend.enabled = false;
        state.blend.config = BlendConfig::PASSTHROUGH;
        state
    }

    // --- culling -----------------------------------------------------------

    pub fn set_cull_enabled<S: CommandSink>(&mut self, sink: &mut S, enabled: bool) {
        if self.cull.enabled == enabled {
            return;
        }
        self.cull.enabled = enabled;
        self.refresh_cull(sink);
    }

    pub fn set_cull_face<S: CommandSink>(&mut self, sink: &mut S, face: Face) {
        if self.cull.face == face {
            return;
        }
        self.cull.face = face;
        self.refresh_cull(sink);
    }

    pub fn set_front_face<S: CommandSink>(&mut self, sink: &mut S, front: Winding) {
        if self.cull.front == front {
            return;
        }
        self.cull.front = front;
        self.refresh_cull(sink);
    }

    fn refresh_cull<S: CommandSink>(&mut self, sink: &mut S) {
        let hw = self.cull.derived();
        if hw == self.cull.hw {
            return;
        }
        self.cull.hw = hw;
        sink.set_cull_mode(hw);
    }

    pub fn cull_mode(&self) -> HwCullMode {
        self.cull.hw
    }

    // --- depth map ---------------------------------------------------------

    pub fn set_depth_map_enabled<S: CommandSink>(&mut self, sink: &mut S, enabled: bool) {
        if self.depth_map.enabled == enabled {
            return;
        }
        self.depth_map.enabled = enabled;
        sink.set_depth_map(enabled, self.depth_map.scale, self.depth_map.offset);
    }

    pub fn set_depth_range<S: CommandSink>(&mut self, sink: &mut S, near: f32, far: f32) {
        if self.depth_map.range_near == near && self.depth_map.range_far == far {
            return;
        }
        self.depth_map.range_near = near;
        self.depth_map.range_far = far;
        self.refresh_depth_map(sink);
    }

    /// Non-zero overrides the near/far mapping with a pure w-buffer scale.
    pub fn set_w_scale<S: CommandSink>(&mut self, sink: &mut S, w_scale: f32) {
        if self.depth_map.w_scale == w_scale {
            return;
        }
        self.depth_map.w_scale = w_scale;
        self.refresh_depth_map(sink);
    }

    pub fn set_polygon_offset<S: CommandSink>(&mut self, sink: &mut S, enabled: bool, units: f32) {
        if self.depth_map.offset_enabled == enabled && self.depth_map.offset_units == units {
            return;
        }
        self.depth_map.offset_enabled = enabled;
        self.depth_map.offset_units = units;
        self.refresh_depth_map(sink);
    }

    fn refresh_depth_map<S: CommandSink>(&mut self, sink: &mut S) {
        let (scale, offset) = self.depth_map.derived();
        if scale == self.depth_map.scale && offset == self.depth_map.offset {
            return;
        }
        self.depth_map.scale = scale;
        self.depth_map.offset = offset;
        sink.set_depth_map(self.depth_map.enabled, scale, offset);
    }

    /// Current `(enabled, scale, offset)` register values.
    pub fn depth_map(&self) -> (bool, f32, f32) {
        (
            self.depth_map.enabled,
            self.depth_map.scale,
            self.depth_map.offset,
        )
    }

    // --- scissor, alpha test, stencil --------------------------------------

    pub fn set_scissor<S: CommandSink>(&mut self, sink: &mut S, mode: ScissorMode, rect: Rect) {
        if self.scissor.mode == mode && self.scissor.rect == rect {
            return;
        }
        self.scissor = ScissorState { mode, rect };
        sink.set_scissor(mode, rect);
    }

    pub fn set_alpha_test<S: CommandSink>(
        &mut self,
        sink: &mut S,
        enabled: bool,
        func: CompareFunc,
        reference: u8,
    ) {
        if self.alpha.enabled == enabled
            && self.alpha.func == func
            && self.alpha.reference == reference
        {
            return;
        }
        self.alpha = AlphaTestState {
            enabled,
            func,
            reference,
        };
        sink.set_alpha_test(enabled, func, reference);
    }

    pub fn set_stencil_test<S: CommandSink>(
        &mut self,
        sink: &mut S,
        enabled: bool,
        func: CompareFunc,
        reference: u8,
        input_mask: u8,
        write_mask: u8,
    ) {
        if self.stencil.enabled == enabled
            && self.stencil.func == func
            && self.stencil.reference == reference
            && self.stencil.input_mask == input_mask
            && self.stencil.write_mask == write_mask
        {
            return;
        }
        self.stencil.enabled = enabled;
        self.stencil.func = func;
        self.stencil.reference = reference;
        self.stencil.input_mask = input_mask;
        self.stencil.write_mask = write_mask;
        sink.set_stencil_test(enabled, func, reference, input_mask, write_mask);
    }

    pub fn set_stencil_ops<S: CommandSink>(
        &mut self,
        sink: &mut S,
        fail: StencilOp,
        depth_fail: StencilOp,
        pass: StencilOp,
    ) {
        if self.stencil.fail == fail
            && self.stencil.depth_fail == depth_fail
            && self.stencil.pass == pass
        {
            return;
        }
        self.stencil.fail = fail;
        self.stencil.depth_fail = depth_fail;
        self.stencil.pass = pass;
        sink.set_stencil_ops(fail, depth_fail, pass);
    }

    // --- depth test and the combined write mask ----------------------------

    pub fn set_depth_test<S: CommandSink>(
        &mut self,
        sink: &mut S,
        enabled: bool,
        func: CompareFunc,
    ) {
        if self.depth.test_enabled == enabled && self.depth.func == func {
            return;
        }
        let old_mask = self.effective_write_mask();
        self.depth.test_enabled = enabled;
        self.depth.func = func;
        sink.set_depth_test(enabled, func);
        let mask = self.effective_write_mask();
        if mask != old_mask {
            sink.set_write_mask(mask);
        }
    }

    pub fn set_depth_write<S: CommandSink>(&mut self, sink: &mut S, enabled: bool) {
        let requested = if enabled {
            self.depth.write_mask | WriteMask::DEPTH
        } else {
            self.depth.write_mask & !WriteMask::DEPTH
        };
        self.update_write_mask(sink, requested);
    }

    /// Replaces the four color-channel bits of the combined mask; the depth
    /// bit is untouched.
    pub fn set_color_write<S: CommandSink>(&mut self, sink: &mut S, color_mask: WriteMask) {
        let requested =
            (self.depth.write_mask & !WriteMask::COLOR) | (color_mask & WriteMask::COLOR);
        self.update_write_mask(sink, requested);
    }

    fn update_write_mask<S: CommandSink>(&mut self, sink: &mut S, requested: WriteMask) {
        if requested == self.depth.write_mask {
            return;
        }
        let old_mask = self.effective_write_mask();
        self.depth.write_mask = requested;
        let mask = self.effective_write_mask();
        if mask != old_mask {
            sink.set_write_mask(mask);
        }
    }

    /// The register value: the requested mask with depth writes forced off
    /// while depth testing is disabled.
    pub fn effective_write_mask(&self) -> WriteMask {
        if self.depth.test_enabled {
            self.depth.write_mask
        } else {
            self.depth.write_mask & !WriteMask::DEPTH
        }
    }

    pub fn set_early_depth_test<S: CommandSink>(
        &mut self,
        sink: &mut S,
        enabled: bool,
        func: EarlyDepthFunc,
        clear_value: u32,
    ) {
        if self.early_depth.enabled == enabled
            && self.early_depth.func == func
            && self.early_depth.clear_value == clear_value
        {
            return;
        }
        self.early_depth = EarlyDepthState {
            enabled,
            func,
            clear_value,
        };
        sink.set_early_depth_test(enabled, func, clear_value);
    }

    // --- blending and logic ops --------------------------------------------
    //
    // Blending and color logic ops are mutually exclusive stages in the
    // output merger. While the logic op is enabled it owns the stage and
    // blend updates only touch the cache; disabling it hands the stage back
    // by re-issuing the blend configuration.

    fn effective_blend(&self) -> BlendConfig {
        if self.blend.enabled {
            self.blend.config
        } else {
            BlendConfig::PASSTHROUGH
        }
    }

    pub fn set_blend_enabled<S: CommandSink>(&mut self, sink: &mut S, enabled: bool) {
        if self.blend.enabled == enabled {
            return;
        }
        let old = self.effective_blend();
        self.blend.enabled = enabled;
        let new = self.effective_blend();
        if !self.logic.enabled && new != old {
            sink.set_blend(new);
        }
    }

    /// Configures both pipes from one equation/factor pair.
    pub fn set_blend_function<S: CommandSink>(
        &mut self,
        sink: &mut S,
        color_eq: BlendEquation,
        alpha_eq: BlendEquation,
        src: BlendFactor,
        dst: BlendFactor,
    ) {
        let config = BlendConfig {
            color_eq,
            alpha_eq,
            src_color: src,
            dst_color: dst,
            src_alpha: src,
            dst_alpha: dst,
        };
        self.update_blend_config(sink, config, false);
    }

    /// Configures the alpha pipe independently of the color pipe.
    pub fn set_blend_function_separate<S: CommandSink>(&mut self, sink: &mut S, config: BlendConfig) {
        self.update_blend_config(sink, config, true);
    }

    fn update_blend_config<S: CommandSink>(
        &mut self,
        sink: &mut S,
        config: BlendConfig,
        four_component: bool,
    ) {
        if self.blend.config == config && self.blend.four_component == four_component {
            return;
        }
        let old = self.effective_blend();
        self.blend.config = config;
        self.blend.four_component = four_component;
        let new = self.effective_blend();
        if !self.logic.enabled && new != old {
            sink.set_blend(new);
        }
    }

    pub fn set_blend_color<S: CommandSink>(&mut self, sink: &mut S, color: [u8; 4]) {
        if self.blend.color == color {
            return;
        }
        self.blend.color = color;
        sink.set_blend_color(color);
    }

    pub fn set_logic_op_enabled<S: CommandSink>(&mut self, sink: &mut S, enabled: bool) {
        if self.logic.enabled == enabled {
            return;
        }
        self.logic.enabled = enabled;
        if enabled {
            sink.set_logic_op(self.logic.op);
        } else {
            sink.set_blend(self.effective_blend());
        }
    }

    pub fn set_logic_op<S: CommandSink>(&mut self, sink: &mut S, op: LogicOp) {
        if self.logic.op == op {
            return;
        }
        self.logic.op = op;
        if self.logic.enabled {
            sink.set_logic_op(op);
        }
    }

    // --- remaining fixed-function state -------------------------------------

    pub fn set_fragment_op_mode<S: CommandSink>(&mut self, sink: &mut S, mode: FragmentOpMode) {
        if self.fragment_op == mode {
            return;
        }
        self.fragment_op = mode;
        sink.set_fragment_op_mode(mode);
    }

    pub fn set_viewport<S: CommandSink>(&mut self, sink: &mut S, rect: Rect) {
        if self.viewport == rect {
            return;
        }
        self.viewport = rect;
        sink.set_viewport(rect);
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn bind_texture<S: CommandSink>(
        &mut self,
        sink: &mut S,
        unit: usize,
        texture: Option<TextureHandle>,
    ) {
        assert!(unit < TEXTURE_UNITS, "texture unit {unit} out of range");
        if self.textures[unit] == texture {
            return;
        }
        self.textures[unit] = texture;
        sink.bind_texture(unit as u8, texture);
    }

    pub fn bound_texture(&self, unit: usize) -> Option<TextureHandle> {
        assert!(unit < TEXTURE_UNITS, "texture unit {unit} out of range");
        self.textures[unit]
    }

    // --- shader binding -----------------------------------------------------

    /// Makes `shader` the context's active shader: binds the program and the
    /// instance's vertex layouts, then flushes the shader's deferred uniform
    /// queue. Re-binding the identical instance is a no-op; binding another
    /// instance of the same program skips the program bind.
    pub fn bind_shader<S: CommandSink>(&mut self, sink: &mut S, shader: &ShaderObject) {
        let shared = shader.shared_cell();
        if let Some(current) = &self.shader {
            if current.shared.as_ptr() == Rc::as_ptr(shared)
                && current.attrs == *shader.attr_layout()
                && current.buffers == *shader.buffer_layout()
            {
                return;
            }
        }

        let program = shader.program();
        let same_program = self
            .shader
            .as_ref()
            .is_some_and(|current| current.program == program);
        if !same_program {
            sink.bind_program(program);
        }
        sink.bind_vertex_layout(shader.attr_layout(), shader.buffer_layout());

        self.shader = Some(BoundShader {
            shared: Rc::downgrade(shared),
            program,
            attrs: shader.attr_layout().clone(),
            buffers: shader.buffer_layout().clone(),
        });
        drain_deferred(shared, sink);
    }

    pub(crate) fn bound_shader_ptr(&self) -> Option<*const RefCell<ShaderShared>> {
        self.shader.as_ref().map(|bound| bound.shared.as_ptr())
    }

    pub(crate) fn clear_bound_shader(&mut self) {
        self.shader = None;
    }

    pub fn has_bound_shader(&self) -> bool {
        self.shader.is_some()
    }

    // --- full resynchronization ---------------------------------------------

    /// Replays every cached field to the device.
    ///
    /// The command facility has no notion of contexts, so activating this
    /// context means re-issuing all of it, including explicit unbinds for
    /// empty texture units and the shader binding with its deferred-uniform
    /// drain. Needed exactly once per context switch.
    pub fn apply_all<S: CommandSink>(&mut self, sink: &mut S) {
        sink.set_cull_mode(self.cull.hw);
        sink.set_depth_map(
            self.depth_map.enabled,
            self.depth_map.scale,
            self.depth_map.offset,
        );
        sink.set_scissor(self.scissor.mode, self.scissor.rect);
        sink.set_alpha_test(self.alpha.enabled, self.alpha.func, self.alpha.reference);
        sink.set_stencil_test(
            self.stencil.enabled,
            self.stencil.func,
            self.stencil.reference,
            self.stencil.input_mask,
            self.stencil.write_mask,
        );
        sink.set_stencil_ops(self.stencil.fail, self.stencil.depth_fail, self.stencil.pass);
        sink.set_depth_test(self.depth.test_enabled, self.depth.func);
        sink.set_write_mask(self.effective_write_mask());
        sink.set_early_depth_test(
            self.early_depth.enabled,
            self.early_depth.func,
            self.early_depth.clear_value,
        );
        sink.set_fragment_op_mode(self.fragment_op);
        sink.set_viewport(self.viewport);
        sink.set_blend_color(self.blend.color);
        if self.logic.enabled {
            sink.set_logic_op(self.logic.op);
        } else {
            sink.set_blend(self.effective_blend());
        }
        for unit in 0..TEXTURE_UNITS {
            sink.bind_texture(unit as u8, self.textures[unit]);
        }

        if let Some(bound) = &self.shader {
            match bound.shared.upgrade() {
                Some(shared) => {
                    sink.bind_program(bound.program);
                    sink.bind_vertex_layout(&bound.attrs, &bound.buffers);
                    drain_deferred(&shared, sink);
                }
                None => {
                    debug!("bound shader was destroyed while the context was inactive; dropping it");
                    self.shader = None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_gpu::{Command, RecordingSink};

    #[test]
    fn cull_mode_matches_the_winding_formula() {
        let cases = [
            (false, Face::Front, Winding::Cw, HwCullMode::None),
            (false, Face::Front, Winding::Ccw, HwCullMode::None),
            (false, Face::Back, Winding::Cw, HwCullMode::None),
            (false, Face::Back, Winding::Ccw, HwCullMode::None),
            (true, Face::Front, Winding::Cw, HwCullMode::Back),
            (true, Face::Front, Winding::Ccw, HwCullMode::Front),
            (true, Face::Back, Winding::Cw, HwCullMode::Front),
            (true, Face::Back, Winding::Ccw, HwCullMode::Back),
        ];
        let mut sink = RecordingSink::new();
        let mut state = RenderState::new(ContextPreset::Compat);
        for (enabled, face, front, want) in cases {
            state.set_cull_enabled(&mut sink, enabled);
            state.set_cull_face(&mut sink, face);
            state.set_front_face(&mut sink, front);
            assert_eq!(state.cull_mode(), want, "{enabled} {face:?} {front:?}");
        }
    }

    #[test]
    fn depth_map_from_range_and_polygon_offset() {
        let mut sink = RecordingSink::new();
        let mut state = RenderState::new(ContextPreset::Compat);
        state.set_depth_range(&mut sink, 0.1, 100.0);
        let (_, scale, offset) = state.depth_map();
        assert_eq!(scale, 0.1 - 100.0);
        assert_eq!(offset, 0.1);

        state.set_w_scale(&mut sink, 2.0);
        state.set_polygon_offset(&mut sink, true, 256.0);
        let (_, scale, offset) = state.depth_map();
        assert_eq!(scale, -2.0);
        assert_eq!(offset, 256.0 / 16_777_215.0);
    }

    #[test]
    fn depth_write_bit_requires_depth_testing() {
        let mut sink = RecordingSink::new();
        let mut state = RenderState::new(ContextPreset::Compat);
        // Depth testing is off in this preset, so asking for depth writes
        // changes the cache but not the register.
        state.set_depth_write(&mut sink, true);
        assert!(!state.effective_write_mask().contains(WriteMask::DEPTH));
        assert!(sink.is_empty());

        // Enabling the test surfaces the cached depth-write bit.
        state.set_depth_test(&mut sink, true, CompareFunc::Less);
        assert!(state.effective_write_mask().contains(WriteMask::DEPTH));
        assert_eq!(
            sink.take(),
            vec![
                Command::DepthTest {
                    enabled: true,
                    func: CompareFunc::Less,
                },
                Command::WriteMask(WriteMask::ALL),
            ]
        );
    }

    #[test]
    fn color_write_leaves_depth_bit_alone() {
        let mut sink = RecordingSink::new();
        let mut state = RenderState::new(ContextPreset::Native);
        state.set_color_write(&mut sink, WriteMask::RED | WriteMask::GREEN);
        assert_eq!(
            state.effective_write_mask(),
            WriteMask::RED | WriteMask::GREEN | WriteMask::DEPTH
        );
    }

    #[test]
    fn changing_cull_inputs_without_register_change_issues_nothing() {
        let mut sink = RecordingSink::new();
        let mut state = RenderState::new(ContextPreset::Compat);
        // Disabled either way; the register stays None.
        state.set_cull_face(&mut sink, Face::Front);
        state.set_front_face(&mut sink, Winding::Cw);
        assert!(sink.is_empty());
    }
}
