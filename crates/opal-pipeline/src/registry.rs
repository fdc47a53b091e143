//! The context registry: owner of the command sink, the live contexts, and
//! the single "active" handle.
//!
//! The underlying device has no notion of contexts, so there is exactly one
//! active [`RenderState`] at a time and switching is not cheap: every cached
//! field of the newly active context is replayed. Unknown context ids are
//! programming errors and abort with a diagnostic rather than returning an
//! error.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use opal_gpu::{
    BlendConfig, BlendEquation, BlendFactor, CommandSink, CompareFunc, EarlyDepthFunc, Face,
    FragmentOpMode, LogicOp, Rect, ScissorMode, StencilOp, TextureHandle, Winding, WriteMask,
};
use tracing::{debug, trace};

use crate::shader::{ShaderObject, ShaderShared};
use crate::state::{ContextPreset, RenderState};

/// Handle to a live context in a [`ContextRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(u32);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owns the command sink and all live rendering contexts.
pub struct ContextRegistry<S: CommandSink> {
    sink: S,
    contexts: HashMap<ContextId, RenderState>,
    active: Option<ContextId>,
    next_id: u32,
}

impl<S: CommandSink> ContextRegistry<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            contexts: HashMap::new(),
            active: None,
            next_id: 0,
        }
    }

    /// Creates a context with one of the preset default state sets. No
    /// hardware commands are issued until the context is activated.
    pub fn create(&mut self, preset: ContextPreset) -> ContextId {
        let id = self.insert(RenderState::new(preset));
        debug!(%id, ?preset, "created rendering context");
        id
    }

    /// Duplicates every cached field of `source` into a new context. The
    /// clone starts with no bound shader.
    pub fn clone_context(&mut self, source: ContextId) -> ContextId {
        let state = self
            .contexts
            .get(&source)
            .unwrap_or_else(|| panic!("cannot clone unknown context {source}"));
        let mut state = state.clone();
        state.clear_bound_shader();
        let id = self.insert(state);
        debug!(%source, %id, "cloned rendering context");
        id
    }

    fn insert(&mut self, state: RenderState) -> ContextId {
        let id = ContextId(self.next_id);
        self.next_id += 1;
        self.contexts.insert(id, state);
        id
    }

    /// Destroys a context, releasing its non-owning texture and shader
    /// references. Destroying the active context leaves the registry with no
    /// active context until the next [`Self::set_active`].
    pub fn destroy(&mut self, id: ContextId) {
        if self.contexts.remove(&id).is_none() {
            panic!("cannot destroy unknown context {id}");
        }
        if self.active == Some(id) {
            debug!(%id, "destroyed the active context");
            self.active = None;
        } else {
            debug!(%id, "destroyed context");
        }
    }

    /// Makes `id` the active context, replaying its entire cached state to
    /// the device. Activating the already-active context does nothing.
    pub fn set_active(&mut self, id: ContextId) {
        if self.active == Some(id) {
            trace!(%id, "context is already active");
            return;
        }
        let state = self
            .contexts
            .get_mut(&id)
            .unwrap_or_else(|| panic!("cannot activate unknown context {id}"));
        debug!(%id, "activating context; resynchronizing device state");
        state.apply_all(&mut self.sink);
        self.active = Some(id);
    }

    pub fn active(&self) -> Option<ContextId> {
        self.active
    }

    /// Read-only view of any live context's cached state.
    pub fn state(&self, id: ContextId) -> &RenderState {
        self.contexts
            .get(&id)
            .unwrap_or_else(|| panic!("unknown context {id}"))
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// The active context's setter surface.
    ///
    /// Panics when no context is active; callers activate one first.
    pub fn current(&mut self) -> ActiveContext<'_, S> {
        let id = self
            .active
            .unwrap_or_else(|| panic!("no rendering context is active"));
        let state = self
            .contexts
            .get_mut(&id)
            .unwrap_or_else(|| panic!("active context {id} is not registered"));
        ActiveContext {
            state,
            sink: &mut self.sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Direct access to the sink. Commands submitted this way bypass every
    /// cache; the next resync will overwrite whatever was written.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Whether `shared` is the shader bound on the active context. This is
    /// the test that decides between immediate and deferred uniform writes.
    pub(crate) fn shader_is_bound(&self, shared: &Rc<RefCell<ShaderShared>>) -> bool {
        let Some(id) = self.active else {
            return false;
        };
        let Some(state) = self.contexts.get(&id) else {
            return false;
        };
        state.bound_shader_ptr() == Some(Rc::as_ptr(shared))
    }
}

/// Borrow of the active context plus the sink: the narrow setter API the
/// rendering call sites use.
pub struct ActiveContext<'a, S: CommandSink> {
    state: &'a mut RenderState,
    sink: &'a mut S,
}

impl<'a, S: CommandSink> ActiveContext<'a, S> {
    pub fn state(&self) -> &RenderState {
        self.state
    }

    pub fn set_cull_enabled(&mut self, enabled: bool) {
        self.state.set_cull_enabled(self.sink, enabled);
    }

    pub fn set_cull_face(&mut self, face: Face) {
        self.state.set_cull_face(self.sink, face);
    }

    pub fn set_front_face(&mut self, front: Winding) {
        self.state.set_front_face(self.sink, front);
    }

    pub fn set_depth_map_enabled(&mut self, enabled: bool) {
        self.state.set_depth_map_enabled(self.sink, enabled);
    }

    pub fn set_depth_range(&mut self, near: f32, far: f32) {
        self.state.set_depth_range(self.sink, near, far);
    }

    pub fn set_w_scale(&mut self, w_scale: f32) {
        self.state.set_w_scale(self.sink, w_scale);
    }

    pub fn set_polygon_offset(&mut self, enabled: bool, units: f32) {
        self.state.set_polygon_offset(self.sink, enabled, units);
    }

    pub fn set_scissor(&mut self, mode: ScissorMode, rect: Rect) {
        self.state.set_scissor(self.sink, mode, rect);
    }

    pub fn set_alpha_test(&mut self, enabled: bool, func: CompareFunc, reference: u8) {
        self.state.set_alpha_test(self.sink, enabled, func, reference);
    }

    pub fn set_stencil_test(
        &mut self,
        enabled: bool,
        func: CompareFunc,
        reference: u8,
        input_mask: u8,
        write_mask: u8,
    ) {
        self.state
            .set_stencil_test(self.sink, enabled, func, reference, input_mask, write_mask);
    }

    pub fn set_stencil_ops(&mut self, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) {
        self.state.set_stencil_ops(self.sink, fail, depth_fail, pass);
    }

    pub fn set_depth_test(&mut self, enabled: bool, func: CompareFunc) {
        self.state.set_depth_test(self.sink, enabled, func);
    }

    pub fn set_depth_write(&mut self, enabled: bool) {
        self.state.set_depth_write(self.sink, enabled);
    }

    pub fn set_color_write(&mut self, color_mask: WriteMask) {
        self.state.set_color_write(self.sink, color_mask);
    }

    pub fn set_early_depth_test(&mut self, enabled: bool, func: EarlyDepthFunc, clear_value: u32) {
        self.state
            .set_early_depth_test(self.sink, enabled, func, clear_value);
    }

    pub fn set_blend_enabled(&mut self, enabled: bool) {
        self.state.set_blend_enabled(self.sink, enabled);
    }

    pub fn set_blend_function(
        &mut self,
        color_eq: BlendEquation,
        alpha_eq: BlendEquation,
        src: BlendFactor,
        dst: BlendFactor,
    ) {
        self.state
            .set_blend_function(self.sink, color_eq, alpha_eq, src, dst);
    }

    pub fn set_blend_function_separate(&mut self, config: BlendConfig) {
        self.state.set_blend_function_separate(self.sink, config);
    }

    pub fn set_blend_color(&mut self, color: [u8; 4]) {
        self.state.set_blend_color(self.sink, color);
    }

    pub fn set_logic_op_enabled(&mut self, enabled: bool) {
        self.state.set_logic_op_enabled(self.sink, enabled);
    }

    pub fn set_logic_op(&mut self, op: LogicOp) {
        self.state.set_logic_op(self.sink, op);
    }

    pub fn set_fragment_op_mode(&mut self, mode: FragmentOpMode) {
        self.state.set_fragment_op_mode(self.sink, mode);
    }

    pub fn set_viewport(&mut self, rect: Rect) {
        self.state.set_viewport(self.sink, rect);
    }

    pub fn bind_texture(&mut self, unit: usize, texture: Option<TextureHandle>) {
        self.state.bind_texture(self.sink, unit, texture);
    }

    pub fn bind_shader(&mut self, shader: &ShaderObject) {
        self.state.bind_shader(self.sink, shader);
    }
}
