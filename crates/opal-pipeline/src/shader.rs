//! Shader objects: compiled-program wrappers with cached uniform state.
//!
//! A [`ShaderObject`] wraps the opaque program handle produced by the
//! external loader, plus per-stage uniform caches that can be written while
//! the shader is not active. Inactive writes land in the cache and a FIFO
//! deferred queue; the queue is drained the next time the shader is bound.
//!
//! `Clone` produces an *alias*: the compiled program, uniform caches, queue
//! and lookup memo are shared with the originator through one
//! reference-counted cell, and only the vertex attribute/buffer layouts are
//! private to each instance. The shared cell is freed exactly once, when the
//! last instance drops.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use hashbrown::HashMap;
use opal_gpu::{
    AttrLayout, BufferLayout, CommandSink, ProgramHandle, Stage, BOOL_UNIFORM_SLOTS,
    FLOAT_UNIFORM_BLOCK_ROWS, INT_UNIFORM_SLOTS,
};
use tracing::trace;

use crate::registry::ContextRegistry;

/// Per-stage uniform-table metadata reported by the program loader.
#[derive(Clone, Debug, Default)]
pub struct StageMetadata {
    /// Number of vec4 rows in the stage's float-uniform table.
    pub float_rows: u8,
    /// Name → base slot for every uniform the compiler kept.
    pub symbols: Vec<(String, u8)>,
}

/// Loader output for one compiled program. The vertex stage is always
/// present; the geometry stage is optional.
#[derive(Clone, Debug)]
pub struct ProgramMetadata {
    pub vertex: StageMetadata,
    pub geometry: Option<StageMetadata>,
}

#[derive(Clone, Copy)]
struct DeferredRange {
    slot: u8,
    rows: u8,
}

struct StageUniforms {
    symbols: Vec<(String, u8)>,
    floats: Vec<[f32; 4]>,
    queue: VecDeque<DeferredRange>,
    /// Memoized name lookups. A `None` entry records a miss, so repeated
    /// lookups of absent names cost one hash probe.
    lookup: HashMap<String, Option<u8>>,
    ints: [[i32; 4]; INT_UNIFORM_SLOTS],
    int_dirty: [bool; INT_UNIFORM_SLOTS],
    bools: [bool; BOOL_UNIFORM_SLOTS],
    bool_dirty: [bool; BOOL_UNIFORM_SLOTS],
}

impl StageUniforms {
    fn new(meta: StageMetadata) -> Self {
        Self {
            floats: vec![[0.0; 4]; meta.float_rows as usize],
            symbols: meta.symbols,
            queue: VecDeque::new(),
            lookup: HashMap::new(),
            ints: [[0; 4]; INT_UNIFORM_SLOTS],
            int_dirty: [false; INT_UNIFORM_SLOTS],
            bools: [false; BOOL_UNIFORM_SLOTS],
            bool_dirty: [false; BOOL_UNIFORM_SLOTS],
        }
    }
}

/// State shared between a shader object and all of its aliases.
pub(crate) struct ShaderShared {
    program: ProgramHandle,
    stages: [Option<StageUniforms>; Stage::COUNT],
}

impl ShaderShared {
    pub(crate) fn program(&self) -> ProgramHandle {
        self.program
    }

    fn stage(&self, stage: Stage) -> Option<&StageUniforms> {
        self.stages[stage.index()].as_ref()
    }

    fn stage_mut(&mut self, stage: Stage) -> Option<&mut StageUniforms> {
        self.stages[stage.index()].as_mut()
    }
}

/// A compiled program plus its cached uniform state.
///
/// Cloning is cheap and produces an alias sharing all uniform state; see the
/// module docs.
#[derive(Clone)]
pub struct ShaderObject {
    shared: Rc<RefCell<ShaderShared>>,
    attrs: AttrLayout,
    buffers: BufferLayout,
}

impl ShaderObject {
    pub fn new(program: ProgramHandle, meta: ProgramMetadata) -> Self {
        let stages = [
            Some(StageUniforms::new(meta.vertex)),
            meta.geometry.map(StageUniforms::new),
        ];
        Self {
            shared: Rc::new(RefCell::new(ShaderShared { program, stages })),
            attrs: AttrLayout::new(),
            buffers: BufferLayout::new(),
        }
    }

    pub fn program(&self) -> ProgramHandle {
        self.shared.borrow().program
    }

    pub fn has_stage(&self, stage: Stage) -> bool {
        self.shared.borrow().stage(stage).is_some()
    }

    /// Replaces this instance's private attribute layout. Takes effect the
    /// next time the instance is bound.
    pub fn set_attr_layout(&mut self, attrs: AttrLayout) {
        self.attrs = attrs;
    }

    pub fn set_buffer_layout(&mut self, buffers: BufferLayout) {
        self.buffers = buffers;
    }

    pub fn attr_layout(&self) -> &AttrLayout {
        &self.attrs
    }

    pub fn buffer_layout(&self) -> &BufferLayout {
        &self.buffers
    }

    pub(crate) fn shared_cell(&self) -> &Rc<RefCell<ShaderShared>> {
        &self.shared
    }

    /// Resolves a uniform name to its base slot in `stage`'s float table.
    ///
    /// The first lookup of a name queries the program metadata; the result,
    /// including "not found", is memoized. `None` means the uniform does not
    /// exist; callers that require it must treat that as their own fatal
    /// error, callers that consider it optional skip the write.
    pub fn uniform_slot(&self, stage: Stage, name: &str) -> Option<u8> {
        let mut shared = self.shared.borrow_mut();
        let uniforms = shared.stage_mut(stage)?;
        if let Some(&cached) = uniforms.lookup.get(name) {
            return cached;
        }
        let found = uniforms
            .symbols
            .iter()
            .find(|(sym, _)| sym.as_str() == name)
            .map(|(_, slot)| *slot);
        uniforms.lookup.insert(name.to_owned(), found);
        found
    }

    /// Writes `rows` starting at the slot `name` resolves to. Returns `false`
    /// when the name is unknown, the stage is absent, or the rows would run
    /// past the stage's float table.
    pub fn write_floats<S: CommandSink>(
        &self,
        gx: &mut ContextRegistry<S>,
        stage: Stage,
        name: &str,
        rows: &[[f32; 4]],
    ) -> bool {
        match self.uniform_slot(stage, name) {
            Some(slot) => self.write_floats_at(gx, stage, slot, rows),
            None => false,
        }
    }

    /// Writes `rows` at a known slot.
    ///
    /// While this shader is bound on the active context, the hardware write
    /// is issued immediately; otherwise the rows land in the shared cache and
    /// a deferred entry is queued for the next bind.
    pub fn write_floats_at<S: CommandSink>(
        &self,
        gx: &mut ContextRegistry<S>,
        stage: Stage,
        slot: u8,
        rows: &[[f32; 4]],
    ) -> bool {
        if rows.is_empty() {
            return true;
        }
        let bound = gx.shader_is_bound(&self.shared);
        {
            let mut shared = self.shared.borrow_mut();
            let Some(uniforms) = shared.stage_mut(stage) else {
                return false;
            };
            let start = slot as usize;
            let Some(end) = start
                .checked_add(rows.len())
                .filter(|&end| end <= uniforms.floats.len())
            else {
                return false;
            };
            uniforms.floats[start..end].copy_from_slice(rows);
            if !bound {
                uniforms.queue.push_back(DeferredRange {
                    slot,
                    rows: rows.len() as u8,
                });
                return true;
            }
        }
        emit_float_rows(gx.sink_mut(), stage, slot, rows);
        true
    }

    /// Writes one of the stage's four integer-vector uniform slots.
    pub fn write_int<S: CommandSink>(
        &self,
        gx: &mut ContextRegistry<S>,
        stage: Stage,
        slot: usize,
        value: [i32; 4],
    ) -> bool {
        assert!(slot < INT_UNIFORM_SLOTS, "integer uniform slot {slot} out of range");
        let bound = gx.shader_is_bound(&self.shared);
        {
            let mut shared = self.shared.borrow_mut();
            let Some(uniforms) = shared.stage_mut(stage) else {
                return false;
            };
            uniforms.ints[slot] = value;
            if !bound {
                uniforms.int_dirty[slot] = true;
                return true;
            }
        }
        gx.sink_mut().write_int_uniform(stage, slot as u8, value);
        true
    }

    /// Writes one of the stage's two boolean uniform slots.
    pub fn write_bool<S: CommandSink>(
        &self,
        gx: &mut ContextRegistry<S>,
        stage: Stage,
        slot: usize,
        value: bool,
    ) -> bool {
        assert!(slot < BOOL_UNIFORM_SLOTS, "boolean uniform slot {slot} out of range");
        let bound = gx.shader_is_bound(&self.shared);
        {
            let mut shared = self.shared.borrow_mut();
            let Some(uniforms) = shared.stage_mut(stage) else {
                return false;
            };
            uniforms.bools[slot] = value;
            if !bound {
                uniforms.bool_dirty[slot] = true;
                return true;
            }
        }
        gx.sink_mut().write_bool_uniform(stage, slot as u8, value);
        true
    }

    /// Reads back a cached float row. Visible across all aliases of the same
    /// program.
    pub fn float_value(&self, stage: Stage, slot: u8) -> Option<[f32; 4]> {
        let shared = self.shared.borrow();
        shared.stage(stage)?.floats.get(slot as usize).copied()
    }
}

/// Flushes the shared deferred-uniform state: queued float ranges in FIFO
/// order, then dirty integer slots, then dirty boolean slots, per stage.
/// Runs each time the shader becomes active.
pub(crate) fn drain_deferred<S: CommandSink>(shared: &Rc<RefCell<ShaderShared>>, sink: &mut S) {
    let mut shared = shared.borrow_mut();
    for stage in Stage::ALL {
        let Some(uniforms) = shared.stage_mut(stage) else {
            continue;
        };
        let queued = uniforms.queue.len();
        while let Some(range) = uniforms.queue.pop_front() {
            let start = range.slot as usize;
            let end = (start + range.rows as usize).min(uniforms.floats.len());
            emit_float_rows(sink, stage, range.slot, &uniforms.floats[start..end]);
        }
        for slot in 0..INT_UNIFORM_SLOTS {
            if uniforms.int_dirty[slot] {
                uniforms.int_dirty[slot] = false;
                sink.write_int_uniform(stage, slot as u8, uniforms.ints[slot]);
            }
        }
        for slot in 0..BOOL_UNIFORM_SLOTS {
            if uniforms.bool_dirty[slot] {
                uniforms.bool_dirty[slot] = false;
                sink.write_bool_uniform(stage, slot as u8, uniforms.bools[slot]);
            }
        }
        if queued > 0 {
            trace!(%stage, queued, "drained deferred uniform writes");
        }
    }
}

/// Emits float rows the way the upload instruction can take them: one block
/// write for up to four contiguous rows, one row write per row beyond that.
fn emit_float_rows<S: CommandSink>(sink: &mut S, stage: Stage, slot: u8, rows: &[[f32; 4]]) {
    if rows.len() <= FLOAT_UNIFORM_BLOCK_ROWS {
        sink.write_float_block(stage, slot, rows);
    } else {
        for (i, row) in rows.iter().enumerate() {
            sink.write_float_row(stage, slot + i as u8, *row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_meta() -> ProgramMetadata {
        ProgramMetadata {
            vertex: StageMetadata {
                float_rows: 16,
                symbols: vec![("mvp".to_owned(), 0), ("tint".to_owned(), 4)],
            },
            geometry: None,
        }
    }

    #[test]
    fn shared_state_is_freed_exactly_once_by_the_last_alias() {
        let original = ShaderObject::new(ProgramHandle(7), test_meta());
        let alias = original.clone();
        let probe = Rc::downgrade(&original.shared);

        drop(alias);
        assert!(probe.upgrade().is_some(), "alias drop must not free shared state");
        drop(original);
        assert!(probe.upgrade().is_none());
    }

    #[test]
    fn lookup_memoizes_misses_with_a_single_entry() {
        let shader = ShaderObject::new(ProgramHandle(1), test_meta());
        assert_eq!(shader.uniform_slot(Stage::Vertex, "missing"), None);
        assert_eq!(shader.uniform_slot(Stage::Vertex, "missing"), None);
        assert_eq!(shader.uniform_slot(Stage::Vertex, "tint"), Some(4));

        let shared = shader.shared.borrow();
        let lookup = &shared.stage(Stage::Vertex).unwrap().lookup;
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get("missing"), Some(&None));
    }

    #[test]
    fn geometry_stage_is_absent_unless_declared() {
        let shader = ShaderObject::new(ProgramHandle(1), test_meta());
        assert!(shader.has_stage(Stage::Vertex));
        assert!(!shader.has_stage(Stage::Geometry));
        assert_eq!(shader.uniform_slot(Stage::Geometry, "mvp"), None);
    }
}
