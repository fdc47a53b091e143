use opal_gpu::{
    AttrFormat, AttrLayout, Command, ProgramHandle, RecordingSink, Stage, TextureHandle,
};
use opal_pipeline::{ContextPreset, ContextRegistry, ProgramMetadata, ShaderObject, StageMetadata};
use pretty_assertions::assert_eq;

type Registry = ContextRegistry<RecordingSink>;

fn meta() -> ProgramMetadata {
    ProgramMetadata {
        vertex: StageMetadata {
            float_rows: 24,
            symbols: vec![
                ("mvp".to_owned(), 0),
                ("normal_mtx".to_owned(), 4),
                ("tint".to_owned(), 8),
                ("bones".to_owned(), 9),
            ],
        },
        geometry: None,
    }
}

fn active_registry() -> Registry {
    let mut gx = ContextRegistry::new(RecordingSink::new());
    let ctx = gx.create(ContextPreset::Native);
    gx.set_active(ctx);
    gx.sink_mut().clear();
    gx
}

fn row(v: f32) -> [f32; 4] {
    [v, v + 0.25, v + 0.5, v + 0.75]
}

#[test]
fn deferred_writes_flush_in_fifo_order_exactly_once() {
    let mut gx = active_registry();
    let shader = ShaderObject::new(ProgramHandle(1), meta());

    // The shader is not bound anywhere: both writes must defer.
    assert!(shader.write_floats(&mut gx, Stage::Vertex, "tint", &[row(1.0)]));
    assert!(shader.write_floats(&mut gx, Stage::Vertex, "mvp", &[row(2.0); 4]));
    assert_eq!(gx.sink_mut().take(), vec![]);

    gx.current().bind_shader(&shader);
    assert_eq!(
        gx.sink_mut().take(),
        vec![
            Command::BindProgram(ProgramHandle(1)),
            Command::BindVertexLayout {
                attrs: AttrLayout::new(),
                buffers: Default::default(),
            },
            Command::FloatBlock {
                stage: Stage::Vertex,
                base_slot: 8,
                rows: vec![row(1.0)],
            },
            Command::FloatBlock {
                stage: Stage::Vertex,
                base_slot: 0,
                rows: vec![row(2.0); 4],
            },
        ]
    );

    // The queue drained: re-activating the context replays the bind but no
    // uniform data.
    let other = gx.create(ContextPreset::Native);
    let original = gx.active().unwrap();
    gx.set_active(other);
    gx.sink_mut().clear();
    gx.set_active(original);
    let float_writes = gx
        .sink_mut()
        .take()
        .into_iter()
        .filter(|c| matches!(c, Command::FloatBlock { .. } | Command::FloatRow { .. }))
        .count();
    assert_eq!(float_writes, 0);
}

#[test]
fn writes_while_bound_are_immediate() {
    let mut gx = active_registry();
    let shader = ShaderObject::new(ProgramHandle(1), meta());
    gx.current().bind_shader(&shader);
    gx.sink_mut().clear();

    assert!(shader.write_floats(&mut gx, Stage::Vertex, "tint", &[row(3.0)]));
    assert_eq!(
        gx.sink_mut().take(),
        vec![Command::FloatBlock {
            stage: Stage::Vertex,
            base_slot: 8,
            rows: vec![row(3.0)],
        }]
    );

    // Nothing was queued, so a rebind of the same instance is a full no-op.
    gx.current().bind_shader(&shader);
    assert_eq!(gx.sink_mut().take(), vec![]);
}

#[test]
fn ranges_longer_than_four_rows_fall_back_to_row_writes() {
    let mut gx = active_registry();
    let shader = ShaderObject::new(ProgramHandle(1), meta());

    let rows: Vec<[f32; 4]> = (0..6).map(|i| row(i as f32)).collect();
    assert!(shader.write_floats(&mut gx, Stage::Vertex, "normal_mtx", &rows));
    gx.current().bind_shader(&shader);

    let commands = gx.sink_mut().take();
    let row_writes: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            Command::FloatRow { slot, row, .. } => Some((*slot, *row)),
            _ => None,
        })
        .collect();
    assert_eq!(
        row_writes,
        (0..6).map(|i| (4 + i as u8, row(i as f32))).collect::<Vec<_>>()
    );
    assert!(!commands.iter().any(|c| matches!(c, Command::FloatBlock { .. })));
}

#[test]
fn unknown_names_and_overruns_are_sentinels() {
    let mut gx = active_registry();
    let shader = ShaderObject::new(ProgramHandle(1), meta());

    assert!(!shader.write_floats(&mut gx, Stage::Vertex, "nope", &[row(0.0)]));
    assert!(!shader.write_floats(&mut gx, Stage::Geometry, "mvp", &[row(0.0)]));
    // 24-row table; writing 16 rows starting at slot 9 runs past the end.
    assert!(!shader.write_floats(&mut gx, Stage::Vertex, "bones", &[row(0.0); 16]));
    assert_eq!(gx.sink_mut().take(), vec![]);
}

#[test]
fn aliases_share_uniform_state_but_not_layouts() {
    let mut gx = active_registry();
    let original = ShaderObject::new(ProgramHandle(1), meta());
    let mut alias = original.clone();
    let mut attrs = AttrLayout::new();
    attrs.add(0, AttrFormat::F32, 3);
    alias.set_attr_layout(attrs.clone());

    // A write through the alias is visible through the original, and the
    // other way around.
    assert!(alias.write_floats(&mut gx, Stage::Vertex, "tint", &[row(9.0)]));
    assert_eq!(original.float_value(Stage::Vertex, 8), Some(row(9.0)));
    assert!(original.write_floats(&mut gx, Stage::Vertex, "mvp", &[row(1.0)]));
    assert_eq!(alias.float_value(Stage::Vertex, 0), Some(row(1.0)));

    // Dropping the alias leaves the shared cache intact.
    drop(alias);
    assert_eq!(original.float_value(Stage::Vertex, 8), Some(row(9.0)));

    // Binding the original then an alias of it re-binds layouts but not the
    // program.
    gx.current().bind_shader(&original);
    gx.sink_mut().clear();
    let mut second = original.clone();
    second.set_attr_layout(attrs);
    gx.current().bind_shader(&second);
    let commands = gx.sink_mut().take();
    assert!(!commands.iter().any(|c| matches!(c, Command::BindProgram(_))));
    assert!(commands.iter().any(|c| matches!(c, Command::BindVertexLayout { .. })));
}

#[test]
fn int_and_bool_slots_flush_only_when_dirty() {
    let mut gx = active_registry();
    let shader = ShaderObject::new(ProgramHandle(1), meta());

    assert!(shader.write_int(&mut gx, Stage::Vertex, 2, [1, 2, 3, 4]));
    assert!(shader.write_bool(&mut gx, Stage::Vertex, 0, true));
    assert_eq!(gx.sink_mut().take(), vec![]);

    gx.current().bind_shader(&shader);
    let commands = gx.sink_mut().take();
    assert_eq!(
        commands[2..],
        [
            Command::IntUniform {
                stage: Stage::Vertex,
                slot: 2,
                value: [1, 2, 3, 4],
            },
            Command::BoolUniform {
                stage: Stage::Vertex,
                slot: 0,
                value: true,
            },
        ]
    );

    // Dirty bits cleared: a later write while bound goes straight through.
    assert!(shader.write_bool(&mut gx, Stage::Vertex, 1, true));
    assert_eq!(
        gx.sink_mut().take(),
        vec![Command::BoolUniform {
            stage: Stage::Vertex,
            slot: 1,
            value: true,
        }]
    );
}

#[test]
fn uniform_writes_with_no_active_context_defer() {
    let mut gx = ContextRegistry::new(RecordingSink::new());
    let shader = ShaderObject::new(ProgramHandle(1), meta());
    assert!(shader.write_floats(&mut gx, Stage::Vertex, "tint", &[row(5.0)]));
    assert_eq!(gx.sink_mut().take(), vec![]);
    assert_eq!(shader.float_value(Stage::Vertex, 8), Some(row(5.0)));
}

#[test]
fn binding_a_different_program_rebinds_everything() {
    let mut gx = active_registry();
    let first = ShaderObject::new(ProgramHandle(1), meta());
    let second = ShaderObject::new(ProgramHandle(2), meta());

    gx.current().bind_shader(&first);
    gx.current().bind_texture(0, Some(TextureHandle(3)));
    gx.sink_mut().clear();

    gx.current().bind_shader(&second);
    let commands = gx.sink_mut().take();
    assert_eq!(commands[0], Command::BindProgram(ProgramHandle(2)));
    assert!(matches!(commands[1], Command::BindVertexLayout { .. }));
}
