//! End-to-end pipeline tests: load a realistic document, edit it through the session,
//! and check the re-serialized text against a fresh reload at every step.

use serde_yaml::Value;

use regmap::loader::{PathSeg, Session, dump, normalize, parse_document};
use regmap::map::{LayoutIssue, RegisterNode};

const TIMER_DOC: &str = "\
name: soc_timers
description: timer subsystem register map
address_blocks:
  - name: timer0
    base_address: 0x4001_0000
    size: 4K
    usage: registers
    registers:
      - name: ctrl
        access: read-write
        fields:
          - name: enable
            bits: 0
            reset: 0
          - name: mode
            bits: \"[3:1]\"
            reset: 5
          - name: clk_sel
            bits: \"[5:4]\"
            reset: 1
          - name: irq_en
            bits: 6
            reset: 1
      - name: chans
        count: 4
        stride: 8
        registers:
          - name: chan
            fields:
              - name: value
                bits: \"[15:0]\"
      - name: status
        access: read-only
        fields:
          - name: busy
            bits: 0
          - name: done
            bits: \"[7:5]\"
";

fn key(name: &str) -> PathSeg {
    PathSeg::Key(name.to_string())
}

fn ctrl_path() -> Vec<PathSeg> {
    vec![
        key("address_blocks"),
        PathSeg::Index(0),
        key("registers"),
        PathSeg::Index(0),
    ]
}

#[test]
fn load_derives_sequential_addresses() {
    let map = normalize(&parse_document(TIMER_DOC).unwrap()).unwrap();
    let block = &map.blocks[0];
    assert_eq!(block.base_address, 0x4001_0000);
    assert_eq!(block.size, 4096, "4K suffix expands to bytes");

    assert_eq!(block.nodes[0].address_offset(), 0, "ctrl at block start");
    match &block.nodes[1] {
        RegisterNode::Array(array) => {
            assert_eq!(array.address_offset, 4, "array right after the 32-bit ctrl");
            assert_eq!(array.element_offset(3), 4 + 3 * 8);
        }
        other => panic!("expected array node, got {other:?}"),
    }
    assert_eq!(
        block.nodes[2].address_offset(),
        4 + 4 * 8,
        "status continues from the array's end, not from 0"
    );
    assert_eq!(block.node_address(2), Some(0x4001_0000 + 36));
}

#[test]
fn loaded_register_aggregates_documented_reset() {
    let map = normalize(&parse_document(TIMER_DOC).unwrap()).unwrap();
    let ctrl = map.register("timer0", "ctrl").unwrap();
    assert_eq!(ctrl.reset_value(), 0x52);
}

#[test]
fn advisory_diagnostics_do_not_block_loading() {
    let map = normalize(&parse_document(TIMER_DOC).unwrap()).unwrap();
    let status = map.register("timer0", "status").unwrap();
    // busy at bit 0, done at [7:5]: bits 1..=4 are a gap; the document still loads.
    let issues = status.detect_overlaps_and_gaps();
    assert_eq!(issues.as_slice(), [LayoutIssue::Gap { lo: 1, hi: 4 }]);
}

#[test]
fn canonical_dump_reloads_to_the_same_model() {
    let map = normalize(&parse_document(TIMER_DOC).unwrap()).unwrap();
    let canonical = dump(&map).unwrap();
    let reloaded = normalize(&parse_document(&canonical).unwrap()).unwrap();
    assert_eq!(reloaded, map);

    // Serializing the reload reproduces the same text: canonical output is a fixpoint.
    assert_eq!(dump(&reloaded).unwrap(), canonical);
}

#[test]
fn session_edit_then_reload_matches() {
    let mut session = Session::open(TIMER_DOC).unwrap();
    let raw_path = [
        Value::from("address_blocks"),
        Value::from(0u64),
        Value::from("registers"),
        Value::from(0u64),
        Value::from("fields"),
        Value::from(1u64),
        Value::from("reset"),
    ];
    session.apply(&raw_path, Value::from(2u64)).expect("wire edit");

    // The committed text is the only state; a fresh session over it sees the edit.
    let reopened = Session::open(session.text()).unwrap();
    let ctrl_reset = reopened
        .model()
        .unwrap()
        .register("timer0", "ctrl")
        .unwrap()
        .reset_value();
    assert_eq!(ctrl_reset, 0x54, "mode reset 5 -> 2 moves aggregate from 0x52");
}

#[test]
fn structural_op_sequence_stays_consistent() {
    let mut session = Session::open(TIMER_DOC).unwrap();

    let added = session.field_add(&ctrl_path(), Some(3)).expect("add");
    let model = session.model().unwrap();
    let ctrl = model.register("timer0", "ctrl").unwrap();
    assert_eq!(ctrl.fields.len(), 5);
    assert_eq!(ctrl.fields[4].name, added);
    assert_eq!(ctrl.fields[4].bit_offset, 7, "lowest free bit after irq_en");

    session.field_move(&ctrl_path(), 4, -1).expect("move");
    let model = session.model().unwrap();
    let ctrl = model.register("timer0", "ctrl").unwrap();
    let mut cursor = 0;
    for field in &ctrl.fields {
        assert_eq!(field.bit_offset, cursor, "contiguous after move: {}", field.name);
        cursor += field.bit_width;
    }

    session.field_delete(&ctrl_path(), 0).expect("delete");
    let model = session.model().unwrap();
    let ctrl = model.register("timer0", "ctrl").unwrap();
    assert_eq!(ctrl.fields.len(), 4);
    assert_eq!(
        ctrl.fields[0].bit_offset, 1,
        "delete does not repack the remaining fields"
    );
}

#[test]
fn rejected_wire_edit_keeps_document_intact() {
    let mut session = Session::open(TIMER_DOC).unwrap();
    let before = session.text().to_string();
    let raw_path = [
        Value::from("address_blocks"),
        Value::from(0u64),
        Value::from("registers"),
        Value::from(0u64),
        Value::from("fields"),
        Value::from(1u64),
        Value::from("reset"),
    ];
    assert!(session.apply(&raw_path, Value::from(16u64)).is_err(), "mode is 3 bits wide");
    assert_eq!(session.text(), before);

    let bad_op = [Value::from("__op"), Value::from("field-delete")];
    let payload: Value =
        serde_yaml::from_str("register: [address_blocks, 0, registers, 0]\nindex: 99\n").unwrap();
    assert!(session.apply(&bad_op, payload).is_err());
    assert_eq!(session.text(), before, "failed structural op commits nothing");
}

#[test]
fn array_template_edits_apply_to_every_element() {
    let mut session = Session::open(TIMER_DOC).unwrap();
    let template_path = vec![
        key("address_blocks"),
        PathSeg::Index(0),
        key("registers"),
        PathSeg::Index(1),
        key("registers"),
        PathSeg::Index(0),
    ];
    session.field_add(&template_path, None).expect("add to template");
    let model = session.model().unwrap();
    let block = &model.blocks[0];
    match &block.nodes[1] {
        RegisterNode::Array(array) => {
            assert_eq!(array.template.fields.len(), 2, "template gained a field");
            assert_eq!(
                array.template.fields[0].bit_offset, 16,
                "inserted at position 0, offset past the 16-bit value field"
            );
        }
        other => panic!("expected array node, got {other:?}"),
    }
}
