use super::*;
use crate::testing::{lif_arch, lif_neuron, lif_program, wide_spike};

fn program_hash(program: &crate::ir::IrProgram) -> ContentHash {
    let mut hasher = PlanHasher::new();
    hasher.write_program(program);
    hasher.finish()
}

#[test]
fn test_hex_and_short_forms() {
    let hash = ContentHash::zero();
    assert_eq!(hash.to_hex(), "0".repeat(64));
    assert_eq!(hash.to_short(), "00000000");
    assert_eq!(format!("{:?}", hash), "ContentHash(00000000)");
}

#[test]
fn test_empty_stream_matches_blake3() {
    let hash = PlanHasher::new().finish();
    assert_eq!(hash.0, *blake3::hash(b"").as_bytes());
}

#[test]
fn test_strings_are_length_prefixed() {
    let mut a = PlanHasher::new();
    a.write_str("ab");
    a.write_str("c");
    let mut b = PlanHasher::new();
    b.write_str("a");
    b.write_str("bc");
    assert_ne!(a.finish(), b.finish(), "boundaries must affect the hash");
}

#[test]
fn test_identical_programs_hash_identically() {
    assert_eq!(program_hash(&lif_program()), program_hash(&lif_program()));
}

#[test]
fn test_program_changes_change_the_hash() {
    let arch = lif_arch();
    let one = crate::api::lower_to_ir(&arch, &wide_spike([8, 8, 6], 1), &lif_neuron(&arch)).unwrap();
    let two = crate::api::lower_to_ir(&arch, &wide_spike([8, 8, 6], 2), &lif_neuron(&arch)).unwrap();
    let wider =
        crate::api::lower_to_ir(&arch, &wide_spike([8, 8, 7], 1), &lif_neuron(&arch)).unwrap();
    assert_ne!(program_hash(&one), program_hash(&two));
    assert_ne!(program_hash(&one), program_hash(&wider));
}

#[test]
fn test_recorded_transforms_are_hashed() {
    let mut program = lif_program();
    let before = program_hash(&program);
    program.record_transform(crate::ir::IrTransformKind::ApplyPacking, Some("words=1".into()));
    assert_ne!(before, program_hash(&program));
}

fn layout_hash(plan: &crate::layout::LayoutPlan) -> ContentHash {
    let mut hasher = PlanHasher::new();
    hasher.write_layout(plan);
    hasher.finish()
}

#[test]
fn test_layout_list_boundaries_are_hashed() {
    use crate::layout::{DynParamPlan, RegisterDesc};

    let arch = lif_arch();
    let kernel = crate::api::compile(
        &arch,
        &crate::testing::lif_spike(),
        &lif_neuron(&arch),
        &crate::api::CompileOptions::default(),
    )
    .unwrap();

    let mut as_array = kernel.layout.clone();
    as_array
        .dynamic
        .as_mut()
        .expect("vm is dynamic")
        .extra
        .push(DynParamPlan {
            field: "trace".to_string(),
            bit_width: 4,
            count: 9,
        });
    let mut as_register = kernel.layout.clone();
    as_register.registers.registers.insert(
        0,
        RegisterDesc {
            name: "trace".to_string(),
            width: 4,
            init: 9,
        },
    );
    assert_ne!(
        layout_hash(&as_array),
        layout_hash(&as_register),
        "same entry in adjacent lists must hash differently"
    );
}
