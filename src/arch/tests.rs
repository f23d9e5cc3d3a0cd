use super::*;

fn lif_params() -> Vec<StaticParamDescriptor> {
    vec![
        StaticParamDescriptor::new("threshold", 8).unwrap(),
        StaticParamDescriptor::new("reset", 8).unwrap(),
        StaticParamDescriptor::new("leak", 6).unwrap(),
    ]
}

#[test]
fn test_bit_width_for_count() {
    assert_eq!(bit_width_for_count(0), 1);
    assert_eq!(bit_width_for_count(1), 1);
    assert_eq!(bit_width_for_count(2), 1);
    assert_eq!(bit_width_for_count(4), 2);
    assert_eq!(bit_width_for_count(5), 3);
    assert_eq!(bit_width_for_count(256), 8);
    assert_eq!(bit_width_for_count(257), 9);
}

#[test]
fn test_derived_widths_two_layers() {
    let arch = ArchDescriptor::fully_connected(vec![4, 3], lif_params()).unwrap();
    let w = arch.derive_widths();
    assert_eq!(w.layer_index_width, 1);
    assert_eq!(w.neuron_index_widths, vec![2, 2]);
    assert_eq!(w.total_neuron_count, 7);
    assert_eq!(w.neuron_global_id_width, 3);
    assert_eq!(w.total_synapse_count, 12);
    assert_eq!(w.synapse_address_width, 4);
}

#[test]
fn test_pre_post_counts() {
    let arch = ArchDescriptor::fully_connected(vec![4, 3, 2], vec![]).unwrap();
    assert_eq!(arch.pre_count(), 4);
    assert_eq!(arch.post_count(), 3, "fully connected uses the second layer");
    assert_eq!(arch.last_layer_count(), 2);

    let custom = ArchDescriptor::new(
        3,
        vec![4, 3, 2],
        Connectivity::from_id(Some("sparse")),
        vec![],
    )
    .unwrap();
    assert_eq!(custom.post_count(), 2, "other topologies use the last layer");
    assert_eq!(custom.total_synapse_count(), 0);
}

#[test]
fn test_zero_neuron_layer_is_accepted() {
    let arch = ArchDescriptor::fully_connected(vec![4, 0], vec![]).unwrap();
    assert_eq!(arch.last_layer_count(), 0);
    assert_eq!(arch.total_synapse_count(), 0);
}

#[test]
fn test_invalid_architectures_rejected() {
    assert!(matches!(
        ArchDescriptor::new(0, vec![], Connectivity::FullyConnected, vec![]),
        Err(CompileError::ConfigurationViolation { .. })
    ));
    assert!(
        ArchDescriptor::new(2, vec![4], Connectivity::FullyConnected, vec![]).is_err(),
        "layer list must match layer count"
    );
    assert!(StaticParamDescriptor::new("threshold", 0).is_err());
    assert!(StaticParamDescriptor::new("  ", 8).is_err());

    let dup = vec![
        StaticParamDescriptor::new("leak", 6).unwrap(),
        StaticParamDescriptor::new("leak", 4).unwrap(),
    ];
    assert!(ArchDescriptor::fully_connected(vec![2, 2], dup).is_err());
}

#[test]
fn test_connectivity_ids() {
    assert_eq!(Connectivity::from_id(None), Connectivity::FullyConnected);
    assert_eq!(Connectivity::from_id(Some("")), Connectivity::FullyConnected);
    assert_eq!(
        Connectivity::from_id(Some("fully_connected")),
        Connectivity::FullyConnected
    );
    assert_eq!(
        Connectivity::from_id(Some("ring")).id(),
        "ring",
        "unknown ids are kept verbatim"
    );
}

#[test]
fn test_architecture_from_document() {
    let doc = r#"{
        "layerCount": 2,
        "neuronsPerLayer": [4, 3],
        "staticParameters": [
            { "name": "threshold", "width": 8 },
            { "name": "leak", "width": 6 }
        ]
    }"#;
    let arch: ArchDescriptor = serde_json::from_str(doc).unwrap();
    assert_eq!(arch.layer_count(), 2);
    assert_eq!(arch.connectivity(), &Connectivity::FullyConnected);
    assert_eq!(arch.static_parameter("leak").map(|p| p.width()), Some(6));
}

#[test]
fn test_document_validation_applies() {
    let doc = r#"{ "layerCount": 3, "neuronsPerLayer": [4, 3] }"#;
    let err = serde_json::from_str::<ArchDescriptor>(doc).unwrap_err();
    assert!(
        err.to_string().contains("must match layer count"),
        "unexpected error: {}",
        err
    );

    let doc = r#"{ "layerCount": 1, "neuronsPerLayer": [4],
                   "staticParameters": [{ "name": "t", "width": 0 }] }"#;
    assert!(serde_json::from_str::<ArchDescriptor>(doc).is_err());
}
