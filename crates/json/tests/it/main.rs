//! Integration tests for the JSON codec.
//!
//! Sections go through the full cycle: mapper to tree, tree to JSON text,
//! and back.

use std::collections::BTreeMap;

use cfgtree::{
    Codec, ConverterRegistry, StructuralMapper,
    mapper::{Fields, Section},
};
use cfgtree_json::JsonCodec;
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("cfgtree=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, Default, PartialEq)]
enum Mode {
    #[default]
    Passive,
    Active,
}
cfgtree::enum_symbols!(Mode { Passive, Active });

#[derive(Debug, Default, PartialEq)]
struct Replica {
    host: String,
    lag_limit: u64,
}

impl Section for Replica {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("host", |s| &s.host, |s| &mut s.host);
        fields.field("lagLimit", |s| &s.lag_limit, |s| &mut s.lag_limit);
    }
}

#[derive(Debug, Default, PartialEq)]
struct Store {
    mode: Mode,
    capacity: u64,
    ratio: f32,
    labels: BTreeMap<String, String>,
    replica: Replica,
    standby: Option<Replica>,
}

impl Section for Store {
    fn describe(fields: &mut Fields<Self>) {
        fields
            .field("mode", |s| &s.mode, |s| &mut s.mode)
            .comment("Comments are not part of JSON");
        fields.field("capacity", |s| &s.capacity, |s| &mut s.capacity);
        fields.field("ratio", |s| &s.ratio, |s| &mut s.ratio);
        fields.field("labels", |s| &s.labels, |s| &mut s.labels);
        fields.section("replica", |s| &s.replica, |s| &mut s.replica);
        fields.optional_section("standby", |s| &s.standby, |s| &mut s.standby);
    }
}

fn sample() -> Store {
    let mut labels = BTreeMap::new();
    labels.insert("Zone".to_string(), "eu-west".to_string());
    Store {
        mode: Mode::Active,
        capacity: u64::MAX,
        ratio: 0.5,
        labels,
        replica: Replica {
            host: "replica-1".to_string(),
            lag_limit: 30,
        },
        standby: None,
    }
}

#[test]
fn test_section_survives_json() {
    let registry = ConverterRegistry::new();
    let mapper = StructuralMapper::new(&registry);
    let codec = JsonCodec::pretty();

    let mut out = Vec::new();
    codec
        .save(&mapper.convert(&sample()).unwrap(), &mut out)
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("\"lag-limit\": 30"), "{text}");
    assert!(!text.contains("standby"), "{text}");
    assert!(!text.contains("Comments"), "{text}");

    let tree = codec.load(&mut text.as_bytes()).unwrap();
    let mut store = Store::default();
    let report = mapper.fill(&tree, &mut store).unwrap();

    assert_eq!(store, sample());
    assert_eq!(report.inherited().len(), 1);
}

#[test]
fn test_hand_written_json_fills_with_relaxed_keys() {
    let registry = ConverterRegistry::new();
    let mapper = StructuralMapper::new(&registry);

    let text = r#"{
        "MODE": "passive",
        "Replica": { "Host": "r2", "lag-limit": "15" },
        "standby": { "host": "cold" }
    }"#;
    let tree = JsonCodec::new().load(&mut text.as_bytes()).unwrap();
    let store: Store = mapper.load(&tree).unwrap();

    assert_eq!(store.mode, Mode::Passive);
    assert_eq!(store.replica.host, "r2");
    assert_eq!(store.replica.lag_limit, 15);
    assert_eq!(
        store.standby,
        Some(Replica {
            host: "cold".to_string(),
            lag_limit: 0,
        })
    );
}

#[test]
fn test_wrong_json_types_are_conversion_errors() {
    let registry = ConverterRegistry::new();
    let mapper = StructuralMapper::new(&registry);

    let tree = JsonCodec::new()
        .load(&mut r#"{"capacity": [1, 2]}"#.as_bytes())
        .unwrap();
    let err = mapper.load::<Store>(&tree).unwrap_err();
    assert!(err.is_conversion_error());
}
