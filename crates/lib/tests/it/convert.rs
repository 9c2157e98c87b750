//! Tests for the converter registry.

use std::{any::Any, sync::Arc};

use cfgtree::{
    Convert, ConverterRegistry, Node,
    convert::{
        ConvertError, Converter, ConverterRegistryBuilder, LanguageTag, TypeDescriptor, TypeKey,
    },
    node::{KeyPolicy, Scalar},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::helpers::LogLevel;

const SHAPE: TypeKey = TypeKey::capability("shape");

#[derive(Debug, PartialEq)]
struct Circle;

#[derive(Debug, PartialEq)]
struct Square;

impl Convert for Circle {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>().extends(SHAPE, 1)
    }
}

impl Convert for Square {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>().extends(SHAPE, 1)
    }
}

/// Writes every shape as a generic marker.
struct ShapeConverter;

impl Converter for ShapeConverter {
    fn name(&self) -> &str {
        "shape"
    }

    fn to_node(
        &self,
        _value: &dyn Any,
        _ty: &TypeDescriptor,
        _registry: &ConverterRegistry,
    ) -> Result<Node, ConvertError> {
        Ok(Node::from("generic shape"))
    }

    fn from_node(
        &self,
        node: &Node,
        ty: &TypeDescriptor,
        _registry: &ConverterRegistry,
    ) -> Result<Box<dyn Any>, ConvertError> {
        if ty.key() == TypeKey::of::<Circle>() {
            Ok(Box::new(Circle))
        } else {
            Err(ConvertError::conversion(
                self.name(),
                node,
                "only circles are supported",
            ))
        }
    }
}

#[test]
fn test_exact_subtype_beats_supertype_and_siblings_keep_supertype() {
    let registry = ConverterRegistry::builder()
        .register(SHAPE, ShapeConverter)
        .register_fn::<Square, _, _>(
            "square",
            |_| Ok(Node::from("square")),
            |_| Ok(Square),
        )
        .build();

    assert_eq!(
        registry.convert_to_node(&Square).unwrap(),
        Node::from("square")
    );
    assert_eq!(
        registry.convert_to_node(&Circle).unwrap(),
        Node::from("generic shape")
    );
    assert_eq!(
        registry.convert_from_node::<Circle>(&Node::from("x")).unwrap(),
        Some(Circle)
    );
}

#[test]
fn test_fallback_chain_and_child_shadowing() {
    let parent = Arc::new(ConverterRegistry::new());
    let child = ConverterRegistryBuilder::new()
        .register_fn::<bool, _, _>(
            "yes-no",
            |v| Ok(Node::from(if *v { "yes" } else { "no" })),
            |node| {
                let text = node
                    .as_text()
                    .map_err(|e| ConvertError::conversion("yes-no", node, e.to_string()))?;
                Ok(text == "yes")
            },
        )
        .with_fallback(parent)
        .build();

    // Shadowed locally
    assert_eq!(child.convert_to_node(&true).unwrap(), Node::from("yes"));
    // Falls through to the built-ins
    assert_eq!(child.convert_to_node(&7u8).unwrap(), Node::from(7));
    assert_eq!(
        child.convert_from_node::<LogLevel>(&Node::from("warn")).unwrap(),
        Some(LogLevel::Warn)
    );
}

#[test]
fn test_empty_chain_reports_no_converter() {
    let registry = ConverterRegistry::builder().build();
    let err = registry.convert_to_node(&1i32).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("i32"));
}

#[test]
fn test_boolean_spellings() {
    let registry = ConverterRegistry::new();
    for text in ["true", "ON", "Yes", "1"] {
        assert_eq!(
            registry.convert_from_node::<bool>(&Node::from(text)).unwrap(),
            Some(true),
            "{text}"
        );
    }
    for text in ["FALSE", "off", "No", "0"] {
        assert_eq!(
            registry.convert_from_node::<bool>(&Node::from(text)).unwrap(),
            Some(false),
            "{text}"
        );
    }
    for text in ["", "2", "enabled", "nope"] {
        let err = registry
            .convert_from_node::<bool>(&Node::from(text))
            .unwrap_err();
        assert!(
            matches!(err, ConvertError::ConversionFailed { .. }),
            "{text}: {err}"
        );
    }
}

#[test]
fn test_locale_tags() {
    let registry = ConverterRegistry::new();
    let parse = |text: &str| {
        registry
            .convert_from_node::<LanguageTag>(&Node::from(text))
            .unwrap()
            .unwrap()
    };

    let tag = parse("en_US");
    assert_eq!((tag.language(), tag.country()), ("en", Some("US")));
    let tag = parse("en-us");
    assert_eq!((tag.language(), tag.country()), ("en", Some("US")));
    let tag = parse("eng_USA");
    assert_eq!((tag.language(), tag.country()), ("en", Some("US")));

    assert!(
        registry
            .convert_from_node::<LanguageTag>(&Node::from("-US"))
            .is_err()
    );
}

#[test]
fn test_built_in_values_round_trip() {
    let registry = ConverterRegistry::new();

    fn round_trip<T: Convert + PartialEq + std::fmt::Debug>(registry: &ConverterRegistry, value: T) {
        let node = registry.convert_to_node(&value).unwrap();
        let back: Option<T> = registry.convert_from_node(&node).unwrap();
        assert_eq!(back.as_ref(), Some(&value), "via {node}");
    }

    round_trip(&registry, true);
    round_trip(&registry, i8::MIN);
    round_trip(&registry, u32::MAX);
    round_trip(&registry, i64::MIN);
    round_trip(&registry, u64::MAX);
    round_trip(&registry, 2.5f32);
    round_trip(&registry, 0.1f64);
    round_trip(&registry, 'λ');
    round_trip(&registry, "text with spaces".to_string());
    round_trip(&registry, Uuid::new_v4());
    round_trip(&registry, DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap());
    round_trip(&registry, LanguageTag::new("no").with_country("NO").with_variant("NY"));
    round_trip(&registry, LanguageTag::new("EN").with_country("us"));
    round_trip(&registry, LanguageTag::new("Deutsch").with_country("Austria"));
    round_trip(&registry, LanguageTag::new("sr").with_variant("latn-x"));
    round_trip(&registry, LogLevel::Error);
    round_trip(&registry, vec![Some(1u16), None, Some(3)]);
}

#[test]
fn test_values_survive_text_form() {
    // Text-only formats hand every scalar back as a string
    let registry = ConverterRegistry::new();
    let id = Uuid::new_v4();
    let node = registry.convert_to_node(&id).unwrap();
    let text = Node::from(node.as_text().unwrap());
    assert_eq!(registry.convert_from_node::<Uuid>(&text).unwrap(), Some(id));

    let date = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
    let node = registry.convert_to_node(&date).unwrap();
    let text = Node::from(node.as_text().unwrap());
    assert_eq!(
        registry.convert_from_node::<DateTime<Utc>>(&text).unwrap(),
        Some(date)
    );

    let node = registry.convert_to_node(&0.1f64).unwrap();
    let text = Node::from(node.as_text().unwrap());
    assert_eq!(registry.convert_from_node::<f64>(&text).unwrap(), Some(0.1));
}

#[test]
fn test_enum_symbols_are_written_as_symbols() {
    let registry = ConverterRegistry::new();
    let node = registry.convert_to_node(&LogLevel::Warn).unwrap();
    assert_eq!(node.value(), Some(&Scalar::Symbol("Warn".to_string())));

    let err = registry
        .convert_from_node::<LogLevel>(&Node::from("verbose"))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Error, Warn, Info, Debug"), "{message}");
}

#[test]
fn test_conversion_error_carries_context() {
    let registry = ConverterRegistry::new();
    let err = registry
        .convert_from_node::<u8>(&Node::from("lots"))
        .unwrap_err();
    match err {
        ConvertError::ConversionFailed {
            converter,
            offending,
            source,
            ..
        } => {
            assert_eq!(converter, "u8");
            assert_eq!(offending, "lots");
            assert!(source.is_some());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_error_nodes_do_not_convert() {
    let registry = ConverterRegistry::new();
    let err = registry
        .convert_from_node::<String>(&Node::error("earlier failure"))
        .unwrap_err();
    assert!(err.is_conversion_error());
}

#[test]
fn test_key_policy_applies_to_converted_maps() {
    let registry = ConverterRegistryBuilder::with_builtins()
        .key_policy(KeyPolicy::Exact)
        .build();
    let mut values = std::collections::BTreeMap::new();
    values.insert("Key".to_string(), 1u8);
    values.insert("key".to_string(), 2u8);

    let node = registry.convert_to_node(&values).unwrap();
    let map = node.as_map().unwrap();
    assert_eq!(map.len(), 2);
    assert!(ConverterRegistry::new().convert_to_node(&values).is_err());
}

#[test]
fn test_registry_is_shared_across_threads() {
    let registry = Arc::new(ConverterRegistry::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let node = registry.convert_to_node(&LogLevel::Debug).unwrap();
                let level: Option<LogLevel> = registry.convert_from_node(&node).unwrap();
                (i, level)
            })
        })
        .collect();
    for handle in handles {
        let (_, level) = handle.join().unwrap();
        assert_eq!(level, Some(LogLevel::Debug));
    }
}
