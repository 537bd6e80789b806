//! Push → read round trips on an in-memory workbook

use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sheetbridge::adapter::{push_to_store, ReadDispatcher};
use sheetbridge::excel::MemoryWorkbook;
use sheetbridge::{
    AdapterError, CellValue, Diagnostics, Entity, PushConfig, PushItem, PushObject, PushType, ReadItem, ReadRequest,
    TypeDescriptor, TypeRegistry,
};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Section {
    depth: f64,
    width: f64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Beam {
    name: String,
    length: f64,
    count: u32,
    section: Section,
    grade: Option<String>,
}

fn beams() -> Vec<Beam> {
    vec![
        Beam {
            name: "B1".into(),
            length: 4.5,
            count: 2,
            section: Section { depth: 0.4, width: 0.2 },
            grade: Some("S355".into()),
        },
        Beam {
            name: "B2".into(),
            length: 6.25,
            count: 1,
            section: Section { depth: 0.5, width: 0.25 },
            grade: None,
        },
    ]
}

fn push(book: &mut MemoryWorkbook, objects: Vec<PushObject>, config: PushConfig) {
    let mut diagnostics = Diagnostics::new();
    let pushed = push_to_store(
        book,
        vec![PushItem::new(objects, Some(config))],
        PushType::AdapterDefault,
        &mut diagnostics,
    );
    assert!(!diagnostics.has_errors(), "{:?}", diagnostics);
    assert!(!pushed.is_empty());
}

fn read(book: &MemoryWorkbook, registry: &TypeRegistry, request: ReadRequest) -> (Vec<ReadItem>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let items = ReadDispatcher::new(book, registry).read(&request, &mut diagnostics);
    (items, diagnostics)
}

fn rows(items: &[ReadItem]) -> Vec<Vec<CellValue>> {
    items
        .iter()
        .map(|i| i.as_row().expect("row item").content.clone())
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// TYPED ROUND TRIPS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_typed_objects_survive_push_and_read() {
    let mut book = MemoryWorkbook::new();
    push(
        &mut book,
        PushObject::from_slice(&beams()).unwrap(),
        PushConfig::for_worksheet("Beams"),
    );

    let mut registry = TypeRegistry::new();
    registry.register(TypeDescriptor::of::<Beam>());
    let (items, diagnostics) = read(&book, &registry, ReadRequest::objects("Beams", "", Some("Beam")).unwrap());

    assert!(!diagnostics.has_errors(), "{:?}", diagnostics);
    let read_back: Vec<Beam> = items
        .iter()
        .map(|i| i.as_entity().unwrap().deserialize().unwrap())
        .collect();
    assert_eq!(read_back, beams());
}

#[test]
fn test_typed_read_with_explicit_columns() {
    let mut book = MemoryWorkbook::new();
    let config = PushConfig {
        worksheet: "Beams".into(),
        object_properties: vec!["Name".into(), "Count".into()],
        ..Default::default()
    };
    push(&mut book, PushObject::from_slice(&beams()).unwrap(), config);

    let mut registry = TypeRegistry::new();
    registry.register(TypeDescriptor::of::<Beam>());
    let (items, _) = read(&book, &registry, ReadRequest::objects("Beams", "", Some("Beam")).unwrap());

    let first: Beam = items[0].as_entity().unwrap().deserialize().unwrap();
    assert_eq!(
        first,
        Beam {
            name: "B1".into(),
            count: 2,
            ..Default::default()
        }
    );
}

#[test]
fn test_registered_alias_name() {
    let mut book = MemoryWorkbook::new();
    push(
        &mut book,
        PushObject::from_slice(&beams()).unwrap(),
        PushConfig::for_worksheet("Beams"),
    );

    let mut registry = TypeRegistry::new();
    registry.register(TypeDescriptor::of::<Beam>().named("SteelBeam"));
    let (items, _) = read(&book, &registry, ReadRequest::objects("Beams", "", Some("SteelBeam")).unwrap());

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_entity().unwrap().type_name, "SteelBeam");
}

#[test]
fn test_unregistered_type_is_schema_mismatch() {
    let mut book = MemoryWorkbook::new();
    push(
        &mut book,
        PushObject::from_slice(&beams()).unwrap(),
        PushConfig::for_worksheet("Beams"),
    );

    let (items, diagnostics) = read(
        &book,
        &TypeRegistry::new(),
        ReadRequest::objects("Beams", "", Some("Column")).unwrap(),
    );
    assert!(items.is_empty());
    assert!(diagnostics.has_error_kind("SchemaMismatch"));
}

// ═══════════════════════════════════════════════════════════════════════════
// BAG OBJECTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_header_round_trip_for_bag_objects() {
    let objects = vec![
        PushObject::Object(Entity::new("Node", json!({ "Name": "N1", "X": 1.5, "Y": 0.5, "Tag": "support" }))),
        PushObject::Object(Entity::new("Node", json!({ "Name": "N2", "X": 3.5, "Y": 2.25, "Tag": "free" }))),
    ];
    let mut book = MemoryWorkbook::new();
    push(&mut book, objects, PushConfig::for_worksheet("Nodes"));

    let (items, diagnostics) = read(&book, &TypeRegistry::new(), ReadRequest::objects("Nodes", "", None).unwrap());
    assert!(diagnostics.is_empty());

    let bags: Vec<_> = items.iter().map(|i| i.as_custom().unwrap()).collect();
    assert_eq!(bags.len(), 2);
    assert_eq!(bags[1].name, "N2");
    let keys: Vec<&str> = bags[0].custom_data.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["X", "Y", "Tag"]);
    assert_eq!(bags[1].custom_data["Y"], json!(2.25));
    assert_eq!(bags[1].custom_data["Tag"], json!("free"));
}

#[test]
fn test_guid_column_restores_identity() {
    let guid = "6f1c2a1e-8a4b-4c7f-9d3e-2b5a7c9e1f00";
    let objects = vec![PushObject::Object(Entity::new("Node", json!({ "Name": "N1", "Guid": guid })))];
    let mut book = MemoryWorkbook::new();
    push(&mut book, objects, PushConfig::for_worksheet("Nodes"));

    let (items, _) = read(&book, &TypeRegistry::new(), ReadRequest::objects("Nodes", "", None).unwrap());
    let bag = items[0].as_custom().unwrap();
    assert_eq!(bag.guid.to_string(), guid);
    assert!(bag.custom_data.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// LAYOUT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_name_value_table() {
    let objects = vec![
        PushObject::Object(Entity::new("Item", json!({ "Name": "A", "Value": 1 }))),
        PushObject::Object(Entity::new("Item", json!({ "Name": "B", "Value": 2 }))),
    ];
    let mut book = MemoryWorkbook::new();
    push(&mut book, objects, PushConfig::for_worksheet("Data"));

    let (items, _) = read(&book, &TypeRegistry::new(), ReadRequest::cell_values("Data", "").unwrap());
    assert_eq!(
        rows(&items),
        vec![
            vec![CellValue::from("Name"), CellValue::from("Value")],
            vec![CellValue::from("A"), CellValue::Int(1)],
            vec![CellValue::from("B"), CellValue::Int(2)],
        ]
    );
}

#[test]
fn test_transposed_table() {
    let objects = vec![
        PushObject::Object(Entity::new("Item", json!({ "Name": "A", "Value": 1 }))),
        PushObject::Object(Entity::new("Item", json!({ "Name": "B", "Value": 2 }))),
    ];
    let config = PushConfig {
        worksheet: "Data".into(),
        transpose_object_table: true,
        ..Default::default()
    };
    let mut book = MemoryWorkbook::new();
    push(&mut book, objects, config);

    let (items, _) = read(&book, &TypeRegistry::new(), ReadRequest::cell_values("Data", "").unwrap());
    assert_eq!(
        rows(&items),
        vec![
            vec![CellValue::from("Name"), CellValue::from("A"), CellValue::from("B")],
            vec![CellValue::from("Value"), CellValue::Int(1), CellValue::Int(2)],
        ]
    );
}

#[test]
fn test_deep_push_uses_dotted_columns() {
    let config = PushConfig {
        worksheet: "Beams".into(),
        go_deep_in_properties: true,
        properties_to_ignore: vec!["Grade".into()],
        ..Default::default()
    };
    let mut book = MemoryWorkbook::new();
    push(&mut book, PushObject::from_slice(&beams()).unwrap(), config);

    let (items, _) = read(&book, &TypeRegistry::new(), ReadRequest::cell_values("Beams", "A1:E1").unwrap());
    assert_eq!(
        rows(&items),
        vec![vec![
            CellValue::from("Name"),
            CellValue::from("Length"),
            CellValue::from("Count"),
            CellValue::from("Section.Depth"),
            CellValue::from("Section.Width"),
        ]]
    );
}

#[test]
fn test_without_header_data_starts_at_anchor() {
    let objects = vec![PushObject::Object(Entity::new("Item", json!({ "Name": "A", "Value": 1 })))];
    let config = PushConfig {
        worksheet: "Data".into(),
        include_property_names: false,
        starting_cell: "B3".parse().unwrap(),
        ..Default::default()
    };
    let mut book = MemoryWorkbook::new();
    push(&mut book, objects, config);

    let (items, _) = read(&book, &TypeRegistry::new(), ReadRequest::cell_values("Data", "B3:C3").unwrap());
    assert_eq!(rows(&items), vec![vec![CellValue::from("A"), CellValue::Int(1)]]);
}

// ═══════════════════════════════════════════════════════════════════════════
// RANGES AND FAILURES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_inverted_range_is_resolution_failure() {
    let mut book = MemoryWorkbook::new();
    push(
        &mut book,
        PushObject::from_slice(&beams()).unwrap(),
        PushConfig::for_worksheet("Beams"),
    );

    let (items, diagnostics) = read(&book, &TypeRegistry::new(), ReadRequest::cell_values("Beams", "C3:A1").unwrap());
    assert!(items.is_empty());
    assert!(diagnostics.has_error_kind("RangeResolutionFailure"));
}

#[test]
fn test_open_column_range_stops_at_last_used_row() {
    let mut book = MemoryWorkbook::new();
    push(
        &mut book,
        PushObject::from_slice(&beams()).unwrap(),
        PushConfig::for_worksheet("Beams"),
    );

    let (items, _) = read(&book, &TypeRegistry::new(), ReadRequest::cell_values("Beams", "A:A").unwrap());
    assert_eq!(
        rows(&items),
        vec![
            vec![CellValue::from("Name")],
            vec![CellValue::from("B1")],
            vec![CellValue::from("B2")],
        ]
    );
}

#[test]
fn test_batch_keeps_request_order_and_survives_failures() {
    let mut book = MemoryWorkbook::new();
    push(
        &mut book,
        PushObject::from_slice(&beams()).unwrap(),
        PushConfig::for_worksheet("Beams"),
    );

    let request = ReadRequest::batch(vec![
        ReadRequest::worksheets(None),
        ReadRequest::cell_values("Missing", "").unwrap(),
        ReadRequest::cell_values("Beams", "A2").unwrap(),
    ]);
    let (items, diagnostics) = read(&book, &TypeRegistry::new(), request);

    assert_eq!(items.len(), 2);
    assert!(matches!(items[0], ReadItem::Worksheet(_)));
    assert_eq!(rows(&items[1..]), vec![vec![CellValue::from("B1")]]);
    assert_eq!(
        diagnostics.errors().collect::<Vec<_>>(),
        vec![&AdapterError::SheetNotFound("Missing".into())]
    );
}

#[test]
fn test_unknown_request_type_is_unsupported() {
    let request: ReadRequest = serde_json::from_str(r#"{"type": "FilteredRequest"}"#).unwrap();
    let (items, diagnostics) = read(&MemoryWorkbook::new(), &TypeRegistry::new(), request);
    assert!(items.is_empty());
    assert!(diagnostics.has_error_kind("UnsupportedRequest"));
}
