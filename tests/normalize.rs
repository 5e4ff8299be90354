use erp_catalog_sync::SyncError;
use erp_catalog_sync::model::{CategoryEntry, CategoryPath, Field, FieldValue, RawRecord};
use erp_catalog_sync::normalize::{
    flatten_categories, normalize_catalog, normalize_record, parse_decimal, parse_number,
};
use serde_json::{Value, json};

fn record(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture is not an object: {other}"),
    }
}

#[test]
fn decimal_comma_strings_are_parsed() {
    assert_eq!(parse_decimal("4,5"), 4.5);
    assert_eq!(parse_decimal("1.234,56"), 1234.56);
    assert_eq!(parse_decimal("12.5"), 12.5);
    assert_eq!(parse_decimal(" 7 "), 7.0);
    assert_eq!(parse_decimal(""), 0.0);
    assert!(parse_decimal("n/a").is_nan());
    assert!(parse_decimal("inf").is_nan());
    assert!(parse_decimal("1,2,3").is_nan());
}

#[test]
fn non_string_numbers_pass_through() {
    assert_eq!(parse_number(&json!(3)), FieldValue::Number(3.0));
    assert_eq!(parse_number(&json!(null)), FieldValue::Null);
    assert_eq!(parse_number(&json!("0,75")), FieldValue::Number(0.75));
}

#[test]
fn category_tree_is_flattened_to_leaves() {
    let tree = json!([
        {
            "tree_node_label": "Furniture",
            "tree_node_list": [
                { "tree_node_label": "Chairs", "tree_node_list": [] },
                {
                    "tree_node_label": "Tables",
                    "tree_node_list": [ { "tree_node_label": "Dining" } ]
                },
                { "tree_node_list": [ { "tree_node_label": "Hidden" } ] }
            ]
        },
        { "tree_node_label": "Outdoor" },
        { "tree_node_label": "" }
    ]);

    let entries = flatten_categories(&tree).expect("tree is an array");

    assert_eq!(
        entries,
        vec![
            CategoryEntry {
                category: CategoryPath::Path(vec!["Furniture".into(), "Chairs".into()]),
            },
            CategoryEntry {
                category: CategoryPath::Path(vec![
                    "Furniture".into(),
                    "Tables".into(),
                    "Dining".into()
                ]),
            },
            CategoryEntry {
                category: CategoryPath::Label("Outdoor".into()),
            },
        ]
    );
}

#[test]
fn non_array_category_tree_is_undefined() {
    assert_eq!(flatten_categories(&json!({ "tree_node_label": "Chairs" })), None);
    assert_eq!(flatten_categories(&json!([])), Some(vec![]));
}

#[test]
fn record_is_projected_onto_the_canonical_fields() {
    let raw = record(json!({
        "count_code": "00042",
        "code": "CH-01",
        "name": "Chair",
        "barcode": null,
        "sales": "true",
        "height": "92,5",
        "weight": 4.2,
        "koli_package_amount": 6,
        "localization": "A-3-2",
        "category_tree_list": [ { "tree_node_label": "Chairs" } ]
    }));

    let product = normalize_record(&raw, 0).expect("record normalized");

    assert_eq!(product.code, "CH-01");
    assert_eq!(product.count_code, Some(FieldValue::from("00042")));
    assert_eq!(product.barcode, Some(FieldValue::Null));
    assert_eq!(product.sales, Some(FieldValue::from("true")));
    assert_eq!(product.height, Some(FieldValue::Number(92.5)));
    assert_eq!(product.weight, Some(FieldValue::Number(4.2)));
    assert_eq!(product.unit, None);
    assert_eq!(
        product.get(Field::Categories),
        Some(FieldValue::List(vec![
            CategoryEntry {
                category: CategoryPath::Label("Chairs".into())
            }
            .to_field_value()
        ]))
    );

    let json = serde_json::to_value(&product).expect("product serialised");
    assert_eq!(
        json,
        json!({
            "count_code": "00042",
            "code": "CH-01",
            "barcode": null,
            "name": "Chair",
            "sales": "true",
            "height": 92.5,
            "weight": 4.2,
            "categories": [ { "category": "Chairs" } ],
            "koli_package_amount": 6
        })
    );
}

#[test]
fn numeric_codes_are_rendered_as_text() {
    let product = normalize_record(&record(json!({ "code": 1200 })), 0).expect("normalized");
    assert_eq!(product.code, "1200");
}

#[test]
fn whole_float_codes_join_like_integers() {
    let whole = normalize_record(&record(json!({ "code": 1200.0 })), 0).expect("normalized");
    let fractional = normalize_record(&record(json!({ "code": 12.5 })), 0).expect("normalized");

    assert_eq!(whole.code, "1200");
    assert_eq!(fractional.code, "12.5");
}

#[test]
fn records_without_code_are_rejected_with_their_position() {
    let records = vec![
        record(json!({ "code": "A" })),
        record(json!({ "name": "nameless" })),
    ];

    let error = normalize_catalog(&records).expect_err("missing code");

    assert!(matches!(error, SyncError::MissingCode { position: 1 }));
}

#[test]
fn catalog_order_is_preserved() {
    let records = vec![
        record(json!({ "code": "C" })),
        record(json!({ "code": "A" })),
        record(json!({ "code": "B" })),
    ];

    let products = normalize_catalog(&records).expect("catalog normalized");

    let codes: Vec<&str> = products.iter().map(|product| product.code.as_str()).collect();
    assert_eq!(codes, vec!["C", "A", "B"]);
}
