use erp_catalog_sync::compare::Comparison;
use erp_catalog_sync::merge::{MergeOptions, PurchasingSource, Side, merge};
use erp_catalog_sync::model::{CategoryEntry, CategoryPath, Field, FieldValue, Product};

fn chair(count_code: &str) -> Product {
    Product::new("CH-01")
        .with(Field::CountCode, count_code)
        .with(Field::Name, "Chair")
        .with(Field::Unit, "kos")
        .with(Field::Sales, true)
        .with(Field::Service, false)
        .with(Field::Purchasing, true)
        .with(Field::Height, 92.5)
        .with_categories(vec![label("Chairs"), label("Outdoor")])
}

fn label(name: &str) -> CategoryEntry {
    CategoryEntry {
        category: CategoryPath::Label(name.to_string()),
    }
}

fn defaults() -> MergeOptions {
    MergeOptions::default()
}

#[test]
fn merging_a_catalog_with_itself_is_a_no_op() {
    let catalog = vec![
        chair("100"),
        Product::new("TB-07")
            .with(Field::Name, "Table")
            .with(Field::Weight, 12.0)
            .with_categories(vec![CategoryEntry {
                category: CategoryPath::Path(vec!["Furniture".into(), "Tables".into()]),
            }]),
        Product::new("LM-02").with(Field::Barcode, FieldValue::Null),
    ];

    let delta = merge(&catalog, &catalog, &defaults());

    assert!(delta.is_empty(), "unexpected delta: {delta:?}");
}

#[test]
fn unmatched_products_become_additions_without_count_code() {
    let only_a = Product::new("A-ONLY")
        .with(Field::CountCode, "1")
        .with(Field::Name, "Lamp");
    let only_b = Product::new("B-ONLY")
        .with(Field::CountCode, "2")
        .with(Field::Name, "Rug");
    let shared = chair("100");

    let delta = merge(
        &[only_a.clone(), shared.clone()],
        &[shared, only_b.clone()],
        &defaults(),
    );

    assert_eq!(delta.new_in_b, vec![only_a.without_count_code()]);
    assert_eq!(delta.new_in_a, vec![only_b.without_count_code()]);
    assert!(delta.new_in_b[0].count_code.is_none());
    assert!(delta.new_in_a[0].count_code.is_none());
    assert!(delta.changes_a.is_empty());
    assert!(delta.changes_b.is_empty());
}

#[test]
fn exempt_fields_are_never_diffed() {
    let a = chair("100");
    let b = chair("900")
        .with(Field::Sales, false)
        .with(Field::Service, true)
        .with(Field::Purchasing, false);

    let delta = merge(&[a], &[b], &defaults());

    assert!(delta.is_empty(), "unexpected delta: {delta:?}");
}

#[test]
fn exempt_fields_are_carried_through_on_updates() {
    let a = chair("100").with(Field::Name, "Chair");
    let b = chair("900")
        .with(Field::Name, "Table")
        .with(Field::Sales, false)
        .with(Field::Service, true)
        .with(Field::Purchasing, false);

    let delta = merge(&[a], &[b], &defaults());

    assert_eq!(delta.changes_b.len(), 1);
    let update = &delta.changes_b[0];
    assert_eq!(update.code, "CH-01");
    assert_eq!(update.changes.keys().copied().collect::<Vec<_>>(), vec![Field::Name]);
    assert_eq!(update.count_code, Some(FieldValue::from("900")));
    assert_eq!(update.sales, Some(FieldValue::Bool(true)));
    assert_eq!(update.service, Some(FieldValue::Bool(true)));
    assert_eq!(update.purchasing, Some(FieldValue::Bool(false)));
}

#[test]
fn case_only_differences_are_equal() {
    let a = chair("1").with(Field::Name, "Chair");
    let b = chair("2").with(Field::Name, "chair");

    let delta = merge(&[a], &[b], &defaults());

    assert!(delta.changes_a.is_empty());
    assert!(delta.changes_b.is_empty());
}

#[test]
fn authoritative_value_wins_a_conflict() {
    let a = chair("1").with(Field::Name, "Chair");
    let b = chair("2").with(Field::Name, "Table");

    let delta = merge(&[a], &[b], &defaults());

    assert!(delta.changes_a.is_empty());
    assert_eq!(delta.changes_b.len(), 1);
    assert_eq!(delta.changes_b[0].code, "CH-01");
    assert_eq!(delta.changes_b[0].get(Field::Name), Some(&FieldValue::from("Chair")));
}

#[test]
fn gaps_are_filled_from_the_other_side() {
    let a = chair("1");
    let b = chair("2").with(Field::Weight, 4.5);

    let delta = merge(&[a], &[b], &defaults());

    assert_eq!(delta.changes_a.len(), 1);
    assert_eq!(delta.changes_a[0].get(Field::Weight), Some(&FieldValue::Number(4.5)));
    assert!(delta.changes_b.is_empty());
}

#[test]
fn subordinate_gaps_are_filled_from_the_authoritative_side() {
    let a = chair("1").with(Field::Country, "SI");
    let b = chair("2");

    let delta = merge(&[a], &[b], &defaults());

    assert!(delta.changes_a.is_empty());
    assert_eq!(delta.changes_b[0].get(Field::Country), Some(&FieldValue::from("SI")));
}

#[test]
fn category_order_does_not_matter() {
    let a = chair("1").with_categories(vec![label("Chairs"), label("Outdoor")]);
    let b = chair("2").with_categories(vec![label("Outdoor"), label("Chairs")]);

    let delta = merge(&[a], &[b], &defaults());

    assert!(delta.is_empty());
}

#[test]
fn applying_changes_converges_the_subordinate_side() {
    let a = vec![
        chair("1").with(Field::Name, "Chair").with(Field::Country, "SI"),
        Product::new("TB-07").with(Field::Weight, 12.0),
    ];
    let b = vec![
        chair("2").with(Field::Name, "Stool").with(Field::Height, 40.0),
        Product::new("TB-07").with(Field::Weight, 11.0).with(Field::Unit, "kos"),
    ];

    let first = merge(&a, &b, &defaults());
    assert_eq!(first.changes_b.len(), 2);

    let updated_b: Vec<Product> = b
        .iter()
        .map(|product| {
            first
                .changes_b
                .iter()
                .find(|update| update.code == product.code)
                .map(|update| product.apply_update(update))
                .unwrap_or_else(|| product.clone())
        })
        .collect();

    let second = merge(&a, &updated_b, &defaults());
    assert!(second.changes_b.is_empty(), "unexpected: {:?}", second.changes_b);
    assert_eq!(second.changes_a, first.changes_a);
}

#[test]
fn purchasing_comes_from_the_targeted_record_by_default() {
    let a = chair("1").with(Field::Purchasing, true);
    let b = chair("2")
        .with(Field::Purchasing, false)
        .with(Field::Norm, "EN 1335");

    let delta = merge(&[a], &[b], &defaults());

    assert_eq!(delta.changes_a.len(), 1);
    assert_eq!(delta.changes_a[0].purchasing, Some(FieldValue::Bool(true)));
    assert_eq!(delta.changes_a[0].count_code, Some(FieldValue::from("1")));
}

#[test]
fn subordinate_purchasing_source_copies_the_other_record() {
    let a = chair("1").with(Field::Purchasing, true);
    let b = chair("2")
        .with(Field::Purchasing, false)
        .with(Field::Norm, "EN 1335");
    let options = MergeOptions {
        purchasing: PurchasingSource::Subordinate,
        ..defaults()
    };

    let delta = merge(&[a], &[b], &options);

    assert_eq!(delta.changes_a[0].purchasing, Some(FieldValue::Bool(false)));
}

#[test]
fn side_b_can_be_authoritative() {
    let a = chair("1")
        .with(Field::Name, "Chair")
        .with(Field::Sales, false);
    let b = chair("2")
        .with(Field::Name, "Armchair")
        .with(Field::Sales, true)
        .with(Field::Asset, "yes");
    let a_only = Product::new("A-ONLY");
    let options = MergeOptions {
        authoritative: Side::B,
        ..defaults()
    };

    let delta = merge(&[a, a_only.clone()], &[b], &options);

    assert_eq!(delta.changes_a.len(), 1);
    let update = &delta.changes_a[0];
    assert_eq!(update.get(Field::Name), Some(&FieldValue::from("Armchair")));
    assert_eq!(update.get(Field::Asset), Some(&FieldValue::from("yes")));
    assert_eq!(update.count_code, Some(FieldValue::from("1")));
    assert_eq!(update.sales, Some(FieldValue::Bool(true)));
    assert!(delta.changes_b.is_empty());
    assert_eq!(delta.new_in_b, vec![a_only]);
    assert!(delta.new_in_a.is_empty());
}

#[test]
fn duplicate_codes_merge_against_the_last_occurrence() {
    let a = vec![chair("1").with(Field::Name, "Chair")];
    let b = vec![
        chair("2").with(Field::Name, "Chair"),
        chair("3").with(Field::Name, "Bench"),
    ];

    let delta = merge(&a, &b, &defaults());

    assert_eq!(delta.changes_b.len(), 1);
    assert_eq!(delta.changes_b[0].count_code, Some(FieldValue::from("3")));
    assert_eq!(delta.changes_b[0].get(Field::Name), Some(&FieldValue::from("Chair")));
}

#[test]
fn unparseable_numbers_always_differ() {
    let a = chair("1").with(Field::Weight, f64::NAN);
    let b = chair("2").with(Field::Weight, f64::NAN);

    let delta = merge(&[a], &[b], &defaults());

    assert_eq!(delta.changes_b.len(), 1);
    let json = serde_json::to_value(&delta.changes_b[0]).expect("update serialised");
    assert_eq!(json["weight"], serde_json::Value::Null);
}

#[test]
fn loose_comparison_ignores_multiplicity() {
    let a = chair("1").with_categories(vec![label("Chairs"), label("Chairs"), label("Outdoor")]);
    let b = chair("2").with_categories(vec![label("Chairs"), label("Outdoor"), label("Outdoor")]);

    let strict = merge(&[a.clone()], &[b.clone()], &defaults());
    let loose = merge(
        &[a],
        &[b],
        &MergeOptions {
            comparison: Comparison::Loose,
            ..defaults()
        },
    );

    assert_eq!(strict.changes_b.len(), 1);
    assert!(strict.changes_b[0].changes.contains_key(&Field::Categories));
    assert!(loose.is_empty());
}

#[test]
fn updates_serialise_changed_fields_before_carried_ones() {
    let a = chair("1").with(Field::Name, "Chair").with(Field::Width, 45.0);
    let b = Product::new("CH-01")
        .with(Field::CountCode, "900")
        .with(Field::Name, "Stool")
        .with(Field::Unit, "kos")
        .with(Field::Height, 92.5)
        .with_categories(vec![label("Chairs"), label("Outdoor")]);

    let delta = merge(&[a], &[b], &defaults());
    let json = serde_json::to_string(&delta.changes_b[0]).expect("update serialised");

    assert_eq!(
        json,
        r#"{"name":"Chair","width":45,"count_code":"900","sales":true,"code":"CH-01"}"#
    );
}
