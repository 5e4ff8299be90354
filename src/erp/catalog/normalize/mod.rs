use serde_json::Value;
use tracing::debug;

use crate::erp::catalog::error::{Result, SyncError};
use crate::erp::catalog::model::{CategoryEntry, Field, FieldValue, Product, RawRecord};

/// Raw key holding the category tree of a product.
pub const CATEGORY_TREE_KEY: &str = "category_tree_list";
/// Label of a single category tree node.
pub const NODE_LABEL_KEY: &str = "tree_node_label";
/// Child list of a single category tree node.
pub const NODE_CHILDREN_KEY: &str = "tree_node_list";

/// Projects every raw record of a catalog into its canonical [`Product`],
/// preserving order.
pub fn normalize_catalog(records: &[RawRecord]) -> Result<Vec<Product>> {
    let products = records
        .iter()
        .enumerate()
        .map(|(position, record)| normalize_record(record, position))
        .collect::<Result<Vec<_>>>()?;
    debug!(product_count = products.len(), "normalized catalog");
    Ok(products)
}

/// Projects a single raw record into a [`Product`].
///
/// `position` is only used to point at the offending record when it has no
/// usable code.
pub fn normalize_record(record: &RawRecord, position: usize) -> Result<Product> {
    let mut product = Product::new(product_code(record, position)?);

    for field in Field::ALL {
        match field {
            Field::Code => {}
            Field::Categories => {
                product.categories = record.get(CATEGORY_TREE_KEY).and_then(flatten_categories);
            }
            field => {
                let Some(raw) = record.get(field.name()) else {
                    continue;
                };
                let value = if field.is_numeric() {
                    parse_number(raw)
                } else {
                    FieldValue::from(raw)
                };
                product.set(field, value);
            }
        }
    }

    Ok(product)
}

/// Join key of a raw record. Whole-number codes render without a fraction,
/// so `1.0` and `1` name the same product.
pub fn product_code(record: &RawRecord, position: usize) -> Result<String> {
    match record.get(Field::Code.name()) {
        Some(Value::String(code)) => Ok(code.clone()),
        Some(Value::Number(code)) => Ok(match code.as_f64() {
            Some(value) if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 => {
                (value as i64).to_string()
            }
            _ => code.to_string(),
        }),
        _ => Err(SyncError::MissingCode { position }),
    }
}

/// Coerces a raw numeric field. Strings are parsed as decimal-comma numbers,
/// everything else passes through unchanged.
pub fn parse_number(raw: &Value) -> FieldValue {
    match raw {
        Value::String(text) => FieldValue::Number(parse_decimal(text)),
        other => FieldValue::from(other),
    }
}

/// Parses `"4,5"`, `"1.234,56"` or `"4.5"` style strings.
///
/// When a comma is present it is the decimal separator and any periods before
/// it are thousands separators. Blank input is zero; anything else that does
/// not parse is NaN.
pub fn parse_decimal(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let normalized = match trimmed.split_once(',') {
        Some((integer, fraction)) => format!("{}.{fraction}", integer.replace('.', "")),
        None => trimmed.to_string(),
    };

    // Rust accepts "inf" and "NaN" literals; ERP data never means those.
    if normalized
        .chars()
        .any(|ch| ch.is_ascii_alphabetic() && ch != 'e' && ch != 'E')
    {
        return f64::NAN;
    }

    normalized.parse().unwrap_or(f64::NAN)
}

/// Flattens a raw category tree into one entry per leaf.
///
/// Returns `None` when the tree is not an array. Nodes without a label are
/// dropped together with their subtree.
pub fn flatten_categories(tree: &Value) -> Option<Vec<CategoryEntry>> {
    let Value::Array(roots) = tree else {
        return None;
    };

    let mut entries = Vec::new();
    for node in roots {
        collect_leaves(node, Vec::new(), &mut entries);
    }
    Some(entries)
}

fn collect_leaves(node: &Value, mut path: Vec<String>, entries: &mut Vec<CategoryEntry>) {
    let Some(label) = node_label(node) else {
        return;
    };
    path.push(label);

    match node.get(NODE_CHILDREN_KEY) {
        Some(Value::Array(children)) if !children.is_empty() => {
            for child in children {
                collect_leaves(child, path.clone(), entries);
            }
        }
        _ => entries.push(CategoryEntry::from_labels(path)),
    }
}

fn node_label(node: &Value) -> Option<String> {
    match node.get(NODE_LABEL_KEY)? {
        Value::String(label) if !label.is_empty() => Some(label.clone()),
        Value::Number(label) if label.as_f64() != Some(0.0) => Some(label.to_string()),
        _ => None,
    }
}
