//! Bidirectional smart merge of two product catalogs.
//!
//! One side is authoritative: when both systems hold different values for
//! the same field, the authoritative value is pushed onto the other system.
//! Gaps are filled in both directions. Products missing on one side are
//! reported as additions for that side.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::erp::catalog::compare::{Comparison, values_equal};
use crate::erp::catalog::model::{Field, FieldValue, Product, ProductUpdate};

/// One of the two reconciled systems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    A,
    B,
}

/// Where the authoritative side's own update takes its `purchasing` flag from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PurchasingSource {
    /// Every update carries the `purchasing` value of the record it targets.
    #[default]
    OwnSystem,
    /// The authoritative side's update carries the subordinate record's
    /// `purchasing` value. Matches what existing downstream consumers of the
    /// delta files were built against.
    Subordinate,
}

/// Knobs of a merge run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    pub authoritative: Side,
    pub comparison: Comparison,
    pub purchasing: PurchasingSource,
}

/// The four delta buckets produced by a merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeDelta {
    /// Field updates System A has to apply.
    #[serde(rename = "changesA")]
    pub changes_a: Vec<ProductUpdate>,
    /// Field updates System B has to apply.
    #[serde(rename = "changesB")]
    pub changes_b: Vec<ProductUpdate>,
    /// Products System A is missing.
    #[serde(rename = "newInA")]
    pub new_in_a: Vec<Product>,
    /// Products System B is missing.
    #[serde(rename = "newInB")]
    pub new_in_b: Vec<Product>,
}

impl MergeDelta {
    pub fn is_empty(&self) -> bool {
        self.changes_a.is_empty()
            && self.changes_b.is_empty()
            && self.new_in_a.is_empty()
            && self.new_in_b.is_empty()
    }
}

/// Reconciles two catalogs and returns what each side has to change.
///
/// Products are paired by `code`. A code that occurs twice within one catalog
/// is merged against its last occurrence only.
pub fn merge(system_a: &[Product], system_b: &[Product], options: &MergeOptions) -> MergeDelta {
    let delta = match options.authoritative {
        Side::A => {
            let outcome = merge_authoritative(system_a, system_b, options);
            MergeDelta {
                changes_a: outcome.primary_changes,
                changes_b: outcome.secondary_changes,
                new_in_a: outcome.new_in_primary,
                new_in_b: outcome.new_in_secondary,
            }
        }
        Side::B => {
            let outcome = merge_authoritative(system_b, system_a, options);
            MergeDelta {
                changes_a: outcome.secondary_changes,
                changes_b: outcome.primary_changes,
                new_in_a: outcome.new_in_secondary,
                new_in_b: outcome.new_in_primary,
            }
        }
    };

    debug!(
        changes_a = delta.changes_a.len(),
        changes_b = delta.changes_b.len(),
        new_in_a = delta.new_in_a.len(),
        new_in_b = delta.new_in_b.len(),
        "merge computed"
    );
    delta
}

/// Buckets named relative to the authoritative (primary) catalog.
struct Outcome {
    primary_changes: Vec<ProductUpdate>,
    secondary_changes: Vec<ProductUpdate>,
    new_in_primary: Vec<Product>,
    new_in_secondary: Vec<Product>,
}

fn merge_authoritative(primary: &[Product], secondary: &[Product], options: &MergeOptions) -> Outcome {
    let primary_index = index_by_code(primary);
    let secondary_index = index_by_code(secondary);

    let mut outcome = Outcome {
        primary_changes: Vec::new(),
        secondary_changes: Vec::new(),
        new_in_primary: Vec::new(),
        new_in_secondary: Vec::new(),
    };

    for primary_product in primary {
        let Some(secondary_product) = secondary_index.get(primary_product.code.as_str()) else {
            outcome
                .new_in_secondary
                .push(primary_product.without_count_code());
            continue;
        };

        let (primary_fields, secondary_fields) =
            diff_pair(primary_product, secondary_product, options.comparison);

        if !secondary_fields.is_empty() {
            outcome.secondary_changes.push(ProductUpdate {
                code: secondary_product.code.clone(),
                changes: secondary_fields,
                count_code: secondary_product.count_code.clone(),
                sales: primary_product.sales.clone(),
                service: secondary_product.service.clone(),
                purchasing: secondary_product.purchasing.clone(),
            });
        }

        if !primary_fields.is_empty() {
            let purchasing = match options.purchasing {
                PurchasingSource::OwnSystem => &primary_product.purchasing,
                PurchasingSource::Subordinate => &secondary_product.purchasing,
            };
            outcome.primary_changes.push(ProductUpdate {
                code: primary_product.code.clone(),
                changes: primary_fields,
                count_code: primary_product.count_code.clone(),
                sales: primary_product.sales.clone(),
                service: primary_product.service.clone(),
                purchasing: purchasing.clone(),
            });
        }
    }

    outcome.new_in_primary = secondary
        .iter()
        .filter(|product| !primary_index.contains_key(product.code.as_str()))
        .map(Product::without_count_code)
        .collect();

    outcome
}

fn index_by_code(products: &[Product]) -> HashMap<&str, &Product> {
    products
        .iter()
        .map(|product| (product.code.as_str(), product))
        .collect()
}

/// Returns the fields the primary and the secondary record each have to take.
fn diff_pair(
    primary: &Product,
    secondary: &Product,
    comparison: Comparison,
) -> (BTreeMap<Field, FieldValue>, BTreeMap<Field, FieldValue>) {
    let mut primary_fields = BTreeMap::new();
    let mut secondary_fields = BTreeMap::new();

    for field in Field::ALL.into_iter().filter(|field| !field.is_exempt()) {
        match (primary.get(field), secondary.get(field)) {
            (None, None) => {}
            (Some(ours), Some(theirs)) => {
                if !values_equal(&ours, &theirs, comparison) {
                    secondary_fields.insert(field, ours);
                }
            }
            (None, Some(theirs)) => {
                primary_fields.insert(field, theirs);
            }
            (Some(ours), None) => {
                secondary_fields.insert(field, ours);
            }
        }
    }

    (primary_fields, secondary_fields)
}
