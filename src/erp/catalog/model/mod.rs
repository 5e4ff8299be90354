use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Untyped product record as returned by an ERP product-list endpoint.
pub type RawRecord = serde_json::Map<String, Value>;

/// Canonical product fields, in the order they are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    CountCode,
    Code,
    Barcode,
    Name,
    Unit,
    Service,
    Sales,
    Activated,
    Purchasing,
    EshopSync,
    Height,
    Width,
    Depth,
    Weight,
    Asset,
    Norm,
    Work,
    Categories,
    NameDesc,
    CustomsFee,
    Country,
    KoliPackageAmount,
    GrossWeight,
}

impl Field {
    /// Every canonical field.
    pub const ALL: [Field; 23] = [
        Field::CountCode,
        Field::Code,
        Field::Barcode,
        Field::Name,
        Field::Unit,
        Field::Service,
        Field::Sales,
        Field::Activated,
        Field::Purchasing,
        Field::EshopSync,
        Field::Height,
        Field::Width,
        Field::Depth,
        Field::Weight,
        Field::Asset,
        Field::Norm,
        Field::Work,
        Field::Categories,
        Field::NameDesc,
        Field::CustomsFee,
        Field::Country,
        Field::KoliPackageAmount,
        Field::GrossWeight,
    ];

    /// Fields that are never diffed, only carried through onto updates.
    pub const EXEMPT: [Field; 5] = [
        Field::CountCode,
        Field::Sales,
        Field::Service,
        Field::Purchasing,
        Field::Code,
    ];

    /// Dimensions that go through locale-aware numeric coercion.
    pub const NUMERIC: [Field; 5] = [
        Field::Height,
        Field::Width,
        Field::Depth,
        Field::Weight,
        Field::GrossWeight,
    ];

    /// Field name as used by the ERP API.
    pub fn name(self) -> &'static str {
        match self {
            Field::CountCode => "count_code",
            Field::Code => "code",
            Field::Barcode => "barcode",
            Field::Name => "name",
            Field::Unit => "unit",
            Field::Service => "service",
            Field::Sales => "sales",
            Field::Activated => "activated",
            Field::Purchasing => "purchasing",
            Field::EshopSync => "eshop_sync",
            Field::Height => "height",
            Field::Width => "width",
            Field::Depth => "depth",
            Field::Weight => "weight",
            Field::Asset => "asset",
            Field::Norm => "norm",
            Field::Work => "work",
            Field::Categories => "categories",
            Field::NameDesc => "name_desc",
            Field::CustomsFee => "customs_fee",
            Field::Country => "country",
            Field::KoliPackageAmount => "koli_package_amount",
            Field::GrossWeight => "gross_weight",
        }
    }

    pub fn is_exempt(self) -> bool {
        Field::EXEMPT.contains(&self)
    }

    pub fn is_numeric(self) -> bool {
        Field::NUMERIC.contains(&self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value held by a non-identity product field.
///
/// Mirrors JSON, except that numbers are plain `f64` so that an unparseable
/// numeric string can be carried as NaN.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Converts the value into JSON. NaN and infinities become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(value) => Value::Bool(*value),
            FieldValue::Number(value) => number_to_json(*value),
            FieldValue::Text(value) => Value::String(value.clone()),
            FieldValue::List(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            FieldValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

fn number_to_json(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(value) => FieldValue::Bool(*value),
            Value::Number(number) => FieldValue::Number(number.as_f64().unwrap_or(f64::NAN)),
            Value::String(value) => FieldValue::Text(value.clone()),
            Value::Array(items) => FieldValue::List(items.iter().map(FieldValue::from).collect()),
            Value::Object(entries) => FieldValue::Map(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), FieldValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Path of one leaf in a product's category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryPath {
    /// Leaf hanging directly under the root.
    Label(String),
    /// Labels from the root down to the leaf.
    Path(Vec<String>),
}

/// A flattened category assignment, serialised as `{"category": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub category: CategoryPath,
}

impl CategoryEntry {
    /// Builds an entry from the labels collected on the way down to a leaf.
    pub fn from_labels(mut labels: Vec<String>) -> Self {
        let category = if labels.len() == 1 {
            CategoryPath::Label(labels.remove(0))
        } else {
            CategoryPath::Path(labels)
        };
        Self { category }
    }

    pub fn to_field_value(&self) -> FieldValue {
        let path = match &self.category {
            CategoryPath::Label(label) => FieldValue::Text(label.clone()),
            CategoryPath::Path(labels) => {
                FieldValue::List(labels.iter().cloned().map(FieldValue::Text).collect())
            }
        };
        FieldValue::Map(BTreeMap::from([("category".to_string(), path)]))
    }

    /// Reads a list of `{"category": ...}` entries back from a field value.
    pub fn list_from_value(value: &FieldValue) -> Option<Vec<CategoryEntry>> {
        let FieldValue::List(items) = value else {
            return None;
        };
        items
            .iter()
            .map(|item| {
                let FieldValue::Map(entry) = item else {
                    return None;
                };
                let category = match entry.get("category")? {
                    FieldValue::Text(label) => CategoryPath::Label(label.clone()),
                    FieldValue::List(labels) => CategoryPath::Path(
                        labels
                            .iter()
                            .map(|label| label.as_text().map(str::to_string))
                            .collect::<Option<Vec<_>>>()?,
                    ),
                    _ => return None,
                };
                Some(CategoryEntry { category })
            })
            .collect()
    }
}

/// Canonical product shape the merge engine operates on.
///
/// `None` means the field was undefined upstream and is omitted entirely;
/// a present `FieldValue::Null` is a different thing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Product {
    pub code: String,
    pub count_code: Option<FieldValue>,
    pub barcode: Option<FieldValue>,
    pub name: Option<FieldValue>,
    pub unit: Option<FieldValue>,
    pub service: Option<FieldValue>,
    pub sales: Option<FieldValue>,
    pub activated: Option<FieldValue>,
    pub purchasing: Option<FieldValue>,
    pub eshop_sync: Option<FieldValue>,
    pub height: Option<FieldValue>,
    pub width: Option<FieldValue>,
    pub depth: Option<FieldValue>,
    pub weight: Option<FieldValue>,
    pub asset: Option<FieldValue>,
    pub norm: Option<FieldValue>,
    pub work: Option<FieldValue>,
    pub categories: Option<Vec<CategoryEntry>>,
    pub name_desc: Option<FieldValue>,
    pub customs_fee: Option<FieldValue>,
    pub country: Option<FieldValue>,
    pub koli_package_amount: Option<FieldValue>,
    pub gross_weight: Option<FieldValue>,
}

impl Product {
    /// Creates a product that only carries its code.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    /// Returns the value of `field`, or `None` when it is undefined.
    pub fn get(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Code => Some(FieldValue::Text(self.code.clone())),
            Field::Categories => self.categories.as_ref().map(|entries| {
                FieldValue::List(entries.iter().map(CategoryEntry::to_field_value).collect())
            }),
            other => self.slot(other).and_then(|slot| slot.clone()),
        }
    }

    /// Assigns `field`. Values that do not fit the code or category slots
    /// leave those slots untouched.
    pub fn set(&mut self, field: Field, value: FieldValue) {
        match field {
            Field::Code => {
                if let FieldValue::Text(code) = value {
                    self.code = code;
                }
            }
            Field::Categories => {
                if let Some(entries) = CategoryEntry::list_from_value(&value) {
                    self.categories = Some(entries);
                }
            }
            other => {
                if let Some(slot) = self.slot_mut(other) {
                    *slot = Some(value);
                }
            }
        }
    }

    /// Builder form of [`Product::set`].
    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.set(field, value.into());
        self
    }

    pub fn with_categories(mut self, entries: Vec<CategoryEntry>) -> Self {
        self.categories = Some(entries);
        self
    }

    /// Copy of the product suitable for sending to the other system, which
    /// assigns its own `count_code`.
    pub fn without_count_code(&self) -> Product {
        Product {
            count_code: None,
            ..self.clone()
        }
    }

    /// Returns a copy with the changed fields of `update` applied.
    pub fn apply_update(&self, update: &ProductUpdate) -> Product {
        let mut updated = self.clone();
        for (field, value) in &update.changes {
            updated.set(*field, value.clone());
        }
        updated
    }

    fn slot(&self, field: Field) -> Option<&Option<FieldValue>> {
        let slot = match field {
            Field::CountCode => &self.count_code,
            Field::Barcode => &self.barcode,
            Field::Name => &self.name,
            Field::Unit => &self.unit,
            Field::Service => &self.service,
            Field::Sales => &self.sales,
            Field::Activated => &self.activated,
            Field::Purchasing => &self.purchasing,
            Field::EshopSync => &self.eshop_sync,
            Field::Height => &self.height,
            Field::Width => &self.width,
            Field::Depth => &self.depth,
            Field::Weight => &self.weight,
            Field::Asset => &self.asset,
            Field::Norm => &self.norm,
            Field::Work => &self.work,
            Field::NameDesc => &self.name_desc,
            Field::CustomsFee => &self.customs_fee,
            Field::Country => &self.country,
            Field::KoliPackageAmount => &self.koli_package_amount,
            Field::GrossWeight => &self.gross_weight,
            Field::Code | Field::Categories => return None,
        };
        Some(slot)
    }

    fn slot_mut(&mut self, field: Field) -> Option<&mut Option<FieldValue>> {
        let slot = match field {
            Field::CountCode => &mut self.count_code,
            Field::Barcode => &mut self.barcode,
            Field::Name => &mut self.name,
            Field::Unit => &mut self.unit,
            Field::Service => &mut self.service,
            Field::Sales => &mut self.sales,
            Field::Activated => &mut self.activated,
            Field::Purchasing => &mut self.purchasing,
            Field::EshopSync => &mut self.eshop_sync,
            Field::Height => &mut self.height,
            Field::Width => &mut self.width,
            Field::Depth => &mut self.depth,
            Field::Weight => &mut self.weight,
            Field::Asset => &mut self.asset,
            Field::Norm => &mut self.norm,
            Field::Work => &mut self.work,
            Field::NameDesc => &mut self.name_desc,
            Field::CustomsFee => &mut self.customs_fee,
            Field::Country => &mut self.country,
            Field::KoliPackageAmount => &mut self.koli_package_amount,
            Field::GrossWeight => &mut self.gross_weight,
            Field::Code | Field::Categories => return None,
        };
        Some(slot)
    }
}

impl Serialize for Product {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present: Vec<(Field, FieldValue)> = Field::ALL
            .iter()
            .filter_map(|field| self.get(*field).map(|value| (*field, value)))
            .collect();

        let mut map = serializer.serialize_map(Some(present.len()))?;
        for (field, value) in &present {
            map.serialize_entry(field.name(), value)?;
        }
        map.end()
    }
}

/// Field-level update one system has to apply to an existing product.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductUpdate {
    /// Shared product code the update targets.
    pub code: String,
    /// Diffed fields and the values they must take.
    pub changes: BTreeMap<Field, FieldValue>,
    pub count_code: Option<FieldValue>,
    pub sales: Option<FieldValue>,
    pub service: Option<FieldValue>,
    pub purchasing: Option<FieldValue>,
}

impl ProductUpdate {
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        match field {
            Field::CountCode => self.count_code.as_ref(),
            Field::Sales => self.sales.as_ref(),
            Field::Service => self.service.as_ref(),
            Field::Purchasing => self.purchasing.as_ref(),
            other => self.changes.get(&other),
        }
    }
}

impl Serialize for ProductUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let carried = [
            (Field::CountCode, &self.count_code),
            (Field::Sales, &self.sales),
            (Field::Service, &self.service),
            (Field::Purchasing, &self.purchasing),
        ];
        let carried_len = carried.iter().filter(|(_, value)| value.is_some()).count();

        let mut map = serializer.serialize_map(Some(self.changes.len() + carried_len + 1))?;
        for (field, value) in &self.changes {
            map.serialize_entry(field.name(), value)?;
        }
        for (field, value) in carried {
            if let Some(value) = value {
                map.serialize_entry(field.name(), value)?;
            }
        }
        map.serialize_entry(Field::Code.name(), &self.code)?;
        map.end()
    }
}
