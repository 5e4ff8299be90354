use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use crate::erp::catalog::apply::{ApiFailure, ProductApi};
use crate::erp::catalog::config::{Credentials, SystemConfig};
use crate::erp::catalog::error::Result;
use crate::erp::catalog::model::RawRecord;
use crate::erp::catalog::stock::{StockApi, StockConfig, StockEntry};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Blocking client for an ERP product API.
///
/// Requests are JSON bodies carrying the credentials next to the record
/// fields; the API answers `opr_code = "0"` on success.
pub struct ErpClient {
    http: Client,
    base_url: String,
    update_url: String,
    add_url: String,
    credentials: Credentials,
}

impl ErpClient {
    pub fn new(system: &SystemConfig, credentials: Credentials) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: system.base_url.clone(),
            update_url: join_url(&system.base_url, &system.update_path),
            add_url: join_url(&system.base_url, &system.add_path),
            credentials,
        })
    }

    /// Builds a client whose credentials come from the environment.
    pub fn from_config(system: &SystemConfig) -> Result<Self> {
        let credentials = system.credentials()?;
        Self::new(system, credentials)
    }

    /// Absolute URL of `path` on this system.
    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Posts `fields` with the credentials and returns the JSON response.
    /// Non-success HTTP statuses are errors.
    pub fn post_fields(&self, url: &str, fields: &RawRecord) -> Result<Value> {
        let body = request_body(&self.credentials, fields);
        debug!(%url, "posting request");
        let response = self.http.post(url).json(&body).send()?.error_for_status()?;
        Ok(response.json()?)
    }

    fn post(&self, url: &str, record: &RawRecord) -> std::result::Result<(), ApiFailure> {
        let body = request_body(&self.credentials, record);
        let code = record.get("code").and_then(Value::as_str);
        debug!(%url, code = code.unwrap_or("<none>"), "posting record");

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .map_err(ApiFailure::message)?;
        let status = response.status();
        let payload: Value = response.json().map_err(|err| {
            ApiFailure(serde_json::json!({
                "error": err.to_string(),
                "status": status.as_u16(),
            }))
        })?;
        interpret_response(payload)
    }
}

impl ProductApi for ErpClient {
    fn update_product(&self, record: &RawRecord) -> std::result::Result<(), ApiFailure> {
        self.post(&self.update_url, record)
    }

    fn add_product(&self, record: &RawRecord) -> std::result::Result<(), ApiFailure> {
        self.post(&self.add_url, record)
    }
}

/// Stock endpoints of an [`ErpClient`].
pub struct StockClient {
    client: ErpClient,
    warehouse_stock_url: String,
    sync_stock_url: String,
}

impl StockClient {
    pub fn new(client: ErpClient, config: &StockConfig) -> Self {
        Self {
            warehouse_stock_url: client.endpoint(&config.warehouse_stock_path),
            sync_stock_url: client.endpoint(&config.sync_stock_path),
            client,
        }
    }
}

impl StockApi for StockClient {
    fn warehouse_stock(&self, warehouses: &str) -> Result<Value> {
        self.client
            .post_fields(&self.warehouse_stock_url, &stock_query_fields(warehouses))
    }

    fn sync_stock(&self, entries: &[StockEntry]) -> Result<Value> {
        self.client
            .post_fields(&self.sync_stock_url, &stock_sync_fields(entries)?)
    }
}

/// Fields of a warehouse stock query.
pub fn stock_query_fields(warehouses: &str) -> RawRecord {
    let mut fields = RawRecord::new();
    fields.insert(
        "wh_id_list".to_string(),
        Value::String(warehouses.to_string()),
    );
    fields
}

/// Fields of a stock sync request.
pub fn stock_sync_fields(entries: &[StockEntry]) -> Result<RawRecord> {
    let mut fields = RawRecord::new();
    fields.insert("stock_list".to_string(), serde_json::to_value(entries)?);
    Ok(fields)
}

/// Request body for one record: the credentials followed by the record's own
/// fields.
pub fn request_body(credentials: &Credentials, record: &RawRecord) -> Value {
    let mut body = RawRecord::new();
    body.insert(
        "secret_key".to_string(),
        Value::String(credentials.secret_key.clone()),
    );
    body.insert(
        "company_id".to_string(),
        Value::String(credentials.company_id.clone()),
    );
    for (key, value) in record {
        body.insert(key.clone(), value.clone());
    }
    Value::Object(body)
}

/// Maps an API response onto success or a failure carrying the response.
pub fn interpret_response(payload: Value) -> std::result::Result<(), ApiFailure> {
    let accepted = match payload.get("opr_code") {
        Some(Value::String(code)) => code == "0",
        Some(Value::Number(code)) => code.as_f64() == Some(0.0),
        _ => false,
    };
    if accepted { Ok(()) } else { Err(ApiFailure(payload)) }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
