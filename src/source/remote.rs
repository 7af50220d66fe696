use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::error::{PricewiseError, Result};
use crate::models::RawSalesRecord;
use crate::settings::{api_key, Settings, API_KEY_ENV, API_URL_ENV};

const TIMEOUT: Duration = Duration::from_secs(10);

/// Read-only client for the hosted sales table.
pub struct RemoteClient {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl RemoteClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.resolved_api_url().ok_or_else(|| {
            PricewiseError::Settings(format!(
                "No API URL configured (set {API_URL_ENV} or api_url in settings)"
            ))
        })?;
        let api_key = api_key()
            .ok_or_else(|| PricewiseError::Settings(format!("Missing {API_KEY_ENV} in environment (.env)")))?;
        let client = Client::builder().timeout(TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            table: settings.sales_table.clone(),
        })
    }

    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// All rows of the sales table, newest first.
    pub fn fetch_sales(&self) -> Result<Vec<RawSalesRecord>> {
        let resp = self
            .client
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "date.desc")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()?;

        if !resp.status().is_success() {
            return Err(PricewiseError::Other(format!(
                "Sales request failed with status {}",
                resp.status()
            )));
        }

        let body: Value = resp.json()?;
        let rows = rows_from_body(body)?;
        tracing::info!(count = rows.len(), table = %self.table, "fetched remote sales rows");
        Ok(rows)
    }
}

fn rows_from_body(body: Value) -> Result<Vec<RawSalesRecord>> {
    let Value::Array(items) = body else {
        return Err(PricewiseError::Other(
            "Sales response was not a JSON array".into(),
        ));
    };
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_object() {
            tracing::warn!("skipping non-object row in sales response");
            continue;
        }
        rows.push(RawSalesRecord::from_value(item)?);
    }
    Ok(rows)
}
