//! Data source settings, read from the instance's `jsonData`.
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use thiserror::Error;

use crate::batch::BatchConfig;

/// Errors occurring when interpreting data source settings.
#[serde_as]
#[derive(Debug, Error, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
#[non_exhaustive]
pub enum ConfigError {
    /// The settings JSON could not be deserialized.
    #[error("unexpected data source JSON data (got {json}): {err}")]
    UnexpectedJsonData {
        /// The underlying JSON error.
        #[serde_as(as = "DisplayFromStr")]
        err: serde_json::Error,
        /// The JSON for which deserialization was attempted.
        json: String,
    },
    /// A setting was present but unusable.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// The camelCase name of the setting.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Paging settings configured on a data source instance.
///
/// Every setting is optional; missing settings fall back to [`BatchConfig::default`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceSettings {
    /// The largest page requested from the service.
    pub max_take_per_request: Option<usize>,
    /// The most requests dispatched per second.
    pub requests_per_second: Option<u32>,
    /// The default number of records returned by a query.
    pub take: Option<usize>,
}

impl DataSourceSettings {
    /// Deserialize settings from `jsonData` bytes. Empty input yields the defaults.
    ///
    /// ```
    /// use grafana_query_sdk::config::DataSourceSettings;
    ///
    /// let settings = DataSourceSettings::from_json(br#"{"maxTakePerRequest": 100}"#).unwrap();
    /// assert_eq!(settings.batch_config().unwrap().max_take_per_request, 100);
    /// assert_eq!(DataSourceSettings::from_json(b"").unwrap(), DataSourceSettings::default());
    /// ```
    pub fn from_json(jdoc: &[u8]) -> Result<Self, ConfigError> {
        read_json(jdoc).map_err(|err| ConfigError::UnexpectedJsonData {
            err,
            json: String::from_utf8(jdoc.to_vec())
                .unwrap_or_else(|_| format!("non-utf8 string: {}", String::from_utf8_lossy(jdoc))),
        })
    }

    /// The batch config described by these settings.
    pub fn batch_config(&self) -> Result<BatchConfig, ConfigError> {
        let defaults = BatchConfig::default();
        let max_take_per_request = match self.max_take_per_request {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: "maxTakePerRequest",
                    value: "0".to_string(),
                })
            }
            Some(max) => max,
            None => defaults.max_take_per_request,
        };
        Ok(BatchConfig::new(
            max_take_per_request,
            self.requests_per_second.unwrap_or(defaults.requests_per_second),
        ))
    }
}

fn read_json<T>(jdoc: &[u8]) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
{
    // Grafana may send an empty string instead of an empty map.
    let jdoc = if jdoc.is_empty() { b"{}".as_slice() } else { jdoc };
    serde_json::from_slice(jdoc)
}
