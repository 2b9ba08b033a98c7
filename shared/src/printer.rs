//! Printer host wire types
//!
//! DTOs for the Moonraker-style REST endpoints and the websocket message
//! shape. The printer host does not use the panel envelope; REST payloads
//! arrive wrapped in `{"result": ...}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Websocket method used to subscribe to printer objects
pub const METHOD_OBJECTS_SUBSCRIBE: &str = "printer.objects.subscribe";

/// `{"result": T}` wrapper returned by the printer host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterResult<T> {
    pub result: T,
}

/// `/printer/info` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterInfo {
    pub state: String,
    #[serde(default)]
    pub state_message: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub software_version: String,
    #[serde(default)]
    pub cpu_info: String,
}

/// Body of `/printer/gcode/script`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcodeCommand {
    pub script: String,
}

/// `/printer/objects/query` payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectsQuery {
    #[serde(default)]
    pub eventtime: f64,
    #[serde(default)]
    pub status: Map<String, Value>,
}

/// Outbound websocket message
///
/// ```json
/// { "method": "printer.objects.subscribe", "params": { "objects": { "print_stats": null } } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsMessage {
    pub method: String,
    pub params: Value,
}

impl WsMessage {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Subscription request for the given objects, every field of each
    pub fn subscribe<I, S>(objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let objects: BTreeMap<String, Option<Vec<String>>> =
            objects.into_iter().map(|name| (name.into(), None)).collect();

        let mut params = Map::new();
        params.insert(
            "objects".to_string(),
            serde_json::to_value(objects).unwrap_or(Value::Null),
        );
        Self::new(METHOD_OBJECTS_SUBSCRIBE, Value::Object(params))
    }
}

// =============================================================================
// Temperature limits (configfile)
// =============================================================================

/// Min/max range of one heater
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeaterLimits {
    pub min_temp: f64,
    pub max_temp: f64,
}

/// Limits of the heaters the panel drives
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureLimits {
    pub extruder: HeaterLimits,
    pub heater_bed: HeaterLimits,
}

/// Heater section as written in the printer config (values are strings)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHeaterConfig {
    pub min_temp: String,
    pub max_temp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHeaterSections {
    pub extruder: RawHeaterConfig,
    pub heater_bed: RawHeaterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFileSection {
    pub config: RawHeaterSections,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFileStatus {
    pub configfile: ConfigFileSection,
}

/// `/printer/objects/query?configfile` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFileQuery {
    #[serde(default)]
    pub eventtime: f64,
    pub status: ConfigFileStatus,
}
