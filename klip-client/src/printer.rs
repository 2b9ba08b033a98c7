// klip-client/src/printer.rs
// Printer host REST API - info, G-code, object queries

use crate::error::read_json;
use crate::{ClientConfig, ClientError, ClientResult};
use async_trait::async_trait;
use reqwest::Client;
use shared::printer::{
    ConfigFileQuery, GcodeCommand, HeaterLimits, ObjectsQuery, PrinterInfo, PrinterResult,
    RawHeaterConfig, TemperatureLimits,
};
use shared::temperature::parse_config_temperature;
use std::time::Duration;

/// Printer host paths
pub mod endpoints {
    pub const INFO: &str = "/printer/info";
    pub const GCODE: &str = "/printer/gcode/script";
    pub const STATUS: &str = "/printer/objects/query";
    pub const TEMPERATURE: &str = "/printer/objects/query?temperatures";
    pub const CONFIGFILE: &str = "/printer/objects/query?configfile";
}

/// Abort timeout for the webcam availability check
pub const WEBCAM_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Printer host operations the stores depend on
#[async_trait]
pub trait PrinterService: Send + Sync {
    async fn info(&self) -> ClientResult<PrinterInfo>;
    async fn send_gcode(&self, script: &str) -> ClientResult<serde_json::Value>;
    async fn query_objects(&self, objects: &[String]) -> ClientResult<ObjectsQuery>;
    async fn temperature_limits(&self) -> ClientResult<TemperatureLimits>;
}

/// REST client for the printer host
///
/// No envelope and no session token: the printer host answers
/// `{"result": ...}` to anyone on the network.
#[derive(Debug, Clone)]
pub struct PrinterApi {
    client: Client,
    base_url: String,
}

impl PrinterApi {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.printer_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.printer_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_result<T: serde::de::DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.client.get(self.url(path)).send().await?;
        let body: PrinterResult<T> = read_json(response).await?;
        Ok(body.result)
    }

    /// Raw temperature query
    pub async fn temperature(&self) -> ClientResult<ObjectsQuery> {
        self.get_result(endpoints::TEMPERATURE).await
    }

    /// Whether the webcam stream answers within [`WEBCAM_CHECK_TIMEOUT`]
    pub async fn webcam_available(&self, url: &str) -> bool {
        let request = self.client.get(url).timeout(WEBCAM_CHECK_TIMEOUT).send();
        match request.await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %url, "Webcam check failed: {}", e);
                false
            }
        }
    }
}

/// Query path for the given object names: `/printer/objects/query?a&b`
pub fn objects_query_path(objects: &[String]) -> String {
    if objects.is_empty() {
        endpoints::STATUS.to_string()
    } else {
        format!("{}?{}", endpoints::STATUS, objects.join("&"))
    }
}

#[async_trait]
impl PrinterService for PrinterApi {
    async fn info(&self) -> ClientResult<PrinterInfo> {
        self.get_result(endpoints::INFO).await
    }

    async fn send_gcode(&self, script: &str) -> ClientResult<serde_json::Value> {
        tracing::info!(script = %script, "Sending G-code");
        let body = GcodeCommand {
            script: script.to_string(),
        };
        let response = self
            .client
            .post(self.url(endpoints::GCODE))
            .json(&body)
            .send()
            .await?;
        read_json(response).await
    }

    async fn query_objects(&self, objects: &[String]) -> ClientResult<ObjectsQuery> {
        self.get_result(&objects_query_path(objects)).await
    }

    async fn temperature_limits(&self) -> ClientResult<TemperatureLimits> {
        let query: ConfigFileQuery = self.get_result(endpoints::CONFIGFILE).await?;
        let config = query.status.configfile.config;
        Ok(TemperatureLimits {
            extruder: heater_limits("extruder", &config.extruder)?,
            heater_bed: heater_limits("heater_bed", &config.heater_bed)?,
        })
    }
}

fn heater_limits(section: &str, raw: &RawHeaterConfig) -> ClientResult<HeaterLimits> {
    let parse = |field: &str, value: &str| {
        parse_config_temperature(value).ok_or_else(|| {
            ClientError::Decode(format!("Invalid {} for {}: '{}'", field, section, value))
        })
    };
    Ok(HeaterLimits {
        min_temp: parse("min_temp", &raw.min_temp)?,
        max_temp: parse("max_temp", &raw.max_temp)?,
    })
}
