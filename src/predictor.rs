use std::collections::HashMap;
use std::fs;

use log::{info, warn};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::ApiError;
use crate::models::{PredictionRequest, PredictionResponse};

fn default_spread() -> f64 {
    0.15
}

/// Serialized model weights. The model is trained elsewhere and shipped as a
/// JSON file; this process only scores with it.
#[derive(Debug, Deserialize)]
struct PriceModel {
    base_price: f64,
    /// Weights keyed as "<feature>=<value>", e.g. "Company=Apple".
    #[serde(default)]
    feature_weights: HashMap<String, f64>,
    #[serde(default)]
    ram_per_gb: f64,
    #[serde(default)]
    storage_per_gb: f64,
    #[serde(default)]
    inches_weight: f64,
    #[serde(default = "default_spread")]
    spread: f64,
}

pub struct Predictor {
    model: Option<PriceModel>,
}

impl Predictor {
    /// Loads model weights from disk. A missing or unreadable model is not
    /// fatal at startup; prediction requests then report it as unavailable.
    pub fn load(model_path: &str) -> Self {
        let model = match fs::read_to_string(model_path) {
            Ok(raw) => match serde_json::from_str::<PriceModel>(&raw) {
                Ok(model) => {
                    info!("Loaded price model from {}", model_path);
                    Some(model)
                }
                Err(e) => {
                    warn!("Price model at {} is unreadable: {}", model_path, e);
                    None
                }
            },
            Err(e) => {
                warn!("Price model not found at {}: {}", model_path, e);
                None
            }
        };
        Self { model }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, ApiError> {
        let model = self.model.as_ref().ok_or(ApiError::ModelUnavailable)?;

        let specs = model_input(request);
        let price = model.score(&specs, request);
        if !price.is_finite() || price <= 0.0 {
            return Err(ApiError::Prediction("Prediction failed".to_string()));
        }

        let spread = model.spread;
        Ok(PredictionResponse {
            predicted_price: round2(price),
            min_price: round2(price * (1.0 - spread)),
            max_price: round2(price * (1.0 + spread)),
            message: "Price prediction successful".to_string(),
        })
    }

    /// Reports model status without predicting; never errors.
    pub fn health(&self) -> Value {
        if self.is_loaded() {
            json!({ "status": "healthy", "message": "ML service running" })
        } else {
            json!({ "status": "model_not_loaded", "message": "Model not trained" })
        }
    }
}

/// Translates API field names into the model's input keys.
fn model_input(request: &PredictionRequest) -> Vec<(&'static str, String)> {
    vec![
        ("Company", request.company.clone()),
        ("TypeName", request.type_name.clone()),
        ("Inches", request.inches.to_string()),
        ("ScreenResolution", request.screen_resolution.clone()),
        ("Cpu", request.cpu.clone()),
        ("Ram", request.ram.clone()),
        ("Memory", request.memory.clone()),
        ("Gpu", request.gpu.clone()),
        ("OpSys", request.os.clone()),
        ("Weight", request.weight.clone()),
    ]
}

impl PriceModel {
    fn score(&self, specs: &[(&'static str, String)], request: &PredictionRequest) -> f64 {
        let mut price = self.base_price;
        for (key, value) in specs {
            if let Some(weight) = self.feature_weights.get(&format!("{key}={value}")) {
                price += weight;
            }
        }

        if let Some(ram_gb) = parse_gigabytes(&request.ram) {
            price += self.ram_per_gb * ram_gb;
        }
        if let Some(storage_gb) = parse_gigabytes(&request.memory) {
            price += self.storage_per_gb * storage_gb;
        }
        price += self.inches_weight * request.inches;

        price
    }
}

/// Pulls a capacity in GB out of strings like "16GB" or "1TB SSD".
fn parse_gigabytes(raw: &str) -> Option<f64> {
    let digits: String = raw
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: f64 = digits.parse().ok()?;
    if raw.to_ascii_uppercase().contains("TB") {
        Some(value * 1024.0)
    } else {
        Some(value)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
