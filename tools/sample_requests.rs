//! Sample Request Generator
//!
//! Generates patient records and posts them to a running service for
//! manual and load testing.
//!
//! Usage: sample_requests [url] [count] [messy_rate] [delay_ms]

use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Record generator for testing
struct RecordGenerator {
    rng: rand::rngs::ThreadRng,
}

impl RecordGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// A record with every field present and inside physiological ranges
    fn generate_typical(&mut self) -> Value {
        json!({
            "age": self.rng.gen_range(18..90),
            "salt_intake": round1(self.rng.gen_range(3.0..15.0)),
            "stress_score": self.rng.gen_range(0..=10),
            "sleep_duration": round1(self.rng.gen_range(4.0..10.0)),
            "bmi": round1(self.rng.gen_range(17.0..40.0)),
            "family_history": self.random_choice(&["Yes", "No"]),
            "smoking_status": self.random_choice(&["Smoker", "Non-Smoker"]),
        })
    }

    /// A record with the kind of input the form lets through
    fn generate_messy(&mut self) -> Value {
        let mut record = self.generate_typical();

        match self.rng.gen_range(0..5) {
            // Out of physiological range, still scored
            0 => record["age"] = json!(self.rng.gen_range(121..200)),
            // Numeric value typed as text
            1 => record["bmi"] = json!(format!("{:.1}", self.rng.gen_range(17.0..40.0))),
            // Category outside the lookup table
            2 => record["family_history"] = json!(self.random_choice(&["Maybe", "yes", "Unknown"])),
            // Blank field
            3 => record["sleep_duration"] = Value::Null,
            // Not a number at all
            _ => record["salt_intake"] = json!("a lot"),
        }

        record
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_requests=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let base_url = args.get(1).map(|s| s.as_str()).unwrap_or("http://localhost:5000");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(20);
    let messy_rate: f64 = args
        .get(3)
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.2)
        .clamp(0.0, 1.0);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        base_url = %base_url,
        count = count,
        messy_rate = messy_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::new();
    if let Err(e) = client.get(format!("{}/health", base_url)).send().await {
        warn!(error = %e, "Service not reachable. Running in dry-run mode.");
        return run_dry_mode(count, messy_rate);
    }

    let mut generator = RecordGenerator::new();
    let mut rng = rand::thread_rng();
    let predict_url = format!("{}/predict", base_url);

    let mut high_risk = 0u64;
    let mut errors = 0u64;

    for i in 0..count {
        let record = if rng.gen_bool(messy_rate) {
            generator.generate_messy()
        } else {
            generator.generate_typical()
        };

        let response = client.post(&predict_url).json(&record).send().await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if let Some(message) = body.get("error") {
            errors += 1;
            warn!(request = i + 1, status = %status, error = %message, "Request rejected");
        } else {
            if body["prediction"] == 1 {
                high_risk += 1;
            }
            info!(
                request = i + 1,
                prediction = %body["prediction"],
                risk_percent = %body["risk_percent"],
                "Scored"
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        total = count,
        high_risk = high_risk,
        errors = errors,
        "Finished sending requests"
    );

    Ok(())
}

/// Print the records that would have been sent
fn run_dry_mode(count: u64, messy_rate: f64) -> anyhow::Result<()> {
    let mut generator = RecordGenerator::new();
    let mut rng = rand::thread_rng();

    for _ in 0..count {
        let record = if rng.gen_bool(messy_rate) {
            generator.generate_messy()
        } else {
            generator.generate_typical()
        };
        println!("{}", serde_json::to_string(&record)?);
    }

    Ok(())
}
