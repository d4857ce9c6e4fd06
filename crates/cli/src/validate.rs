use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use paymentsheet_sdk::{Intent, IntentConfiguration, PaymentMethod, RetrievedIntent, validator};
use serde::de::DeserializeOwned;

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct ValidateCommand {
    /// JSON file with the server-returned intent (`object` must be
    /// `payment_intent` or `setup_intent`)
    #[arg(long = "intent", short = 'i')]
    pub intent_path: PathBuf,

    /// JSON file with the intent configuration (`mode` is `payment` or `setup`)
    #[arg(long = "config", short = 'c')]
    pub config_path: PathBuf,

    /// Id of the payment method passed to the confirm handler
    #[arg(long = "payment-method", short = 'p')]
    pub payment_method: String,

    /// Type of the payment method
    #[arg(long = "payment-method-type", default_value = "card")]
    pub payment_method_type: String,

    /// Validate as a Flow Controller integration
    #[arg(long = "flow-controller")]
    pub flow_controller: bool,
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file {}", what, path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} file {}", what, path.display()))
}

impl ValidateCommand {
    pub fn execute(&self) -> anyhow::Result<()> {
        let intent: RetrievedIntent = read_json(&self.intent_path, "intent")?;
        let configuration: IntentConfiguration = read_json(&self.config_path, "configuration")?;
        let payment_method = PaymentMethod::new(&self.payment_method, &self.payment_method_type);

        let mode = configuration.mode.to_string();

        validator::reconcile(
            &Intent::Deferred(configuration),
            &intent,
            &payment_method,
            self.flow_controller,
        )?;

        println!(
            "✓ {} {} matches the {} mode configuration",
            intent.kind(),
            intent.id(),
            mode
        );
        Ok(())
    }
}
