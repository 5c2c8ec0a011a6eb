use anyhow::{Context, Result};
use connector_wizard::auth::EnvTokenProvider;
use connector_wizard::config::{load_config, WizardConfig};
use connector_wizard::form::{JsonSchemaForm, SchemaForm};
use connector_wizard::registry::CachingRegistry;
use connector_wizard::wizard::WizardParams;
use connector_wizard::{WizardService, WizardStage};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use wizard_console::{load_catalog, ConsoleCommand, FederatedRegistry, HttpConnectorApi};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the projected views
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wizard_console=info,connector_wizard=info".into()),
        )
        .init();

    info!("Wizard console starting...");

    let mut config = match std::env::var("WIZARD_CONFIG") {
        Ok(path) => load_config(&path)?,
        Err(_) => WizardConfig::default(),
    };
    config.apply_env();

    let catalog_path = std::env::var("WIZARD_CATALOG")
        .context("WIZARD_CATALOG is required (path to the connector catalog JSON)")?;
    let catalog = load_catalog(&catalog_path)?;
    let mode = catalog.mode(&std::env::var("WIZARD_MODE").unwrap_or_else(|_| "create".to_string()))?;

    info!(
        base_path = %config.api.base_path,
        connector_types = catalog.connector_types.len(),
        remote_configurators = config.configurators.len(),
        loader_timeout_secs = config.loader.timeout_secs,
        "Configuration loaded"
    );

    let registry = Arc::new(CachingRegistry::new(FederatedRegistry::new(&config)?));
    let api = Arc::new(HttpConnectorApi::new()?);
    let params = WizardParams {
        auth_token: Arc::new(EnvTokenProvider::new("COS_ACCESS_TOKEN")),
        base_path: config.api.base_path.clone(),
        mode,
    };
    let mut service =
        WizardService::new(params, registry, api).with_loader_timeout(config.loader.timeout());
    let form = JsonSchemaForm;

    print_view(&service, &form)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let command: ConsoleCommand = match serde_json::from_str(&line) {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "Invalid command");
                continue;
            }
        };
        let event = match command.into_event(&service.view(), &catalog, &form) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Command rejected");
                continue;
            }
        };

        service.dispatch(event);
        settle(&mut service).await;
        print_view(&service, &form)?;

        if service.stage().is_terminal() {
            break;
        }
    }

    info!(stage = %service.stage(), "Wizard console exiting");
    Ok(())
}

/// Waits for in-flight loader or submission results.
async fn settle(service: &mut WizardService) {
    while matches!(
        service.stage(),
        WizardStage::LoadingConfigurator | WizardStage::Submitting
    ) {
        if service.process_next().await.is_none() {
            break;
        }
    }
    while service.try_process_next().is_some() {}
}

fn print_view(service: &WizardService, form: &dyn SchemaForm) -> Result<()> {
    let view = service.view();
    let mut out = serde_json::to_value(&view).context("Failed to serialize wizard view")?;
    out["ui"] = view.render(form).unwrap_or(serde_json::Value::Null);
    println!("{}", out);
    Ok(())
}
