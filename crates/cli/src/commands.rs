use std::io::{BufRead, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use opencode_health::{HealthMonitor, ProbeRequest, ReqwestTransport, StatusIndicator, manual_test_notice};
use opencode_types::{ConnectionConfig, ConnectionState, Protocol, VIEW_TYPE};
use opencode_util::{SecretStore, SettingsStore, default_secret_store, redact_sensitive, remove_secret, store_secret};
use tracing::{debug, info, warn};

/// Field changes requested by `config set`, already validated.
#[derive(Debug, Default)]
pub struct SettingsEdit {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub protocol: Option<Protocol>,
    pub credential_ref: Option<String>,
}

impl SettingsEdit {
    fn apply(self, config: &mut ConnectionConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(protocol) = self.protocol {
            config.protocol = protocol;
        }
        if let Some(credential_ref) = self.credential_ref {
            config.credential_ref = credential_ref.trim().to_string();
        }
    }
}

/// Open the settings file, falling back to in-memory defaults when it cannot
/// be read. Only read-only commands use the fallback.
fn load_settings() -> SettingsStore {
    SettingsStore::open().unwrap_or_else(|error| {
        warn!(%error, "failed to open settings; using defaults");
        SettingsStore::ephemeral(ConnectionConfig::default())
    })
}

fn build_monitor(secrets: Arc<dyn SecretStore>) -> Result<Arc<HealthMonitor>> {
    let transport = ReqwestTransport::new().context("failed to build HTTP client")?;
    Ok(Arc::new(HealthMonitor::new(Arc::new(transport), secrets)))
}

/// Pretty JSON describing `request`, with credentials redacted.
fn dry_run_report(request: &ProbeRequest) -> Result<String> {
    let mut headers = serde_json::Map::new();
    if let Some(value) = &request.authorization {
        headers.insert("authorization".to_string(), serde_json::Value::String(redact_sensitive(value)));
    }
    let out = serde_json::json!({
        "method": "GET",
        "url": request.url,
        "headers": headers,
    });
    Ok(serde_json::to_string_pretty(&out)?)
}

async fn run_probe(monitor: &HealthMonitor, config: &ConnectionConfig) -> bool {
    let connected = monitor.probe_once(config).await;
    println!("{}", manual_test_notice(connected));
    println!("{}", StatusIndicator::new(monitor.state(), config).tooltip);
    connected
}

pub async fn check(dry_run: bool) -> Result<ExitCode> {
    let config = load_settings().config();
    let secrets = default_secret_store();

    if dry_run {
        let request = ProbeRequest::for_config(&config, secrets.as_ref());
        println!("{}", dry_run_report(&request)?);
        return Ok(ExitCode::SUCCESS);
    }

    let monitor = build_monitor(secrets)?;
    let connected = run_probe(&monitor, &config).await;
    Ok(if connected { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

pub async fn monitor() -> Result<ExitCode> {
    let config = load_settings().config();
    let monitor = build_monitor(default_secret_store())?;

    monitor.start(config, |state, config| {
        let indicator = StatusIndicator::new(state, config);
        match state {
            ConnectionState::Disconnected => warn!(state = %state, "{}", indicator.tooltip),
            _ => info!(state = %state, "{}", indicator.tooltip),
        }
    });

    tokio::signal::ctrl_c().await.context("failed to listen for Ctrl+C")?;
    monitor.stop();
    Ok(ExitCode::SUCCESS)
}

pub async fn watch() -> Result<ExitCode> {
    let settings = Arc::new(load_settings());
    let monitor = build_monitor(default_secret_store())?;
    opencode_tui::run(settings, monitor).await?;
    Ok(ExitCode::SUCCESS)
}

pub fn config_show() -> Result<ExitCode> {
    let config = load_settings().config();
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!("# {}", config.base_url());
    Ok(ExitCode::SUCCESS)
}

pub fn config_path() -> Result<ExitCode> {
    let settings = SettingsStore::open().context("failed to open settings")?;
    println!("{}", settings.path().display());
    Ok(ExitCode::SUCCESS)
}

/// Persist the edit, then test the connection with the new values.
pub async fn config_set(edit: SettingsEdit) -> Result<ExitCode> {
    let settings = SettingsStore::open().context("failed to open settings")?;
    let config = settings.update(|config| edit.apply(config)).context("failed to save settings")?;
    info!(url = %config.base_url(), "settings saved");

    let monitor = build_monitor(default_secret_store())?;
    let connected = run_probe(&monitor, &config).await;
    Ok(if connected { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn read_secret_from_stdin() -> Result<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprintln!("Enter secret value:");
    }
    let mut line = String::new();
    stdin.lock().read_line(&mut line).context("failed to read secret from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn secret_set(name: &str, value: Option<String>) -> Result<ExitCode> {
    let value = match value {
        Some(value) => value,
        None => read_secret_from_stdin()?,
    };
    if value.is_empty() {
        bail!("refusing to store an empty secret");
    }
    store_secret(name, &value)?;
    println!("Stored secret '{name}'");
    Ok(ExitCode::SUCCESS)
}

pub fn secret_remove(name: &str) -> Result<ExitCode> {
    remove_secret(name)?;
    println!("Removed secret '{name}'");
    Ok(ExitCode::SUCCESS)
}

pub fn url() -> Result<ExitCode> {
    let config = load_settings().config();
    debug!(view = VIEW_TYPE, "resolved view URL");
    println!("{}", config.view_url());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencode_util::StaticSecretStore;

    #[test]
    fn edit_only_touches_given_fields() {
        let mut config = ConnectionConfig::default();
        SettingsEdit {
            port: Some(5000),
            credential_ref: Some("  opencode-password ".into()),
            ..SettingsEdit::default()
        }
        .apply(&mut config);

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5000);
        assert_eq!(config.protocol, Protocol::Http);
        assert_eq!(config.credential_ref, "opencode-password");
    }

    #[test]
    fn dry_run_redacts_credentials() {
        let config = ConnectionConfig {
            credential_ref: "pw".into(),
            ..ConnectionConfig::default()
        };
        let secrets = StaticSecretStore::new().with_secret("pw", "secret");
        let report = dry_run_report(&ProbeRequest::for_config(&config, &secrets)).expect("report");

        assert!(report.contains("http://localhost:4096/global/health"));
        let value: serde_json::Value = serde_json::from_str(&report).expect("json");
        assert_eq!(value["headers"]["authorization"], "Basic [REDACTED]");
        assert!(!report.contains("b3BlbmNvZGU6c2VjcmV0"));
    }

    #[test]
    fn dry_run_without_credentials_has_no_headers() {
        let request = ProbeRequest::for_config(&ConnectionConfig::default(), &StaticSecretStore::new());
        let report = dry_run_report(&request).expect("report");
        let value: serde_json::Value = serde_json::from_str(&report).expect("json");
        assert_eq!(value["headers"], serde_json::json!({}));
    }

    #[test]
    fn config_set_persists_to_the_settings_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        let settings = SettingsStore::open_at(&path).expect("open");

        settings
            .update(|config| {
                SettingsEdit {
                    host: Some("devbox".into()),
                    ..SettingsEdit::default()
                }
                .apply(config)
            })
            .expect("update");

        assert_eq!(SettingsStore::open_at(&path).expect("reopen").config().host, "devbox");
    }
}
