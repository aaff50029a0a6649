//! CLI bootstrap: the composition root.
//!
//! The only place where concrete adapters are chosen and wired into a
//! [`SpeechSession`]:
//! - synthesis client and optional cost ledger (questvoice-synth)
//! - file or speaker output (questvoice-playback)
//! - the event emitter feeding `--events`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Notify, mpsc};
use tracing::{debug, info};

use questvoice_core::{
    AudioLoader, ChannelEmitter, CostLedgerPort, NoopCostLedger, TtsEvent, TtsSettings,
    TtsSettingsUpdate, validate_settings,
};
use questvoice_playback::{FileOutput, SpeechSession};
use questvoice_synth::{
    HttpCostLedger, HttpSynthesisClient, LedgerClientConfig, SpeechProducer, SynthClientConfig,
};

use crate::error::CliError;
use crate::parser::Cli;

/// Bootstrap configuration, resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub ledger_url: Option<String>,
    pub ledger_token: Option<String>,
    pub settings_path: Option<PathBuf>,
    pub voice: Option<String>,
    pub out_dir: PathBuf,
    pub speaker: bool,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            endpoint: cli.endpoint.clone(),
            token: cli.token.clone(),
            ledger_url: cli.ledger_url.clone(),
            ledger_token: cli.ledger_token.clone(),
            settings_path: cli.settings.clone(),
            voice: cli.voice.clone(),
            out_dir: cli.out_dir.clone(),
            speaker: cli.speaker,
        }
    }

    /// Settings file (if any) with flag overrides applied, validated.
    pub fn settings(&self) -> Result<TtsSettings, CliError> {
        let mut settings = match &self.settings_path {
            Some(path) => read_settings(path)?,
            None => TtsSettings::with_defaults(),
        };
        if let Some(voice) = &self.voice {
            settings.merge(&TtsSettingsUpdate {
                voice_id: Some(Some(voice.clone())),
                ..TtsSettingsUpdate::default()
            });
        }
        validate_settings(&settings)?;
        Ok(settings)
    }
}

fn read_settings(path: &Path) -> Result<TtsSettings, CliError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| CliError::Data(format!("settings file {}: {e}", path.display())))
}

/// Fully composed context for command handlers.
pub struct CliContext {
    pub session: SpeechSession,
    /// Signalled by the engine's drained hook.
    pub drained: Arc<Notify>,
    /// Engine events, taken by the handler that prints them.
    pub events: Option<mpsc::UnboundedReceiver<TtsEvent>>,
}

impl std::fmt::Debug for CliContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliContext")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Wire adapters into a speech session.
///
/// Must be called from within a tokio runtime.
pub fn bootstrap(config: &CliConfig) -> Result<CliContext, CliError> {
    let settings = config.settings()?;

    let endpoint = config.endpoint.as_deref().ok_or_else(|| {
        CliError::Config("no synthesis endpoint; pass --endpoint or set QUESTVOICE_TTS_URL".into())
    })?;
    let synth = HttpSynthesisClient::new(
        &SynthClientConfig::new(endpoint).with_optional_token(config.token.clone()),
    )?;

    let ledger: Arc<dyn CostLedgerPort> = match &config.ledger_url {
        Some(url) => Arc::new(HttpCostLedger::new(
            &LedgerClientConfig::new(url).with_optional_token(config.ledger_token.clone()),
        )?),
        None => {
            debug!(target: "questvoice.cli", "No ledger configured; generations are not charged");
            Arc::new(NoopCostLedger)
        }
    };

    let loader = audio_output(config)?;
    let producer = SpeechProducer::new(Arc::new(synth), ledger, loader, &settings);

    let (emitter, events) = ChannelEmitter::new();
    let session = SpeechSession::create(settings, Arc::new(producer), Arc::new(emitter))?;

    let drained = Arc::new(Notify::new());
    let hook = Arc::clone(&drained);
    session.set_drained_hook(move || hook.notify_one());

    info!(target: "questvoice.cli", endpoint, speaker = config.speaker, "Speech session ready");
    Ok(CliContext {
        session,
        drained,
        events: Some(events),
    })
}

fn audio_output(config: &CliConfig) -> Result<Arc<dyn AudioLoader>, CliError> {
    if config.speaker {
        return speaker_output();
    }
    Ok(Arc::new(FileOutput::new(&config.out_dir).keep_files(true)))
}

#[cfg(feature = "local-output")]
fn speaker_output() -> Result<Arc<dyn AudioLoader>, CliError> {
    let speaker = questvoice_playback::SpeakerOutput::open()
        .map_err(|e| CliError::Config(format!("audio device: {e}")))?;
    Ok(Arc::new(speaker))
}

#[cfg(not(feature = "local-output"))]
fn speaker_output() -> Result<Arc<dyn AudioLoader>, CliError> {
    Err(CliError::Arguments(
        "--speaker needs a build with the `local-output` feature".into(),
    ))
}
