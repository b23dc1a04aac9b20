//! Init command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::InitArgs;
use pruner::{GitRepository, PrunerSettings, ProviderKind, StateStore};
use std::path::{Path, PathBuf};

/// Execute the init command from `cwd`
pub async fn execute_init(config: &CliConfig, args: &InitArgs, cwd: &Path) -> CliResult<PathBuf> {
    let repo = GitRepository::discover(cwd).await?;
    let settings = build_settings(args.provider.as_deref(), &args.answers)?;
    let path = write_settings(repo.root(), &settings, args.force).await?;

    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    reporter.success("Pruner has been initialized!");
    if config.verbosity.is_verbose() {
        reporter.info(&format!("Settings written to {}", path.display()));
    }
    Ok(path)
}

/// Settings from the `--provider`/`--answer` flags
pub fn build_settings(provider: Option<&str>, answers: &[String]) -> CliResult<PrunerSettings> {
    let mut settings = PrunerSettings::new();
    let Some(provider) = provider else {
        return Ok(settings);
    };

    let kind = ProviderKind::from_name(provider)?;
    let questions = kind.init_questions();
    for answer in answers {
        let (key, value) = parse_answer(answer)?;
        if !questions.iter().any(|question| question.key == key) {
            let known: Vec<&str> = questions.iter().map(|question| question.key).collect();
            return Err(CliError::invalid_argument(format!(
                "{provider} has no setting '{key}' (expected one of: {})",
                known.join(", ")
            )));
        }
        settings.set_answer(kind.name(), key, value);
    }
    Ok(settings)
}

/// Split `key=value`
pub fn parse_answer(answer: &str) -> CliResult<(&str, &str)> {
    match answer.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(CliError::invalid_argument(format!(
            "answer '{answer}' must look like key=value"
        ))),
    }
}

/// Create `.pruner/settings.json` under `root`
///
/// An existing document is only replaced when `force` is set.
pub async fn write_settings(root: &Path, settings: &PrunerSettings, force: bool) -> CliResult<PathBuf> {
    let store = StateStore::new(root);
    if store.settings_exists().await? && !force {
        return Err(CliError::config(format!(
            "{} already exists; use --force to overwrite it",
            store.settings_path().display()
        )));
    }
    store.save_settings(settings).await?;
    tracing::info!(path = %store.settings_path().display(), "wrote settings");
    Ok(store.settings_path())
}
