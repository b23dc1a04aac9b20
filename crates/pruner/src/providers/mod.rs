//! Supported test runner integrations and the factory that builds them

pub mod dotnet;

pub use dotnet::{DotNetProvider, DotNetSettings};

use crate::provider::TestProvider;
use crate::result::{PrunerError, PrunerResult};
use crate::settings::{PrunerSettings, SettingsQuestion};
use std::path::Path;

/// A supported integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// `dotnet test` with AltCover
    DotNet,
}

const SUPPORTED_PROVIDER_NAMES: [&str; 1] = [ProviderKind::DotNet.name()];

impl ProviderKind {
    /// All kinds, in listing order
    pub const ALL: [Self; 1] = [Self::DotNet];

    /// Name used on the command line and in storage
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DotNet => "dotnet",
        }
    }

    /// Resolve a provider name
    pub fn from_name(name: &str) -> PrunerResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| PrunerError::UnknownProvider(name.to_owned()))
    }

    /// Questions `init` asks for this provider
    #[must_use]
    pub fn init_questions(self) -> &'static [SettingsQuestion] {
        match self {
            Self::DotNet => DotNetProvider::init_questions(),
        }
    }
}

/// Names accepted by [`ProviderKind::from_name`]
#[must_use]
pub fn supported_provider_names() -> &'static [&'static str] {
    &SUPPORTED_PROVIDER_NAMES
}

/// Build a provider from project settings
pub fn build_provider(
    kind: ProviderKind,
    settings: &PrunerSettings,
    project_root: &Path,
) -> PrunerResult<Box<dyn TestProvider>> {
    let provider: Box<dyn TestProvider> = match kind {
        ProviderKind::DotNet => Box::new(DotNetProvider::new(
            settings.provider::<DotNetSettings>(kind.name())?,
            project_root,
            settings.merge_policy(),
        )?),
    };
    Ok(provider)
}
