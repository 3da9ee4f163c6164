//! Change-to-reaction bindings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::GustConfig;
use crate::pipeline::PathSpec;
use crate::task::names;

/// What a matching change causes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reaction {
    /// Re-run a task; it re-resolves its sources and notifies on its own
    Run(String),
    /// Reload connected pages without rebuilding anything
    Reload,
}

#[derive(Debug)]
pub struct WatchBinding {
    pub spec: PathSpec,
    pub reaction: Reaction,
}

/// Ordered set of independent bindings.
#[derive(Debug, Default)]
pub struct WatchRegistrar {
    bindings: Vec<WatchBinding>,
}

impl WatchRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: PathSpec, reaction: Reaction) {
        self.bindings.push(WatchBinding { spec, reaction });
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }

    /// The default bindings of the development pipeline.
    pub fn from_config(config: &GustConfig) -> Result<Self> {
        let src = &config.paths.src;
        let table: [(PathBuf, &str, Reaction); 6] = [
            (src.clone(), "*.html", Reaction::Run(names::HTML.into())),
            (src.join("styles"), "**/*", Reaction::Run(names::STYLES.into())),
            (src.join("scripts"), "*.js", Reaction::Run(names::SCRIPTS.into())),
            (src.join("images"), "**/*", Reaction::Run(names::IMAGES.into())),
            (src.join("fonts"), "**/*", Reaction::Run(names::FONTS.into())),
            (src.clone(), "**/*.html", Reaction::Reload),
        ];

        let mut registrar = Self::new();
        for (base, pattern, reaction) in table {
            let spec = PathSpec::new(&base, &[pattern])
                .with_context(|| format!("invalid watch pattern {pattern}"))?;
            registrar.register(spec, reaction);
        }
        Ok(registrar)
    }

    /// Reactions triggered by a batch of changed paths, each at most once,
    /// in binding order.
    pub fn reactions(&self, paths: &[PathBuf]) -> Vec<Reaction> {
        self.bindings
            .iter()
            .filter(|binding| paths.iter().any(|path| binding.spec.matches(path)))
            .map(|binding| binding.reaction.clone())
            .fold(Vec::new(), |mut out, reaction| {
                if !out.contains(&reaction) {
                    out.push(reaction);
                }
                out
            })
    }

    /// Directories to watch recursively: binding bases not nested in another.
    pub fn roots(&self) -> Vec<PathBuf> {
        let mut bases: Vec<&Path> = self.bindings.iter().map(|b| b.spec.base()).collect();
        bases.sort();
        bases.dedup();

        let mut roots: Vec<PathBuf> = Vec::new();
        for base in bases {
            if !roots.iter().any(|root| base.starts_with(root)) {
                roots.push(base.to_path_buf());
            }
        }
        roots
    }
}
