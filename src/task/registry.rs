//! The static task table.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;

use super::{ReloadKind, Task};
use crate::config::GustConfig;
use crate::pipeline::{PathSpec, Pipeline};
use crate::transform::{
    CompileStyle, Concat, MinifyHtml, MinifyScript, MinifyStyle, Newer, OptimizeImage, Select,
    ToWebp, ToWoff, ToWoff2, TranspileScript,
};

/// Registered task names.
pub mod names {
    pub const HTML: &str = "html";
    pub const STYLES: &str = "styles";
    pub const SCRIPTS: &str = "scripts";
    pub const IMAGES: &str = "images";
    pub const FONTS: &str = "fonts";

    pub const HTML_BUILD: &str = "htmlBuild";
    pub const STYLES_BUILD: &str = "stylesBuild";
    pub const SCRIPTS_BUILD: &str = "scriptsBuild";
    pub const COPY_STATIC_ASSETS: &str = "copyStaticAssets";
}

const RASTER: &[&str] = &["png", "jpg", "jpeg"];
const VECTOR: &[&str] = &["svg"];

/// Tasks by name, in registration order.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Vec<Arc<Task>>,
    index: FxHashMap<String, usize>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Names are unique.
    pub fn register(&mut self, task: Task) -> Result<()> {
        if self.index.contains_key(task.name()) {
            bail!("task '{}' is already registered", task.name());
        }
        self.index.insert(task.name().to_string(), self.tasks.len());
        self.tasks.push(Arc::new(task));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Task>> {
        self.index.get(name).map(|&i| Arc::clone(&self.tasks[i]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.tasks.iter()
    }

    /// Build the development and production tasks for a project.
    pub fn from_config(config: &GustConfig) -> Result<Self> {
        let mut registry = Self::new();
        for task in dev_tasks(config)?.into_iter().chain(build_tasks(config)?) {
            registry.register(task)?;
        }
        Ok(registry)
    }
}

fn spec(base: impl Into<std::path::PathBuf>, patterns: &[&str]) -> Result<PathSpec> {
    let base = base.into();
    PathSpec::new(&base, patterns)
        .with_context(|| format!("invalid pattern {patterns:?} under {}", base.display()))
}

fn dev_tasks(config: &GustConfig) -> Result<Vec<Task>> {
    let src = &config.paths.src;
    let dist = &config.paths.dist;

    let html = Task::new(names::HTML, spec(src, &["*.html"])?, dist)
        .branch(Pipeline::new().map(MinifyHtml::development()))
        .reload(ReloadKind::Full);

    let styles = Task::new(
        names::STYLES,
        spec(src.join("styles"), &["index.{css,scss,sass}"])?,
        dist.join("css"),
    )
    .branch(Pipeline::new().map(CompileStyle::new(&config.styles)))
    .reload(ReloadKind::Css);

    let scripts = Task::new(
        names::SCRIPTS,
        spec(src.join("scripts"), &["*.js"])?,
        dist.join("scripts"),
    )
    .branch(
        Pipeline::new()
            .map(TranspileScript)
            .pipe(Concat::new(&config.scripts.bundle))
            .map(MinifyScript),
    )
    .reload(ReloadKind::Full);

    let images_dest = dist.join("images");
    let mut images = Task::new(
        names::IMAGES,
        spec(src.join("images"), &["*.{png,jpg,jpeg,svg}"])?,
        &images_dest,
    );
    if config.images.webp {
        images = images.branch(
            Pipeline::new()
                .pipe(Select(RASTER))
                .pipe(Newer::with_ext(&images_dest, "webp"))
                .map(ToWebp),
        );
    }
    let images = images
        .branch(
            Pipeline::new()
                .pipe(Select(RASTER))
                .pipe(Newer::new(&images_dest))
                .map(OptimizeImage::new(config.images.jpeg_quality)),
        )
        .branch(
            Pipeline::new()
                .pipe(Select(VECTOR))
                .pipe(Newer::new(&images_dest)),
        )
        .reload(ReloadKind::Full);

    let fonts_dest = dist.join("fonts");
    let fonts = Task::new(
        names::FONTS,
        spec(src.join("fonts"), &["**/*.{ttf,otf}"])?,
        &fonts_dest,
    )
    .branch(
        Pipeline::new()
            .pipe(Newer::with_ext(&fonts_dest, "woff"))
            .map(ToWoff),
    )
    .branch(
        Pipeline::new()
            .pipe(Newer::with_ext(&fonts_dest, "woff2"))
            .map(ToWoff2),
    )
    .reload(ReloadKind::Full);

    Ok(vec![html, styles, scripts, images, fonts])
}

fn build_tasks(config: &GustConfig) -> Result<Vec<Task>> {
    let dist = &config.paths.dist;
    let build = &config.paths.build;

    let html = Task::new(names::HTML_BUILD, spec(dist, &["*.html"])?, build)
        .branch(Pipeline::new().map(MinifyHtml::production()));

    let styles = Task::new(
        names::STYLES_BUILD,
        spec(dist.join("css"), &["*.css"])?,
        build.join("css"),
    )
    .branch(Pipeline::new().map(MinifyStyle::new(&config.styles)));

    let scripts = Task::new(
        names::SCRIPTS_BUILD,
        spec(dist.join("scripts"), &["*.js"])?,
        build.join("scripts"),
    )
    .branch(Pipeline::new().map(MinifyScript));

    let assets = Task::new(
        names::COPY_STATIC_ASSETS,
        spec(dist, &["images/**/*", "fonts/**/*"])?,
        build,
    )
    .branch(Pipeline::new());

    Ok(vec![html, styles, scripts, assets])
}
