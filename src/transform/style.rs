//! Stylesheet compilation and minification.
//!
//! `.scss`/`.sass` entries go through the external Sass compiler first.
//! Plain `.css` entries are bundled by lightningcss, which inlines local
//! `@import`s. Either way the result is prefixed, lowered for the configured
//! browser targets (e.g. media query ranges) and minified.

use std::path::Path;

use lightningcss::bundler::{Bundler, FileProvider};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::config::{BrowserTargets, StylesConfig};
use crate::pipeline::{FileTransform, StageError, VirtualFile};
use crate::utils::exec::{Cmd, FilterRule};

/// Sass deprecation chatter that is not worth surfacing on every rebuild.
static SASS_FILTER: FilterRule = FilterRule::new(&["DEPRECATION WARNING", "More info"]);

/// `compile-style` stage.
pub struct CompileStyle {
    sass: Vec<String>,
    targets: Targets,
}

impl CompileStyle {
    pub fn new(config: &StylesConfig) -> Self {
        Self {
            sass: config.sass.clone(),
            targets: to_targets(&config.targets),
        }
    }

    fn compile_sass(&self, file: &VirtualFile) -> Result<String, StageError> {
        let program = self.sass.first().map(String::as_str).unwrap_or("sass");
        if which::which(program).is_err() {
            return Err(StageError::new(format!(
                "Sass compiler `{program}` not found (set [styles] sass in gust.toml)"
            )));
        }

        let load_path = file
            .source
            .parent()
            .map(|dir| format!("--load-path={}", dir.display()));
        let indented = file.ext().as_deref() == Some("sass");

        let output = Cmd::from_slice(&self.sass)
            .args(["--stdin", "--no-source-map"])
            .arg(if indented { "--indented" } else { "" })
            .arg(load_path.unwrap_or_default())
            .stdin(&file.contents)
            .filter(&SASS_FILTER)
            .run()
            .map_err(|e| StageError::new(format!("{e:#}")))?;

        String::from_utf8(output.stdout)
            .map_err(|e| StageError::new(format!("Sass produced invalid UTF-8: {e}")))
    }
}

impl FileTransform for CompileStyle {
    fn name(&self) -> &'static str {
        "compile-style"
    }

    fn transform(&self, file: VirtualFile) -> Result<VirtualFile, StageError> {
        let css = match file.ext().as_deref() {
            Some("scss" | "sass") => {
                let compiled = self.compile_sass(&file)?;
                finish_css(&compiled, &file.source, self.targets)
            }
            _ => bundle_css(&file.source, self.targets),
        };
        let css = css.map_err(StageError::new)?;
        Ok(file.with_contents(css.into_bytes()).with_extension("css"))
    }
}

/// `minify-style` stage.
pub struct MinifyStyle {
    targets: Targets,
}

impl MinifyStyle {
    pub fn new(config: &StylesConfig) -> Self {
        Self {
            targets: to_targets(&config.targets),
        }
    }
}

impl FileTransform for MinifyStyle {
    fn name(&self) -> &'static str {
        "minify-style"
    }

    fn transform(&self, file: VirtualFile) -> Result<VirtualFile, StageError> {
        let css = minify_css(file.text()?, self.targets).map_err(StageError::new)?;
        Ok(file.with_contents(css.into_bytes()))
    }
}

/// Minify a stylesheet for the given targets.
pub fn minify_css(source: &str, targets: Targets) -> Result<String, String> {
    finish_css(source, Path::new("inline.css"), targets)
}

fn bundle_css(entry: &Path, targets: Targets) -> Result<String, String> {
    let provider = FileProvider::new();
    let mut bundler = Bundler::new(&provider, None, ParserOptions::default());
    let mut stylesheet = bundler.bundle(entry).map_err(|e| e.to_string())?;
    print_minified(&mut stylesheet, targets)
}

fn finish_css(source: &str, filename: &Path, targets: Targets) -> Result<String, String> {
    let options = ParserOptions {
        filename: filename.to_string_lossy().to_string(),
        ..ParserOptions::default()
    };
    let mut stylesheet = StyleSheet::parse(source, options).map_err(|e| e.to_string())?;
    print_minified(&mut stylesheet, targets)
}

fn print_minified(stylesheet: &mut StyleSheet<'_>, targets: Targets) -> Result<String, String> {
    stylesheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(result.code)
}

/// Convert major versions to lightningcss' `major << 16` encoding.
fn to_targets(targets: &BrowserTargets) -> Targets {
    let version = |v: Option<u32>| v.map(|major| major << 16);
    Targets::from(Browsers {
        chrome: version(targets.chrome),
        edge: version(targets.edge),
        firefox: version(targets.firefox),
        safari: version(targets.safari),
        ios_saf: version(targets.ios_safari),
        samsung: version(targets.samsung),
        ..Browsers::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn read(dir: &TempDir, rel: &str) -> VirtualFile {
        VirtualFile::read(&dir.path().join(rel), dir.path()).unwrap()
    }

    #[test]
    fn test_minify_css() {
        let css = minify_css("a {\n  color: #ff0000;\n}\n", Targets::default()).unwrap();
        assert_eq!(css, "a{color:red}");
    }

    #[test]
    fn test_compile_css_bundles_imports() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("base.css"), "body { margin: 0 }").unwrap();
        fs::write(
            dir.path().join("index.css"),
            "@import \"base.css\";\n.card { display: flex }",
        )
        .unwrap();

        let stage = CompileStyle::new(&StylesConfig::default());
        let out = stage.transform(read(&dir, "index.css")).unwrap();

        let css = String::from_utf8(out.contents).unwrap();
        assert!(css.contains("body{margin:0}"));
        assert!(css.contains(".card{display:flex}"));
        assert!(!css.contains("@import"));
        assert_eq!(out.rel, Path::new("index.css"));
    }

    #[test]
    fn test_compile_lowers_media_ranges() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("index.css"),
            "@media (width >= 600px) { a { color: blue } }",
        )
        .unwrap();

        let stage = CompileStyle::new(&StylesConfig::default());
        let css = String::from_utf8(stage.transform(read(&dir, "index.css")).unwrap().contents)
            .unwrap();
        assert!(css.contains("min-width:600px"), "got {css}");
    }

    #[test]
    fn test_compile_adds_prefixes_for_old_targets() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.css"), ".a { user-select: none }").unwrap();

        let mut config = StylesConfig::default();
        config.targets.safari = Some(12);
        let css = String::from_utf8(
            CompileStyle::new(&config)
                .transform(read(&dir, "index.css"))
                .unwrap()
                .contents,
        )
        .unwrap();
        assert!(css.contains("-webkit-user-select:none"), "got {css}");
    }

    #[test]
    fn test_missing_sass_compiler() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.scss"), "$c: red; a { color: $c }").unwrap();

        let mut config = StylesConfig::default();
        config.sass = vec!["gust-no-such-sass-binary".to_string()];
        let err = CompileStyle::new(&config)
            .transform(read(&dir, "index.scss"))
            .unwrap_err();
        assert!(err.message.contains("not found"));
    }

    #[test]
    fn test_targets_encoding() {
        let targets = to_targets(&BrowserTargets::default());
        let browsers = targets.browsers.unwrap();
        assert_eq!(browsers.chrome, Some(95 << 16));
        assert_eq!(browsers.ie, None);
    }
}
