//! Script stages: transpile, concatenate, minify.
//!
//! Transpilation parses every file as an ES module and re-emits it, so a
//! syntax error fails the task before anything is bundled. Syntax is not
//! down-leveled.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::pipeline::{FileSet, FileTransform, Stage, StageError, VirtualFile};

/// `transpile-script` stage.
pub struct TranspileScript;

impl FileTransform for TranspileScript {
    fn name(&self) -> &'static str {
        "transpile-script"
    }

    fn transform(&self, file: VirtualFile) -> Result<VirtualFile, StageError> {
        let code = transpile_js(file.text()?).map_err(StageError::new)?;
        Ok(file.with_contents(code.into_bytes()))
    }
}

/// `concat` stage: joins every file into one bundle, in input order.
pub struct Concat {
    name: String,
}

impl Concat {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Stage for Concat {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn apply(&self, files: FileSet) -> Result<FileSet, StageError> {
        let mut contents = Vec::new();
        for file in &files {
            if !contents.is_empty() && !contents.ends_with(b"\n") {
                contents.push(b'\n');
            }
            contents.extend_from_slice(&file.contents);
        }

        let mut bundle = VirtualFile::generated(&self.name, contents);
        // The bundle is as new as its newest part.
        bundle.mtime = files.iter().filter_map(|f| f.mtime).max();
        Ok(vec![bundle])
    }
}

/// `minify-script` stage.
pub struct MinifyScript;

impl FileTransform for MinifyScript {
    fn name(&self) -> &'static str {
        "minify-script"
    }

    fn transform(&self, file: VirtualFile) -> Result<VirtualFile, StageError> {
        let code = minify_js(file.text()?).map_err(StageError::new)?;
        Ok(file.with_contents(code.into_bytes()))
    }
}

/// Parse as an ES module and re-emit; the first parse error is the message.
fn transpile_js(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(error.to_string());
    }
    Ok(Codegen::new().build(&ret.program).code)
}

/// Minify JavaScript source code.
pub fn minify_js(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(error.to_string());
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}
