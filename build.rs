//! Build script: minifies the embedded live-reload client.
//!
//! The error overlay stylesheet is minified separately and spliced into the
//! client script before the script itself is minified.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use std::fs;
use std::path::Path;

const OVERLAY_CSS_PLACEHOLDER: &str = "__GUST_OVERLAY_CSS__";

const RELOAD_JS: &str = "src/embed/serve/reload.js";
const OVERLAY_CSS: &str = "src/embed/serve/overlay.css";

fn main() {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let out_path = Path::new(&out_dir);

    build_reload_client(RELOAD_JS, OVERLAY_CSS, &out_path.join("reload.min.js"));

    println!("cargo:rerun-if-changed={RELOAD_JS}");
    println!("cargo:rerun-if-changed={OVERLAY_CSS}");
}

fn build_reload_client(js_input: &str, css_input: &str, output: &Path) {
    let source = fs::read_to_string(js_input).expect("Failed to read reload.js");
    let css_source = fs::read_to_string(css_input).expect("Failed to read overlay.css");
    let css = escape_template_literal(&minify_css(&css_source));

    let count = source.matches(OVERLAY_CSS_PLACEHOLDER).count();
    assert_eq!(
        count, 1,
        "reload.js must contain exactly one {OVERLAY_CSS_PLACEHOLDER} placeholder"
    );

    let source = source.replace(OVERLAY_CSS_PLACEHOLDER, &css);
    fs::write(output, minify_js(&source)).expect("Failed to write minified reload.js");
}

fn escape_template_literal(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

fn minify_js(source: &str) -> String {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    assert!(ret.errors.is_empty(), "Parse errors: {:?}", ret.errors);

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code
}

fn minify_css(source: &str) -> String {
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).expect("Failed to parse CSS");
    stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .expect("Failed to minify CSS")
        .code
}
