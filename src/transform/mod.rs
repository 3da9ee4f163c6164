//! Concrete transform stages.
//!
//! | Stage              | Kind      | Module   |
//! |--------------------|-----------|----------|
//! | `minify-html`      | per file  | `html`   |
//! | `compile-style`    | per file  | `style`  |
//! | `minify-style`     | per file  | `style`  |
//! | `transpile-script` | per file  | `script` |
//! | `concat`           | reducing  | `script` |
//! | `minify-script`    | per file  | `script` |
//! | `webp`             | per file  | `image`  |
//! | `optimize-image`   | per file  | `image`  |
//! | `woff` / `woff2`   | per file  | `font`   |
//! | `select` / `newer` | filtering | `filter` |

mod filter;
pub mod font;
mod html;
mod image;
mod script;
mod style;

pub use filter::{Newer, Select};
pub use font::{ToWoff, ToWoff2};
pub use html::MinifyHtml;
pub use image::{OptimizeImage, ToWebp};
pub use script::{Concat, MinifyScript, TranspileScript, minify_js};
pub use style::{CompileStyle, MinifyStyle, minify_css};
