//! A small line-oriented reference language for `.lang` files.
//!
//! ```text
//! # comment
//! export area(width, height)   exports `<stem>.area`
//! use Shapes.square            references another unit's export
//! require shapes/palette.txt   needs a classpath resource
//! let total = width * height   a local; `_`-prefixed locals are synthetic
//! ```
//!
//! Each unit generates `<stem>.out` into the `default` outlet, with a line
//! trace back to the source.

#![warn(missing_docs)]

pub mod generator;
pub mod model;
pub mod parser;
pub mod validator;

use std::sync::Arc;

use kiln_common::Encoding;
use kiln_lang::{LanguageSetup, SetupCatalog};

pub use generator::DemoGenerator;
pub use model::DemoUnit;
pub use parser::DemoParser;
pub use validator::DemoValidator;

/// Identifier this language registers under.
pub const SETUP_ID: &str = "kiln.demo";
/// Language identifier keying output configurations.
pub const LANGUAGE_ID: &str = "demo";
/// File extension of source units.
pub const EXTENSION: &str = "lang";
/// Outlet generated files go to.
pub const OUTLET: &str = "default";

/// Builds the language setup.
pub fn setup() -> LanguageSetup {
    LanguageSetup {
        id: SETUP_ID.to_string(),
        language: LANGUAGE_ID.to_string(),
        file_extensions: vec![EXTENSION.to_string()],
        parser: Arc::new(DemoParser),
        validator: Arc::new(DemoValidator),
        generator: Arc::new(DemoGenerator),
        encoding: Encoding::default(),
    }
}

/// A catalog containing this language.
pub fn catalog() -> SetupCatalog {
    SetupCatalog::new().with(SETUP_ID, setup)
}
