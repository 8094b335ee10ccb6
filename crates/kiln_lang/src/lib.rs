//! Pluggable language capabilities and the registry that resolves them.
//!
//! A language is installed as a [`LanguageSetup`]: its identifier, the file
//! extensions it claims, and its [`Parser`], [`Validator`] and [`Generator`].
//! Setups are looked up by identifier in a [`SetupCatalog`] and registered
//! into a [`LanguageRegistry`] once at startup. The registry is then shared
//! read-only by every build.

#![warn(missing_docs)]

pub mod capability;
pub mod catalog;
pub mod error;
pub mod registry;
pub mod scope;
pub mod setup;

pub use capability::{GeneratedFile, Generator, ParsedUnit, Parser, Validator};
pub use catalog::{SetupCatalog, SetupFactory};
pub use error::RegistrationError;
pub use registry::LanguageRegistry;
pub use scope::{ResolvedSymbol, Scope};
pub use setup::LanguageSetup;
