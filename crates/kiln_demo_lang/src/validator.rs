//! Cross-unit checks for `.lang` units.

use std::collections::BTreeMap;

use kiln_diagnostics::{Category, Diagnostic, DiagnosticCode};
use kiln_lang::{ParsedUnit, Scope, Validator};

use crate::model::DemoUnit;

/// A `use` names a symbol no visible unit exports.
pub const UNRESOLVED_USE: DiagnosticCode = DiagnosticCode::new(Category::Linking, 201);
/// A `require` names a resource the classpath does not contain.
pub const UNRESOLVED_REQUIRE: DiagnosticCode = DiagnosticCode::new(Category::Linking, 202);
/// The same name is exported twice from one unit.
pub const DUPLICATE_EXPORT: DiagnosticCode = DiagnosticCode::new(Category::Validation, 301);
/// A local is declared but never mentioned afterwards.
pub const UNUSED_LOCAL: DiagnosticCode = DiagnosticCode::new(Category::Validation, 302);

/// Validator for `.lang` units.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoValidator;

impl Validator for DemoValidator {
    fn validate(&self, unit: &ParsedUnit, scope: &dyn Scope) -> Vec<Diagnostic> {
        let Some(model) = unit.model::<DemoUnit>() else {
            return Vec::new();
        };
        let uri = unit.uri();
        let mut issues = Vec::new();

        for used in &model.uses {
            if scope.resolve(&used.target).is_none() {
                issues.push(
                    Diagnostic::error(UNRESOLVED_USE, format!("cannot resolve `{}`", used.target))
                        .at(uri, used.line, used.column),
                );
            }
        }

        let mut first_seen = BTreeMap::new();
        for export in &model.exports {
            let first = *first_seen.entry(&export.name).or_insert(export.line);
            if first != export.line {
                issues.push(
                    Diagnostic::error(DUPLICATE_EXPORT, format!("`{}` is exported more than once", export.name))
                        .at(uri, export.line, 1)
                        .with_note(format!("first exported on line {first}")),
                );
            }
        }

        for required in &model.requires {
            if scope.resolve_resource(&required.path).is_none() {
                issues.push(
                    Diagnostic::error(
                        UNRESOLVED_REQUIRE,
                        format!("resource `{}` is not on the classpath", required.path),
                    )
                    .at(uri, required.line, required.column),
                );
            }
        }

        for local in model.lets.iter().filter(|l| !l.used && !l.is_synthetic()) {
            issues.push(
                Diagnostic::warning(UNUSED_LOCAL, format!("local `{}` is never used", local.name))
                    .at(uri, local.line, 1)
                    .with_note("prefix the name with `_` to silence this warning"),
            );
        }

        issues
    }
}
