//! Line parser for `.lang` units.

use kiln_common::{ContentHash, SourceUri};
use kiln_diagnostics::{Category, Diagnostic, DiagnosticCode};
use kiln_index::{QualifiedName, ResourceDescription};
use kiln_lang::{ParsedUnit, Parser};

use crate::model::{DemoUnit, Export, Let, Require, Use};

/// A line that is not a statement.
pub const UNRECOGNIZED_STATEMENT: DiagnosticCode = DiagnosticCode::new(Category::Syntax, 101);
/// A statement keyword followed by a malformed operand.
pub const MALFORMED_STATEMENT: DiagnosticCode = DiagnosticCode::new(Category::Syntax, 102);

/// Parser for `.lang` units.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoParser;

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn mentions(line: &str, name: &str) -> bool {
    line.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|token| token == name)
}

struct LineParser<'a> {
    uri: &'a SourceUri,
    unit: DemoUnit,
    issues: Vec<Diagnostic>,
}

impl LineParser<'_> {
    fn malformed(&mut self, line: u32, column: u32, message: String) {
        self.issues
            .push(Diagnostic::error(MALFORMED_STATEMENT, message).at(self.uri, line, column));
    }

    fn statement(&mut self, line: u32, indent: u32, text: &str) {
        let (keyword, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        let operand = rest.trim();
        let operand_column = indent + (text.len() - rest.trim_start().len()) as u32 + 1;
        match keyword {
            "export" => self.export(line, operand_column, operand),
            "use" => {
                let segments: Vec<&str> = operand.split('.').collect();
                if segments.len() < 2 || !segments.iter().all(|s| is_identifier(s)) {
                    self.malformed(line, operand_column, format!("expected `use UNIT.NAME`, found `{text}`"));
                    return;
                }
                self.unit.uses.push(Use {
                    target: QualifiedName::new(operand),
                    line,
                    column: operand_column,
                });
            }
            "require" => {
                if operand.is_empty() || operand.contains(char::is_whitespace) {
                    self.malformed(line, operand_column, format!("expected `require PATH`, found `{text}`"));
                    return;
                }
                self.unit.requires.push(Require {
                    path: operand.to_string(),
                    line,
                    column: operand_column,
                });
            }
            "let" => {
                let Some((name, expr)) = operand.split_once('=') else {
                    self.malformed(line, operand_column, format!("expected `let NAME = EXPR`, found `{text}`"));
                    return;
                };
                let name = name.trim();
                if !is_identifier(name) {
                    self.malformed(line, operand_column, format!("`{name}` is not a valid local name"));
                    return;
                }
                self.unit.lets.push(Let {
                    name: name.to_string(),
                    expr: expr.trim().to_string(),
                    line,
                    used: false,
                });
            }
            _ => self.issues.push(
                Diagnostic::error(UNRECOGNIZED_STATEMENT, format!("unrecognized statement `{text}`"))
                    .at(self.uri, line, indent + 1)
                    .with_note("expected `export`, `use`, `require` or `let`"),
            ),
        }
    }

    fn export(&mut self, line: u32, column: u32, operand: &str) {
        let parsed = operand
            .strip_suffix(')')
            .and_then(|s| s.split_once('('))
            .filter(|(name, _)| is_identifier(name.trim()));
        let Some((name, signature)) = parsed else {
            self.malformed(line, column, format!("expected `export NAME(SIGNATURE)`, found `{operand}`"));
            return;
        };
        let name = QualifiedName::from_segments([self.unit.stem.as_str(), name.trim()]);
        self.unit.exports.push(Export {
            name,
            signature: signature.trim().to_string(),
            line,
        });
    }
}

impl Parser for DemoParser {
    fn parse(&self, uri: &SourceUri, text: &str) -> ParsedUnit {
        let mut parser = LineParser {
            uri,
            unit: DemoUnit {
                stem: uri.stem().unwrap_or_default().to_string(),
                file_name: uri.file_name().unwrap_or_default().to_string(),
                ..DemoUnit::default()
            },
            issues: Vec::new(),
        };

        let lines: Vec<&str> = text.lines().collect();
        for (index, raw) in lines.iter().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let indent = (raw.len() - raw.trim_start().len()) as u32;
            parser.statement(index as u32 + 1, indent, trimmed);
        }

        for local in &mut parser.unit.lets {
            local.used = lines
                .iter()
                .skip(local.line as usize)
                .filter(|l| !l.trim_start().starts_with('#'))
                .any(|l| mentions(l, &local.name));
        }

        let mut description = ResourceDescription::new(uri.clone());
        for export in &parser.unit.exports {
            description = description.with_export(export.name.clone(), ContentHash::of_str(&export.signature));
        }
        for used in &parser.unit.uses {
            description = description.with_reference(used.target.clone());
        }

        ParsedUnit::new(description, parser.unit).with_issues(parser.issues)
    }
}
