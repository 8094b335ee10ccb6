//! Code generation for `.lang` units.

use std::path::PathBuf;

use kiln_debuginfo::SourceTrace;
use kiln_lang::{GeneratedFile, Generator, ParsedUnit, Scope};

use crate::model::DemoUnit;
use crate::OUTLET;

/// Extension of generated files.
pub const OUTPUT_EXTENSION: &str = "out";

/// Generator for `.lang` units.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoGenerator;

struct Line {
    source_line: u32,
    text: String,
    local: Option<(String, bool)>,
}

fn lines(model: &DemoUnit, scope: &dyn Scope) -> Vec<Line> {
    let mut out = Vec::new();
    for export in &model.exports {
        out.push(Line {
            source_line: export.line,
            text: format!("fn {}({})", export.name, export.signature),
            local: None,
        });
    }
    for used in &model.uses {
        let text = match scope.resolve(&used.target) {
            Some(found) => format!("import {} from {} [{}]", used.target, found.unit, found.container),
            None => format!("import {} [unresolved]", used.target),
        };
        out.push(Line {
            source_line: used.line,
            text,
            local: None,
        });
    }
    for required in &model.requires {
        let text = match scope.resolve_resource(&required.path) {
            Some(found) => format!("resource {} => {}", required.path, found.display()),
            None => format!("resource {} [missing]", required.path),
        };
        out.push(Line {
            source_line: required.line,
            text,
            local: None,
        });
    }
    for local in &model.lets {
        out.push(Line {
            source_line: local.line,
            text: format!("let {} = {}", local.name, local.expr),
            local: Some((local.name.clone(), local.is_synthetic())),
        });
    }
    out.sort_by_key(|l| l.source_line);
    out
}

impl Generator for DemoGenerator {
    fn generate(&self, unit: &ParsedUnit, scope: &dyn Scope) -> Vec<GeneratedFile> {
        let Some(model) = unit.model::<DemoUnit>() else {
            return Vec::new();
        };

        let mut trace = SourceTrace::new(unit.uri().path());
        let mut contents = format!("// generated from {}\n", model.file_name);
        for (index, line) in lines(model, scope).into_iter().enumerate() {
            let generated_line = index as u32 + 2;
            contents.push_str(&line.text);
            contents.push('\n');
            trace.map_line(generated_line, line.source_line);
            if let Some((name, synthetic)) = line.local {
                trace.add_local(name, generated_line, synthetic);
            }
        }

        vec![GeneratedFile {
            outlet: OUTLET.to_string(),
            relative_path: PathBuf::from(format!("{}.{OUTPUT_EXTENSION}", model.stem)),
            contents: contents.into_bytes(),
            trace: Some(trace),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DemoParser;
    use kiln_common::{ContainerHandle, ContentHash, SourceUri};
    use kiln_index::QualifiedName;
    use kiln_lang::{Parser, ResolvedSymbol};
    use std::path::Path;

    struct LibScope;

    impl Scope for LibScope {
        fn resolve(&self, name: &QualifiedName) -> Option<ResolvedSymbol> {
            (name.first_segment() == "Math").then(|| ResolvedSymbol {
                container: ContainerHandle::new("lib"),
                unit: SourceUri::from_absolute(Path::new("/lib/Math.lang")),
                signature: ContentHash::of_str(""),
            })
        }

        fn resolve_resource(&self, _path: &str) -> Option<PathBuf> {
            None
        }
    }

    fn generate(text: &str) -> GeneratedFile {
        let uri = SourceUri::from_absolute(Path::new("/ws/src/Shapes.lang"));
        let mut files = DemoGenerator.generate(&DemoParser.parse(&uri, text), &LibScope);
        assert_eq!(files.len(), 1);
        files.remove(0)
    }

    #[test]
    fn writes_one_line_per_statement() {
        let file = generate("# header\nuse Math.mul\n\nexport area(w, h)\nlet a = w\n");
        assert_eq!(file.outlet, "default");
        assert_eq!(file.relative_path, PathBuf::from("Shapes.out"));
        let text = String::from_utf8(file.contents).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "// generated from Shapes.lang",
                "import Math.mul from /lib/Math.lang [lib]",
                "fn Shapes.area(w, h)",
                "let a = w",
            ]
        );
    }

    #[test]
    fn trace_maps_generated_lines_to_source() {
        let file = generate("use Math.mul\n\nexport area(w, h)\nlet _t = 0\n");
        let trace = file.trace.unwrap();
        assert_eq!(trace.source_name, "Shapes.lang");
        assert_eq!(trace.source_line_for(1), None);
        assert_eq!(trace.source_line_for(2), Some(1));
        assert_eq!(trace.source_line_for(3), Some(3));
        assert_eq!(trace.source_line_for(4), Some(4));
        assert_eq!(trace.locals.len(), 1);
        assert_eq!(trace.locals[0].generated_line, 4);
        assert!(trace.locals[0].synthetic);
    }

    #[test]
    fn same_input_generates_same_bytes() {
        let text = "export f(int)\nlet x = f\n";
        assert_eq!(generate(text).contents, generate(text).contents);
    }
}
