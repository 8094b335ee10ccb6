//! Parsed form of a `.lang` unit.

use kiln_index::QualifiedName;

/// An `export NAME(SIGNATURE)` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Qualified name, `<stem>.NAME`.
    pub name: QualifiedName,
    /// Signature text between the parentheses, trimmed.
    pub signature: String,
    /// 1-based source line.
    pub line: u32,
}

/// A `use UNIT.NAME` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Use {
    /// Referenced name.
    pub target: QualifiedName,
    /// 1-based source line.
    pub line: u32,
    /// 1-based column of the name.
    pub column: u32,
}

/// A `require PATH` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    /// Classpath resource path.
    pub path: String,
    /// 1-based source line.
    pub line: u32,
    /// 1-based column of the path.
    pub column: u32,
}

/// A `let NAME = EXPR` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Let {
    /// Local name.
    pub name: String,
    /// Expression text.
    pub expr: String,
    /// 1-based source line.
    pub line: u32,
    /// Whether a later line mentions the name.
    pub used: bool,
}

impl Let {
    /// Locals starting with `_` are compiler-introduced.
    pub fn is_synthetic(&self) -> bool {
        self.name.starts_with('_')
    }
}

/// Everything a unit declares, in source order per statement kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoUnit {
    /// File stem, used to qualify exports.
    pub stem: String,
    /// File name of the unit.
    pub file_name: String,
    /// Exports.
    pub exports: Vec<Export>,
    /// Uses.
    pub uses: Vec<Use>,
    /// Requires.
    pub requires: Vec<Require>,
    /// Locals.
    pub lets: Vec<Let>,
}
