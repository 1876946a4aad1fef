//! Relations (tables and views) declared by a compiled SQL program.

use serde::{Deserialize, Serialize};

/// Column type as reported by the SQL compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnType {
  #[serde(rename = "type")]
  pub typ: String,
  #[serde(default)]
  pub nullable: bool,
}

/// A SQL column of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
  pub name: String,
  pub columntype: ColumnType,
}

/// A named table (input) or view (output) of a compiled program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
  pub name: String,
  #[serde(default)]
  pub fields: Vec<Field>,
}

impl Relation {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      fields: vec![],
    }
  }
}

/// Input and output relations of a compiled program.
///
/// Replaced wholesale on recompilation; never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSchema {
  #[serde(default)]
  pub inputs: Vec<Relation>,
  #[serde(default)]
  pub outputs: Vec<Relation>,
}

impl ProgramSchema {
  /// Builds a schema from bare relation names.
  pub fn from_names<I, O>(inputs: I, outputs: O) -> Self
  where
    I: IntoIterator,
    I::Item: Into<String>,
    O: IntoIterator,
    O::Item: Into<String>,
  {
    Self {
      inputs: inputs.into_iter().map(Relation::new).collect(),
      outputs: outputs.into_iter().map(Relation::new).collect(),
    }
  }

  /// Relations on the given side of the program.
  pub fn relations(&self, is_input: bool) -> &[Relation] {
    if is_input { &self.inputs } else { &self.outputs }
  }
}
