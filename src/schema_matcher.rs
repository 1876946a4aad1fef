//! Decides whether an attachment can be wired to a relation of the program.

use crate::types::{AttachedConnector, ProgramSchema};
use tracing::instrument;

/// Returns true if `attached` names a relation that exists on its side of `schema`.
///
/// False while the program is not compiled (`schema` is `None`) or the
/// attachment is unwired. Names are compared exactly, case included.
#[instrument(level = "trace", skip_all, fields(connector = %attached.name, relation = %attached.relation_name))]
pub fn matches(attached: &AttachedConnector, schema: Option<&ProgramSchema>) -> bool {
  let Some(schema) = schema else {
    return false;
  };
  if attached.relation_name.is_empty() {
    return false;
  }
  schema
    .relations(attached.is_input)
    .iter()
    .any(|r| r.name == attached.relation_name)
}
