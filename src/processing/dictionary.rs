//! Dictionary unification for [`crate::types::Table`].
//!
//! Parsing assigns dictionary codes in first-seen order, so two parses of the same text can
//! disagree on codes. Unification rewrites every dictionary column onto one sorted lookup shared
//! by all of them. After that, two codes are equal iff their decoded values are equal, and the
//! writer can emit the lookup once for the whole stream.

use std::collections::{BTreeSet, HashMap};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{Column, DictionaryColumn, Table};

/// Returns a new [`Table`] whose dictionary columns all share one canonical lookup.
///
/// The lookup is the sorted, de-duplicated set of values referenced by any dictionary column;
/// values no row references are dropped. Non-dictionary columns are untouched. Applying this to
/// its own output changes nothing.
pub fn unify_dictionaries(table: &Table) -> PipelineResult<Table> {
    let mut domain: BTreeSet<&str> = BTreeSet::new();
    for column in table.columns() {
        if let Column::Dictionary(d) = column {
            domain.extend(d.decoded().flatten());
        }
    }

    let values: Vec<String> = domain.iter().map(|s| (*s).to_owned()).collect();
    let mut codes: HashMap<&str, i32> = HashMap::with_capacity(domain.len());
    for (idx, value) in domain.iter().enumerate() {
        let code = i32::try_from(idx).map_err(|_| PipelineError::DictionaryOverflow {
            values: domain.len(),
        })?;
        codes.insert(*value, code);
    }

    let columns = table
        .columns()
        .iter()
        .map(|column| match column {
            Column::Dictionary(d) => {
                let keys = d
                    .decoded()
                    .map(|v| v.and_then(|s| codes.get(s).copied()))
                    .collect();
                Column::Dictionary(DictionaryColumn::new(keys, values.clone()))
            }
            other => other.clone(),
        })
        .collect();

    Table::try_new(table.schema().clone(), columns)
}
