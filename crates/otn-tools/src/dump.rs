//! Plain-text listing of every row of the STATE_DB and COUNTERS_DB.
//!
//! Rows are printed in name order, one line per field:
//! `<row> attr value <field> with on <value>`.

use sonic_orch_common::DbConnector;

use crate::error::Result;

/// Lines for every field of every row of one database.
pub async fn dump_db(db: &dyn DbConnector) -> Result<Vec<String>> {
    let mut names = db.row_names("*").await?;
    names.sort();

    let separator = db.separator();
    let mut lines = Vec::new();
    for name in names {
        let Some((table, key)) = name.split_once(separator) else {
            log::debug!("Skip {}, not a table row", name);
            continue;
        };
        let mut fvs = db.hgetall(table, key).await?;
        fvs.sort();
        lines.extend(
            fvs.into_iter()
                .map(|(field, value)| format!("{} attr value {} with on {}", name, field, value)),
        );
    }
    Ok(lines)
}

/// The STATE_DB dump followed by the COUNTERS_DB dump, each under a header.
pub async fn dump_state_and_counters(state: &dyn DbConnector, counters: &dyn DbConnector) -> Result<Vec<String>> {
    let mut lines = vec!["dump state-db".to_string()];
    lines.extend(dump_db(state).await?);
    lines.push("dump counters-db".to_string());
    lines.extend(dump_db(counters).await?);
    Ok(lines)
}
