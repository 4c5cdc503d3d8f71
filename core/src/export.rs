//! Export of the fully joined warehouse view for downstream consumers.

use crate::{error::WarehouseResult, store::WarehouseStore};
use std::path::Path;

/// Write every warehouse row to `path` as a delimited file with a header.
/// Returns the number of rows written.
pub fn export_warehouse_view(
    store: &WarehouseStore,
    path: &Path,
    delimiter: u8,
) -> WarehouseResult<u64> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;
    let rows = store.for_each_warehouse_row(|row| {
        writer.serialize(&row)?;
        Ok(())
    })?;
    writer.flush()?;
    log::info!("Exported {rows} warehouse rows to {}", path.display());
    Ok(rows)
}
