use log::info;

use crate::results::{CollapsedTable, IntersectionResult};

/// Pair up the p-values of loci present in both tables
///
/// Loci found in only one table are dropped. Columns are named `series1` and `series2`.
pub fn intersect(table_a: &CollapsedTable, table_b: &CollapsedTable) -> IntersectionResult {
    intersect_named(table_a, table_b, ["series1", "series2"])
}

/// As [`intersect`], with explicit names for the two columns (e.g. the populations)
pub fn intersect_named(
    table_a: &CollapsedTable,
    table_b: &CollapsedTable,
    names: [&str; 2],
) -> IntersectionResult {
    // Probe from the smaller side
    let (small, large, swapped) = if table_a.len() <= table_b.len() {
        (table_a, table_b, false)
    } else {
        (table_b, table_a, true)
    };

    let rows = small
        .iter()
        .filter_map(|(locus, row)| {
            let other = large.pvalue(locus)?;
            let pair = if swapped {
                (other, row.pvalue)
            } else {
                (row.pvalue, other)
            };
            Some((locus.clone(), pair))
        })
        .collect();

    let result = IntersectionResult::new(names.map(String::from), rows);
    info!(
        "Intersected {} ({} loci) with {} ({} loci): {} shared",
        names[0],
        table_a.len(),
        names[1],
        table_b.len(),
        result.len()
    );
    result
}
