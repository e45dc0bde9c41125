use std::collections::HashMap;
use std::fmt::Write;

use derive_new::new;
use itertools::Itertools;

use crate::{locus::Locus, observation::Observation};

/// One collapsed locus
#[derive(new, Debug, Clone, PartialEq)]
pub struct CollapsedRow {
    /// Reduced p-value
    pub pvalue: f64,
    /// Sample standard deviation of the collapsed p-values, `NaN` when `count` is 1
    pub stddev: f64,
    /// Number of observations collapsed into this row
    pub count: usize,
    /// First rsID seen for this locus
    pub snpid: Option<String>,
    /// Sorted, de-duplicated identifiers of contributing studies
    pub study_ids: Vec<String>,
}

impl CollapsedRow {
    fn single(pvalue: f64) -> Self {
        Self::new(pvalue, f64::NAN, 1, None, Vec::new())
    }
}

/// Observations collapsed to one row per locus
///
/// Row order is unspecified; use [`CollapsedTable::sorted_rows`] for a stable view.
#[derive(Debug, Clone, Default)]
pub struct CollapsedTable {
    rows: HashMap<Locus, CollapsedRow>,
    skipped: usize,
}

impl CollapsedTable {
    pub(crate) fn new(rows: HashMap<Locus, CollapsedRow>, skipped: usize) -> Self {
        Self { rows, skipped }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, locus: &Locus) -> Option<&CollapsedRow> {
        self.rows.get(locus)
    }

    pub fn pvalue(&self, locus: &Locus) -> Option<f64> {
        self.rows.get(locus).map(|row| row.pvalue)
    }

    pub fn contains(&self, locus: &Locus) -> bool {
        self.rows.contains_key(locus)
    }

    /// Number of malformed input records dropped under [`crate::MalformedPolicy::Skip`]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Locus, &CollapsedRow)> {
        self.rows.iter()
    }

    pub fn loci(&self) -> impl Iterator<Item = &Locus> {
        self.rows.keys()
    }

    pub fn sorted_rows(&self) -> Vec<(&Locus, &CollapsedRow)> {
        self.rows
            .iter()
            .sorted_unstable_by(|a, b| a.0.cmp(b.0))
            .collect()
    }

    /// Keep only rows with `pvalue <= threshold`
    pub fn filter(mut self, threshold: f64) -> Self {
        self.rows.retain(|_, row| row.pvalue <= threshold);
        self
    }

    /// Expand back into one observation per locus
    ///
    /// Study identifiers are joined with commas; collapsing splits them again.
    pub fn as_observations(&self) -> Vec<Observation> {
        self.sorted_rows()
            .into_iter()
            .map(|(locus, row)| Observation {
                locus: locus.clone(),
                pvalue: row.pvalue,
                study_id: (!row.study_ids.is_empty()).then(|| row.study_ids.join(",")),
                snpid: row.snpid.clone(),
            })
            .collect()
    }

    pub fn to_tsv(&self) -> String {
        let mut out = String::from("Location\tSNP\tPvalue\tStdDev\tCount\tStudies\n");
        for (locus, row) in self.sorted_rows() {
            // writing to a String cannot fail
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}",
                locus,
                row.snpid.as_deref().unwrap_or(""),
                row.pvalue,
                row.stddev,
                row.count,
                row.study_ids.join(","),
            );
        }
        out
    }

    pub fn pprint(&self) {
        print!("{}", self.to_tsv());
    }
}

impl FromIterator<(Locus, f64)> for CollapsedTable {
    /// Builds a table from bare locus/p-value pairs; later duplicates overwrite earlier ones
    fn from_iter<I: IntoIterator<Item = (Locus, f64)>>(iter: I) -> Self {
        let rows = iter
            .into_iter()
            .map(|(locus, pvalue)| (locus, CollapsedRow::single(pvalue)))
            .collect();
        Self::new(rows, 0)
    }
}

/// Loci present in two tables, with the p-value from each side
#[derive(Debug, Clone)]
pub struct IntersectionResult {
    names: [String; 2],
    rows: HashMap<Locus, (f64, f64)>,
}

impl IntersectionResult {
    pub(crate) fn new(names: [String; 2], rows: HashMap<Locus, (f64, f64)>) -> Self {
        Self { names, rows }
    }

    /// Column names for the first and second table
    pub fn names(&self) -> (&str, &str) {
        (&self.names[0], &self.names[1])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, locus: &Locus) -> Option<(f64, f64)> {
        self.rows.get(locus).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Locus, (f64, f64))> {
        self.rows.iter().map(|(locus, pair)| (locus, *pair))
    }

    pub fn loci(&self) -> impl Iterator<Item = &Locus> {
        self.rows.keys()
    }

    pub fn sorted_rows(&self) -> Vec<(&Locus, (f64, f64))> {
        self.iter().sorted_unstable_by(|a, b| a.0.cmp(b.0)).collect()
    }

    pub fn to_tsv(&self) -> String {
        let mut out = format!("Location\t{}\t{}\n", self.names[0], self.names[1]);
        for (locus, (a, b)) in self.sorted_rows() {
            // writing to a String cannot fail
            let _ = writeln!(out, "{locus}\t{a}\t{b}");
        }
        out
    }

    pub fn pprint(&self) {
        print!("{}", self.to_tsv());
    }
}
