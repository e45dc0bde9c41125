use std::collections::HashMap;

use itertools::Itertools;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::{
    config::{CollapseConfig, MalformedPolicy, Mechanism},
    error::{GraspError, Result},
    locus::Locus,
    math::sample_stddev,
    observation::{Observation, SnpRecord},
    results::{CollapsedRow, CollapsedTable},
};

/// The columns of an observation that get aggregated within a locus
struct Member {
    pvalue: f64,
    study_id: Option<String>,
    snpid: Option<String>,
}

/// Collapse observations to one row per locus
///
/// Malformed records abort the call. See [`collapse_with`] for the skipping policy.
pub fn collapse<I, R>(records: I, mechanism: Mechanism, threshold: Option<f64>) -> Result<CollapsedTable>
where
    I: IntoIterator<Item = R>,
    R: SnpRecord,
{
    let config = CollapseConfig::builder()
        .mechanism(mechanism)
        .maybe_threshold(threshold)
        .build();
    collapse_with(records, config)
}

/// Collapse with the mechanism given by name (`median`, `mean` or `min`)
pub fn collapse_named<I, R>(records: I, mechanism: &str, threshold: Option<f64>) -> Result<CollapsedTable>
where
    I: IntoIterator<Item = R>,
    R: SnpRecord,
{
    collapse(records, mechanism.parse()?, threshold)
}

/// Collapse observations to one row per locus
///
/// The process is:
/// 1. Validate each record according to the malformed policy
/// 2. Group the observations by locus
/// 3. Reduce the p-values of each group with the configured mechanism
/// 4. Drop loci whose reduced p-value exceeds the threshold, if any
///
/// Empty input yields an empty table.
pub fn collapse_with<I, R>(records: I, config: CollapseConfig) -> Result<CollapsedTable>
where
    I: IntoIterator<Item = R>,
    R: SnpRecord,
{
    if let Some(threshold) = config.threshold {
        if threshold.is_nan() {
            return Err(GraspError::InvalidThreshold(threshold));
        }
    }

    // Validate and split off the locus as the group key
    let mut skipped = 0;
    let mut members = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        match record.validate() {
            Ok(Observation {
                locus,
                pvalue,
                study_id,
                snpid,
            }) => members.push((
                locus,
                Member {
                    pvalue,
                    study_id,
                    snpid,
                },
            )),
            Err(reason) => match config.policy {
                MalformedPolicy::Abort => {
                    return Err(GraspError::MalformedObservation { index, reason })
                }
                MalformedPolicy::Skip => {
                    warn!("Skipping malformed observation at index {}: {}", index, reason);
                    skipped += 1;
                }
            },
        }
    }

    let num_observations = members.len();
    let groups: HashMap<Locus, Vec<Member>> = members.into_iter().into_group_map();
    debug!(
        "Grouped {} observations into {} loci",
        num_observations,
        groups.len()
    );

    // Reduce each locus
    let rows = groups
        .into_par_iter()
        .map(|(locus, members)| (locus, reduce_group(members, config.mechanism)))
        .collect::<HashMap<_, _>>();

    let mut table = CollapsedTable::new(rows, skipped);
    if let Some(threshold) = config.threshold {
        let before = table.len();
        table = table.filter(threshold);
        debug!(
            "Threshold {} retained {} of {} loci",
            threshold,
            table.len(),
            before
        );
    }

    info!(
        "Collapsed {} observations to {} loci by {} ({} skipped)",
        num_observations,
        table.len(),
        config.mechanism,
        skipped
    );
    Ok(table)
}

/// Reduce the members of a single locus into a row
fn reduce_group(members: Vec<Member>, mechanism: Mechanism) -> CollapsedRow {
    let mut pvalues = members.iter().map(|m| m.pvalue).collect::<Vec<_>>();
    let stddev = sample_stddev(&pvalues);
    let pvalue = mechanism.reduce(&mut pvalues);

    let snpid = members.iter().find_map(|m| m.snpid.clone());
    // A study column may already hold a comma-joined list from an earlier collapse
    let study_ids = members
        .iter()
        .filter_map(|m| m.study_id.as_deref())
        .flat_map(|ids| ids.split(','))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .sorted_unstable()
        .dedup()
        .collect();

    CollapsedRow::new(pvalue, stddev, pvalues.len(), snpid, study_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::RawObservation;
    use approx::assert_relative_eq;
    use rand::{seq::SliceRandom, Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const MECHANISMS: [Mechanism; 3] = [Mechanism::Median, Mechanism::Mean, Mechanism::Min];

    fn obs(chrom: &str, pos: u64, pvalue: f64) -> Observation {
        Observation::new(Locus::new(chrom, pos), pvalue)
    }

    #[test]
    fn test_median_odd_group() -> anyhow::Result<()> {
        let records = vec![obs("1", 10, 0.6), obs("1", 10, 0.2), obs("1", 10, 0.4)];
        let table = collapse(records, Mechanism::Median, None)?;
        assert_eq!(table.len(), 1);
        assert_relative_eq!(table.pvalue(&Locus::new(1u8, 10)).unwrap(), 0.4);
        Ok(())
    }

    #[test]
    fn test_median_even_group() -> anyhow::Result<()> {
        let records = vec![
            obs("1", 10, 0.1),
            obs("1", 10, 0.3),
            obs("1", 10, 0.5),
            obs("1", 10, 0.7),
        ];
        let table = collapse(records, Mechanism::Median, None)?;
        assert_relative_eq!(table.pvalue(&Locus::new(1u8, 10)).unwrap(), 0.4);
        Ok(())
    }

    #[test]
    fn test_mean_and_min() -> anyhow::Result<()> {
        let records = vec![obs("2", 5, 0.1), obs("2", 5, 0.2), obs("2", 5, 0.6)];
        let locus = Locus::new(2u8, 5);

        let table = collapse(records.clone(), Mechanism::Mean, None)?;
        assert_relative_eq!(table.pvalue(&locus).unwrap(), 0.3);

        let table = collapse(records, Mechanism::Min, None)?;
        assert_relative_eq!(table.pvalue(&locus).unwrap(), 0.1);
        Ok(())
    }

    #[test]
    fn test_threshold_filter() -> anyhow::Result<()> {
        let records = vec![obs("1", 1, 1e-9), obs("1", 2, 5e-3)];
        let table = collapse(records, Mechanism::Median, Some(1e-8))?;
        assert_eq!(table.len(), 1);
        assert!(table.contains(&Locus::new(1u8, 1)));
        Ok(())
    }

    #[test]
    fn test_threshold_keeps_equal_values() -> anyhow::Result<()> {
        let records = vec![obs("1", 1, 1e-8), obs("1", 2, 1.1e-8)];
        let table = collapse(records, Mechanism::Median, Some(1e-8))?;
        assert_eq!(table.len(), 1);
        assert!(table.contains(&Locus::new(1u8, 1)));
        Ok(())
    }

    #[test]
    fn test_nan_threshold_is_rejected() {
        let err = collapse(vec![obs("1", 1, 0.1)], Mechanism::Min, Some(f64::NAN)).unwrap_err();
        assert!(matches!(err, GraspError::InvalidThreshold(t) if t.is_nan()));
    }

    #[test]
    fn test_empty_input() -> anyhow::Result<()> {
        let table = collapse(Vec::<Observation>::new(), Mechanism::Median, None)?;
        assert!(table.is_empty());
        assert_eq!(table.skipped(), 0);
        Ok(())
    }

    #[test]
    fn test_invalid_mechanism() {
        let err = collapse_named(vec![obs("1", 1, 0.1)], "mode", None).unwrap_err();
        assert_eq!(err, GraspError::InvalidMechanism("mode".to_string()));
    }

    #[test]
    fn test_named_mechanism() -> anyhow::Result<()> {
        let records = vec![obs("1", 1, 0.1), obs("1", 1, 0.5)];
        let table = collapse_named(records, "min", None)?;
        assert_relative_eq!(table.pvalue(&Locus::new(1u8, 1)).unwrap(), 0.1);
        Ok(())
    }

    #[test]
    fn test_chromosome_spellings_share_a_group() -> anyhow::Result<()> {
        let records = vec![
            obs("chr1", 100, 0.1),
            Observation::new(Locus::new(1u8, 100), 0.3),
            obs("1", 100, 0.5),
        ];
        let table = collapse(records, Mechanism::Median, None)?;
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&Locus::new("1", 100)).unwrap().count, 3);
        Ok(())
    }

    #[test]
    fn test_row_summary_columns() -> anyhow::Result<()> {
        let records = vec![
            obs("3", 7, 0.2).with_study("s2").with_snpid("rs42"),
            obs("3", 7, 0.4).with_study("s1").with_snpid("rs43"),
            obs("3", 7, 0.6).with_study("s2"),
            obs("4", 1, 0.9),
        ];
        let table = collapse(records, Mechanism::Mean, None)?;

        let row = table.get(&Locus::new(3u8, 7)).unwrap();
        assert_eq!(row.count, 3);
        assert_relative_eq!(row.stddev, 0.2);
        assert_eq!(row.snpid.as_deref(), Some("rs42"));
        assert_eq!(row.study_ids, vec!["s1".to_string(), "s2".to_string()]);

        let row = table.get(&Locus::new(4u8, 1)).unwrap();
        assert_eq!(row.count, 1);
        assert!(row.stddev.is_nan());
        assert!(row.snpid.is_none());
        assert!(row.study_ids.is_empty());
        Ok(())
    }

    #[test]
    fn test_malformed_aborts_by_default() {
        let records = vec![
            RawObservation::new(Some("1".into()), Some(1), Some(0.1), None, None),
            RawObservation::new(Some("1".into()), None, Some(0.1), None, None),
        ];
        let err = collapse(records, Mechanism::Median, None).unwrap_err();
        assert_eq!(
            err,
            GraspError::MalformedObservation {
                index: 1,
                reason: "missing position".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_skip_counts() -> anyhow::Result<()> {
        let records = vec![
            RawObservation::new(Some("1".into()), Some(1), Some(0.1), None, None),
            RawObservation::new(Some("1".into()), Some(1), Some(f64::NAN), None, None),
            RawObservation::new(None, Some(1), Some(0.1), None, None),
            RawObservation::new(Some("1".into()), Some(1), Some(0.3), None, None),
        ];
        let config = CollapseConfig::builder()
            .policy(MalformedPolicy::Skip)
            .build();
        let table = collapse_with(records, config)?;
        assert_eq!(table.skipped(), 2);
        let row = table.get(&Locus::new(1u8, 1)).unwrap();
        assert_eq!(row.count, 2);
        assert_relative_eq!(row.pvalue, 0.2);
        Ok(())
    }

    #[test]
    fn test_collapse_is_idempotent() -> anyhow::Result<()> {
        let records = vec![
            obs("1", 1, 0.1).with_study("a"),
            obs("1", 1, 0.3).with_study("b"),
            obs("2", 9, 1e-6),
            obs("X", 4, 0.02).with_snpid("rs7"),
        ];
        let first = collapse(records, Mechanism::Min, None)?;

        for mechanism in MECHANISMS {
            let again = collapse(first.as_observations(), mechanism, None)?;
            assert_eq!(again.len(), first.len());
            for (locus, row) in first.iter() {
                let other = again.get(locus).unwrap();
                assert_eq!(other.pvalue, row.pvalue);
                assert_eq!(other.count, 1);
                assert_eq!(other.snpid, row.snpid);
                assert_eq!(other.study_ids, row.study_ids);
            }
        }

        let row = first.get(&Locus::new(1u8, 1)).unwrap();
        assert_eq!(row.study_ids, vec!["a".to_string(), "b".to_string()]);
        Ok(())
    }

    #[test]
    fn test_joined_study_ids_are_split() -> anyhow::Result<()> {
        let records = vec![
            obs("5", 3, 0.1).with_study("s2,s1"),
            obs("5", 3, 0.2).with_study("s3, s1"),
        ];
        let table = collapse(records, Mechanism::Mean, None)?;
        let row = table.get(&Locus::new(5u8, 3)).unwrap();
        assert_eq!(row.study_ids, vec!["s1", "s2", "s3"]);
        Ok(())
    }

    #[test]
    fn test_random_grouping_invariants() -> anyhow::Result<()> {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let chroms = ["1", "2", "chr2", "X"];

        let mut records = Vec::new();
        for _ in 0..500 {
            let chrom = chroms.choose(&mut rng).unwrap();
            let pos = rng.gen_range(0..40);
            let pvalue = rng.gen_range(1e-12..1.0);
            records.push(obs(chrom, pos, pvalue));
        }

        // Expected groups computed independently
        let mut expected: HashMap<Locus, Vec<f64>> = HashMap::new();
        for record in &records {
            expected
                .entry(record.locus.clone())
                .or_default()
                .push(record.pvalue);
        }

        for mechanism in MECHANISMS {
            let table = collapse(records.clone(), mechanism, None)?;
            assert_eq!(table.len(), expected.len());

            let total = table.iter().map(|(_, row)| row.count).sum::<usize>();
            assert_eq!(total, records.len());

            for (locus, pvalues) in &expected {
                let row = table.get(locus).unwrap();
                assert_eq!(row.count, pvalues.len());
                let mut pvalues = pvalues.clone();
                assert_relative_eq!(row.pvalue, mechanism.reduce(&mut pvalues));
            }
        }

        let threshold = 0.25;
        let filtered = collapse(records, Mechanism::Median, Some(threshold))?;
        assert!(filtered.iter().all(|(_, row)| row.pvalue <= threshold));
        Ok(())
    }
}
