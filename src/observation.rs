use derive_new::new;

use crate::locus::Locus;

/// A single SNP association reported by one study
#[derive(new, Debug, Clone, PartialEq)]
pub struct Observation {
    /// Genomic coordinate of the SNP
    pub locus: Locus,
    /// Association p-value, expected in (0, 1]
    pub pvalue: f64,
    /// Identifier of the reporting study
    #[new(default)]
    pub study_id: Option<String>,
    /// rsID as reported by the study
    #[new(default)]
    pub snpid: Option<String>,
}

impl Observation {
    pub fn with_study(mut self, study_id: impl Into<String>) -> Self {
        self.study_id = Some(study_id.into());
        self
    }

    pub fn with_snpid(mut self, snpid: impl Into<String>) -> Self {
        self.snpid = Some(snpid.into());
        self
    }
}

/// An unvalidated row as it comes off a query cursor
///
/// Any column may be missing. Positions are signed so that corrupt negative values
/// can be reported instead of wrapping.
#[derive(new, Debug, Clone, Default, PartialEq)]
pub struct RawObservation {
    pub chromosome: Option<String>,
    pub position: Option<i64>,
    pub pvalue: Option<f64>,
    pub study_id: Option<String>,
    pub snpid: Option<String>,
}

/// Anything that can be checked and turned into an [`Observation`]
///
/// On failure the reason is returned; the caller attaches the record index.
pub trait SnpRecord {
    fn validate(self) -> Result<Observation, String>;
}

impl SnpRecord for Observation {
    fn validate(self) -> Result<Observation, String> {
        if self.locus.chromosome().is_empty() {
            return Err("empty chromosome".to_string());
        }
        check_pvalue(self.pvalue)?;
        Ok(self)
    }
}

impl SnpRecord for RawObservation {
    fn validate(self) -> Result<Observation, String> {
        let chromosome = self.chromosome.ok_or("missing chromosome")?;
        let position = self.position.ok_or("missing position")?;
        let pvalue = self.pvalue.ok_or("missing p-value")?;
        let position =
            u64::try_from(position).map_err(|_| format!("negative position {position}"))?;

        let observation = Observation {
            locus: Locus::new(chromosome, position),
            pvalue,
            study_id: self.study_id,
            snpid: self.snpid,
        };
        observation.validate()
    }
}

fn check_pvalue(pvalue: f64) -> Result<(), String> {
    if !pvalue.is_finite() {
        return Err(format!("non-numeric p-value {pvalue}"));
    }
    if pvalue <= 0.0 || pvalue > 1.0 {
        return Err(format!("p-value {pvalue} outside (0, 1]"));
    }
    Ok(())
}
