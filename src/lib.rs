//! grasp: SNP collapsing and cohort intersection for the GRASP GWAS index
//!
//! This library takes SNP-level association results (chromosome, position,
//! p-value and reporting study), as materialized from a GRASP database query,
//! and collapses them to one row per genomic locus. Loci that are significant
//! in two cohorts can then be found by intersecting two collapsed tables.
//!
//! The main components of this library are:
//! - [`collapse`]: group observations by locus, reduce their p-values and filter by threshold
//! - [`intersect`]: pair the p-values of loci shared by two collapsed tables
//! - [`Mechanism`]: the reduction applied to each locus (median, mean or min)
//! - [`CollapsedTable`] and [`IntersectionResult`]: the resulting tables
//!
//! ```
//! use grasp::{collapse, intersect, Locus, Mechanism, Observation};
//!
//! let eur = vec![
//!     Observation::new(Locus::new("chr1", 1_000), 1e-9),
//!     Observation::new(Locus::new(1u8, 1_000), 3e-9),
//!     Observation::new(Locus::new("1", 1_000), 2e-9),
//!     Observation::new(Locus::new(2u8, 500), 0.2),
//! ];
//! let afr = vec![Observation::new(Locus::new("1", 1_000), 4e-10)];
//!
//! let eur = collapse(eur, Mechanism::Median, Some(5e-8)).unwrap();
//! let afr = collapse(afr, Mechanism::Median, Some(5e-8)).unwrap();
//! let shared = intersect(&eur, &afr);
//! assert_eq!(shared.get(&Locus::new(1u8, 1_000)), Some((2e-9, 4e-10)));
//! ```

mod collapse;
mod config;
mod error;
mod intersect;
mod locus;
mod math;
mod observation;
mod results;

pub use collapse::{collapse, collapse_named, collapse_with};
pub use config::{CollapseConfig, MalformedPolicy, Mechanism};
pub use error::{GraspError, Result};
pub use intersect::{intersect, intersect_named};
pub use locus::{Chromosome, Locus};
pub use observation::{Observation, RawObservation, SnpRecord};
pub use results::{CollapsedRow, CollapsedTable, IntersectionResult};
