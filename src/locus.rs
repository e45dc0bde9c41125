use std::cmp::Ordering;
use std::fmt;

use derive_new::new;

/// A normalized chromosome identifier
///
/// Leading `chr` prefixes are stripped (case-insensitive), whitespace is trimmed and
/// numeric names lose leading zeros, so `"chr1"`, `"01"`, `"1"` and `1u8` all name
/// the same chromosome.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chromosome(String);

impl Chromosome {
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        let stripped = match name.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &name[3..],
            _ => name,
        };
        match stripped.parse::<u64>() {
            Ok(number) => Self(number.to_string()),
            Err(_) => Self(stripped.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for Chromosome {
    /// Numeric chromosomes first in numeric order, then named ones (X, Y, MT) lexically
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Chromosome {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Chromosome {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Chromosome {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<&String> for Chromosome {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

macro_rules! chromosome_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Chromosome {
                fn from(number: $t) -> Self {
                    Self(number.to_string())
                }
            }
        )*
    };
}

chromosome_from_int!(u8, u16, u32, u64, usize, i32);

/// A genomic coordinate used as the grouping and join key
///
/// Displayed as `chrom:pos`, but equality and hashing go through the typed fields.
#[derive(new, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locus {
    #[new(into)]
    chromosome: Chromosome,
    position: u64,
}

impl Locus {
    pub fn chromosome(&self) -> &Chromosome {
        &self.chromosome
    }

    pub fn position(&self) -> u64 {
        self.position
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chromosome, self.position)
    }
}
