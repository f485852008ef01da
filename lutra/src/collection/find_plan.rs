use crate::common::Value;
use std::fmt::Display;
use std::ops::Bound;

/// One index range scan: the indexed field and the key bounds to walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexScanSpec {
    field: String,
    lower: Bound<Value>,
    upper: Bound<Value>,
}

impl IndexScanSpec {
    pub fn new(field: &str, lower: Bound<Value>, upper: Bound<Value>) -> Self {
        IndexScanSpec {
            field: field.to_string(),
            lower,
            upper,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn lower(&self) -> &Bound<Value> {
        &self.lower
    }

    pub fn upper(&self) -> &Bound<Value> {
        &self.upper
    }

    /// Narrows this scan with another range over the same field.
    pub(crate) fn intersect(&mut self, lower: Bound<Value>, upper: Bound<Value>) {
        self.lower = tighter_lower(self.lower.clone(), lower);
        self.upper = tighter_upper(self.upper.clone(), upper);
    }
}

impl Display for IndexScanSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "index-scan({})", self.field)
    }
}

/// The execution strategy chosen for a filter.
///
/// An index never changes what a query returns: candidates produced by
/// `IndexScan`/`IndexUnion` are always re-verified against the full filter,
/// using the same predicate evaluation a `FullScan` uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionChoice {
    /// Evaluate the filter against every document.
    FullScan,
    /// Scan one index range per covered field and intersect the candidate
    /// id sets (conjunction).
    IndexScan(Vec<IndexScanSpec>),
    /// Union the candidate sets of fully index-covered `$or` branches; each
    /// branch is itself a conjunction of scans.
    IndexUnion(Vec<Vec<IndexScanSpec>>),
}

fn lower_rank(bound: &Bound<Value>) -> Option<(&Value, bool)> {
    match bound {
        Bound::Unbounded => None,
        Bound::Included(v) => Some((v, false)),
        Bound::Excluded(v) => Some((v, true)),
    }
}

fn tighter_lower(a: Bound<Value>, b: Bound<Value>) -> Bound<Value> {
    match (lower_rank(&a), lower_rank(&b)) {
        (None, _) => b,
        (_, None) => a,
        (Some((av, ax)), Some((bv, bx))) => {
            // the greater value wins; at equal values exclusive is tighter
            if av > bv || (av == bv && ax) {
                a
            } else {
                b
            }
        }
    }
}

fn tighter_upper(a: Bound<Value>, b: Bound<Value>) -> Bound<Value> {
    match (lower_rank(&a), lower_rank(&b)) {
        (None, _) => b,
        (_, None) => a,
        (Some((av, ax)), Some((bv, bx))) => {
            // the smaller value wins; at equal values exclusive is tighter
            if av < bv || (av == bv && ax) {
                a
            } else {
                b
            }
        }
    }
}
