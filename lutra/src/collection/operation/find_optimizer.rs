use smallvec::SmallVec;

use crate::collection::find_plan::{ExecutionChoice, IndexScanSpec};
use crate::filter::{is_all_filter, is_and_filter, is_or_filter, Filter};
use crate::index::{IndexDescriptor, IndexType};

type FilterVec = SmallVec<[Filter; 4]>;

/// Chooses an execution strategy for a filter given the declared indexes.
///
/// The optimizer only narrows the candidate set; it never decides the final
/// result. Every candidate id an index scan produces is re-verified against
/// the whole filter, so partial operator coverage (an AND with an unindexed
/// or non-coverable conjunct) is safe by construction.
pub(crate) fn plan(filter: &Filter, indexes: &[IndexDescriptor]) -> ExecutionChoice {
    if is_all_filter(filter) {
        return ExecutionChoice::FullScan;
    }

    if is_or_filter(filter) {
        return plan_disjunction(filter, indexes);
    }

    plan_conjunction(filter, indexes)
}

/// Every `$or` branch must be fully index-covered, otherwise the whole
/// disjunction falls back to a single full scan.
fn plan_disjunction(filter: &Filter, indexes: &[IndexDescriptor]) -> ExecutionChoice {
    let branches = match filter.logical_filters() {
        Ok(branches) => branches,
        Err(_) => return ExecutionChoice::FullScan,
    };

    let mut branch_scans = Vec::with_capacity(branches.len());
    for branch in &branches {
        match plan(branch, indexes) {
            ExecutionChoice::IndexScan(scans) => branch_scans.push(scans),
            _ => {
                log::debug!("$or branch {} lacks index coverage, using full scan", branch);
                return ExecutionChoice::FullScan;
            }
        }
    }
    ExecutionChoice::IndexUnion(branch_scans)
}

fn plan_conjunction(filter: &Filter, indexes: &[IndexDescriptor]) -> ExecutionChoice {
    let conjuncts = match flatten_and(filter) {
        Some(conjuncts) => conjuncts,
        // nested $or below an $and stays on the scan path
        None => return ExecutionChoice::FullScan,
    };

    let mut scans: Vec<IndexScanSpec> = Vec::new();
    for conjunct in &conjuncts {
        let field = match conjunct.field_name() {
            Some(field) => field,
            None => continue,
        };
        let (lower, upper) = match conjunct.index_range() {
            Some(range) => range,
            None => continue,
        };
        if !is_indexed(field, indexes) {
            continue;
        }

        match scans.iter_mut().find(|scan| scan.field() == field) {
            Some(existing) => existing.intersect(lower, upper),
            None => scans.push(IndexScanSpec::new(field, lower, upper)),
        }
    }

    if scans.is_empty() {
        ExecutionChoice::FullScan
    } else {
        log::debug!("Filter {} planned as index scan over {} field(s)", filter, scans.len());
        ExecutionChoice::IndexScan(scans)
    }
}

/// Flattens nested `$and` filters into one conjunct list; returns `None` if
/// a logical `$or` is nested inside (handled conservatively with a scan).
fn flatten_and(filter: &Filter) -> Option<FilterVec> {
    let mut conjuncts = FilterVec::new();
    if is_and_filter(filter) {
        let children = filter.logical_filters().ok()?;
        for child in children {
            if is_or_filter(&child) {
                return None;
            }
            conjuncts.append(&mut flatten_and(&child)?);
        }
    } else {
        conjuncts.push(filter.clone());
    }
    Some(conjuncts)
}

fn is_indexed(field: &str, indexes: &[IndexDescriptor]) -> bool {
    indexes
        .iter()
        .any(|idx| idx.field() == field && idx.index_type() == IndexType::SingleField)
}
