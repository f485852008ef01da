use im::OrdSet;

use crate::collection::core::CollectionSnapshot;
use crate::collection::find_plan::{ExecutionChoice, IndexScanSpec};
use crate::collection::{Document, ObjectId};
use crate::errors::LutraResult;
use crate::filter::Filter;

/// Executes a compiled filter against a snapshot, returning matching
/// documents in id order.
///
/// Index scans only narrow the candidate set; every candidate goes through
/// [Filter::apply] — the same primitive the full scan uses — so results are
/// identical whether or not an index was available. Both paths also iterate
/// in id order, keeping result order stable across strategies.
pub(crate) fn find(snapshot: &CollectionSnapshot, filter: &Filter) -> LutraResult<Vec<Document>> {
    match filter.plan(&snapshot.index_descriptors()) {
        ExecutionChoice::FullScan => full_scan(snapshot, filter),
        ExecutionChoice::IndexScan(scans) => match collect_candidates(snapshot, &scans) {
            Some(ids) => verify_candidates(snapshot, filter, &ids),
            None => full_scan(snapshot, filter),
        },
        ExecutionChoice::IndexUnion(branches) => {
            let mut ids = OrdSet::new();
            for scans in &branches {
                match collect_candidates(snapshot, scans) {
                    Some(branch_ids) => ids = ids.union(branch_ids),
                    None => return full_scan(snapshot, filter),
                }
            }
            verify_candidates(snapshot, filter, &ids)
        }
    }
}

/// Finds the first matching document, short-circuiting the scan.
pub(crate) fn find_first(
    snapshot: &CollectionSnapshot,
    filter: &Filter,
) -> LutraResult<Option<Document>> {
    for (_, doc) in snapshot.documents().iter() {
        if filter.apply(doc)? {
            return Ok(Some(doc.clone()));
        }
    }
    Ok(None)
}

fn full_scan(snapshot: &CollectionSnapshot, filter: &Filter) -> LutraResult<Vec<Document>> {
    let mut result = Vec::new();
    for (_, doc) in snapshot.documents().iter() {
        if filter.apply(doc)? {
            result.push(doc.clone());
        }
    }
    Ok(result)
}

/// Intersects the id sets of the given index scans. Returns `None` when a
/// referenced index is missing from the snapshot, which sends the caller
/// back to the full-scan path.
fn collect_candidates(
    snapshot: &CollectionSnapshot,
    scans: &[IndexScanSpec],
) -> Option<OrdSet<ObjectId>> {
    let mut candidates: Option<OrdSet<ObjectId>> = None;
    for scan in scans {
        let index = snapshot.index_for(scan.field())?;
        let ids = index
            .index_map()
            .scan(scan.lower().clone(), scan.upper().clone());
        candidates = Some(match candidates {
            Some(existing) => existing.intersection(ids),
            None => ids,
        });
        if let Some(ref ids) = candidates {
            if ids.is_empty() {
                break;
            }
        }
    }
    candidates
}

fn verify_candidates(
    snapshot: &CollectionSnapshot,
    filter: &Filter,
    ids: &OrdSet<ObjectId>,
) -> LutraResult<Vec<Document>> {
    let mut result = Vec::new();
    for id in ids {
        if let Some(doc) = snapshot.get(id) {
            if filter.apply(doc)? {
                result.push(doc.clone());
            }
        }
    }
    Ok(result)
}
