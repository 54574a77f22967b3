use std::collections::HashMap;
use std::hash::Hash;

use log::debug;

/// One row of a ranked partition.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankedRow<G, K> {
    pub group: G,
    pub key: K,
    pub total: u64,
    /// 1-based, within the partition.
    pub rank: u32,
}

/// Partitions the records by `group_key`, sums `metric` for every distinct
/// `sub_key` inside a partition and ranks the sums in decreasing order.
///
/// Partitions are returned in order of first appearance. Equal sums are
/// ordered by sub key, ascending, so that the ranking is reproducible.
/// Records for which `group_key` returns `None` are skipped.
pub fn rank<'a, R, G, K, FG, FK, FM>(
    records: impl IntoIterator<Item = &'a R>,
    group_key: FG,
    sub_key: FK,
    metric: FM,
) -> Vec<RankedRow<G, K>>
where
    R: 'a,
    G: Eq + Hash + Clone,
    K: Eq + Hash + Ord + Clone,
    FG: Fn(&R) -> Option<G>,
    FK: Fn(&R) -> K,
    FM: Fn(&R) -> u64,
{
    let mut partitions: Vec<(G, HashMap<K, u64>)> = Vec::new();
    let mut positions: HashMap<G, usize> = HashMap::new();
    for r in records {
        let g = match group_key(r) {
            Some(g) => g,
            None => continue,
        };
        let idx = *positions.entry(g.clone()).or_insert_with(|| {
            partitions.push((g.clone(), HashMap::new()));
            partitions.len() - 1
        });
        *partitions[idx].1.entry(sub_key(r)).or_insert(0) += metric(r);
    }

    let mut res: Vec<RankedRow<G, K>> = Vec::new();
    for (group, sums) in partitions {
        let mut sorted: Vec<(K, u64)> = sums.into_iter().collect();
        sorted.sort_by(|(ka, va), (kb, vb)| vb.cmp(va).then_with(|| ka.cmp(kb)));
        for (idx, (key, total)) in sorted.into_iter().enumerate() {
            res.push(RankedRow {
                group: group.clone(),
                key,
                total,
                rank: (idx + 1) as u32,
            });
        }
    }
    debug!("rank: {} ranked rows", res.len());
    res
}

/// Ranking over a single partition.
pub fn rank_all<'a, R, K, FK, FM>(
    records: impl IntoIterator<Item = &'a R>,
    sub_key: FK,
    metric: FM,
) -> Vec<RankedRow<(), K>>
where
    R: 'a,
    K: Eq + Hash + Ord + Clone,
    FK: Fn(&R) -> K,
    FM: Fn(&R) -> u64,
{
    rank(records, |_| Some(()), sub_key, metric)
}

/// The rank 1 row of every partition.
pub fn winners<G: Clone, K: Clone>(rows: &[RankedRow<G, K>]) -> Vec<RankedRow<G, K>> {
    top_n(rows, 1)
}

/// The rows with a rank lower or equal to `n`.
pub fn top_n<G: Clone, K: Clone>(rows: &[RankedRow<G, K>], n: u32) -> Vec<RankedRow<G, K>> {
    rows.iter().filter(|r| r.rank <= n).cloned().collect()
}
