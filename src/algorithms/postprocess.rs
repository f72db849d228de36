//! Partition post-processing (spec.md §4.4): empty-partition repair and
//! contiguity checking.

use crate::mesh::pool::LinkedListPool;
use crate::mesh::point::UNSET;

/// Repairs `part` in place so every part has at least one cell (spec.md
/// §4.4.1).
///
/// Builds a linked list per part, then repeatedly moves one cell from the
/// largest nonempty list into the smallest (empty) one until no list is
/// empty. Requires `n >= nparts`.
///
/// On exit: every part has >= 1 cell, `part` is still a total function on
/// cells, and `sum(|part_i|) == n`.
pub fn correct_empty_partitions(part: &mut [usize], nparts: usize) {
    let n = part.len();
    if nparts == 0 {
        return;
    }
    debug_assert!(n >= nparts, "correct_empty_partitions requires n >= nparts");

    let mut pool = LinkedListPool::with_capacity(n.max(1));
    let mut heads = vec![UNSET; nparts];
    // Push in reverse so iterating the chain front-to-back yields
    // ascending cell index, which keeps the repair deterministic.
    for cell in (0..n).rev() {
        let p = part[cell];
        heads[p] = pool.insert_front(heads[p], cell);
    }

    let mut lens: Vec<usize> = heads.iter().map(|&h| pool.len_of(h)).collect();

    loop {
        let Some(empty_part) = (0..nparts).find(|&p| lens[p] == 0) else {
            break;
        };
        let largest_part = (0..nparts).max_by_key(|&p| lens[p]).unwrap();

        let (new_head, cell) = pool.pop_front(heads[largest_part]);
        heads[largest_part] = new_head;
        lens[largest_part] -= 1;

        part[cell] = empty_part;
        heads[empty_part] = pool.insert_front(heads[empty_part], cell);
        lens[empty_part] += 1;
    }
}

/// Flood-fills the dual graph restricted to each part, returning the
/// maximum number of colors (connected components) found in any single
/// part (spec.md §4.4.2). A part is contiguous iff its color count is 1.
pub fn max_part_colors(xadj: &[usize], adjncy: &[usize], part: &[usize]) -> usize {
    let n = part.len();
    let mut color = vec![UNSET; n];
    let mut part_color_count = vec![0usize; part.iter().copied().max().map_or(0, |m| m + 1)];
    let mut stack = Vec::new();

    for start in 0..n {
        if color[start] != UNSET {
            continue;
        }
        let this_part = part[start];
        let c = part_color_count[this_part];
        part_color_count[this_part] += 1;
        color[start] = c;
        stack.push(start);
        while let Some(node) = stack.pop() {
            for &nbr in &adjncy[xadj[node]..xadj[node + 1]] {
                if part[nbr] == this_part && color[nbr] == UNSET {
                    color[nbr] = c;
                    stack.push(nbr);
                }
            }
        }
    }

    part_color_count.into_iter().max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_single_empty_partition() {
        let mut part = vec![0, 0, 0, 0, 0];
        correct_empty_partitions(&mut part, 2);
        assert!(part.contains(&0));
        assert!(part.contains(&1));
        assert_eq!(part.len(), 5);
    }

    #[test]
    fn repairs_multiple_empty_partitions() {
        let mut part = vec![0, 0, 0, 0, 0, 0, 0, 0];
        correct_empty_partitions(&mut part, 4);
        for p in 0..4 {
            assert!(part.contains(&p), "part {p} ended up empty");
        }
    }

    #[test]
    fn leaves_already_balanced_partition_alone() {
        let mut part = vec![0, 1, 0, 1];
        let before = part.clone();
        correct_empty_partitions(&mut part, 2);
        assert_eq!(part, before);
    }

    #[test]
    fn detects_disconnected_part() {
        // path graph 0-1-2-3-4-5, part = [0,1,0,1,0,1] -> no same-color
        // adjacency at all, so every single-node "part" has as many
        // colors as nodes assigned to it.
        let xadj = vec![0, 1, 3, 5, 7, 9, 10];
        let adjncy = vec![1, 0, 2, 1, 3, 2, 4, 3, 5, 4];
        let part = vec![0, 1, 0, 1, 0, 1];
        let colors = max_part_colors(&xadj, &adjncy, &part);
        assert_eq!(colors, 3);
    }

    #[test]
    fn contiguous_partition_has_one_color_per_part() {
        let xadj = vec![0, 1, 3, 5, 7, 9, 10];
        let adjncy = vec![1, 0, 2, 1, 3, 2, 4, 3, 5, 4];
        let part = vec![0, 0, 0, 1, 1, 1];
        let colors = max_part_colors(&xadj, &adjncy, &part);
        assert_eq!(colors, 1);
    }
}
