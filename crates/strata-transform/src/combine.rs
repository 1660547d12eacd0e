use std::sync::Mutex;

/// Combines per-batch results along a fixed binary tree keyed by batch
/// index.
///
/// Every inner node combines its left child into its right-hand position in
/// a fixed order, so the final value is the same no matter in which order
/// batches finish. The combiner therefore only needs to be associative, not
/// commutative.
///
/// Whichever thread delivers the second child of a node performs that node's
/// combination and carries the result upward, so combination work is spread
/// over the batch threads instead of a final single-threaded pass.
pub struct CombineTree<T, F> {
    /// Leaf count per level, halving (rounded up) towards the root.
    widths: Vec<usize>,
    /// One slot per inner node, holding the first-arrived child.
    slots: Vec<Vec<Mutex<Option<(bool, T)>>>>,
    combine: F,
}

impl<T, F> CombineTree<T, F>
where
    F: Fn(T, T) -> T,
{
    /// Creates a tree expecting exactly `leaves` results.
    pub fn new(leaves: usize, combine: F) -> CombineTree<T, F> {
        assert!(leaves > 0, "combine tree needs at least one leaf");
        let mut widths = vec![leaves];
        let mut slots = Vec::new();
        let mut width = leaves;
        while width > 1 {
            let parents = width.div_ceil(2);
            slots.push((0..width / 2).map(|_| Mutex::new(None)).collect());
            widths.push(parents);
            width = parents;
        }
        CombineTree {
            widths,
            slots,
            combine,
        }
    }

    /// Delivers the result of leaf `index`.
    ///
    /// Returns the root value once every leaf has been delivered, on
    /// whichever call completes the last combination; all other calls return
    /// `None`. Each leaf must be delivered exactly once.
    pub fn accept(&self, index: usize, value: T) -> Option<T> {
        let mut index = index;
        let mut value = value;
        for (level, width) in self.widths.iter().copied().enumerate() {
            if width == 1 {
                return Some(value);
            }
            if width % 2 == 1 && index == width - 1 {
                // odd tail has no sibling and moves up unchanged
                index /= 2;
                continue;
            }
            let parent = index / 2;
            let mut slot = self.slots[level][parent].lock().expect("combine slot");
            match slot.take() {
                None => {
                    *slot = Some((index % 2 == 0, value));
                    return None;
                }
                Some((stored_is_left, stored)) => {
                    drop(slot);
                    value = if stored_is_left {
                        (self.combine)(stored, value)
                    } else {
                        (self.combine)(value, stored)
                    };
                    index = parent;
                }
            }
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn concat_in_order(leaves: usize) -> String {
        (0..leaves).map(|i| i.to_string()).collect()
    }

    #[test]
    fn single_leaf_passes_through() {
        let tree = CombineTree::new(1, |a: String, b: String| a + &b);
        assert_eq!(tree.accept(0, "x".to_string()), Some("x".to_string()));
    }

    #[test]
    fn delivery_order_does_not_change_the_result() {
        // string concatenation is associative but not commutative, so any
        // order-dependence would show up as scrambled output
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for leaves in 1..=17 {
            let mut order: Vec<usize> = (0..leaves).collect();
            for _ in 0..20 {
                order.shuffle(&mut rng);
                let tree = CombineTree::new(leaves, |a: String, b: String| a + &b);
                let mut root = None;
                for &leaf in &order {
                    let delivered = tree.accept(leaf, leaf.to_string());
                    if delivered.is_some() {
                        assert!(root.is_none());
                        root = delivered;
                    }
                }
                assert_eq!(root, Some(concat_in_order(leaves)));
            }
        }
    }
}
