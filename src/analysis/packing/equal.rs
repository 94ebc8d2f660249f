use crate::analysis::packing::flatten::flatten_type;
use crate::ir::{DataLayout, Type};

/// Decide whether two types are layout-compatible over the first
/// `byte_limit` bytes.
///
/// Both types are flattened from offset 0 and walked in lock-step by index:
/// entry `i` of one side is compared against entry `i` of the other, never
/// against the entry at the matching offset. A running covered-bytes counter
/// takes the larger of the two offsets at each step; the walk stops as soon
/// as the counter or the entry index reaches `byte_limit`, or either side
/// runs out of entries. Stopping counts as success, so the tail that cannot
/// be compared is never reported — a deliberate under-approximation.
///
/// Two pointer leaves are always compatible regardless of pointee type: the
/// byte-precise encoding preserves pointer identity, not pointee shape. Any
/// other pair of leaves must agree on both store size and offset.
///
/// Known limitation: because the walk is index-aligned, two layouts that
/// subdivide the same byte range into different numbers of leaves can pass
/// when their cumulative offsets happen to line up index by index. This
/// imprecision is kept as is.
pub fn structurally_equal(a: &Type, b: &Type, byte_limit: u64, layout: &DataLayout) -> bool {
    let fa = flatten_type(a, 0, layout);
    let fb = flatten_type(b, 0, layout);
    let entries = fa.len().min(fb.len());
    let mut covered = 0u64;
    let mut i = 0usize;
    while (i as u64) < byte_limit && i < entries && covered < byte_limit {
        let ea = &fa[i];
        let eb = &fb[i];
        covered = ea.offset.max(eb.offset);
        if !(ea.leaf.is_pointer() && eb.leaf.is_pointer()) {
            if layout.store_size(&ea.leaf) != layout.store_size(&eb.leaf)
                || ea.offset != eb.offset
            {
                return false;
            }
        }
        i += 1;
    }
    true
}
