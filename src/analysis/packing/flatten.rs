use smallvec::{smallvec, SmallVec};

use crate::ir::{DataLayout, Type};

/// One scalar leaf of a flattened aggregate: the leaf type and its absolute
/// byte offset. The leaf is always `Integer`, `Float` or `Pointer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    pub leaf: Type,
    pub offset: u64,
}

/// The physical layout of a type as an offset-ordered sequence of scalar
/// leaves. Ordering is maintained by construction, never re-sorted.
pub type FlattenedLayout = SmallVec<[LayoutEntry; 8]>;

/// Recursively decompose `ty` into its scalar leaves, each paired with its
/// absolute byte offset starting at `offset`.
///
/// Arrays expand element by element at the element's alloc-size stride;
/// structs expand field by field at the offsets the data layout assigns.
/// A zero-length array contributes no leaves. Flattening is a pure structural
/// recursion: identical inputs always yield the identical sequence.
pub fn flatten_type(ty: &Type, offset: u64, layout: &DataLayout) -> FlattenedLayout {
    match ty {
        Type::Integer { .. } | Type::Float { .. } | Type::Pointer { .. } => {
            smallvec![LayoutEntry {
                leaf: ty.clone(),
                offset,
            }]
        }
        Type::Array { element, count } => {
            let stride = layout.alloc_size(element);
            let mut leaves = FlattenedLayout::new();
            for i in 0..*count {
                leaves.extend(flatten_type(element, offset + i * stride, layout));
            }
            leaves
        }
        Type::Struct { fields } => {
            let sl = layout.struct_layout(fields);
            let mut leaves = FlattenedLayout::new();
            for (field, field_offset) in fields.iter().zip(sl.offsets) {
                leaves.extend(flatten_type(field, offset + field_offset, layout));
            }
            leaves
        }
    }
}
