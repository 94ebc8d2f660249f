use snafu::{ensure, ResultExt, Snafu};

use crate::ir::types::Type;

/// Errors raised while parsing an LLVM-style data-layout specification string.
#[derive(Debug, Snafu)]
pub enum LayoutError {
    #[snafu(display("empty component in data layout `{}`", spec))]
    EmptyComponent { spec: String },

    #[snafu(display("malformed data layout component `{}`", component))]
    MalformedComponent { component: String },

    #[snafu(display("bad size in data layout component `{}`: {}", component, source))]
    BadSize {
        component: String,
        source: std::num::ParseIntError,
    },

    #[snafu(display("size {} in component `{}` is not a multiple of 8 bits", bits, component))]
    NotByteSized { component: String, bits: u64 },
}

/// Byte-size and alignment oracle for one target. All quantities are bytes.
///
/// The oracle is owned by the caller for the duration of one analysis
/// invocation and never mutated by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    little_endian: bool,
    pointer_size: u64,
    pointer_align: u64,
    /* (bit width, abi alignment), sorted by bit width */
    int_aligns: Vec<(u32, u64)>,
    float_aligns: Vec<(u32, u64)>,
}

/// Field offsets and overall size/alignment of one struct body, including
/// inter-field and tail padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub offsets: Vec<u64>,
    pub size: u64,
    pub align: u64,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self {
            little_endian: true,
            pointer_size: 8,
            pointer_align: 8,
            int_aligns: vec![(1, 1), (8, 1), (16, 2), (32, 4), (64, 8)],
            float_aligns: vec![(16, 2), (32, 4), (64, 8), (80, 16), (128, 16)],
        }
    }
}

fn round_up(value: u64, align: u64) -> u64 {
    (value + align - 1) / align * align
}

fn parse_bits(component: &str, text: &str) -> Result<u64, LayoutError> {
    let bits: u64 = text.parse().context(BadSizeSnafu { component })?;
    ensure!(bits % 8 == 0, NotByteSizedSnafu { component, bits });
    Ok(bits)
}

fn upsert(table: &mut Vec<(u32, u64)>, bits: u32, align: u64) {
    match table.binary_search_by_key(&bits, |entry| entry.0) {
        Ok(pos) => table[pos].1 = align,
        Err(pos) => table.insert(pos, (bits, align)),
    }
}

/// Alignment lookup: exact width if listed, otherwise the next larger listed
/// width, otherwise the largest listed one.
fn lookup_align(table: &[(u32, u64)], bits: u32) -> u64 {
    for &(width, align) in table {
        if width >= bits {
            return align;
        }
    }
    table.last().map(|entry| entry.1).unwrap_or(1)
}

impl DataLayout {
    /// Parse an LLVM-style specification such as `e-p:64:64-i64:64-f80:128`,
    /// applying each component as an override on top of the default target.
    /// Components with no bearing on sizes or alignment (`m`, `n`, `a`, `S`,
    /// `v`) are accepted and ignored.
    pub fn parse(spec: &str) -> Result<Self, LayoutError> {
        let mut layout = DataLayout::default();
        for component in spec.split('-') {
            ensure!(!component.is_empty(), EmptyComponentSnafu { spec });
            let mut parts = component.split(':');
            let head = parts.next().unwrap();
            ensure!(!head.is_empty(), MalformedComponentSnafu { component });
            match head.as_bytes()[0] {
                b'e' if head == "e" => layout.little_endian = true,
                b'E' if head == "E" => layout.little_endian = false,
                b'p' => {
                    // p[addrspace]:<size>:<abi>[:<pref>]
                    let size = parts
                        .next()
                        .ok_or_else(|| MalformedComponentSnafu { component }.build())?;
                    let abi = parts
                        .next()
                        .ok_or_else(|| MalformedComponentSnafu { component }.build())?;
                    layout.pointer_size = (parse_bits(component, size)? / 8).max(1);
                    layout.pointer_align = (parse_bits(component, abi)? / 8).max(1);
                }
                b'i' | b'f' => {
                    let bits: u32 = head[1..]
                        .parse()
                        .context(BadSizeSnafu { component })?;
                    let abi = parts
                        .next()
                        .ok_or_else(|| MalformedComponentSnafu { component }.build())?;
                    let align = parse_bits(component, abi)? / 8;
                    let table = if head.as_bytes()[0] == b'i' {
                        &mut layout.int_aligns
                    } else {
                        &mut layout.float_aligns
                    };
                    upsert(table, bits, align.max(1));
                }
                b'm' | b'n' | b'a' | b'S' | b'v' => {}
                _ => return MalformedComponentSnafu { component }.fail(),
            }
        }
        Ok(layout)
    }

    pub fn is_little_endian(&self) -> bool {
        self.little_endian
    }

    pub fn pointer_size(&self) -> u64 {
        self.pointer_size
    }

    /// Bytes actually touched by a load or store of `ty`. For aggregates this
    /// includes internal padding; tail padding is included as well since the
    /// aggregate is only ever moved as a whole.
    pub fn store_size(&self, ty: &Type) -> u64 {
        match ty {
            Type::Integer { bits } => u64::from(bits + 7) / 8,
            Type::Float { bits } => u64::from(bits + 7) / 8,
            Type::Pointer { .. } => self.pointer_size,
            Type::Array { element, count } => count * self.alloc_size(element),
            Type::Struct { fields } => self.struct_layout(fields).size,
        }
    }

    /// Bytes reserved for `ty` in memory: the store size rounded up to the
    /// ABI alignment. This is the stride between consecutive array elements.
    pub fn alloc_size(&self, ty: &Type) -> u64 {
        round_up(self.store_size(ty), self.abi_align(ty))
    }

    pub fn abi_align(&self, ty: &Type) -> u64 {
        match ty {
            Type::Integer { bits } => lookup_align(&self.int_aligns, *bits),
            Type::Float { bits } => lookup_align(&self.float_aligns, *bits),
            Type::Pointer { .. } => self.pointer_align,
            Type::Array { element, .. } => self.abi_align(element),
            Type::Struct { fields } => self.struct_layout(fields).align,
        }
    }

    /// Lay out a struct body: each field at the next offset rounded up to its
    /// alignment, overall size rounded up to the struct alignment. Offsets
    /// are monotonically non-decreasing in field index by construction.
    pub fn struct_layout(&self, fields: &[Type]) -> StructLayout {
        let mut offsets = Vec::with_capacity(fields.len());
        let mut offset = 0u64;
        let mut align = 1u64;
        for field in fields {
            let field_align = self.abi_align(field);
            align = align.max(field_align);
            offset = round_up(offset, field_align);
            offsets.push(offset);
            offset += self.alloc_size(field);
        }
        StructLayout {
            offsets,
            size: round_up(offset, align),
            align,
        }
    }

    pub fn field_offset(&self, fields: &[Type], index: usize) -> u64 {
        self.struct_layout(fields).offsets[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_sizes() {
        let dl = DataLayout::default();
        assert_eq!(dl.store_size(&Type::integer(32)), 4);
        assert_eq!(dl.alloc_size(&Type::integer(32)), 4);
        assert_eq!(dl.store_size(&Type::integer(1)), 1);
        assert_eq!(dl.store_size(&Type::float(64)), 8);
        assert_eq!(dl.store_size(&Type::pointer(Type::integer(8))), 8);
    }

    #[test]
    fn odd_width_integer_is_padded_to_alignment() {
        let dl = DataLayout::default();
        // i48 stores in 6 bytes but aligns like the next larger listed width.
        assert_eq!(dl.store_size(&Type::integer(48)), 6);
        assert_eq!(dl.abi_align(&Type::integer(48)), 8);
        assert_eq!(dl.alloc_size(&Type::integer(48)), 8);
    }

    #[test]
    fn struct_offsets_and_padding() {
        let dl = DataLayout::default();
        let fields = vec![Type::integer(8), Type::integer(32), Type::integer(8)];
        let sl = dl.struct_layout(&fields);
        assert_eq!(sl.offsets, vec![0, 4, 8]);
        assert_eq!(sl.align, 4);
        assert_eq!(sl.size, 12);
        assert_eq!(dl.field_offset(&fields, 1), 4);
    }

    #[test]
    fn packed_scalar_array_struct() {
        let dl = DataLayout::default();
        let fields = vec![Type::integer(32), Type::array(Type::integer(8), 4)];
        let sl = dl.struct_layout(&fields);
        assert_eq!(sl.offsets, vec![0, 4]);
        assert_eq!(sl.size, 8);
    }

    #[test]
    fn array_stride_uses_alloc_size() {
        let dl = DataLayout::default();
        let inner = Type::structure(vec![Type::integer(32), Type::integer(8)]);
        assert_eq!(dl.alloc_size(&inner), 8);
        assert_eq!(dl.store_size(&Type::array(inner, 3)), 24);
    }

    #[test]
    fn parse_overrides_defaults() {
        let dl = DataLayout::parse("e-p:32:32-i64:32").unwrap();
        assert_eq!(dl.pointer_size(), 4);
        assert_eq!(dl.abi_align(&Type::integer(64)), 4);
        assert!(dl.is_little_endian());
    }

    #[test]
    fn parse_rejects_malformed_components() {
        assert!(DataLayout::parse("q32").is_err());
        assert!(DataLayout::parse("p:63:64").is_err());
        assert!(DataLayout::parse("i32").is_err());
        assert!(DataLayout::parse("e--i32:32").is_err());
    }
}
