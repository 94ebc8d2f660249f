use std::fmt;

/// The closed set of IR types the analysis understands. Aggregates are always
/// expanded by the flattener; only `Integer`, `Float` and `Pointer` appear as
/// layout leaves. Types are compared structurally, never by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Integer { bits: u32 },
    Float { bits: u32 },
    Pointer { pointee: Box<Type> },
    Array { element: Box<Type>, count: u64 },
    Struct { fields: Vec<Type> },
}

impl Type {
    pub fn integer(bits: u32) -> Self {
        Type::Integer { bits }
    }

    pub fn float(bits: u32) -> Self {
        Type::Float { bits }
    }

    pub fn pointer(pointee: Type) -> Self {
        Type::Pointer { pointee: Box::new(pointee) }
    }

    pub fn array(element: Type, count: u64) -> Self {
        Type::Array { element: Box::new(element), count }
    }

    pub fn structure(fields: Vec<Type>) -> Self {
        Type::Struct { fields }
    }

    /// A scalar occupies one layout leaf; aggregates are expanded.
    pub fn is_scalar(&self) -> bool {
        match self {
            Type::Integer { .. } | Type::Float { .. } | Type::Pointer { .. } => true,
            Type::Array { .. } | Type::Struct { .. } => false,
        }
    }

    pub fn is_pointer(&self) -> bool {
        match self {
            Type::Pointer { .. } => true,
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer { bits } => write!(f, "i{}", bits),
            Type::Float { bits } => write!(f, "f{}", bits),
            Type::Pointer { pointee } => write!(f, "{}*", pointee),
            Type::Array { element, count } => write!(f, "[{} x {}]", count, element),
            Type::Struct { fields } => {
                write!(f, "{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, " }}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_classification() {
        assert!(Type::integer(32).is_scalar());
        assert!(Type::float(64).is_scalar());
        assert!(Type::pointer(Type::integer(8)).is_scalar());
        assert!(!Type::array(Type::integer(8), 4).is_scalar());
        assert!(!Type::structure(vec![Type::integer(32)]).is_scalar());
    }

    #[test]
    fn display_forms() {
        let ty = Type::structure(vec![
            Type::integer(32),
            Type::array(Type::integer(8), 4),
            Type::pointer(Type::float(64)),
        ]);
        assert_eq!(format!("{}", ty), "{ i32, [4 x i8], f64* }");
    }
}
