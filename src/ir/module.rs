use crate::ir::types::Type;

/// Index of a value in its function's value table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueId(pub u32);

/// Index of an instruction in its function's instruction list; findings use
/// this as an opaque location token.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstId(pub u32);

/// One node of a function's immutable value graph. The graph is acyclic by
/// construction: a `BitCast` may only reference an already-inserted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueData {
    /// A stack slot declared in the current function. The only value kind
    /// with a statically trusted layout (a "box").
    Alloca { allocated: Type },
    /// A formal parameter. Provenance unknown to the analysis.
    Argument { index: u32, ty: Type },
    /// A module-level definition. Provenance unknown to the analysis.
    Global { name: String, ty: Type },
    /// A no-op pointer reinterpretation from `*from` to `*to`.
    BitCast { operand: ValueId, from: Type, to: Type },
    /// A constant integer, e.g. a block-copy length.
    ConstInt { bits: u32, value: u64 },
    /// Anything the analysis does not model (call results, arithmetic, ...).
    Opaque { ty: Type },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inst {
    /// Read a value of type `ty` through `ptr`.
    Load { ptr: ValueId, ty: Type },
    /// Copy `len` bytes from `src` to `dest`. `len` names a value; the
    /// detector only fires when it resolves to a `ConstInt`.
    MemCpy {
        dest: ValueId,
        src: ValueId,
        len: ValueId,
    },
    /// Any instruction irrelevant to the analysis.
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    values: Vec<ValueData>,
    insts: Vec<Inst>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            insts: Vec::new(),
        }
    }

    pub fn add_value(&mut self, data: ValueData) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(data);
        id
    }

    pub fn add_inst(&mut self, inst: Inst) -> InstId {
        let id = InstId(self.insts.len() as u32);
        self.insts.push(inst);
        id
    }

    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.0 as usize]
    }

    pub fn insts(&self) -> impl Iterator<Item = (InstId, &Inst)> {
        self.insts
            .iter()
            .enumerate()
            .map(|(i, inst)| (InstId(i as u32), inst))
    }

    /// Unwind any chain of no-op pointer reinterpretations and return the
    /// underlying value. Cast chains cannot cycle, so no visited set is kept.
    pub fn strip_pointer_casts(&self, id: ValueId) -> ValueId {
        let mut current = id;
        while let ValueData::BitCast { operand, .. } = self.value(current) {
            current = *operand;
        }
        current
    }

    /// True iff `id` denotes a locally declared, fixed-layout memory object.
    /// Parameters, globals and opaque values do not carry a trustworthy
    /// layout and are never classified as local objects.
    pub fn is_local_object(&self, id: ValueId) -> bool {
        match self.value(id) {
            ValueData::Alloca { .. } => true,
            _ => false,
        }
    }

    /// The declared type of a local object, if `id` is one.
    pub fn allocated_type(&self, id: ValueId) -> Option<&Type> {
        match self.value(id) {
            ValueData::Alloca { allocated } => Some(allocated),
            _ => None,
        }
    }

    /// The value of `id` if it is a constant integer.
    pub fn const_int(&self, id: ValueId) -> Option<u64> {
        match self.value(id) {
            ValueData::ConstInt { value, .. } => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    pub fn add_function(&mut self, func: Function) {
        self.functions.push(func);
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }
}
