pub mod equal;
pub mod flatten;

use std::fmt;

use crate::ir::{DataLayout, Function, Inst, InstId, Module, ValueData, ValueId};
use crate::pack_warn;
use equal::structurally_equal;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FindingKind {
    MismatchedLoad,
    MismatchedCopy,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingKind::MismatchedLoad => write!(f, "load"),
            FindingKind::MismatchedCopy => write!(f, "memcpy"),
        }
    }
}

/// One suspected packing violation: an access that a byte-precise memory
/// model and a naive typed model would disagree on. Findings carry no
/// remediation data; the instruction id is an opaque location token for the
/// caller to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub function: String,
    pub inst: InstId,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Got one {}: in {}", self.kind, self.function)
    }
}

/// Run the packing detector over every function of `module` in declaration
/// order and return the findings in discovery order. Pure: no logging, no
/// deduplication, no state beyond the returned vector.
pub fn analyze(module: &Module, layout: &DataLayout) -> Vec<Finding> {
    let mut findings = Vec::new();
    for func in module.functions() {
        check_function(func, layout, &mut findings);
    }
    findings
}

/// One linear walk over the instruction stream; instructions that are
/// neither loads nor block copies are skipped.
fn check_function(func: &Function, layout: &DataLayout, findings: &mut Vec<Finding>) {
    for (id, inst) in func.insts() {
        match inst {
            Inst::Load { ptr, .. } => {
                if let Some(finding) = check_load(func, id, *ptr, layout) {
                    findings.push(finding);
                }
            }
            Inst::MemCpy { dest, src, len } => {
                if let Some(finding) = check_memcpy(func, id, *dest, *src, *len, layout) {
                    findings.push(finding);
                }
            }
            Inst::Other => {}
        }
    }
}

/// Load rule: the pointer operand must itself be a reinterpreting cast whose
/// base resolves to a local object; the source and destination pointee types
/// are then compared over the smaller of their store sizes.
fn check_load(func: &Function, inst: InstId, ptr: ValueId, layout: &DataLayout) -> Option<Finding> {
    let (operand, from, to) = match func.value(ptr) {
        ValueData::BitCast { operand, from, to } => (*operand, from, to),
        _ => return None,
    };
    if !func.is_local_object(func.strip_pointer_casts(operand)) {
        return None;
    }
    let limit = layout.store_size(from).min(layout.store_size(to));
    if structurally_equal(from, to, limit, layout) {
        return None;
    }
    Some(Finding {
        kind: FindingKind::MismatchedLoad,
        function: func.name.clone(),
        inst,
    })
}

/// Block-copy rule: both endpoints must resolve to local objects and the
/// length must be a known constant; the declared types are then compared
/// over that many bytes.
fn check_memcpy(
    func: &Function,
    inst: InstId,
    dest: ValueId,
    src: ValueId,
    len: ValueId,
    layout: &DataLayout,
) -> Option<Finding> {
    let dest_ty = func.allocated_type(func.strip_pointer_casts(dest))?;
    let src_ty = func.allocated_type(func.strip_pointer_casts(src))?;
    let size = func.const_int(len)?;
    if structurally_equal(dest_ty, src_ty, size, layout) {
        return None;
    }
    Some(Finding {
        kind: FindingKind::MismatchedCopy,
        function: func.name.clone(),
        inst,
    })
}

/// Detector front end in the platform's analysis shape: `new` then `start`.
/// `start` runs the pure analysis and renders each finding through the
/// logging system before handing the findings back.
pub struct PackingCheck<'a> {
    module: &'a Module,
    layout: &'a DataLayout,
}

impl<'a> PackingCheck<'a> {
    pub fn new(module: &'a Module, layout: &'a DataLayout) -> Self {
        Self { module, layout }
    }

    pub fn start(&self) -> Vec<Finding> {
        let findings = analyze(self.module, self.layout);
        for finding in &findings {
            pack_warn!("{}", finding);
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Type;

    /// A function that allocates `declared`, reinterprets the slot as
    /// `loaded_as` and loads through the cast.
    fn load_through_cast(name: &str, declared: Type, loaded_as: Type) -> Function {
        let mut func = Function::new(name);
        let slot = func.add_value(ValueData::Alloca {
            allocated: declared.clone(),
        });
        let cast = func.add_value(ValueData::BitCast {
            operand: slot,
            from: declared,
            to: loaded_as.clone(),
        });
        func.add_inst(Inst::Load {
            ptr: cast,
            ty: loaded_as,
        });
        func
    }

    fn copy_between_boxes(name: &str, dest: Type, src: Type, len: Option<u64>) -> Function {
        let mut func = Function::new(name);
        let d = func.add_value(ValueData::Alloca { allocated: dest });
        let s = func.add_value(ValueData::Alloca { allocated: src });
        let len = match len {
            Some(value) => func.add_value(ValueData::ConstInt { bits: 64, value }),
            None => func.add_value(ValueData::Opaque {
                ty: Type::integer(64),
            }),
        };
        func.add_inst(Inst::MemCpy { dest: d, src: s, len });
        func
    }

    fn single(func: Function) -> Module {
        let mut module = Module::new("m");
        module.add_function(func);
        module
    }

    #[test]
    fn mismatched_load_is_reported() {
        let dl = DataLayout::default();
        let declared = Type::structure(vec![Type::integer(32), Type::integer(32)]);
        let loaded = Type::structure(vec![Type::integer(16), Type::integer(48)]);
        let module = single(load_through_cast("victim", declared, loaded));
        let findings = analyze(&module, &dl);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::MismatchedLoad);
        assert_eq!(findings[0].function, "victim");
        assert_eq!(format!("{}", findings[0]), "Got one load: in victim");
    }

    #[test]
    fn compatible_reinterpretation_is_silent() {
        let dl = DataLayout::default();
        let declared = Type::structure(vec![Type::integer(32), Type::integer(32)]);
        let loaded = Type::structure(vec![Type::integer(32), Type::float(32)]);
        let module = single(load_through_cast("ok", declared, loaded));
        assert!(analyze(&module, &dl).is_empty());
    }

    #[test]
    fn load_without_reinterpreting_cast_is_skipped() {
        let dl = DataLayout::default();
        let mut func = Function::new("plain");
        let slot = func.add_value(ValueData::Alloca {
            allocated: Type::integer(32),
        });
        func.add_inst(Inst::Load {
            ptr: slot,
            ty: Type::integer(32),
        });
        assert!(analyze(&single(func), &dl).is_empty());
    }

    #[test]
    fn non_local_base_is_skipped() {
        let dl = DataLayout::default();
        let mut func = Function::new("param");
        let arg = func.add_value(ValueData::Argument {
            index: 0,
            ty: Type::pointer(Type::integer(32)),
        });
        let cast = func.add_value(ValueData::BitCast {
            operand: arg,
            from: Type::integer(32),
            to: Type::array(Type::integer(8), 4),
        });
        func.add_inst(Inst::Load {
            ptr: cast,
            ty: Type::array(Type::integer(8), 4),
        });
        assert!(analyze(&single(func), &dl).is_empty());
    }

    #[test]
    fn cast_chain_still_resolves_to_the_box() {
        let dl = DataLayout::default();
        let mut func = Function::new("chained");
        let slot = func.add_value(ValueData::Alloca {
            allocated: Type::integer(64),
        });
        let first = func.add_value(ValueData::BitCast {
            operand: slot,
            from: Type::integer(64),
            to: Type::array(Type::integer(16), 4),
        });
        let second = func.add_value(ValueData::BitCast {
            operand: first,
            from: Type::array(Type::integer(16), 4),
            to: Type::array(Type::integer(8), 8),
        });
        func.add_inst(Inst::Load {
            ptr: second,
            ty: Type::array(Type::integer(8), 8),
        });
        let findings = analyze(&single(func), &dl);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::MismatchedLoad);
    }

    #[test]
    fn mismatched_copy_is_reported() {
        let dl = DataLayout::default();
        let module = single(copy_between_boxes(
            "copier",
            Type::integer(32),
            Type::array(Type::integer(8), 4),
            Some(4),
        ));
        let findings = analyze(&module, &dl);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::MismatchedCopy);
        assert_eq!(format!("{}", findings[0]), "Got one memcpy: in copier");
    }

    #[test]
    fn non_constant_length_is_skipped() {
        let dl = DataLayout::default();
        let module = single(copy_between_boxes(
            "dynamic",
            Type::integer(32),
            Type::array(Type::integer(8), 4),
            None,
        ));
        assert!(analyze(&module, &dl).is_empty());
    }

    #[test]
    fn copy_between_identical_boxes_is_silent() {
        let dl = DataLayout::default();
        let ty = Type::structure(vec![Type::integer(32), Type::float(64)]);
        let module = single(copy_between_boxes("same", ty.clone(), ty, Some(16)));
        assert!(analyze(&module, &dl).is_empty());
    }

    #[test]
    fn findings_follow_module_declaration_order() {
        let dl = DataLayout::default();
        let mut module = Module::new("m");
        module.add_function(load_through_cast(
            "first",
            Type::integer(32),
            Type::array(Type::integer(8), 4),
        ));
        module.add_function(copy_between_boxes(
            "second",
            Type::integer(32),
            Type::array(Type::integer(8), 4),
            Some(4),
        ));
        let findings = analyze(&module, &dl);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].function, "first");
        assert_eq!(findings[1].function, "second");
    }
}
