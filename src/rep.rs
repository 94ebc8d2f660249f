//! Emission of the byte-precise memory-model prelude: the two-dimensional
//! (region, offset) pointer encoding and the runtime procedure declarations
//! the encoded program calls into. Purely declarative string emission; the
//! detection core never depends on this module.

pub const PTR_TYPE: &str = "$ptr";
pub const REF_TYPE: &str = "$ref";
pub const MEMORY: &str = "$Mem";
pub const ALLOC: &str = "$Alloc";

/// Global state the runtime procedures are allowed to modify.
pub fn modifies() -> Vec<&'static str> {
    vec![MEMORY, ALLOC]
}

pub fn ptr_type() -> &'static str {
    PTR_TYPE
}

/// Type, constructor/projection and state declarations for the encoding.
/// A pointer is an (object reference, byte offset) pair; memory maps whole
/// pointers to values, so reinterpreted accesses hit the same cells.
pub fn memory_model() -> String {
    format!(
        "// Memory model: two-dimensional (reference, offset) encoding\n\
         type {ref_ty};\n\
         type {ptr_ty};\n\
         function $ptr({ref_ty}, int) returns ({ptr_ty});\n\
         function $obj({ptr_ty}) returns ({ref_ty});\n\
         function $off({ptr_ty}) returns (int);\n\
         axiom (forall x: {ref_ty}, y: int :: {{ $ptr(x, y) }} $obj($ptr(x, y)) == x);\n\
         axiom (forall x: {ref_ty}, y: int :: {{ $ptr(x, y) }} $off($ptr(x, y)) == y);\n\
         const unique $NULL: {ref_ty};\n\
         var {memory}: [{ptr_ty}] int;\n\
         var {alloc}: [{ref_ty}] bool;\n",
        ref_ty = REF_TYPE,
        ptr_ty = PTR_TYPE,
        memory = MEMORY,
        alloc = ALLOC,
    )
}

pub fn malloc_proc() -> String {
    format!(
        "procedure $malloc(obj_size: int) returns (new: {ptr_ty});\n\
         modifies {alloc};\n\
         ensures !old({alloc})[$obj(new)];\n\
         ensures {alloc}[$obj(new)];\n\
         ensures $obj(new) != $NULL;\n\
         ensures $off(new) == 0;\n\
         ensures (forall x: {ref_ty} :: x == $obj(new) || old({alloc})[x] == {alloc}[x]);\n",
        ptr_ty = PTR_TYPE,
        ref_ty = REF_TYPE,
        alloc = ALLOC,
    )
}

pub fn free_proc() -> String {
    format!(
        "procedure $free(pointer: {ptr_ty});\n\
         modifies {alloc};\n\
         requires {alloc}[$obj(pointer)];\n\
         requires $off(pointer) == 0;\n\
         ensures !{alloc}[$obj(pointer)];\n\
         ensures (forall x: {ref_ty} :: x == $obj(pointer) || old({alloc})[x] == {alloc}[x]);\n",
        ptr_ty = PTR_TYPE,
        ref_ty = REF_TYPE,
        alloc = ALLOC,
    )
}

/// Stack allocation has the same footprint contract as `$malloc`; the caller
/// is responsible for popping the frame.
pub fn alloca_proc() -> String {
    format!(
        "procedure $alloca(obj_size: int) returns (new: {ptr_ty});\n\
         modifies {alloc};\n\
         ensures !old({alloc})[$obj(new)];\n\
         ensures {alloc}[$obj(new)];\n\
         ensures $obj(new) != $NULL;\n\
         ensures $off(new) == 0;\n\
         ensures (forall x: {ref_ty} :: x == $obj(new) || old({alloc})[x] == {alloc}[x]);\n",
        ptr_ty = PTR_TYPE,
        ref_ty = REF_TYPE,
        alloc = ALLOC,
    )
}

/// Byte-wise block copy between two memory regions. Regions are numbered by
/// the host's alias partitioning; the copy is specified cell by cell so type
/// boundaries play no role in it.
pub fn memcpy_proc(dst_reg: usize, src_reg: usize) -> String {
    format!(
        "procedure $memcpy.{dst}.{src}(dest: {ptr_ty}, source: {ptr_ty}, size: int);\n\
         modifies {memory};\n\
         ensures (forall x: int :: 0 <= x && x < size ==> \
         {memory}[$ptr($obj(dest), $off(dest) + x)] == \
         old({memory})[$ptr($obj(source), $off(source) + x)]);\n\
         ensures (forall p: {ptr_ty} :: $obj(p) != $obj(dest) || \
         $off(p) < $off(dest) || $off(p) >= $off(dest) + size ==> \
         {memory}[p] == old({memory})[p]);\n",
        dst = dst_reg,
        src = src_reg,
        ptr_ty = PTR_TYPE,
        memory = MEMORY,
    )
}
