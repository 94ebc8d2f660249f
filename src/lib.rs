#[macro_use]
extern crate serde_derive;

pub mod analysis;
pub mod ir;
pub mod rep;
pub mod utils;

use stopwatch::Stopwatch;

use crate::analysis::packing::{Finding, PackingCheck};
use crate::ir::{DataLayout, Module};

/// The data-layout specification assumed when the caller supplies none.
pub static PACKCHECK_DEFAULT_LAYOUT: &str =
    "e-p:64:64-i1:8-i8:8-i16:16-i32:32-i64:64-f32:32-f64:64-f80:128";

fn run_analyzer<F, R>(name: &str, func: F) -> R
where
    F: FnOnce() -> R,
{
    pack_info!("{} Start", name);
    let sw = Stopwatch::start_new();
    let res = func();
    pack_info!("{} Done in {} ms", name, sw.elapsed_ms());
    res
}

/// Run the packing detector over a whole module. The data layout is threaded
/// through every call and never varies within one invocation; findings come
/// back in module declaration order, then instruction order.
pub fn start_analyzer(module: &Module, layout: &DataLayout) -> Vec<Finding> {
    run_analyzer("Packing Analysis", || {
        PackingCheck::new(module, layout).start()
    })
}
