pub mod layout;
pub mod module;
pub mod types;

pub use layout::{DataLayout, LayoutError, StructLayout};
pub use module::{Function, Inst, InstId, Module, ValueData, ValueId};
pub use types::Type;
