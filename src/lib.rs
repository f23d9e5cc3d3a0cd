//! Middle end of a kernel compiler for spiking-neural-network accelerators.
//!
//! A spike transaction and a neuron transaction are lowered through
//! AST, symbols and IR into semantic, layout, binding, control and naming
//! plans that a hardware backend can consume.

pub mod api;
pub mod arch;
pub mod ast;
pub mod binding;
pub mod control;
pub mod diagnostic;
pub mod error;
pub mod hash;
pub mod ir;
pub mod layout;
pub mod naming;
pub mod semantics;
pub mod symbols;
pub mod transaction;

#[cfg(test)]
mod testing;

pub use api::{compile, lower_to_ir, CompileOptions, CompiledKernel};
pub use arch::ArchDescriptor;
pub use diagnostic::Diagnostic;
pub use error::{CompileError, Result};
pub use transaction::Transaction;
