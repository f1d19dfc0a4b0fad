//! External circuit-compiler abstraction.
//!
//! The compiler is an opaque collaborator: the harness only drives the
//! compile step and reads the R1CS artifact it leaves behind.

pub mod circom;
pub mod generic;
pub mod mock;
pub mod r1cs;
pub mod traits;

pub use circom::{CircomCompiler, CircomConfig};
pub use generic::GenericCompiler;
pub use mock::{MockCompiler, MockConfig};
pub use traits::{CircuitCompiler, CompiledCircuit, CompilerInfo, ConstraintSystemSize};
