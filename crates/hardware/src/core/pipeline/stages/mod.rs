//! Pipeline stage executors.
//!
//! Each executor handles one instruction latch per call and is invoked by the
//! core scheduler (in-order or out-of-order):
//! 1. **Fetch:** Reads the instruction and charges fetch latency.
//! 2. **Decode:** Decodes the instruction and trains the predictor.
//! 3. **Execute:** Resolves branches against their prediction.
//! 4. **Memory:** Performs data accesses and charges their latency.

/// Instruction decode stage implementation.
pub mod decode;

/// Instruction execute stage implementation.
pub mod execute;

/// Instruction fetch stage implementation.
pub mod fetch;

/// Memory access stage implementation.
pub mod memory;

/// Decode stage entry point (ID stage).
pub use decode::decode_stage;
/// Execute stage entry point (EX stage).
pub use execute::execute_stage;
/// Fetch stage entry point (IF stage).
pub use fetch::fetch_stage;
/// Memory stage entry point (MEM stage).
pub use memory::mem_stage;
