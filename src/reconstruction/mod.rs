/*!
 * Reconstruction of translated scripts from extraction artifacts.
 */

pub mod reconstructor;

pub use reconstructor::{ReconstructionResult, Reconstructor};
