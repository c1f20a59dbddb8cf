/// SDNA inspection command.
pub mod dna;
/// Full block dump command.
pub mod dump;
/// ID-to-ID graph command.
pub mod graph;
/// ID content summary command.
pub mod ids;
/// File-level information command.
pub mod info;
/// Address lookup command.
pub mod locate;
/// Size statistics command.
pub mod stats;
/// Pointer strip/restore command.
pub mod strip;

mod util;
