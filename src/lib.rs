pub mod checker;
pub mod conf;
pub mod probes;
pub mod structures;

pub use checker::LivenessChecker;
pub use structures::{HostTarget, ProbeMethod, ProbeReport, ProbeResult};
