// Engine module - analysis over stored captures
// Sits between the capture store (index) and CLI presentation; pure functions only

pub mod flow;
pub mod trend;

pub use flow::{
    CALL_SIGNATURES, FlowAnalysis, TimingStat, Trace, TraceStep, analyze, build_call, classify,
    feature_flags, timing_report, traces,
};
pub use trend::{LinearFit, linear_fit};
