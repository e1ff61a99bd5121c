//! Session module
//!
//! The wizard's state machine, the AI-backed operations it sequences, and a
//! controller that runs them in order.

mod controller;
mod flow;
mod studio;

pub use controller::Controller;
pub use flow::{
    AnalysisJob, FlowError, FlowState, GenerationJob, LookupJob, Notice, NoticeLevel, Operation, Outcome, Session,
    Ticket,
};
pub use studio::{Studio, extract_json, parse_structured};
