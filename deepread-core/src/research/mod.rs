//! Research workflow: prompt construction, report assembly, session
//! orchestration and export.
//!
//! 1. **Search**: topic to ranked results
//! 2. **Read**: selected results to cleaned documents
//! 3. **Assemble**: documents to one generation call to a [`ReportRecord`]
//! 4. **Export**: report to Markdown or JSON
//!
//! [`ReportRecord`]: crate::types::ReportRecord

pub mod assembler;
pub mod output;
pub mod prompt;
pub mod session;

pub use assembler::{ResearchReportAssembler, report_from_completion};
pub use output::OutputFormat;
pub use session::{RequestToken, ResearchSession, SessionSnapshot, Settled};
