//! Single-page SEO audit: raw page facts, site-level files, and a weighted
//! multi-category score.

pub mod auditor;
pub mod content;
pub mod error;
pub mod facts;
mod locale;
pub mod score;
pub mod site_files;
pub mod speed;

pub use auditor::{PageAudit, PageAuditor};
pub use content::{ContentAnalysis, TermDensity};
pub use error::AuditError;
pub use facts::{OpenGraph, PageFacts};
pub use score::AuditScore;
pub use site_files::SiteFiles;
pub use speed::{NoSpeedProvider, PageSpeedClient, SpeedProvider};
