//! 业务能力层
//!
//! 每个服务只提供一种能力，不关心整体流程。

pub mod court_directory;
pub mod diagnostics;
pub mod notifier;
pub mod readiness;
pub mod row_matcher;
pub mod session_driver;

pub use court_directory::CourtDirectory;
pub use diagnostics::{ArtifactWriter, DiagnosticsSink};
pub use notifier::{build_notification, Notification, Notifier, NotifyStatus, WebhookNotifier};
pub use readiness::{BusyCycle, BusyPhase};
pub use row_matcher::{match_grid, CaseKeys};
pub use session_driver::{FillTechnique, SessionDriver, SubmitMethod};
