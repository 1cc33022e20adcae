//! Task lifecycle: creation, status transitions, and sealing into the archive.

pub mod archive;
pub mod lifecycle;
pub mod model;
pub mod status;

pub use archive::{archive_from_snapshot, archive_ids, ArchiveEntry};
pub use lifecycle::TaskLifecycle;
pub use model::{tasks_from_snapshot, Task};
pub use status::TaskStatus;
