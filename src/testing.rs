//! Testing utilities for code built on ironsplit.
//!
//! - **Mock I/O**: temporary directories and files, pre-populated [`MemoryFs`](crate::fs::MemoryFs)
//! - **Assertions**: split coverage checks and record collection helpers
//!
//! # Quick Start
//!
//! ```
//! use ironsplit::planner::plan;
//! use ironsplit::testing::*;
//!
//! let fs = memory_fs_with(&[("/a.txt", "x\ny\n"), ("/b.txt", "z\n")]);
//! let files = entries_for(&fs, &["/a.txt", "/b.txt"]);
//! let splits = plan(&fs, &files, 3, false);
//! assert_covers_exactly_once(&files, &splits);
//! ```

pub mod assertions;
pub mod mock_io;

pub use assertions::*;
pub use mock_io::*;
