//! Platform dispatch for the page source (component A).
//!
//! Each platform module exposes the same three free functions:
//! `query_page_size`, `map_pages`, `unmap_pages`. The core never looks at
//! `cfg(unix)`/`cfg(windows)` directly — it only calls through here.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::{map_pages, query_page_size, unmap_pages};

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::{map_pages, query_page_size, unmap_pages};
