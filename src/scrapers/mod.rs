//! News source scrapers.
//!
//! Each source module drives the two-phase run for one programme:
//!
//! 1. **Indexing**: discover segment URLs from the programme's index pages
//! 2. **Fetching**: download each segment page and hand it to the extractor
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | CCTV Xinwen Lianbo | [`xwlb`] | HTML scraping of the daily index and segment pages |
//!
//! Sources are generic over [`crate::fetch::PageFetcher`], fetch strictly one
//! page at a time, and skip (after logging) any segment that fails.

pub mod xwlb;
