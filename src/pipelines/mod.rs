// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for live frames and still photos
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Camera Frame │ ──▶ │   Live Pipeline   │ ──▶ │   Display    │
//! │  (in place)  │     │  - tritan kernel  │     │              │
//! │              │     │  - release once   │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Encoded photo│ ──▶ │  Photo Pipeline   │ ──▶ │ Photo library│
//! │ (path/bytes) │     │  - bounded resize │     │              │
//! │              │     │  - tritan kernel  │     │              │
//! │              │     │  - encoding       │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`live`]: per-frame filtering on the frame delivery thread
//! - [`photo`]: gallery previews and filtered photo capture

pub mod live;
pub mod photo;
