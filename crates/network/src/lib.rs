// crates/network/src/lib.rs
//! Network access for chapter audio delivery

mod chapter_source;
mod client;
mod error;

pub use chapter_source::{chapter_url, ChapterSource, HttpChapterSource};
pub use client::{Client, ClientConfig};
pub use error::{NetworkError, NetworkResult};
