//! Domain types for DreamFM
//!
//! - `book`: book ids and catalog metadata
//! - `catalog`: cached catalog snapshot
//! - `playback`: playback rate set and volume
//! - `common`: shared traits

mod book;
mod catalog;
mod common;
mod playback;

pub use book::{BookId, BookMetadata};
pub use catalog::Catalog;
pub use common::Validator;
pub use playback::{PlaybackRate, RateCycle, Volume};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let _id: BookId = BookId::new("x");
        let _rate: PlaybackRate = PlaybackRate::default();
        let _cycle: RateCycle = RateCycle::default();
        let _volume: Volume = Volume::default();
        let _catalog: Catalog = Catalog::default();
    }
}
