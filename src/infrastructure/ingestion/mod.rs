//! Text splitting implementations

mod recursive;

pub use recursive::RecursiveCharacterSplitter;
