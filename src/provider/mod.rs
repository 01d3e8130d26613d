//! Photo search providers
//!
//! Defines the [`PhotoProvider`] trait, the [`Candidate`] model and the
//! classified [`SearchError`], plus the Unsplash implementation.

mod traits;
pub mod unsplash;

pub use traits::*;
pub use unsplash::UnsplashProvider;
