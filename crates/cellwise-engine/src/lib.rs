//! cellwise_engine - Formula evaluation over a grid of raw cell text.

pub mod engine;
