// Shared test helpers

pub mod recording;
