mod basic;

pub use basic::{Card, CardError, Color, Figure};
