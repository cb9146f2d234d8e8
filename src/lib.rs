pub mod fusion;
pub mod geometry;
pub mod host;
pub mod io;
