// ABOUTME: Wire protocol — newline-delimited JSON-RPC 2.0 frames and their I/O.
// ABOUTME: Frame types live in frame.rs; the line reader and serialized writer in io.rs.

pub mod frame;
pub mod io;

pub use frame::*;
pub use io::*;
