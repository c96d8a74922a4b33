//! Generated-file intermediate representation and the tools plugins use to
//! rewrite it: lookup, import injection and pattern patching.

pub mod file;
pub mod imports;
pub mod locate;
pub mod patch;
pub mod utils;

pub use file::*;
pub use imports::*;
pub use locate::*;
pub use patch::*;
