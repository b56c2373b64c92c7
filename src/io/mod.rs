/*!
# IO utilities

Line-oriented JSON reading and writing for the three passes, with
transparent gzip on `.gz` paths.
!*/
mod reader;
mod writer;

pub use reader::JsonlReader;
pub use writer::JsonlWriter;
