//! Wire codecs.
//!
//! Two framings over the single `ChatMessage` model in [`crate::message`]:
//! [`text`] for the TCP line-oriented grammar and [`binary`] for the UDP
//! tagged-binary grammar. Serialization is total for any value that
//! satisfies [`crate::grammar`]'s predicates; parsing never panics on
//! garbage and never reads past the supplied slice.

pub mod binary;
pub mod text;
