//! Per-format decoders and input discovery.
//!
//! A [`Decoder`] turns the byte range of one file into a lazy stream of
//! [`StructuredRecord`](crate::record::StructuredRecord)s. The composite reader
//! never looks inside a format; it only hands each decoder an open handle, the
//! file's range and a [`DecodeContext`].

pub mod decoder;
pub mod glob;

#[cfg(any(feature = "io-text", feature = "io-csv", feature = "io-jsonl"))]
pub mod lines;

#[cfg_attr(docsrs, doc(cfg(feature = "io-text")))]
#[cfg(feature = "io-text")]
pub mod text;

#[cfg_attr(docsrs, doc(cfg(feature = "io-csv")))]
#[cfg(feature = "io-csv")]
pub mod csv;

#[cfg_attr(docsrs, doc(cfg(feature = "io-jsonl")))]
#[cfg(feature = "io-jsonl")]
pub mod jsonl;

#[cfg_attr(docsrs, doc(cfg(feature = "io-avro")))]
#[cfg(feature = "io-avro")]
pub mod avro;

pub use decoder::{DecodeContext, Decoder, Format, RecordStream};
