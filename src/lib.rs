//! Harmonizes heterogeneous gene-expression count files into one long-format
//! `(sample_id, ensembl_gene_id, raw_count)` table.
//!
//! Each count file lives in a directory named after its file id. The file id is
//! resolved to a sample through a sample sheet ([`sheet`]), the file layout is
//! classified from its first rows ([`detect`]), parsed by the matching variant
//! parser ([`parsers`]) and merged by the driver ([`app`]).

pub mod app;
pub mod config;
pub mod detect;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod io;
pub mod output;
pub mod parsers;
pub mod sheet;
pub mod sink;
pub mod table;
