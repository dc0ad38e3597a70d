//! plantops: Plant Ops Toolkit
//!
//! Keeps a plant's production and inventory records in sync between an
//! Excel workbook (the durable interchange copy) and a local SQLite mirror
//! (the fast, queryable copy), and implements the stock ledger and
//! BOM-driven consumption logic on top of the mirror.

pub mod cli;
pub mod core;
pub mod entities;
