//! Persistence of goals and time entries is organized through [entry_store::JsonEntryStore].
//! The basic idea is:
//!  - There is a directory holding `goals.jsonl` and `entries.jsonl`.
//!  - Every line is one JSON document.
//!  - Writes append or rewrite a file under an exclusive lock, reads take a shared one.

pub mod connection;
pub mod entry_store;
