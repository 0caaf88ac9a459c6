//! NotebookLM Exporter - extract conversations and Studio documents
//! from a NotebookLM page as Markdown files.
//!
//! The host app publishes no API and no stable markup, so everything
//! works against an in-memory document tree: lookups go through ordered
//! chains of fallback locator strategies, extraction strips host chrome
//! before conversion, and a level-triggered reconciliation loop keeps
//! the injected export controls present across re-renders.
//!
//! Layers follow the usual split: `domain` holds the tree, locators and
//! models; `application` the export pipeline and loops; `infrastructure`
//! the filesystem and snapshot-parsing adapters.

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
