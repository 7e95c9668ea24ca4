//! Integration test suite for duebell.
//!
//! These tests exercise the service end to end: ingest through the
//! handler, reminder scans against a real task file, restarts, and both
//! TCP channels.
//!
//! # Test Categories
//!
//! - `ingest_flow`: Request handling and validation outcomes
//! - `reminders`: Reminder window and at-most-once delivery
//! - `restart`: Durability of tasks and delivery flags across restarts
//! - `transport`: Request/response and publish channels over TCP
//!
//! All sockets bind to `127.0.0.1:0`, so the suite is safe to run in parallel.


mod ingest_flow;
mod reminders;
mod restart;
