//! Integration tests across pool, service and sweeper.

pub mod flows;
