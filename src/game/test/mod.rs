//! Tests for the Werewolf game engine
//!
//! Most tests use the fixed nine-seat table from [test_utils::table], so that
//! seat numbers in assertions always mean the same role.

#![cfg(test)]
#![allow(clippy::bool_assert_comparison)]

pub mod badge_election;
pub mod events_history;
pub mod role_rules;
pub mod test_utils;
