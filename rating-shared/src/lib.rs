//! # Rating Shared
//! This crate defines shared data structures and types used across the rating ecosystem.
//! It includes common definitions for vote values, user votes, vote transitions,
//! principals and the writeups that votes are cast on.
pub mod types;
