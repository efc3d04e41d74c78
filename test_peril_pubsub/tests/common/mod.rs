#![allow(dead_code)]

pub mod handle;
pub mod names;
pub mod receiver;
