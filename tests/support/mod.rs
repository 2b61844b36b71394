#![allow(dead_code)]

pub mod fake_classifier;
pub mod frames;
pub mod handsign_env;
