//! # UI Module
//!
//! This module contains all UI components for the string tuner.

pub mod deviation_meter;
pub mod main_display;
pub mod spectrum;
