//! UI module - contains reusable rendering components

pub mod components;
