//! C ABI surface called by the host-side loader

pub mod exports;
