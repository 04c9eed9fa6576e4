//! Foundational types: users and the IOU entity with its claim lifecycle.

pub mod iou;
pub mod user;
