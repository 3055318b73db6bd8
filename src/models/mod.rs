// src/models/mod.rs

pub mod attempt;
pub mod exam;
pub mod exam_record;
pub mod question;
