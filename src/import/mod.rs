pub mod common;
pub mod diary;
pub mod events;
pub mod ideas;
pub mod members;
pub mod roles;
