pub mod size_and_align;
pub mod target;
