pub mod compare;
pub mod info;
pub mod regen;
pub mod track;
