pub mod cards;
pub mod winners;
