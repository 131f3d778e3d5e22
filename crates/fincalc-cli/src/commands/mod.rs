pub mod comparison;
pub mod investments;
pub mod loans;
