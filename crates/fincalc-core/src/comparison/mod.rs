pub mod mortgage_swp;
