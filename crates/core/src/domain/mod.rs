pub mod contract;
pub mod flag;
pub mod market;
pub mod verdict;
