pub mod greedy_string_tiling;
mod hashing;

pub use self::{
    greedy_string_tiling::{ComparisonError, GreedyStringTiling},
    hashing::TokenHashes,
};
