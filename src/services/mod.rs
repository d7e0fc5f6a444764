pub mod board;

pub use board::{Board, BoardEntry, BoardFilter, FilterCounts, PriorityFilter, StatusFilter, build_board};
