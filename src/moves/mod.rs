pub mod move_gen;
pub mod move_info;
pub mod move_list;

pub use move_gen::{GenMode, generate_moves};
pub use move_info::Move;
pub use move_list::MoveList;
