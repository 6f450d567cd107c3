pub mod interaction;
pub mod mapper;

pub use interaction::{Edit, EditTarget, InteractionController, Modifiers};
pub use mapper::{CanvasRect, CellMapper};
