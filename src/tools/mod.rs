pub mod builtin;
pub mod registry;
pub mod tool;

pub use builtin::{EchoTool, TextEnhancerTool};
pub use registry::ToolRegistry;
pub use tool::Tool;
