pub mod activity_search_tool;
mod tool;
pub mod weather_tool;

pub use activity_search_tool::{ActivityResult, ActivitySearchTool};
pub use tool::{parse_args, FunctionDescriptor, LlmTool, ToolDescriptor};
pub use weather_tool::{WeatherConfig, WeatherTool};
