pub mod calculator;
pub mod web_search;

pub use calculator::CalculatorTool;
pub use threadchat_core::tools::ToolRegistry;
pub use web_search::WebSearchTool;
