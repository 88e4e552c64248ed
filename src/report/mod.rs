pub mod export;
pub mod rules;
pub mod table;

pub use export::export_to_json;
pub use rules::describe_rules;
pub use table::{render_summary, render_table, render_verdict};
